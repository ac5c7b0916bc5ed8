use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use schemelet::ast::{Callable, Value};
use schemelet::evaluator::{Arity, Environment};
use schemelet::scheme::{Reader, parse_all};
use schemelet::{Interpreter, InterpreterConfig};
use std::panic;
use std::process;

fn main() {
    let result = panic::catch_unwind(|| {
        run_repl();
    });

    if let Err(panic_info) = result {
        eprintln!("The REPL encountered an unexpected error and must exit.");

        if let Some(msg) = panic_info.downcast_ref::<&str>() {
            eprintln!("Error: {msg}");
        } else if let Some(msg) = panic_info.downcast_ref::<String>() {
            eprintln!("Error: {msg}");
        } else {
            eprintln!("Error: Unknown panic occurred");
        }

        process::exit(1);
    }
}

fn run_repl() {
    println!("Schemelet - a small Scheme interpreter");
    println!("Enter expressions like: (define (square x) (* x x))");
    println!("Unbalanced input continues on the next line.");
    println!("Type :help for more commands, or Ctrl+C to exit.");
    println!();

    let mut rl = DefaultEditor::new().expect("Could not initialize REPL");
    let mut interpreter = match Interpreter::with_config(InterpreterConfig::default()) {
        Ok(interpreter) => interpreter,
        Err(e) => {
            eprintln!("Could not load the prelude: {e}");
            process::exit(1);
        }
    };

    // Callable from Scheme code as (help)
    interpreter
        .environment()
        .register_builtin_function("help", Arity::Exact(0), |_| {
            print_help();
            Ok(Value::Nil)
        });

    let mut pending = String::new();

    loop {
        let prompt = if pending.is_empty() { "scheme> " } else { "   ...> " };
        match rl.readline(prompt) {
            Ok(line) => {
                if pending.is_empty() {
                    let command = line.trim();
                    if command.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(command);

                    match command {
                        ":help" => {
                            print_help();
                            continue;
                        }
                        ":env" => {
                            print_environment(interpreter.environment());
                            continue;
                        }
                        ":macros" => {
                            println!("{}", interpreter.macro_names().join(" "));
                            continue;
                        }
                        ":quit" | ":exit" => {
                            println!("Goodbye!");
                            break;
                        }
                        _ => {}
                    }

                    if let Some(form) = command.strip_prefix(":expand ") {
                        match interpreter.expand(form) {
                            Ok(expanded) => println!("→ {expanded}"),
                            Err(e) => println!("Error: {e}"),
                        }
                        continue;
                    }
                } else {
                    let _ = rl.add_history_entry(line.trim());
                }

                pending.push_str(&line);
                pending.push('\n');

                // Nothing but comments: not worth an "empty input" error
                if Reader::new(&pending).at_end() {
                    pending.clear();
                    continue;
                }

                // Wait for the rest of an unbalanced form before running anything
                if let Err(e) = parse_all(&pending)
                    && e.is_incomplete()
                {
                    continue;
                }

                match interpreter.interpret(&pending) {
                    Ok(result) => println!("{result}"),
                    Err(e) => println!("Error: {e}"),
                }
                pending.clear();
            }

            Err(ReadlineError::Interrupted) if !pending.is_empty() => {
                println!("(input discarded)");
                pending.clear();
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
}

fn print_help() {
    println!("Schemelet REPL:");
    println!("  :help         - Show this help message");
    println!("  :env          - Show current environment bindings");
    println!("  :macros       - List the registered macros");
    println!("  :expand FORM  - Show the expansion of FORM without evaluating it");
    println!("  :quit         - Exit the interpreter");
    println!("  :exit         - Exit the interpreter");
    println!("  Ctrl+C        - Discard pending input, or exit");
    println!();
    println!("Special forms: quote if define define-syntax lambda set! begin");
    println!("               quasiquote unquote unquote-splicing");
    println!("Prelude macros: let let* and or cond when unless");
    println!();
    println!("Examples:");
    println!("  (define (fact n) (if (= n 0) 1 (* n (fact (- n 1)))))");
    println!("  (fact 20)");
    println!("  `(1 ,(+ 1 1) ,@(list 3 4))");
    println!("  (define-syntax swap! (lambda (a b) `(let ((tmp ,a)) (set! ,a ,b) (set! ,b tmp))))");
    println!("  #x4dfCF0  1/3  3-i");
    println!();
}

fn print_environment(env: &Environment) {
    let bindings = env.get_all_bindings();

    if bindings.is_empty() {
        println!("Environment is empty.");
        return;
    }

    println!("Environment bindings ({} total):", bindings.len());
    println!();

    // Separate built-in functions from user-defined values
    let mut builtins = Vec::new();
    let mut user_defined = Vec::new();

    for (name, value) in bindings {
        match value.as_callable() {
            Some(Callable::Primitive(_)) => builtins.push(name),
            _ => user_defined.push((name, value)),
        }
    }

    if !builtins.is_empty() {
        println!("Built-in functions ({}):", builtins.len());
        let mut col = 0;
        for name in builtins {
            print!("  {name:<15}");
            col += 1;
            if col % 4 == 0 {
                println!();
            }
        }
        if col % 4 != 0 {
            println!();
        }
        println!();
    }

    if !user_defined.is_empty() {
        println!("User-defined values ({}):", user_defined.len());
        for (name, value) in user_defined {
            println!("  {name} = {value}");
        }
    }
}
