//! Read, expand and evaluate source text one top-level form at a time.

use crate::Error;
use crate::ast::Value;
use crate::evaluator::{Environment, create_global_env, eval};
use crate::expander::{Expander, MacroTable};
use crate::scheme::{ParseConfig, Reader, parse_scheme_with_config};

/// Derived forms defined as macros over the core grammar
const PRELUDE: &str = r#"
(define-syntax let
  (lambda args
    (if (symbol? (car args))
        ((lambda (name bindings body)
           `((lambda ()
               (define ,name (lambda ,(map car bindings) ,@body))
               (,name ,@(map (lambda (b) (car (cdr b))) bindings)))))
         (car args) (car (cdr args)) (cdr (cdr args)))
        `((lambda ,(map car (car args)) ,@(cdr args))
          ,@(map (lambda (b) (car (cdr b))) (car args))))))

(define-syntax let*
  (lambda args
    (if (null? (car args))
        `((lambda () ,@(cdr args)))
        `(let (,(car (car args)))
           (let* ,(cdr (car args)) ,@(cdr args))))))

(define-syntax and
  (lambda args
    (if (null? args)
        #t
        (if (null? (cdr args))
            (car args)
            `(if ,(car args) (and ,@(cdr args)) #f)))))

(define-syntax or
  (lambda args
    (if (null? args)
        #f
        (if (null? (cdr args))
            (car args)
            `((lambda (value rest) (if value value (rest)))
              ,(car args)
              (lambda () (or ,@(cdr args))))))))

(define-syntax cond
  (lambda clauses
    (if (null? clauses)
        ''()
        ((lambda (clause rest)
           (if (eq? (car clause) 'else)
               `(begin ,@(cdr clause))
               (if (null? (cdr clause))
                   `(or ,(car clause) (cond ,@rest))
                   `(if ,(car clause) (begin ,@(cdr clause)) (cond ,@rest)))))
         (car clauses) (cdr clauses)))))

(define-syntax when
  (lambda args `(if ,(car args) (begin ,@(cdr args)) '())))

(define-syntax unless
  (lambda args `(if ,(car args) '() (begin ,@(cdr args)))))
"#;

/// Interpreter settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Reader settings applied to every call of [`Interpreter::interpret`]
    pub parse: ParseConfig,
    /// Load the `let`/`let*`/`and`/`or`/`cond`/`when`/`unless` macros
    pub prelude: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            parse: ParseConfig::default(),
            prelude: true,
        }
    }
}

/// One interpreter instance: a global environment plus its own macro table.
/// Instances never share state.
pub struct Interpreter {
    env: Environment,
    macros: MacroTable,
    config: InterpreterConfig,
}

impl Interpreter {
    /// An interpreter with the builtin procedures only, no prelude macros
    pub fn new() -> Self {
        Interpreter {
            env: create_global_env(),
            macros: MacroTable::new(),
            config: InterpreterConfig {
                prelude: false,
                ..InterpreterConfig::default()
            },
        }
    }

    pub fn with_config(config: InterpreterConfig) -> Result<Self, Error> {
        let mut interpreter = Interpreter {
            env: create_global_env(),
            macros: MacroTable::new(),
            config,
        };
        if config.prelude {
            interpreter.run(Reader::new(PRELUDE))?;
        }
        Ok(interpreter)
    }

    /// Read, expand and evaluate every form in `source`, returning the value
    /// of the last one. Stops at the first error; forms before it keep their
    /// effects.
    pub fn interpret(&mut self, source: &str) -> Result<Value, Error> {
        let reader = Reader::with_config(source, &self.config.parse);
        self.run(reader)?
            .ok_or_else(|| Error::syntax("empty input"))
    }

    /// Expand a single form without evaluating it. `define-syntax` forms still
    /// register their macro.
    pub fn expand(&mut self, source: &str) -> Result<Value, Error> {
        let form = parse_scheme_with_config(source, &self.config.parse)?;
        Expander::new(&mut self.macros, &self.env).expand(&form, true)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Names of all registered macros, sorted
    pub fn macro_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.macros.keys().map(|name| name.name()).collect();
        names.sort();
        names
    }

    fn run(&mut self, mut reader: Reader<'_>) -> Result<Option<Value>, Error> {
        let mut last = None;
        loop {
            let form = reader.read()?;
            if form.is_eof() {
                return Ok(last);
            }
            log::debug!("evaluating {form}");
            let expanded = Expander::new(&mut self.macros, &self.env).expand(&form, true)?;
            last = Some(eval(&expanded, &self.env)?);
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Evaluate `source` in a fresh interpreter (builtins only) and return the
/// value of its last form
pub fn interpret(source: &str) -> Result<Value, Error> {
    Interpreter::new().interpret(source)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::printer::stringify;

    /// Expected outcome of interpreting one chunk of source text
    #[derive(Debug)]
    enum TestResult {
        Prints(&'static str),        // Result should print as this text
        SpecificError(&'static str), // Interpretation should fail with error containing this string
    }
    use TestResult::*;

    /// Chunks interpreted in order by one interpreter
    struct TestSession(Vec<(&'static str, TestResult)>);

    fn run_sessions(sessions: Vec<TestSession>) {
        for (session_idx, TestSession(cases)) in sessions.into_iter().enumerate() {
            let mut interpreter = Interpreter::with_config(InterpreterConfig::default()).unwrap();
            for (case_idx, (source, expected)) in cases.into_iter().enumerate() {
                let test_id = format!("Session #{} case #{}", session_idx + 1, case_idx + 1);
                match (interpreter.interpret(source), expected) {
                    (Ok(value), Prints(text)) => {
                        assert_eq!(stringify(&value), text, "{test_id}: {source}");
                    }
                    (Err(e), SpecificError(fragment)) => {
                        let message = e.to_string();
                        assert!(
                            message.contains(fragment),
                            "{test_id}: error for {source} should contain '{fragment}', got: {message}"
                        );
                    }
                    (Ok(value), SpecificError(fragment)) => {
                        panic!("{test_id}: expected error containing '{fragment}', got {value}");
                    }
                    (Err(e), Prints(text)) => {
                        panic!("{test_id}: expected {text} from {source}, got error {e}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_pipeline_sessions() {
        run_sessions(vec![
            TestSession(vec![
                ("(if #t 1 2)", Prints("1")),
                ("(if #f 1 2)", Prints("2")),
                ("(if #f 1)", Prints("()")),
                ("(begin (define foo 123) (set! foo 456) foo)", Prints("456")),
                ("(quote abc)", Prints("abc")),
                ("((quote if) #f 1 2)", SpecificError("is not applicable")),
                // Several forms: the last value wins
                ("(define a 1) (define b 2) (+ a b)", Prints("3")),
                ("(define (square x) (* x x)) (square 12)", Prints("144")),
                ("`(1 ,(square 2) ,@(list 3 4))", Prints("(1 4 3 4)")),
                ("(define x 5)", Prints("()")),
                ("(/ 1+i 0)", Prints("+nan.0+nan.0i")),
                ("(* 2 3-i)", Prints("6-2i")),
            ]),
            TestSession(vec![
                // The first error stops evaluation; earlier forms keep their effects
                ("(define a 1) (car '()) (define a 2)", SpecificError("car: empty list")),
                ("a", Prints("1")),
                ("(define b 1) (if) (set! b 2)", SpecificError("if too few arguments")),
                ("b", Prints("1")),
                ("(define c 1) (+ 1", SpecificError("unexpected end of input")),
                ("c", Prints("1")),
                // Keywords are syntax, never variables
                ("(define if 5)", SpecificError("cannot bind syntactic keyword if")),
                ("(+ if 1)", SpecificError("undefined variable: if")),
                ("(define (f set!) set!)", SpecificError("cannot bind syntactic keyword set!")),
            ]),
            TestSession(vec![
                ("", SpecificError("SyntaxError: empty input")),
                ("   ; nothing but a comment", SpecificError("empty input")),
                ("()", SpecificError("empty input")),
                (")", SpecificError("unexpected ')'")),
            ]),
        ]);
    }

    #[test]
    fn test_prelude_macros() {
        run_sessions(vec![TestSession(vec![
            ("(let ((x 1) (y 2)) (+ x y))", Prints("3")),
            ("(let () 7)", Prints("7")),
            ("(let ((x 1)) (define y 2) (+ x y))", Prints("3")),
            (
                "(let loop ((i 0) (acc '())) (if (= i 3) acc (loop (+ i 1) (cons i acc))))",
                Prints("(2 1 0)"),
            ),
            ("(let* ((x 1) (y (+ x 1))) (* x y))", Prints("2")),
            ("(let* () 5)", Prints("5")),
            ("(and)", Prints("#t")),
            ("(and 1 2)", Prints("2")),
            ("(and 1 #f 3)", Prints("#f")),
            ("(and #f (car '()))", Prints("#f")),
            ("(or)", Prints("#f")),
            ("(or #f 3)", Prints("3")),
            ("(or #f #f)", Prints("#f")),
            ("(or 1 (car '()))", Prints("1")),
            ("(cond (#f 1) ((= 1 1) 2) (else 3))", Prints("2")),
            ("(cond (#f 1) (else 3))", Prints("3")),
            ("(cond (#f 1))", Prints("()")),
            ("(cond (#f) (5))", Prints("5")),
            ("(when #t 1 2)", Prints("2")),
            ("(when #f 1)", Prints("()")),
            ("(unless #f 1)", Prints("1")),
            ("(unless #t 1)", Prints("()")),
        ])]);
    }

    #[test]
    fn test_user_macros() {
        run_sessions(vec![
            TestSession(vec![
                (
                    "(define-syntax swap! (lambda (a b) `(let ((tmp ,a)) (set! ,a ,b) (set! ,b tmp))))",
                    Prints("()"),
                ),
                ("(define p 1) (define q 2) (swap! p q) (list p q)", Prints("(2 1)")),
                // Not hygienic: the macro's `tmp` shadows the caller's
                (
                    "(define tmp 5) (define other 6) (swap! tmp other) (list tmp other)",
                    Prints("(5 6)"),
                ),
            ]),
            TestSession(vec![
                (
                    "(define-syntax (my-while test . body) 0)",
                    SpecificError("illegal lambda argument list"),
                ),
                (
                    "(define-syntax while (lambda args `(let loop () (when ,(car args) ,@(cdr args) (loop)))))",
                    Prints("()"),
                ),
                (
                    "(define i 0) (define total 0) (while (< i 5) (set! total (+ total i)) (set! i (+ i 1))) total",
                    Prints("10"),
                ),
                ("(define (f) (define-syntax m car))", SpecificError("only allowed at top level")),
            ]),
        ]);
    }

    #[test]
    fn test_macro_tables_are_per_instance() {
        let mut first = Interpreter::new();
        first
            .interpret("(define-syntax (twice e) `(begin ,e ,e))")
            .unwrap();
        assert_eq!(first.macro_names(), vec!["twice".to_owned()]);
        assert_eq!(
            stringify(&first.expand("(twice (f))").unwrap()),
            "(begin (f) (f))"
        );

        let mut second = Interpreter::new();
        assert!(second.macro_names().is_empty());
        assert_eq!(stringify(&second.expand("(twice (f))").unwrap()), "(twice (f))");

        let with_prelude = Interpreter::with_config(InterpreterConfig::default()).unwrap();
        assert_eq!(
            with_prelude.macro_names(),
            ["and", "cond", "let", "let*", "or", "unless", "when"]
        );
    }

    #[test]
    fn test_free_interpret_has_no_prelude() {
        assert_eq!(interpret("(+ 1 2)").unwrap(), Value::Integer(3));
        let err = interpret("(let ((x 1)) x)").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert!(err.message.contains("let"));
    }

    #[test]
    fn test_parse_config_is_applied() {
        let config = InterpreterConfig {
            parse: ParseConfig {
                handle_comments: false,
                max_depth: 4,
            },
            prelude: true,
        };
        let mut interpreter = Interpreter::with_config(config).unwrap();

        assert_eq!(interpreter.interpret("(let ((x 1)) x)").unwrap().to_string(), "1");
        let err = interpreter.interpret("1 ; comment").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lex);
        let err = interpreter.interpret("((((1))))").unwrap_err();
        assert!(err.message.contains("too deeply nested"), "{err}");
    }

    #[test]
    fn test_expand_exposes_lowering() {
        let mut interpreter = Interpreter::new();
        let test_cases = vec![
            ("(if #t (display \"foo\"))", "(if #t (display \"foo\") ())"),
            ("(define (f args) body)", "(define f (lambda (args) body))"),
            ("(lambda (x) e1 e2)", "(lambda (x) (begin e1 e2))"),
            ("(foo `,x)", "(foo x)"),
            ("(foo `(,@x y))", "(foo (append x (cons (quote y) (quote ()))))"),
        ];
        for (input, expected) in test_cases {
            assert_eq!(stringify(&interpreter.expand(input).unwrap()), expected);
        }
        assert!(interpreter.expand("(a) (b)").is_err());
    }
}
