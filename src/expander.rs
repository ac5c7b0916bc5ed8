//! Syntactic expansion of parsed forms into the core grammar.
//!
//! The expander runs once per top-level form, before evaluation. It checks the
//! shape of every special form, fills in defaults and rewrites sugar:
//!
//! ```text
//! (if c a)                  => (if c a ())
//! (define (f x) e)          => (define f (lambda (x) e))
//! (lambda (x) e1 e2)        => (lambda (x) (begin e1 e2))
//! `(a ,b ,@c)               => (cons (quote a) (cons b (append c (quote ()))))
//! ```
//!
//! `define-syntax` registers a procedure in the [`MacroTable`]; every later form
//! headed by that symbol is handed to the procedure unevaluated and the result
//! is expanded again. Expansion is not hygienic: identifiers introduced by a
//! macro are used as written.

use std::collections::HashMap;
use std::rc::Rc;

use crate::Error;
use crate::ast::{Callable, Params, Value, bindable};
use crate::evaluator::{DepthGuard, Environment, apply_callable, eval};
use crate::symbol::{Keyword, Symbol};

/// Macros registered by `define-syntax`, keyed by name
pub type MacroTable = HashMap<Symbol, Rc<Callable>>;

fn keyword(kw: Keyword) -> Value {
    Value::Symbol(kw.symbol())
}

/// The form left behind by `define-syntax` and an empty `begin`
fn placeholder() -> Value {
    Value::list([keyword(Keyword::Begin)])
}

/// Rewrites forms against one macro table, running `define-syntax` bodies in
/// `env`
pub struct Expander<'a> {
    macros: &'a mut MacroTable,
    env: &'a Environment,
}

impl<'a> Expander<'a> {
    pub fn new(macros: &'a mut MacroTable, env: &'a Environment) -> Self {
        Expander { macros, env }
    }

    /// Expand `form`. `top_level` is true for a form read directly from the
    /// input and for the members of a top-level `begin`; only there may
    /// `define-syntax` appear.
    pub fn expand(&mut self, form: &Value, top_level: bool) -> Result<Value, Error> {
        let _level = DepthGuard::enter()?;
        let Value::Pair(pair) = form else {
            if form.is_nil() && top_level {
                return Err(Error::syntax("empty input"));
            }
            return Ok(form.clone());
        };

        let Some(elements) = form.to_vec() else {
            return Err(Error::syntax(format!("cannot expand improper form {form}")));
        };

        let Some(head) = pair.first.as_symbol() else {
            return self.expand_call(&elements);
        };

        match head.keyword() {
            Some(Keyword::Quote) => {
                if elements.len() != 2 {
                    return Err(Error::syntax(format!(
                        "quote requires exactly one argument: {form}"
                    )));
                }
                Ok(form.clone())
            }
            Some(Keyword::If) => match elements.len() {
                3 => {
                    let mut elements = elements;
                    elements.push(Value::Nil);
                    self.expand_call(&elements)
                }
                4 => self.expand_call(&elements),
                n if n < 3 => Err(Error::syntax(format!("if too few arguments: {form}"))),
                _ => Err(Error::syntax(format!("if too many arguments: {form}"))),
            },
            Some(Keyword::Set) => match elements.as_slice() {
                [set, target @ Value::Symbol(name), value] => {
                    bindable(*name, form)?;
                    Ok(Value::list([
                        set.clone(),
                        target.clone(),
                        self.expand(value, false)?,
                    ]))
                }
                [_, _, _] => Err(Error::syntax(format!("can only set! a symbol: {form}"))),
                _ => Err(Error::syntax(format!(
                    "set! requires exactly two arguments: {form}"
                ))),
            },
            Some(kw @ (Keyword::Define | Keyword::DefineSyntax)) => {
                self.expand_definition(kw, &elements, form, top_level)
            }
            Some(Keyword::Begin) => {
                if elements.len() == 1 {
                    return Ok(placeholder());
                }
                let mut expanded = vec![elements[0].clone()];
                for sub_form in &elements[1..] {
                    expanded.push(self.expand(sub_form, top_level)?);
                }
                Ok(Value::list(expanded))
            }
            Some(Keyword::Lambda) => self.expand_lambda(&elements, form),
            Some(Keyword::Quasiquote) => {
                let [_, datum] = elements.as_slice() else {
                    return Err(Error::syntax(format!(
                        "quasiquote requires exactly one argument: {form}"
                    )));
                };
                let lowered = expand_quasiquote(datum)?;
                self.expand(&lowered, false)
            }
            _ => match self.macros.get(&head).cloned() {
                Some(transformer) => {
                    let result = apply_callable(&transformer, elements[1..].to_vec())?;
                    log::trace!("expanded macro {head}: {form} => {result}");
                    self.expand(&result, top_level)
                }
                None => self.expand_call(&elements),
            },
        }
    }

    /// Expand every element of an ordinary form (a call, or `if` once its
    /// arity is settled)
    fn expand_call(&mut self, elements: &[Value]) -> Result<Value, Error> {
        let expanded = elements
            .iter()
            .map(|element| self.expand(element, false))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::list(expanded))
    }

    fn expand_definition(
        &mut self,
        kw: Keyword,
        elements: &[Value],
        form: &Value,
        top_level: bool,
    ) -> Result<Value, Error> {
        let [head, target, body @ ..] = elements else {
            return Err(Error::syntax(format!(
                "{kw} requires at least two arguments: {form}"
            )));
        };
        if body.is_empty() {
            return Err(Error::syntax(format!(
                "{kw} requires at least two arguments: {form}"
            )));
        }

        match target {
            // (define (f . args) body...) => (define f (lambda args body...))
            Value::Pair(signature) => {
                let lambda = Value::list_with_tail(
                    [keyword(Keyword::Lambda), signature.rest.clone()],
                    Value::list(body.iter().cloned()),
                );
                let rewritten = Value::list([head.clone(), signature.first.clone(), lambda]);
                self.expand(&rewritten, top_level)
            }
            Value::Symbol(name) => {
                bindable(*name, form)?;
                let [value] = body else {
                    return Err(Error::syntax(format!(
                        "{kw} takes exactly one value expression: {form}"
                    )));
                };
                let value = self.expand(value, false)?;
                if kw == Keyword::Define {
                    return Ok(Value::list([head.clone(), target.clone(), value]));
                }
                if !top_level {
                    return Err(Error::syntax(format!(
                        "define-syntax only allowed at top level: {form}"
                    )));
                }
                self.register_macro(*name, &value)?;
                Ok(placeholder())
            }
            _ => Err(Error::syntax(format!(
                "{kw} target must be a symbol or a list: {form}"
            ))),
        }
    }

    fn register_macro(&mut self, name: Symbol, expr: &Value) -> Result<(), Error> {
        match eval(expr, self.env)? {
            Value::Procedure(transformer) => {
                log::debug!("registered macro {name}");
                self.macros.insert(name, transformer);
                Ok(())
            }
            other => Err(Error::bad_type(format!(
                "macro must be a procedure: {name} is bound to {other}"
            ))),
        }
    }

    fn expand_lambda(&mut self, elements: &[Value], form: &Value) -> Result<Value, Error> {
        let [head, params, body @ ..] = elements else {
            return Err(Error::syntax(format!(
                "lambda requires at least one body expression: {form}"
            )));
        };
        Params::from_value(params)?;

        let body = match body {
            [] => {
                return Err(Error::syntax(format!(
                    "lambda requires at least one body expression: {form}"
                )));
            }
            [single] => single.clone(),
            several => Value::cons(keyword(Keyword::Begin), Value::list(several.iter().cloned())),
        };

        Ok(Value::list([
            head.clone(),
            params.clone(),
            self.expand(&body, false)?,
        ]))
    }
}

/// Lower the datum of a quasiquote into `cons`/`append`/`quote` calls.
/// Unquoted expressions are returned as written.
pub fn expand_quasiquote(datum: &Value) -> Result<Value, Error> {
    let _level = DepthGuard::enter()?;
    let Value::Pair(pair) = datum else {
        return Ok(Value::list([keyword(Keyword::Quote), datum.clone()]));
    };

    match pair.first.as_symbol().and_then(Symbol::keyword) {
        Some(Keyword::UnquoteSplicing) => {
            return Err(Error::syntax(format!("can't splice here: {datum}")));
        }
        Some(Keyword::Unquote) => {
            return match datum.to_vec().as_deref() {
                Some([_, expr]) => Ok(expr.clone()),
                _ => Err(Error::syntax(format!(
                    "unquote requires exactly one argument: {datum}"
                ))),
            };
        }
        _ => {}
    }

    if pair.first.head_symbol().and_then(Symbol::keyword) == Some(Keyword::UnquoteSplicing) {
        let spliced = match pair.first.to_vec().as_deref() {
            Some([_, spliced]) => spliced.clone(),
            _ => {
                return Err(Error::syntax(format!(
                    "unquote-splicing requires exactly one argument: {}",
                    pair.first
                )));
            }
        };
        return Ok(Value::list([
            keyword(Keyword::Append),
            spliced,
            expand_quasiquote(&pair.rest)?,
        ]));
    }

    Ok(Value::list([
        keyword(Keyword::Cons),
        expand_quasiquote(&pair.first)?,
        expand_quasiquote(&pair.rest)?,
    ]))
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::evaluator::create_global_env;
    use crate::scheme::parse_scheme;

    /// Expected outcome of expanding one top-level form
    #[derive(Debug)]
    enum ExpandResult {
        Expands(&'static str),       // Expansion should equal this parsed form
        SpecificError(&'static str), // Expansion should fail with error containing this string
    }
    use ExpandResult::*;

    /// Forms expanded in order against one macro table
    struct TestSession(Vec<(&'static str, ExpandResult)>);

    fn run_sessions(sessions: Vec<TestSession>) {
        for (session_idx, TestSession(cases)) in sessions.iter().enumerate() {
            let env = create_global_env();
            let mut macros = MacroTable::new();
            let mut expander = Expander::new(&mut macros, &env);

            for (case_idx, (input, expected)) in cases.iter().enumerate() {
                let test_id = format!("Session #{} case #{}", session_idx + 1, case_idx + 1);
                let form = parse_scheme(input).unwrap();
                match (expander.expand(&form, true), expected) {
                    (Ok(actual), Expands(text)) => {
                        let expected_form = parse_scheme(text).unwrap();
                        assert_eq!(
                            actual, expected_form,
                            "{test_id}: '{input}' expanded to {actual}, expected {text}"
                        );
                    }
                    (Err(e), SpecificError(fragment)) => {
                        let message = e.to_string();
                        assert!(
                            message.contains(fragment),
                            "{test_id}: error for '{input}' should contain '{fragment}', got: {message}"
                        );
                    }
                    (Ok(actual), SpecificError(fragment)) => {
                        panic!("{test_id}: expected error containing '{fragment}', got {actual}");
                    }
                    (Err(e), Expands(text)) => {
                        panic!("{test_id}: expected '{input}' to expand to {text}, got error {e}");
                    }
                }
            }
        }
    }

    fn run_cases(cases: Vec<(&'static str, ExpandResult)>) {
        run_sessions(cases.into_iter().map(|case| TestSession(vec![case])).collect());
    }

    #[test]
    fn test_core_form_expansion() {
        run_cases(vec![
            // Atoms and quoted data pass through
            ("42", Expands("42")),
            ("x", Expands("x")),
            ("\"str\"", Expands("\"str\"")),
            ("(quote abc)", Expands("(quote abc)")),
            ("(quote (if a b))", Expands("(quote (if a b))")),
            ("'(lambda (x) a b)", Expands("(quote (lambda (x) a b))")),
            // if gains an explicit alternate
            ("(if #t 1 2)", Expands("(if #t 1 2)")),
            (
                "(if #t (display \"foo\"))",
                Expands("(if #t (display \"foo\") ())"),
            ),
            ("(if a (if b c))", Expands("(if a (if b c ()) ())")),
            // define sugar
            ("(define x 1)", Expands("(define x 1)")),
            ("(define (f args) body)", Expands("(define f (lambda (args) body))")),
            ("(define (f) a b)", Expands("(define f (lambda () (begin a b)))")),
            ("(define (f . args) args)", Expands("(define f (lambda args args))")),
            ("(define (f a . rest) rest)", SpecificError("illegal lambda argument list")),
            (
                "(define ((adder n) x) (+ n x))",
                Expands("(define adder (lambda (n) (lambda (x) (+ n x))))"),
            ),
            ("(define x (if a b))", Expands("(define x (if a b ()))")),
            // lambda bodies
            ("(lambda (x) e1)", Expands("(lambda (x) e1)")),
            ("(lambda (x) e1 e2)", Expands("(lambda (x) (begin e1 e2))")),
            ("(lambda args (if a b))", Expands("(lambda args (if a b ()))")),
            // begin and set!
            ("(begin)", Expands("(begin)")),
            ("(begin (if a b) c)", Expands("(begin (if a b ()) c)")),
            ("(set! x (if a b))", Expands("(set! x (if a b ()))")),
            // calls expand every element, including the operator
            (
                "(f (if a b) (lambda (x) y z))",
                Expands("(f (if a b ()) (lambda (x) (begin y z)))"),
            ),
            ("((lambda (x) (if x 1)) 2)", Expands("((lambda (x) (if x 1 ())) 2)")),
            ("(cons (if a b) c)", Expands("(cons (if a b ()) c)")),
        ]);
    }

    #[test]
    fn test_quasiquote_lowering() {
        run_cases(vec![
            ("(foo `,x)", Expands("(foo x)")),
            (
                "(foo `(,@x y))",
                Expands("(foo (append x (cons (quote y) (quote ()))))"),
            ),
            ("`x", Expands("(quote x)")),
            ("`()", Expands("(quote ())")),
            ("`5", Expands("(quote 5)")),
            (
                "`(1 ,x)",
                Expands("(cons (quote 1) (cons x (quote ())))"),
            ),
            ("`(a . b)", Expands("(cons (quote a) (quote b))")),
            ("`(a . ,b)", Expands("(cons (quote a) b)")),
            (
                "`((,x) ,@y)",
                Expands("(cons (cons x (quote ())) (append y (quote ())))"),
            ),
            // Unquoted expressions are expanded once lowered
            (
                "`(,(if a b))",
                Expands("(cons (if a b ()) (quote ()))"),
            ),
            ("`,@x", SpecificError("can't splice here")),
            ("`(unquote a b)", SpecificError("unquote requires exactly one argument")),
            ("`((unquote-splicing) x)", SpecificError("unquote-splicing requires exactly one argument")),
            ("(quasiquote a b)", SpecificError("quasiquote requires exactly one argument")),
            ("(quasiquote)", SpecificError("quasiquote requires exactly one argument")),
        ]);
    }

    #[test]
    fn test_shape_errors() {
        run_cases(vec![
            ("()", SpecificError("empty input")),
            ("(if)", SpecificError("if too few arguments")),
            ("(if a)", SpecificError("if too few arguments")),
            ("(if a b c d)", SpecificError("if too many arguments")),
            ("(set! foo)", SpecificError("set! requires exactly two arguments")),
            ("(set! foo 1 2)", SpecificError("set! requires exactly two arguments")),
            ("(set! (foo) 1)", SpecificError("can only set! a symbol")),
            ("(quote)", SpecificError("quote requires exactly one argument")),
            ("(quote foo bar)", SpecificError("quote requires exactly one argument")),
            ("(lambda \"foo\" bar)", SpecificError("illegal lambda argument list")),
            ("(lambda (x 1) x)", SpecificError("illegal lambda argument list")),
            ("(lambda (x x) x)", SpecificError("duplicate parameter name x")),
            ("(lambda (x))", SpecificError("lambda requires at least one body expression")),
            ("(lambda)", SpecificError("lambda requires at least one body expression")),
            ("(define x)", SpecificError("define requires at least two arguments")),
            ("(define x 1 2)", SpecificError("define takes exactly one value expression")),
            ("(define 1 2)", SpecificError("define target must be a symbol or a list")),
            ("(define () 2)", SpecificError("define target must be a symbol or a list")),
            ("(define if 5)", SpecificError("cannot bind syntactic keyword if")),
            ("(define (quote x) x)", SpecificError("cannot bind syntactic keyword quote")),
            ("(set! begin 1)", SpecificError("cannot bind syntactic keyword begin")),
            ("(define-syntax lambda car)", SpecificError("cannot bind syntactic keyword lambda")),
            ("(lambda (x cons) x)", SpecificError("cannot bind syntactic keyword cons")),
            ("(lambda define 1)", SpecificError("cannot bind syntactic keyword define")),
            ("(f . x)", SpecificError("improper form")),
            ("(g (f . x))", SpecificError("improper form")),
            // Errors deep inside a form surface unchanged
            ("(f (g (if)))", SpecificError("SyntaxError: if too few arguments")),
        ]);
    }

    #[test]
    fn test_define_syntax() {
        run_sessions(vec![
            TestSession(vec![
                (
                    "(define-syntax (unless2 c body) `(if ,c () ,body))",
                    Expands("(begin)"),
                ),
                ("(unless2 x (f y))", Expands("(if x () (f y))")),
                // Arguments are passed unevaluated
                ("(unless2 (undefined-thing) 1)", Expands("(if (undefined-thing) () 1)")),
                // Arity is checked like any call
                ("(unless2 x)", SpecificError("ArityMismatch")),
            ]),
            TestSession(vec![
                // The result of a macro is expanded again
                (
                    "(define-syntax my-when (lambda args `(if ,(car args) (begin ,@(cdr args)))))",
                    Expands("(begin)"),
                ),
                ("(my-when t a b)", Expands("(if t (begin a b) ())")),
                ("(f (my-when t a))", Expands("(f (if t (begin a) ()))")),
                // Macros may expand into other macro uses
                (
                    "(define-syntax my-unless (lambda args `(my-when (not ,(car args)) ,@(cdr args))))",
                    Expands("(begin)"),
                ),
                ("(my-unless t a)", Expands("(if (not t) (begin a) ())")),
                // Quoted data is left alone
                ("'(my-when t a)", Expands("(quote (my-when t a))")),
            ]),
            TestSession(vec![
                ("(define-syntax ignore (lambda args ''ignored))", Expands("(begin)")),
                ("(ignore 1 2 3)", Expands("(quote ignored)")),
                // Registrations inside a top-level begin take effect for later members
                (
                    "(begin (define-syntax one (lambda () 1)) (one))",
                    Expands("(begin (begin) 1)"),
                ),
            ]),
            TestSession(vec![
                // Not hygienic: the macro's `tmp` captures the caller's
                (
                    "(define-syntax (with-tmp e) `(lambda (tmp) ,e))",
                    Expands("(begin)"),
                ),
                ("(with-tmp tmp)", Expands("(lambda (tmp) tmp)")),
            ]),
            TestSession(vec![
                (
                    "(lambda (x) (define-syntax m car))",
                    SpecificError("define-syntax only allowed at top level"),
                ),
                (
                    "(f (define-syntax m car))",
                    SpecificError("define-syntax only allowed at top level"),
                ),
                ("(define-syntax m 5)", SpecificError("macro must be a procedure")),
                ("(define-syntax m undefined-thing)", SpecificError("undefined variable")),
                // A builtin is a procedure too
                ("(define-syntax first car)", Expands("(begin)")),
                ("(first (x y))", Expands("x")),
                ("(first x y)", SpecificError("car: expected 1 arguments, got 2")),
            ]),
        ]);
    }

    #[test]
    fn test_macro_error_kind_and_registration() {
        let env = create_global_env();
        let mut macros = MacroTable::new();
        let mut expander = Expander::new(&mut macros, &env);

        let err = expander
            .expand(&parse_scheme("(define-syntax m \"text\")").unwrap(), true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadType);

        expander
            .expand(&parse_scheme("(define-syntax (m x) x)").unwrap(), true)
            .unwrap();
        assert!(macros.contains_key(&Symbol::intern("m")));
        assert_eq!(macros.len(), 1);

        // Tables are independent
        let mut other = MacroTable::new();
        let mut fresh = Expander::new(&mut other, &env);
        let untouched = fresh.expand(&parse_scheme("(m 1)").unwrap(), true).unwrap();
        assert_eq!(untouched, parse_scheme("(m 1)").unwrap());
    }

    #[test]
    fn test_expand_quasiquote_directly() {
        let lowered = expand_quasiquote(&parse_scheme("(a ,b ,@c)").unwrap()).unwrap();
        assert_eq!(
            lowered,
            parse_scheme("(cons (quote a) (cons b (append c (quote ()))))").unwrap()
        );

        // Vectors are quoted whole
        let vector = parse_scheme("#(1 ,x)").unwrap();
        assert_eq!(
            expand_quasiquote(&vector).unwrap(),
            Value::list([keyword(Keyword::Quote), vector])
        );
    }
}
