use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::{Error, MAX_EVAL_DEPTH};
use crate::ast::{Callable, Closure, Params, Primitive, PrimitiveFn, Value, bindable};
use crate::builtinops::get_builtin_ops;
use crate::symbol::{Keyword, Symbol};

mod environment;

pub use environment::Environment;

/// Number of arguments a procedure accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly the specified number of arguments
    Exact(usize),
    /// At least the specified number of arguments
    AtLeast(usize),
    /// Between min and max arguments (inclusive)
    Range(usize, usize),
    /// Any number of arguments (including zero)
    Any,
}

impl Arity {
    /// Check that `got` arguments satisfy this arity
    pub fn validate(self, got: usize) -> Result<(), Error> {
        if self.accepts(got) {
            Ok(())
        } else {
            Err(Error::arity_error(self, got))
        }
    }

    pub fn accepts(self, got: usize) -> bool {
        match self {
            Arity::Exact(n) => got == n,
            Arity::AtLeast(n) => got >= n,
            Arity::Range(min, max) => (min..=max).contains(&got),
            Arity::Any => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// One level of `eval`/`expand` nesting on this thread. Entering past
/// [`MAX_EVAL_DEPTH`] fails with an error instead of exhausting the stack;
/// dropping the guard leaves the level.
pub(crate) struct DepthGuard(());

impl DepthGuard {
    pub(crate) fn enter() -> Result<DepthGuard, Error> {
        DEPTH.with(|depth| {
            let current = depth.get();
            if current >= MAX_EVAL_DEPTH {
                return Err(Error::eval(format!(
                    "evaluation depth limit exceeded (max: {MAX_EVAL_DEPTH})"
                )));
            }
            depth.set(current + 1);
            Ok(DepthGuard(()))
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Keeps message formatting out of the recursive frames
#[cold]
#[inline(never)]
fn malformed(message: &str, expr: &Value) -> Error {
    Error::syntax(format!("{message}: {expr}"))
}

/// Evaluate an already-expanded core form
pub fn eval(expr: &Value, env: &Environment) -> Result<Value, Error> {
    let _level = DepthGuard::enter()?;
    match expr {
        Value::Symbol(name) => env
            .find(*name)
            .ok_or_else(|| Error::undefined_variable(name)),

        Value::Pair(_) => {
            let Some(elements) = expr.to_vec() else {
                return Err(malformed("cannot evaluate improper form", expr));
            };
            match expr.head_symbol().and_then(Symbol::keyword) {
                Some(keyword) => eval_special_form(keyword, &elements, expr, env),
                None => eval_application(&elements, env),
            }
        }

        // Everything else, `()` included, evaluates to itself
        _ => Ok(expr.clone()),
    }
}

fn eval_special_form(
    keyword: Keyword,
    elements: &[Value],
    expr: &Value,
    env: &Environment,
) -> Result<Value, Error> {
    let args = &elements[1..];
    match keyword {
        Keyword::Quote => match args {
            [datum] => Ok(datum.clone()),
            _ => Err(malformed("quote requires exactly one argument", expr)),
        },
        Keyword::If => eval_if(args, expr, env),
        Keyword::Define => match args {
            [Value::Symbol(name), value_expr] => {
                let name = bindable(*name, expr)?;
                let value = eval(value_expr, env)?;
                env.define(name, value);
                Ok(Value::Nil)
            }
            _ => Err(malformed("malformed define", expr)),
        },
        Keyword::Set => match args {
            [Value::Symbol(name), value_expr] => {
                let name = bindable(*name, expr)?;
                let value = eval(value_expr, env)?;
                env.set(name, value)?;
                Ok(Value::Nil)
            }
            [_, _] => Err(malformed("can only set! a symbol", expr)),
            _ => Err(malformed("set! requires exactly two arguments", expr)),
        },
        Keyword::Lambda => eval_lambda(args, expr, env),
        Keyword::Begin => {
            let mut result = Value::Nil;
            for form in args {
                result = eval(form, env)?;
            }
            Ok(result)
        }
        Keyword::DefineSyntax
        | Keyword::Quasiquote
        | Keyword::Unquote
        | Keyword::UnquoteSplicing => Err(malformed(
            &format!("{keyword} is not allowed here"),
            expr,
        )),
        // Targets of quasiquote lowering; bound as ordinary primitives
        Keyword::Append | Keyword::Cons => eval_application(elements, env),
    }
}

fn eval_if(args: &[Value], expr: &Value, env: &Environment) -> Result<Value, Error> {
    let (test, consequent, alternate) = match args {
        [test, consequent] => (test, consequent, None),
        [test, consequent, alternate] => (test, consequent, Some(alternate)),
        [] | [_] => return Err(malformed("if too few arguments", expr)),
        _ => return Err(malformed("if too many arguments", expr)),
    };

    if eval(test, env)?.is_true() {
        eval(consequent, env)
    } else {
        alternate.map_or(Ok(Value::Nil), |alternate| eval(alternate, env))
    }
}

fn eval_lambda(args: &[Value], expr: &Value, env: &Environment) -> Result<Value, Error> {
    let [spec, body @ ..] = args else {
        return Err(malformed("lambda requires a body", expr));
    };
    let body = match body {
        [] => return Err(malformed("lambda requires a body", expr)),
        [single] => single.clone(),
        several => Value::cons(
            Keyword::Begin.symbol().into(),
            Value::list(several.iter().cloned()),
        ),
    };

    Ok(Value::procedure(Callable::Closure(Closure {
        params: Params::from_value(spec)?,
        body,
        env: env.clone(),
    })))
}

fn eval_application(elements: &[Value], env: &Environment) -> Result<Value, Error> {
    let [operator, operands @ ..] = elements else {
        return Err(Error::syntax("cannot evaluate empty application"));
    };

    let procedure = eval(operator, env)?;
    let args = operands
        .iter()
        .map(|operand| eval(operand, env))
        .collect::<Result<Vec<_>, _>>()?;

    apply(&procedure, args)
}

/// Call a procedure value with already-evaluated arguments
pub fn apply(procedure: &Value, args: Vec<Value>) -> Result<Value, Error> {
    match procedure.as_callable() {
        Some(callable) => apply_callable(callable, args),
        None => Err(Error::not_applicable(format!("{procedure} is not applicable"))),
    }
}

pub fn apply_callable(callable: &Callable, args: Vec<Value>) -> Result<Value, Error> {
    match callable {
        Callable::Primitive(primitive) => {
            if !primitive.arity.accepts(args.len()) {
                return Err(Error::arity_error_with_expr(
                    primitive.arity,
                    args.len(),
                    &primitive.name,
                ));
            }
            (primitive.func)(args)
        }
        Callable::Closure(closure) => {
            let frame = Environment::with_parent(&closure.env);
            match &closure.params {
                Params::Fixed(names) => {
                    if names.len() != args.len() {
                        return Err(Error::arity_error_with_expr(
                            names.len(),
                            args.len(),
                            "#<function>",
                        ));
                    }
                    for (name, arg) in names.iter().zip(args) {
                        frame.define(*name, arg);
                    }
                }
                Params::Variadic(name) => frame.define(*name, Value::list(args)),
            }
            log::trace!("calling closure with body {}", closure.body);
            eval(&closure.body, &frame)
        }
    }
}

/// Create a global environment with every builtin procedure bound
pub fn create_global_env() -> Environment {
    let env = Environment::new();

    for builtin_op in get_builtin_ops() {
        let func: Rc<PrimitiveFn> = Rc::new(builtin_op.func);
        env.define(
            Symbol::intern(builtin_op.scheme_id),
            Value::procedure(Callable::Primitive(Primitive {
                name: builtin_op.scheme_id.to_owned(),
                arity: builtin_op.arity,
                func,
            })),
        );
    }

    env
}
