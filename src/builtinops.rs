//! Built-in procedure registry.
//!
//! Every global environment starts with the primitives listed here. Each entry
//! pairs a Scheme identifier with an [`Arity`] and a host function taking
//! ownership of its evaluated arguments:
//!
//! ```scheme
//! (+ 1 2.5)               ; => 3.5, integers widen to floats
//! (* 2 3+4i)              ; => 6+8i
//! (/ 6 4)                 ; => 1.5, exact only when evenly divisible
//! (map + '(1 2) '(10 20)) ; => (11 22)
//! ```
//!
//! ## Functions vs Special Forms
//!
//! Everything in this registry is an ordinary procedure: its arguments are
//! evaluated before the call. Special forms (`if`, `define`, `lambda`, ...) are
//! handled structurally by the expander and the evaluator and never appear here.
//!
//! ## Numeric tower
//!
//! Arithmetic is exact on 64-bit integers and reports overflow instead of
//! wrapping. Mixing in a float makes the result a float, and mixing in a complex
//! value makes it complex. `/` stays exact when the division is exact.
//!
//! ## Error Handling
//!
//! - **Arity** is validated by the caller before the host function runs
//! - **Type errors** (`(+ 1 "a")`, `(car 5)`) are `BadType`
//! - **Runtime faults** (division by zero, overflow, `(car '())`) are `Eval`
//!
//! ## Adding New Operations
//!
//! 1. Implement `fn(Vec<Value>) -> Result<Value, Error>`; arguments may be
//!    indexed freely up to the declared arity
//! 2. Add it to `BUILTIN_OPS` with its Scheme identifier and arity
//! 3. Add tests covering edge cases and error conditions

use std::cmp::Ordering;
use std::io::Write;
use std::rc::Rc;
use std::sync::LazyLock;

use crate::Error;
use crate::ast::{Complex, NumberType, Value};
use crate::evaluator::{Arity, apply};

/// Host function signature shared by all registry entries
pub type BuiltinFn = fn(Vec<Value>) -> Result<Value, Error>;

/// Definition of a built-in procedure
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The Scheme identifier this procedure is bound to
    pub scheme_id: &'static str,
    /// Expected number of arguments
    pub arity: Arity,
    /// The implementation
    pub func: BuiltinFn,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Identifiers are unique within the registry
        self.scheme_id == other.scheme_id
    }
}

//
// Argument helpers
//

fn type_error(op: &str, expected: &str, got: &Value) -> Error {
    Error::bad_type(format!("{op}: expected {expected}, got {got}"))
}

fn overflow(op: &str) -> Error {
    Error::eval(format!("{op}: integer overflow"))
}

fn division_by_zero(op: &str) -> Error {
    Error::eval(format!("{op}: division by zero"))
}

fn integer_arg(op: &str, value: &Value) -> Result<NumberType, Error> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(type_error(op, "integer", other)),
    }
}

fn string_arg<'a>(op: &str, value: &'a Value) -> Result<&'a str, Error> {
    match value {
        Value::String(s) => Ok(&**s),
        other => Err(type_error(op, "string", other)),
    }
}

fn list_arg(op: &str, value: &Value) -> Result<Vec<Value>, Error> {
    value
        .to_vec()
        .ok_or_else(|| type_error(op, "proper list", value))
}

/// Text written by `display` and used in `error` messages: strings and
/// characters appear raw, everything else in printed form
fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        Value::Char(c) => c.to_string(),
        other => other.to_string(),
    }
}

//
// Numeric tower
//

#[derive(Debug, Clone, Copy)]
enum Number {
    Integer(NumberType),
    Float(f64),
    Complex(Complex),
}

impl Number {
    fn from_value(op: &str, value: &Value) -> Result<Number, Error> {
        match value {
            Value::Integer(n) => Ok(Number::Integer(*n)),
            Value::Float(x) => Ok(Number::Float(*x)),
            Value::Complex(c) => Ok(Number::Complex(*c)),
            other => Err(type_error(op, "number", other)),
        }
    }

    /// Like `from_value` but rejects complex numbers, for ordering operations
    fn real_from_value(op: &str, value: &Value) -> Result<Number, Error> {
        match Number::from_value(op, value)? {
            Number::Complex(_) => Err(type_error(op, "real number", value)),
            real => Ok(real),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Float(x) => x,
            Number::Complex(c) => c.re,
        }
    }

    fn to_complex(self) -> Complex {
        match self {
            Number::Complex(c) => c,
            real => Complex::from(real.to_f64()),
        }
    }

    fn is_exact(self) -> bool {
        matches!(self, Number::Integer(_))
    }

    fn into_value(self) -> Value {
        match self {
            Number::Integer(n) => Value::Integer(n),
            Number::Float(x) => Value::Float(x),
            Number::Complex(c) => Value::Complex(c),
        }
    }

    /// Combine two numbers, widening to the more general representation
    fn combine(
        self,
        other: Number,
        op: &str,
        on_integer: fn(NumberType, NumberType) -> Option<NumberType>,
        on_float: fn(f64, f64) -> f64,
        on_complex: fn(Complex, Complex) -> Complex,
    ) -> Result<Number, Error> {
        Ok(match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => {
                Number::Integer(on_integer(a, b).ok_or_else(|| overflow(op))?)
            }
            (Number::Complex(_), _) | (_, Number::Complex(_)) => {
                Number::Complex(on_complex(self.to_complex(), other.to_complex()))
            }
            _ => Number::Float(on_float(self.to_f64(), other.to_f64())),
        })
    }

    fn plus(self, other: Number) -> Result<Number, Error> {
        self.combine(other, "+", NumberType::checked_add, |a, b| a + b, |a, b| a + b)
    }

    fn minus(self, other: Number) -> Result<Number, Error> {
        self.combine(other, "-", NumberType::checked_sub, |a, b| a - b, |a, b| a - b)
    }

    fn times(self, other: Number) -> Result<Number, Error> {
        self.combine(other, "*", NumberType::checked_mul, |a, b| a * b, |a, b| a * b)
    }

    /// Exact when both operands are integers and the division leaves no
    /// remainder; a float otherwise
    fn divided_by(self, other: Number) -> Result<Number, Error> {
        match (self, other) {
            (Number::Integer(_), Number::Integer(0)) => Err(division_by_zero("/")),
            (Number::Integer(a), Number::Integer(b)) => match a.checked_rem(b) {
                Some(0) => a.checked_div(b).map(Number::Integer).ok_or_else(|| overflow("/")),
                Some(_) => Ok(Number::Float(a as f64 / b as f64)),
                None => Err(overflow("/")),
            },
            _ => self.combine(other, "/", NumberType::checked_div, |a, b| a / b, |a, b| a / b),
        }
    }

    fn numeric_eq(self, other: Number) -> bool {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => a == b,
            (Number::Complex(_), _) | (_, Number::Complex(_)) => {
                self.to_complex() == other.to_complex()
            }
            _ => self.to_f64() == other.to_f64(),
        }
    }

    /// Ordering of two reals; `None` when a NaN is involved
    fn compare(self, other: Number) -> Option<Ordering> {
        match (self, other) {
            (Number::Integer(a), Number::Integer(b)) => Some(a.cmp(&b)),
            _ => self.to_f64().partial_cmp(&other.to_f64()),
        }
    }
}

fn numbers(op: &str, args: &[Value]) -> Result<Vec<Number>, Error> {
    args.iter().map(|arg| Number::from_value(op, arg)).collect()
}

fn reals(op: &str, args: &[Value]) -> Result<Vec<Number>, Error> {
    args.iter().map(|arg| Number::real_from_value(op, arg)).collect()
}

//
// Builtin Function Implementations
//

fn builtin_add(args: Vec<Value>) -> Result<Value, Error> {
    numbers("+", &args)?
        .into_iter()
        .try_fold(Number::Integer(0), Number::plus)
        .map(Number::into_value)
}

fn builtin_mul(args: Vec<Value>) -> Result<Value, Error> {
    numbers("*", &args)?
        .into_iter()
        .try_fold(Number::Integer(1), Number::times)
        .map(Number::into_value)
}

fn builtin_sub(args: Vec<Value>) -> Result<Value, Error> {
    match numbers("-", &args)?.as_slice() {
        [only] => Number::Integer(0).minus(*only).map(Number::into_value),
        [first, rest @ ..] => rest
            .iter()
            .try_fold(*first, |acc, n| acc.minus(*n))
            .map(Number::into_value),
        [] => Err(Error::arity_error(Arity::AtLeast(1), 0)),
    }
}

fn builtin_div(args: Vec<Value>) -> Result<Value, Error> {
    match numbers("/", &args)?.as_slice() {
        [only] => Number::Integer(1).divided_by(*only).map(Number::into_value),
        [first, rest @ ..] => rest
            .iter()
            .try_fold(*first, |acc, n| acc.divided_by(*n))
            .map(Number::into_value),
        [] => Err(Error::arity_error(Arity::AtLeast(1), 0)),
    }
}

fn builtin_numeric_equals(args: Vec<Value>) -> Result<Value, Error> {
    let numbers = numbers("=", &args)?;
    Ok(Value::Bool(
        numbers.windows(2).all(|pair| pair[0].numeric_eq(pair[1])),
    ))
}

// Macro to generate chained numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op_str:expr, $accept:pat) => {
        fn $name(args: Vec<Value>) -> Result<Value, Error> {
            let reals = reals($op_str, &args)?;
            Ok(Value::Bool(
                reals
                    .windows(2)
                    .all(|pair| matches!(pair[0].compare(pair[1]), $accept)),
            ))
        }
    };
}

numeric_comparison!(builtin_lt, "<", Some(Ordering::Less));
numeric_comparison!(builtin_gt, ">", Some(Ordering::Greater));
numeric_comparison!(builtin_le, "<=", Some(Ordering::Less | Ordering::Equal));
numeric_comparison!(builtin_ge, ">=", Some(Ordering::Greater | Ordering::Equal));

// Macro to generate min/max; any inexact argument makes the result inexact
macro_rules! numeric_extremum {
    ($name:ident, $op_str:expr, $replace_when:pat) => {
        fn $name(args: Vec<Value>) -> Result<Value, Error> {
            let reals = reals($op_str, &args)?;
            let exact = reals.iter().all(|n| n.is_exact());
            let Some((first, rest)) = reals.split_first() else {
                return Err(Error::arity_error(Arity::AtLeast(1), 0));
            };
            let best = rest.iter().fold(*first, |best, n| {
                if matches!(n.compare(best), $replace_when) {
                    *n
                } else {
                    best
                }
            });
            Ok(if exact {
                best.into_value()
            } else {
                Value::Float(best.to_f64())
            })
        }
    };
}

numeric_extremum!(builtin_min, "min", Some(Ordering::Less));
numeric_extremum!(builtin_max, "max", Some(Ordering::Greater));

fn integer_division(
    op: &str,
    args: &[Value],
    divide: fn(NumberType, NumberType) -> Option<NumberType>,
) -> Result<Value, Error> {
    let dividend = integer_arg(op, &args[0])?;
    let divisor = integer_arg(op, &args[1])?;
    if divisor == 0 {
        return Err(division_by_zero(op));
    }
    divide(dividend, divisor)
        .map(Value::Integer)
        .ok_or_else(|| overflow(op))
}

fn builtin_quotient(args: Vec<Value>) -> Result<Value, Error> {
    integer_division("quotient", &args, NumberType::checked_div)
}

fn builtin_remainder(args: Vec<Value>) -> Result<Value, Error> {
    // The only overflowing case, MIN rem -1, has remainder 0
    integer_division("remainder", &args, |a, b| Some(a.checked_rem(b).unwrap_or(0)))
}

fn builtin_modulo(args: Vec<Value>) -> Result<Value, Error> {
    // Result takes the sign of the divisor
    integer_division("modulo", &args, |a, b| {
        let r = a.checked_rem(b).unwrap_or(0);
        Some(if r != 0 && (r < 0) != (b < 0) { r + b } else { r })
    })
}

fn builtin_abs(args: Vec<Value>) -> Result<Value, Error> {
    match Number::real_from_value("abs", &args[0])? {
        Number::Integer(n) => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or_else(|| overflow("abs")),
        other => Ok(Value::Float(other.to_f64().abs())),
    }
}

fn builtin_exact_to_inexact(args: Vec<Value>) -> Result<Value, Error> {
    match Number::from_value("exact->inexact", &args[0])? {
        Number::Integer(n) => Ok(Value::Float(n as f64)),
        other => Ok(other.into_value()),
    }
}

fn builtin_is_zero(args: Vec<Value>) -> Result<Value, Error> {
    let n = Number::from_value("zero?", &args[0])?;
    Ok(Value::Bool(n.numeric_eq(Number::Integer(0))))
}

// Macro to generate one-argument type predicates
macro_rules! type_predicate {
    ($name:ident, $pattern:pat) => {
        fn $name(args: Vec<Value>) -> Result<Value, Error> {
            Ok(Value::Bool(matches!(&args[0], $pattern)))
        }
    };
}

type_predicate!(
    builtin_is_number,
    Value::Integer(_) | Value::Float(_) | Value::Complex(_)
);
type_predicate!(builtin_is_real, Value::Integer(_) | Value::Float(_));
type_predicate!(builtin_is_boolean, Value::Bool(_));
type_predicate!(builtin_is_symbol, Value::Symbol(_));
type_predicate!(builtin_is_string, Value::String(_));
type_predicate!(builtin_is_char, Value::Char(_));
type_predicate!(builtin_is_vector, Value::Vector(_));
type_predicate!(builtin_is_procedure, Value::Procedure(_));
type_predicate!(builtin_is_null, Value::Nil);
type_predicate!(builtin_is_pair, Value::Pair(_));

fn builtin_is_integer(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Bool(match &args[0] {
        Value::Integer(_) => true,
        Value::Float(x) => x.is_finite() && x.fract() == 0.0,
        _ => false,
    }))
}

fn builtin_is_list(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Bool(args[0].is_list()))
}

//
// Pairs and lists
//

fn builtin_cons(mut args: Vec<Value>) -> Result<Value, Error> {
    let rest = args.pop().unwrap_or_default();
    let first = args.pop().unwrap_or_default();
    Ok(Value::cons(first, rest))
}

fn builtin_car(args: Vec<Value>) -> Result<Value, Error> {
    match &args[0] {
        Value::Pair(pair) => Ok(pair.first.clone()),
        Value::Nil => Err(Error::eval("car: empty list")),
        other => Err(type_error("car", "pair", other)),
    }
}

fn builtin_cdr(args: Vec<Value>) -> Result<Value, Error> {
    match &args[0] {
        Value::Pair(pair) => Ok(pair.rest.clone()),
        Value::Nil => Err(Error::eval("cdr: empty list")),
        other => Err(type_error("cdr", "pair", other)),
    }
}

fn builtin_list(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::list(args))
}

/// Copies every argument but the last, which becomes the shared tail
fn builtin_append(mut args: Vec<Value>) -> Result<Value, Error> {
    let Some(last) = args.pop() else {
        return Ok(Value::Nil);
    };
    args.iter().rev().try_fold(last, |tail, list| {
        Ok(Value::list_with_tail(list_arg("append", list)?, tail))
    })
}

fn builtin_length(args: Vec<Value>) -> Result<Value, Error> {
    let length = list_arg("length", &args[0])?.len();
    NumberType::try_from(length)
        .map(Value::Integer)
        .map_err(|_| overflow("length"))
}

fn builtin_reverse(args: Vec<Value>) -> Result<Value, Error> {
    let items = list_arg("reverse", &args[0])?;
    Ok(Value::list(items.into_iter().rev()))
}

//
// Higher order procedures
//

fn procedure_arg(op: &str, value: Value) -> Result<Value, Error> {
    match value {
        Value::Procedure(_) => Ok(value),
        other => Err(type_error(op, "procedure", &other)),
    }
}

/// `(apply f a b '(c d))` calls `(f a b c d)`
fn builtin_apply(mut args: Vec<Value>) -> Result<Value, Error> {
    let spread = args.pop().unwrap_or_default();
    let mut call_args = args.split_off(1);
    let procedure = procedure_arg("apply", args.pop().unwrap_or_default())?;
    call_args.extend(list_arg("apply", &spread)?);
    apply(&procedure, call_args)
}

/// Argument lists for each call of `map`/`for-each`, stopping at the
/// shortest input list
fn columns(op: &str, lists: &[Value]) -> Result<Vec<Vec<Value>>, Error> {
    let lists = lists
        .iter()
        .map(|list| list_arg(op, list))
        .collect::<Result<Vec<_>, _>>()?;
    let shortest = lists.iter().map(Vec::len).min().unwrap_or(0);
    Ok((0..shortest)
        .map(|i| lists.iter().map(|list| list[i].clone()).collect())
        .collect())
}

fn builtin_map(mut args: Vec<Value>) -> Result<Value, Error> {
    let lists = args.split_off(1);
    let procedure = procedure_arg("map", args.pop().unwrap_or_default())?;
    let results = columns("map", &lists)?
        .into_iter()
        .map(|call_args| apply(&procedure, call_args))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::list(results))
}

fn builtin_for_each(mut args: Vec<Value>) -> Result<Value, Error> {
    let lists = args.split_off(1);
    let procedure = procedure_arg("for-each", args.pop().unwrap_or_default())?;
    for call_args in columns("for-each", &lists)? {
        apply(&procedure, call_args)?;
    }
    Ok(Value::Nil)
}

//
// Equivalence
//

/// Atoms compare by value; pairs, vectors, strings and procedures by identity
fn is_eqv(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Pair(x), Value::Pair(y)) => Rc::ptr_eq(x, y),
        (Value::Vector(x), Value::Vector(y)) => Rc::ptr_eq(x, y),
        (Value::String(x), Value::String(y)) => Rc::ptr_eq(x, y),
        _ => a == b,
    }
}

fn builtin_eqv(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Bool(is_eqv(&args[0], &args[1])))
}

fn builtin_equal(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Bool(args[0] == args[1]))
}

fn builtin_not(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::Bool(!args[0].is_true()))
}

//
// Strings, symbols and vectors
//

fn builtin_string_length(args: Vec<Value>) -> Result<Value, Error> {
    let length = string_arg("string-length", &args[0])?.chars().count();
    NumberType::try_from(length)
        .map(Value::Integer)
        .map_err(|_| overflow("string-length"))
}

fn builtin_string_append(args: Vec<Value>) -> Result<Value, Error> {
    let mut result = String::new();
    for arg in &args {
        result.push_str(string_arg("string-append", arg)?);
    }
    Ok(Value::from(result))
}

fn builtin_symbol_to_string(args: Vec<Value>) -> Result<Value, Error> {
    match &args[0] {
        Value::Symbol(s) => Ok(Value::from(s.name())),
        other => Err(type_error("symbol->string", "symbol", other)),
    }
}

fn builtin_string_to_symbol(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::symbol(string_arg("string->symbol", &args[0])?))
}

fn builtin_vector(args: Vec<Value>) -> Result<Value, Error> {
    Ok(Value::vector(args))
}

fn builtin_vector_ref(args: Vec<Value>) -> Result<Value, Error> {
    let Value::Vector(items) = &args[0] else {
        return Err(type_error("vector-ref", "vector", &args[0]));
    };
    let index = integer_arg("vector-ref", &args[1])?;
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| Error::eval(format!("vector-ref: index {index} out of range")))
}

fn builtin_vector_length(args: Vec<Value>) -> Result<Value, Error> {
    match &args[0] {
        Value::Vector(items) => NumberType::try_from(items.len())
            .map(Value::Integer)
            .map_err(|_| overflow("vector-length")),
        other => Err(type_error("vector-length", "vector", other)),
    }
}

//
// Output and errors
//

fn write_stdout(op: &str, text: &str) -> Result<Value, Error> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| Error::eval(format!("{op}: {e}")))?;
    Ok(Value::Nil)
}

fn builtin_display(args: Vec<Value>) -> Result<Value, Error> {
    write_stdout("display", &display_text(&args[0]))
}

fn builtin_newline(_args: Vec<Value>) -> Result<Value, Error> {
    write_stdout("newline", "\n")
}

/// `(error "msg" irritant ...)` fails with the arguments joined by spaces
fn builtin_error(args: Vec<Value>) -> Result<Value, Error> {
    let message = args.iter().map(display_text).collect::<Vec<_>>().join(" ");
    Err(Error::eval(message))
}

//
// Registry
//

const fn builtin(scheme_id: &'static str, arity: Arity, func: BuiltinFn) -> BuiltinOp {
    BuiltinOp {
        scheme_id,
        arity,
        func,
    }
}

/// Global registry of all built-in procedures, initialized on first use
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    use Arity::*;
    vec![
        // Arithmetic
        builtin("+", Any, builtin_add),
        builtin("-", AtLeast(1), builtin_sub),
        builtin("*", Any, builtin_mul),
        builtin("/", AtLeast(1), builtin_div),
        builtin("quotient", Exact(2), builtin_quotient),
        builtin("remainder", Exact(2), builtin_remainder),
        builtin("modulo", Exact(2), builtin_modulo),
        builtin("abs", Exact(1), builtin_abs),
        builtin("min", AtLeast(1), builtin_min),
        builtin("max", AtLeast(1), builtin_max),
        builtin("exact->inexact", Exact(1), builtin_exact_to_inexact),
        // Numeric comparison
        builtin("=", AtLeast(1), builtin_numeric_equals),
        builtin("<", AtLeast(1), builtin_lt),
        builtin(">", AtLeast(1), builtin_gt),
        builtin("<=", AtLeast(1), builtin_le),
        builtin(">=", AtLeast(1), builtin_ge),
        // Numeric predicates
        builtin("number?", Exact(1), builtin_is_number),
        builtin("complex?", Exact(1), builtin_is_number),
        builtin("real?", Exact(1), builtin_is_real),
        builtin("integer?", Exact(1), builtin_is_integer),
        builtin("zero?", Exact(1), builtin_is_zero),
        // Pairs and lists
        builtin("cons", Exact(2), builtin_cons),
        builtin("car", Exact(1), builtin_car),
        builtin("cdr", Exact(1), builtin_cdr),
        builtin("list", Any, builtin_list),
        builtin("append", Any, builtin_append),
        builtin("length", Exact(1), builtin_length),
        builtin("reverse", Exact(1), builtin_reverse),
        builtin("null?", Exact(1), builtin_is_null),
        builtin("pair?", Exact(1), builtin_is_pair),
        builtin("list?", Exact(1), builtin_is_list),
        // Higher order
        builtin("apply", AtLeast(2), builtin_apply),
        builtin("map", AtLeast(2), builtin_map),
        builtin("for-each", AtLeast(2), builtin_for_each),
        // Equivalence
        builtin("eq?", Exact(2), builtin_eqv),
        builtin("eqv?", Exact(2), builtin_eqv),
        builtin("equal?", Exact(2), builtin_equal),
        builtin("not", Exact(1), builtin_not),
        // Type predicates
        builtin("boolean?", Exact(1), builtin_is_boolean),
        builtin("symbol?", Exact(1), builtin_is_symbol),
        builtin("string?", Exact(1), builtin_is_string),
        builtin("char?", Exact(1), builtin_is_char),
        builtin("vector?", Exact(1), builtin_is_vector),
        builtin("procedure?", Exact(1), builtin_is_procedure),
        // Strings and symbols
        builtin("string-length", Exact(1), builtin_string_length),
        builtin("string-append", Any, builtin_string_append),
        builtin("symbol->string", Exact(1), builtin_symbol_to_string),
        builtin("string->symbol", Exact(1), builtin_string_to_symbol),
        // Vectors
        builtin("vector", Any, builtin_vector),
        builtin("vector-ref", Exact(2), builtin_vector_ref),
        builtin("vector-length", Exact(1), builtin_vector_length),
        // Output
        builtin("display", Exact(1), builtin_display),
        builtin("newline", Exact(0), builtin_newline),
        builtin("error", AtLeast(1), builtin_error),
    ]
});

/// Every registered builtin, in registration order
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}
