//! This module defines the runtime value model shared by the reader, the
//! expander and the evaluator. The main enum, [`Value`], is a closed tagged
//! union over every Scheme datum the interpreter understands. Lists are chains
//! of reference-counted [`Pair`] cells, so sub-lists can be shared between
//! several parents (macro expansion and quasiquote lowering rely on this).
//!
//! Ergonomic helper functions such as [`val`], [`sym`] and [`nil`] are provided
//! for convenient construction in code and tests, and the module implements
//! conversion traits for common Rust types so that `val([1, 2, 3])` builds a
//! proper list. Equality is structural for data and by identity for procedures.

use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use crate::Error;
use crate::evaluator::{Arity, Environment};
use crate::symbol::Symbol;

/// Type alias for exact integers in the interpreter
pub(crate) type NumberType = i64;

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "!$%&*/:<=>?^_~+-.@";

/// Check if a string is a valid symbol name
/// Valid: non-empty, no leading digit, no "+digit"/"-digit"/".digit" prefix,
/// alphanumeric + SYMBOL_SPECIAL_CHARS
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        None => false, // name is empty
        Some(first_char) => {
            if first_char.is_ascii_digit() {
                return false;
            }

            if matches!(first_char, '+' | '-' | '.')
                && let Some(second_char) = chars.next()
                && second_char.is_ascii_digit()
            {
                return false;
            }

            name.chars()
                .all(|c| c.is_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c))
        }
    }
}

/// Complex number stored as two floats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }
}

impl From<f64> for Complex {
    fn from(re: f64) -> Self {
        Complex::new(re, 0.0)
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

impl Div for Complex {
    type Output = Complex;

    fn div(self, rhs: Complex) -> Complex {
        let denominator = rhs.re * rhs.re + rhs.im * rhs.im;
        Complex::new(
            (self.re * rhs.re + self.im * rhs.im) / denominator,
            (self.im * rhs.re - self.re * rhs.im) / denominator,
        )
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        Complex::new(-self.re, -self.im)
    }
}

/// A cons cell. `rest` is another pair, `Nil`, or (for improper lists) any
/// other value.
pub struct Pair {
    pub first: Value,
    pub rest: Value,
}

impl Drop for Pair {
    // Unlink long spines iteratively so dropping a big list cannot overflow
    // the stack.
    fn drop(&mut self) {
        let mut rest = std::mem::replace(&mut self.rest, Value::Nil);
        while let Value::Pair(cell) = rest {
            match Rc::try_unwrap(cell) {
                Ok(mut pair) => rest = std::mem::replace(&mut pair.rest, Value::Nil),
                Err(_) => break,
            }
        }
    }
}

/// Canonical erased signature of host procedures. Builtins receive ownership
/// of their evaluated argument vector.
pub type PrimitiveFn = dyn Fn(Vec<Value>) -> Result<Value, Error>;

/// Builtin procedure implemented in Rust
#[derive(Clone)]
pub struct Primitive {
    pub name: String,
    pub arity: Arity,
    pub func: Rc<PrimitiveFn>,
}

/// Reject syntactic keywords as variable names; they are never looked up
pub(crate) fn bindable(name: Symbol, form: &Value) -> Result<Symbol, Error> {
    match name.keyword() {
        Some(kw) => Err(Error::syntax(format!(
            "cannot bind syntactic keyword {kw}: {form}"
        ))),
        None => Ok(name),
    }
}

/// Parameter specification of a closure
#[derive(Debug, Clone, PartialEq)]
pub enum Params {
    /// `(lambda (a b c) ...)`: exactly this many arguments
    Fixed(Vec<Symbol>),
    /// `(lambda args ...)`: the whole argument list bound to one symbol
    Variadic(Symbol),
}

impl Params {
    /// Parse a lambda parameter spec: a proper list of distinct symbols or a
    /// single symbol
    pub fn from_value(spec: &Value) -> Result<Params, Error> {
        if let Value::Symbol(name) = spec {
            return Ok(Params::Variadic(bindable(*name, spec)?));
        }

        let Some(items) = spec.to_vec() else {
            return Err(Error::syntax(format!("illegal lambda argument list: {spec}")));
        };

        let mut names = Vec::with_capacity(items.len());
        for item in &items {
            match item {
                Value::Symbol(name) => {
                    if names.contains(name) {
                        return Err(Error::syntax(format!(
                            "duplicate parameter name {name} in {spec}"
                        )));
                    }
                    names.push(bindable(*name, spec)?);
                }
                _ => {
                    return Err(Error::syntax(format!(
                        "illegal lambda argument list: {spec}"
                    )));
                }
            }
        }
        Ok(Params::Fixed(names))
    }
}

/// User-defined procedure: parameters, one normalized body expression and the
/// environment that was live when the `lambda` was evaluated.
#[derive(Clone)]
pub struct Closure {
    pub params: Params,
    pub body: Value,
    pub env: Environment,
}

/// Anything that can appear in operator position
#[derive(Clone)]
pub enum Callable {
    Primitive(Primitive),
    Closure(Closure),
}

impl Callable {
    pub fn name(&self) -> Option<&str> {
        match self {
            Callable::Primitive(p) => Some(p.name.as_str()),
            Callable::Closure(_) => None,
        }
    }
}

/// Core value type of the interpreter
///
/// To build values, use the ergonomic helper functions:
/// - `val(42)` for atoms, `sym("name")` for symbols, `nil()` for the empty list
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone, Default)]
pub enum Value {
    /// The empty list; also the value of forms that produce nothing
    #[default]
    Nil,
    Bool(bool),
    Integer(NumberType),
    Float(f64),
    Complex(Complex),
    String(Rc<str>),
    Symbol(Symbol),
    Char(char),
    Pair(Rc<Pair>),
    /// Fixed-length heterogeneous sequence
    Vector(Rc<[Value]>),
    Procedure(Rc<Callable>),
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Integer(n) => write!(f, "Integer({n})"),
            Value::Float(x) => write!(f, "Float({x:?})"),
            Value::Complex(c) => write!(f, "Complex({:?}, {:?})", c.re, c.im),
            Value::String(s) => write!(f, "String(\"{s}\")"),
            Value::Symbol(s) => write!(f, "{s:?}"),
            Value::Char(c) => write!(f, "Char({c:?})"),
            Value::Pair(_) => {
                write!(f, "List(")?;
                let mut iter = self.iter();
                for (i, v) in iter.by_ref().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                if !iter.tail().is_nil() {
                    write!(f, " . {:?}", iter.tail())?;
                }
                write!(f, ")")
            }
            Value::Vector(items) => write!(f, "Vector({items:?})"),
            Value::Procedure(callable) => match callable.as_ref() {
                Callable::Primitive(p) => write!(f, "Primitive({})", p.name),
                Callable::Closure(c) => {
                    write!(f, "Closure(params={:?}, body={:?})", c.params, c.body)
                }
            },
        }
    }
}

/// Iterator over the elements of a list spine. Stops at the first non-pair
/// tail, which stays available through [`ListIter::tail`].
pub struct ListIter<'a> {
    current: &'a Value,
}

impl<'a> ListIter<'a> {
    /// What terminates the spine walked so far (`Nil` for a proper list)
    pub fn tail(&self) -> &'a Value {
        self.current
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self.current {
            Value::Pair(pair) => {
                self.current = &pair.rest;
                Some(&pair.first)
            }
            _ => None,
        }
    }
}

impl Value {
    pub fn cons(first: Value, rest: Value) -> Value {
        Value::Pair(Rc::new(Pair { first, rest }))
    }

    /// Build a proper list from an ordered sequence
    pub fn list<I>(items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        Value::list_with_tail(items, Value::Nil)
    }

    /// Build a list whose final `rest` is `tail` (improper unless `tail` is a list)
    pub fn list_with_tail<I>(items: I, tail: Value) -> Value
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(tail, |rest, first| Value::cons(first, rest))
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::intern(name))
    }

    pub fn string(text: &str) -> Value {
        Value::String(Rc::from(text))
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Rc::from(items))
    }

    pub fn procedure(callable: Callable) -> Value {
        Value::Procedure(Rc::new(callable))
    }

    /// The value the reader returns once its input is exhausted
    pub fn eof() -> Value {
        Value::Symbol(Symbol::eof())
    }

    pub fn iter(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    /// Elements of a proper list, or `None` for atoms and improper lists
    pub fn to_vec(&self) -> Option<Vec<Value>> {
        let mut iter = self.iter();
        let items: Vec<Value> = iter.by_ref().cloned().collect();
        iter.tail().is_nil().then_some(items)
    }

    /// Check if a value represents nil (empty list)
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    /// True for `()` and for pair chains terminated by `()`
    pub fn is_list(&self) -> bool {
        let mut iter = self.iter();
        iter.by_ref().for_each(drop);
        iter.tail().is_nil()
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, Value::Symbol(s) if *s == Symbol::eof())
    }

    /// Everything except `#f` counts as true
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Procedure(callable) => Some(callable),
            _ => None,
        }
    }

    /// Short type description used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "empty list",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Char(_) => "character",
            Value::Pair(_) => "pair",
            Value::Vector(_) => "vector",
            Value::Procedure(_) => "procedure",
        }
    }

    /// Head symbol of a list form, e.g. `if` for `(if a b c)`
    pub(crate) fn head_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Pair(pair) => pair.first.as_symbol(),
            _ => None,
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<Complex> for Value {
    fn from(c: Complex) -> Self {
        Value::Complex(c)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Integer(n as NumberType)
            }
        }
    };
}

// Generate From implementations for all integer types that fit in i64
impl_from_integer!(i8);
impl_from_integer!(i16);
impl_from_integer!(i32);
impl_from_integer!(NumberType); // Special case - no casting
impl_from_integer!(u8);
impl_from_integer!(u16);
impl_from_integer!(u32);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::list(v.into_iter().map(Into::into))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::list(arr.into_iter().map(Into::into))
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(slice: &[T]) -> Self {
        Value::list(slice.iter().cloned().map(Into::into))
    }
}

/// Helper function for creating symbols - works great in mixed lists!
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::symbol(name.as_ref())
}

/// Helper function for creating Values - works great in mixed lists!
/// Accepts any type that can be converted to Value
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil) - follows Lisp/Scheme conventions
pub fn nil() -> Value {
    Value::Nil
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        // Walk list spines iteratively; only `first` slots recurse.
        let (mut left, mut right) = (self, other);
        loop {
            match (left, right) {
                (Value::Pair(a), Value::Pair(b)) => {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if a.first != b.first {
                        return false;
                    }
                    left = &a.rest;
                    right = &b.rest;
                }
                (Value::Nil, Value::Nil) => return true,
                (Value::Bool(a), Value::Bool(b)) => return a == b,
                (Value::Integer(a), Value::Integer(b)) => return a == b,
                (Value::Float(a), Value::Float(b)) => return a == b,
                (Value::Complex(a), Value::Complex(b)) => return a == b,
                (Value::String(a), Value::String(b)) => return a == b,
                (Value::Symbol(a), Value::Symbol(b)) => return a == b,
                (Value::Char(a), Value::Char(b)) => return a == b,
                (Value::Vector(a), Value::Vector(b)) => return a == b,
                // Procedures compare by identity
                (Value::Procedure(a), Value::Procedure(b)) => return Rc::ptr_eq(a, b),
                _ => return false, // Different variants are never equal
            }
        }
    }
}
