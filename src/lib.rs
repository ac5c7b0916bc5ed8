//! Schemelet - a small Scheme interpreter
//!
//! This crate reads, expands and evaluates a compact Scheme dialect. Source text
//! flows through a pull-based pipeline, one top-level form at a time:
//!
//! ```text
//! text -> Tokenizer -> Reader -> Expander -> Evaluator -> Value -> stringify
//! ```
//!
//! ```scheme
//! (define (square x) (* x x))      ; sugared define, lowered to lambda
//! (if #f 1)                        ; missing alternate becomes ()
//! `(1 ,(square 3) ,@(list 4 5))    ; quasiquote lowered to cons/append
//! (define-syntax swap!             ; non-hygienic procedural macros
//!   (lambda (a b) `(let ((tmp ,a)) (set! ,a ,b) (set! ,b tmp))))
//! ```
//!
//! ## Numeric literals
//!
//! Integers are exact 64-bit values and accept any combination of the `#b`,
//! `#o`, `#d`, `#x`, `#e` and `#i` prefixes. Floats use decimal/exponential
//! syntax. Rationals such as `1/3` are converted to the nearest float when read,
//! and complex literals are kept as a pair of floats (`3+4i`, `-i`, `1@2`).
//!
//! ## Known limitations
//!
//! - Macros are not hygienic: identifiers introduced by a macro are not renamed.
//! - The `a@b` complex form is read rectangularly, not as magnitude/angle.
//! - String escapes are only partially decoded and never re-escaped on output.
//! - There are no tail-call guarantees; runaway recursion exhausts the stack.
//!
//! ## Modules
//!
//! - `scheme`: tokenizer, numeric literals and the s-expression reader
//! - `ast`: runtime values and shared cons cells
//! - `expander`: derived-form lowering, quasiquote and `define-syntax`
//! - `evaluator`: environments and the tree-walking evaluator
//! - `builtinops`: primitive procedures bound in the global environment
//! - `printer`: canonical external representation
//! - `interpreter`: the `interpret` entry point tying the pipeline together

use std::fmt;

/// Maximum reader nesting depth to prevent stack overflow on hostile input.
/// Can be lowered per reader through [`scheme::ParseConfig`].
pub const MAX_PARSE_DEPTH: usize = 128;

/// Maximum nesting of evaluation and expansion on one thread.
/// Set higher than parse depth to allow for nested procedure calls.
pub const MAX_EVAL_DEPTH: usize = 256;

/// Categorizes every failure the interpreter can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed token text or input that ended in the middle of a form
    Lex,
    /// Structural violation of a special form's shape
    Syntax,
    /// Literal text the numeric decoder cannot parse
    InvalidNumber,
    /// Numeric literal outside the representable range
    NumberRange,
    /// Recognized but intentionally unimplemented literal feature
    Unsupported,
    /// A value used where a different kind of value is required
    BadType,
    /// Attempt to call something that is not a procedure
    NotApplicable,
    /// Lookup or assignment of an unbound symbol
    UndefinedVariable,
    /// Procedure called with the wrong number of arguments
    ArityMismatch,
    /// Runtime fault raised by a builtin (division by zero, `error`, ...)
    Eval,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::Lex => "LexError",
            ErrorKind::Syntax => "SyntaxError",
            ErrorKind::InvalidNumber => "InvalidNumber",
            ErrorKind::NumberRange => "NumberRange",
            ErrorKind::Unsupported => "Unsupported",
            ErrorKind::BadType => "BadType",
            ErrorKind::NotApplicable => "NotApplicable",
            ErrorKind::UndefinedVariable => "UndefinedVariable",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::Eval => "EvaluationError",
        }
    }
}

/// Error type for the interpreter: a kind plus a human readable message.
///
/// Messages include the printed form of the offending expression where one
/// is available.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    /// Set for lex errors caused by input ending before a form was complete
    incomplete: bool,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            incomplete: false,
        }
    }

    pub fn lex(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lex, message)
    }

    /// Lex error for input that ended before the current form was closed.
    /// Hosts use [`Error::is_incomplete`] to decide to read another line.
    pub fn unexpected_eof(what: impl fmt::Display) -> Self {
        Error {
            kind: ErrorKind::Lex,
            message: format!("unexpected end of input {what}"),
            incomplete: true,
        }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Syntax, message)
    }

    pub fn invalid_number(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidNumber, message)
    }

    pub fn number_range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NumberRange, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    pub fn bad_type(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadType, message)
    }

    pub fn not_applicable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotApplicable, message)
    }

    pub fn undefined_variable(name: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("undefined variable: {name}"),
        )
    }

    pub fn eval(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Eval, message)
    }

    /// Create an ArityMismatch error without expression context
    pub fn arity_error(expected: impl fmt::Display, got: usize) -> Self {
        Self::new(
            ErrorKind::ArityMismatch,
            format!("expected {expected} arguments, got {got}"),
        )
    }

    /// Create an ArityMismatch error naming the procedure or expression
    pub fn arity_error_with_expr(
        expected: impl fmt::Display,
        got: usize,
        expression: impl fmt::Display,
    ) -> Self {
        Self::new(
            ErrorKind::ArityMismatch,
            format!("{expression}: expected {expected} arguments, got {got}"),
        )
    }

    /// True when more input could complete the form that failed to read
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
pub mod expander;
pub mod interpreter;
pub mod printer;
pub mod scheme;
pub mod symbol;

pub use ast::Value;
pub use interpreter::{Interpreter, InterpreterConfig, interpret};
pub use printer::stringify;
