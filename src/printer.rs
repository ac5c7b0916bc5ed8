//! Canonical external representation of values.
//!
//! Printing is total and has no side effects. Lists print their elements
//! separated by single spaces, strings print between double quotes without
//! escaping, and floats always keep a decimal point so they read back as
//! floats.

use std::fmt;

use crate::ast::{Callable, Complex, Value};

fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("+nan.0")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "+inf.0" } else { "-inf.0" })
    } else {
        // Debug keeps the trailing ".0" on integral floats
        write!(f, "{x:?}")
    }
}

/// Shortest rendering for finite components (`3`, `1.5`), the float names
/// otherwise
fn write_component(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_finite() {
        write!(f, "{x}")
    } else {
        write_float(f, x)
    }
}

fn write_complex(f: &mut fmt::Formatter<'_>, c: &Complex) -> fmt::Result {
    write_component(f, c.re)?;
    // Non-finite names carry their own sign
    if c.im.is_finite() && !c.im.is_sign_negative() {
        f.write_str("+")?;
    }
    write_component(f, c.im)?;
    f.write_str("i")
}

fn write_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        ' ' => f.write_str("#\\space"),
        '\n' => f.write_str("#\\newline"),
        '\t' => f.write_str("#\\tab"),
        _ => write!(f, "#\\{c}"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("()"),
            Value::Bool(true) => f.write_str("#t"),
            Value::Bool(false) => f.write_str("#f"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Float(x) => write_float(f, *x),
            Value::Complex(c) => write_complex(f, c),
            Value::String(s) => write!(f, "\"{s}\""),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Char(c) => write_char(f, *c),
            Value::Pair(_) => {
                f.write_str("(")?;
                let mut items = self.iter();
                for (i, item) in items.by_ref().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                let tail = items.tail();
                if !tail.is_nil() {
                    write!(f, " . {tail}")?;
                }
                f.write_str(")")
            }
            Value::Vector(items) => {
                f.write_str("#(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
            Value::Procedure(callable) => match callable.as_ref() {
                Callable::Primitive(p) => write!(f, "#<builtin-function:{}>", p.name),
                Callable::Closure(_) => f.write_str("#<function>"),
            },
        }
    }
}

/// Render a value in its canonical text form
pub fn stringify(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};

    #[test]
    fn test_stringify_data_driven() {
        let test_cases = vec![
            (nil(), "()"),
            (val(true), "#t"),
            (val(false), "#f"),
            (val(-42), "-42"),
            (val(2.0), "2.0"),
            (val(0.5), "0.5"),
            (val(1.0 / 3.0), "0.3333333333333333"),
            (val(f64::INFINITY), "+inf.0"),
            (val(f64::NEG_INFINITY), "-inf.0"),
            (val(f64::NAN), "+nan.0"),
            (val(Complex::new(3.0, 4.0)), "3+4i"),
            (val(Complex::new(3.0, -1.0)), "3-1i"),
            (val(Complex::new(1.5, 0.5)), "1.5+0.5i"),
            (val(Complex::new(0.0, -2.5)), "0-2.5i"),
            (val(Complex::new(f64::NAN, f64::NAN)), "+nan.0+nan.0i"),
            (val(Complex::new(1.0, f64::INFINITY)), "1+inf.0i"),
            (val(Complex::new(f64::NEG_INFINITY, -2.0)), "-inf.0-2i"),
            (val(Complex::new(0.5, f64::NEG_INFINITY)), "0.5-inf.0i"),
            (val("say \"hi\""), "\"say \"hi\"\""),
            (sym("set!"), "set!"),
            (val('a'), "#\\a"),
            (val(' '), "#\\space"),
            (val('\n'), "#\\newline"),
            (val('\t'), "#\\tab"),
            (val([1, 2, 3]), "(1 2 3)"),
            (val(vec![sym("quote"), sym("x")]), "(quote x)"),
            (val([val([1]), nil(), val([2, 3])]), "((1) () (2 3))"),
            (Value::cons(val(1), val(2)), "(1 . 2)"),
            (
                Value::list_with_tail([val(1), val(2)], sym("rest")),
                "(1 2 . rest)",
            ),
            (Value::vector(vec![val(1), val("a"), nil()]), "#(1 \"a\" ())"),
            (Value::vector(vec![]), "#()"),
        ];

        for (value, expected) in test_cases {
            assert_eq!(stringify(&value), expected, "stringify({value:?})");
        }
    }

    #[test]
    fn test_long_list_prints_flat() {
        let long = Value::list((0..10_000).map(Value::Integer));
        let text = stringify(&long);
        assert!(text.starts_with("(0 1 2 "));
        assert!(text.ends_with(" 9998 9999)"));
    }
}
