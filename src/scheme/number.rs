//! Numeric literal grammar.
//!
//! The same `nom` recognizers serve two callers: the tokenizer uses
//! [`classify`] to decide which kind of numeric token a piece of text is, and
//! the reader uses the `decode_*` functions to turn the token text into a
//! value. Decoding reports overflow (`NumberRange`) separately from malformed
//! text (`InvalidNumber`).

use std::num::IntErrorKind;

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{all_consuming, opt, recognize, value},
    multi::many0,
};

use crate::Error;
use crate::ast::{Complex, NumberType};

/// Which numeric token a piece of text forms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberKind {
    Integer,
    Rational,
    Float,
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exactness {
    Exact,
    Inexact,
}

/// Accumulated `#b #o #d #x #e #i` prefixes; the last radix mark wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Prefix {
    radix: u32,
    exactness: Option<Exactness>,
}

#[derive(Debug, Clone, Copy)]
enum PrefixMark {
    Radix(u32),
    Exactness(Exactness),
}

#[derive(Debug, Clone, Copy)]
struct IntegerParts<'a> {
    prefix: Prefix,
    negative: bool,
    digits: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct FloatParts<'a> {
    prefix: Prefix,
    /// Signed body without prefixes, e.g. `-1.5e3` or `+inf.0`
    body: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct RationalParts<'a> {
    numerator: IntegerParts<'a>,
    denominator: &'a str,
}

#[derive(Debug, Clone, Copy)]
enum ComplexParts<'a> {
    /// `<real>@<real>`, combined component-wise
    AtSign { left: &'a str, right: &'a str },
    /// `[<real>](+|-)[<ureal>]i`
    Rectangular {
        real: Option<&'a str>,
        negative: bool,
        imaginary: Option<&'a str>,
    },
}

fn prefix_mark(input: &str) -> IResult<&str, PrefixMark> {
    let (input, _) = char('#').parse(input)?;
    alt((
        value(PrefixMark::Radix(2), one_of("bB")),
        value(PrefixMark::Radix(8), one_of("oO")),
        value(PrefixMark::Radix(10), one_of("dD")),
        value(PrefixMark::Radix(16), one_of("xX")),
        value(PrefixMark::Exactness(Exactness::Exact), one_of("eE")),
        value(PrefixMark::Exactness(Exactness::Inexact), one_of("iI")),
    ))
    .parse(input)
}

/// Parse any number of prefixes, in any order
fn prefix(input: &str) -> IResult<&str, Prefix> {
    let (input, marks) = many0(prefix_mark).parse(input)?;

    let mut prefix = Prefix {
        radix: 10,
        exactness: None,
    };
    for mark in marks {
        match mark {
            PrefixMark::Radix(radix) => prefix.radix = radix,
            PrefixMark::Exactness(exactness) => prefix.exactness = Some(exactness),
        }
    }
    Ok((input, prefix))
}

fn sign_char(input: &str) -> IResult<&str, char> {
    one_of("+-").parse(input)
}

fn radix_digits(input: &str, radix: u32) -> IResult<&str, &str> {
    take_while1(move |c: char| c.is_digit(radix)).parse(input)
}

fn integer_parts(input: &str) -> IResult<&str, IntegerParts<'_>> {
    let (input, prefix) = prefix(input)?;
    let (input, sign) = opt(sign_char).parse(input)?;
    let (input, digits) = radix_digits(input, prefix.radix)?;
    Ok((
        input,
        IntegerParts {
            prefix,
            negative: sign == Some('-'),
            digits,
        },
    ))
}

fn rational_parts(input: &str) -> IResult<&str, RationalParts<'_>> {
    let (input, numerator) = integer_parts(input)?;
    let (input, _) = char('/').parse(input)?;
    // The denominator is read in the numerator's radix
    let (input, denominator) = radix_digits(input, numerator.prefix.radix)?;
    Ok((
        input,
        RationalParts {
            numerator,
            denominator,
        },
    ))
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize((one_of("eE"), opt(sign_char), digit1)).parse(input)
}

/// Unsigned decimal that is unambiguously a float: has a point or an exponent
fn unsigned_decimal(input: &str) -> IResult<&str, &str> {
    alt((
        recognize((digit1, char('.'), opt(digit1), opt(exponent))),
        recognize((char('.'), digit1, opt(exponent))),
        recognize((digit1, exponent)),
    ))
    .parse(input)
}

fn special_float(input: &str) -> IResult<&str, &str> {
    recognize((sign_char, alt((tag("inf.0"), tag("nan.0"))))).parse(input)
}

fn float_parts(input: &str) -> IResult<&str, FloatParts<'_>> {
    let (input, prefix) = prefix(input)?;
    let (input, body) = alt((
        special_float,
        recognize((opt(sign_char), unsigned_decimal)),
    ))
    .parse(input)?;
    Ok((input, FloatParts { prefix, body }))
}

/// Unsigned real component of a complex literal
fn ureal(input: &str) -> IResult<&str, &str> {
    alt((unsigned_decimal, digit1)).parse(input)
}

fn real(input: &str) -> IResult<&str, &str> {
    recognize((opt(sign_char), ureal)).parse(input)
}

fn at_sign_complex(input: &str) -> IResult<&str, ComplexParts<'_>> {
    let (input, (left, _, right)) = (real, char('@'), real).parse(input)?;
    Ok((input, ComplexParts::AtSign { left, right }))
}

fn rectangular_complex(input: &str) -> IResult<&str, ComplexParts<'_>> {
    let (input, (re, sign, imaginary, _)) =
        (real, sign_char, opt(ureal), one_of("iI")).parse(input)?;
    Ok((
        input,
        ComplexParts::Rectangular {
            real: Some(re),
            negative: sign == '-',
            imaginary,
        },
    ))
}

fn imaginary_complex(input: &str) -> IResult<&str, ComplexParts<'_>> {
    let (input, (sign, imaginary, _)) = (sign_char, opt(ureal), one_of("iI")).parse(input)?;
    Ok((
        input,
        ComplexParts::Rectangular {
            real: None,
            negative: sign == '-',
            imaginary,
        },
    ))
}

fn complex_parts(input: &str) -> IResult<&str, ComplexParts<'_>> {
    alt((at_sign_complex, rectangular_complex, imaginary_complex)).parse(input)
}

/// Run `parser` over the whole of `text`
fn parse_complete<'a, O, P>(parser: P, text: &'a str) -> Option<O>
where
    P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    all_consuming(parser)
        .parse(text)
        .ok()
        .map(|(_, output)| output)
}

/// Decide which numeric token `text` is, if any. Integers win over the other
/// shapes; floats must be decimal.
pub(crate) fn classify(text: &str) -> Option<NumberKind> {
    if parse_complete(integer_parts, text).is_some() {
        Some(NumberKind::Integer)
    } else if parse_complete(rational_parts, text).is_some() {
        Some(NumberKind::Rational)
    } else if parse_complete(float_parts, text).is_some_and(|parts| parts.prefix.radix == 10) {
        Some(NumberKind::Float)
    } else if parse_complete(complex_parts, text).is_some() {
        Some(NumberKind::Complex)
    } else {
        None
    }
}

fn malformed(kind: &str, text: &str) -> Error {
    Error::invalid_number(format!("invalid {kind} literal: {text}"))
}

fn integer_value(parts: &IntegerParts<'_>, text: &str) -> Result<NumberType, Error> {
    let signed;
    let digits = if parts.negative {
        signed = format!("-{}", parts.digits);
        signed.as_str()
    } else {
        parts.digits
    };

    NumberType::from_str_radix(digits, parts.prefix.radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            Error::number_range(format!("number out of range: {text}"))
        }
        _ => malformed("integer", text),
    })
}

fn float_value(body: &str, text: &str) -> Result<f64, Error> {
    let value = match body {
        "+inf.0" => f64::INFINITY,
        "-inf.0" => f64::NEG_INFINITY,
        "+nan.0" | "-nan.0" => f64::NAN,
        _ => body.parse::<f64>().map_err(|_| malformed("float", text))?,
    };

    if value.is_infinite() && !body.ends_with("inf.0") {
        return Err(Error::number_range(format!("number out of range: {text}")));
    }
    Ok(value)
}

/// Decode an integer literal: prefixes, optional sign, digits in the radix.
/// Exactness prefixes are accepted and ignored.
pub(crate) fn decode_integer(text: &str) -> Result<NumberType, Error> {
    let parts = parse_complete(integer_parts, text).ok_or_else(|| malformed("integer", text))?;
    integer_value(&parts, text)
}

/// Decode a float literal. Exactness prefixes are rejected as unsupported.
pub(crate) fn decode_float(text: &str) -> Result<f64, Error> {
    let parts = parse_complete(float_parts, text).ok_or_else(|| malformed("float", text))?;

    if parts.prefix.exactness.is_some() {
        return Err(Error::unsupported(format!(
            "exactness prefix on a float literal is not supported: {text}"
        )));
    }
    if parts.prefix.radix != 10 {
        return Err(malformed("float", text));
    }
    float_value(parts.body, text)
}

/// Decode `<int>/<int>` into the floating point quotient of the two halves
pub(crate) fn decode_rational(text: &str) -> Result<f64, Error> {
    if !text.contains('/') {
        return Err(Error::syntax(format!(
            "rational literal requires a '/': {text}"
        )));
    }

    let parts = parse_complete(rational_parts, text).ok_or_else(|| malformed("rational", text))?;
    let numerator = integer_value(&parts.numerator, text)?;
    let denominator = integer_value(
        &IntegerParts {
            prefix: parts.numerator.prefix,
            negative: false,
            digits: parts.denominator,
        },
        text,
    )?;
    Ok(numerator as f64 / denominator as f64)
}

/// Decode a complex literal. `a@b` is read as the rectangular pair (a, b).
pub(crate) fn decode_complex(text: &str) -> Result<Complex, Error> {
    match parse_complete(complex_parts, text).ok_or_else(|| malformed("complex", text))? {
        ComplexParts::AtSign { left, right } => Ok(Complex::new(
            float_value(left, text)?,
            float_value(right, text)?,
        )),
        ComplexParts::Rectangular {
            real,
            negative,
            imaginary,
        } => {
            let re = match real {
                Some(body) => float_value(body, text)?,
                None => 0.0,
            };
            let magnitude = match imaginary {
                Some(body) => float_value(body, text)?,
                None => 1.0,
            };
            Ok(Complex::new(re, if negative { -magnitude } else { magnitude }))
        }
    }
}
