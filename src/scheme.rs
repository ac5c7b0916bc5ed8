//! S-expression reader.
//!
//! [`Reader`] pulls tokens from a [`Tokenizer`] one at a time and assembles
//! them into [`Value`] trees: atoms, proper and dotted lists, vectors and the
//! four quote abbreviations. Reading stops as soon as one datum is complete,
//! so an interpreter can evaluate each top-level form before the next one is
//! tokenized.

pub mod lexer;
mod number;

pub use lexer::{Token, Tokenizer};

use crate::Error;
use crate::MAX_PARSE_DEPTH;
use crate::ast::Value;
use crate::symbol::Keyword;

/// Reader settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Discard `;` and `#| |#` comments. When off, a comment is a lex error.
    pub handle_comments: bool,
    /// Deepest nesting of lists, vectors and quote markers accepted
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            handle_comments: true,
            max_depth: MAX_PARSE_DEPTH,
        }
    }
}

/// Decode the escapes `\n \t \r \\ \"`. Any other escape is kept verbatim.
fn decode_string(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('t') => decoded.push('\t'),
            Some('r') => decoded.push('\r'),
            Some('\\') => decoded.push('\\'),
            Some('"') => decoded.push('"'),
            Some(other) => {
                decoded.push('\\');
                decoded.push(other);
            }
            None => decoded.push('\\'),
        }
    }
    decoded
}

/// Builds values from a token stream, one datum per [`Reader::read`]
pub struct Reader<'a> {
    tokens: Tokenizer<'a>,
    max_depth: usize,
    finished: bool,
}

impl<'a> Reader<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, &ParseConfig::default())
    }

    pub fn with_config(input: &'a str, config: &ParseConfig) -> Self {
        Reader {
            tokens: Tokenizer::with_config(input, config),
            max_depth: config.max_depth,
            finished: false,
        }
    }

    /// Read the next datum. Returns the `#<eof>` symbol (see
    /// [`Value::is_eof`]) once the input holds no further forms.
    pub fn read(&mut self) -> Result<Value, Error> {
        match self.tokens.next_token() {
            Token::Eof => Ok(Value::eof()),
            token => self.read_one(token),
        }
    }

    /// Read the datum that starts with `token`, which the caller has
    /// already pulled from the tokenizer
    pub fn read_one(&mut self, token: Token<'a>) -> Result<Value, Error> {
        self.read_datum(token, 0)
    }

    /// True when only whitespace and comments remain
    pub fn at_end(&self) -> bool {
        let mut rest = self.tokens.clone();
        rest.next_token() == Token::Eof
    }

    fn read_datum(&mut self, token: Token<'a>, depth: usize) -> Result<Value, Error> {
        if depth >= self.max_depth {
            return Err(Error::syntax(format!(
                "expression too deeply nested (max depth: {})",
                self.max_depth
            )));
        }

        match token {
            Token::OpenParen => self.read_list(depth),
            Token::VectorStart => self.read_vector(depth),
            Token::CloseParen => Err(Error::syntax(format!(
                "unexpected ')' at position {}",
                self.tokens.position() - 1
            ))),
            Token::Quote => self.read_abbreviation(Keyword::Quote, depth),
            Token::Quasiquote => self.read_abbreviation(Keyword::Quasiquote, depth),
            Token::Unquote => self.read_abbreviation(Keyword::Unquote, depth),
            Token::UnquoteSplicing => self.read_abbreviation(Keyword::UnquoteSplicing, depth),
            Token::String(raw) => Ok(Value::from(decode_string(raw))),
            Token::Integer(text) => number::decode_integer(text).map(Value::Integer),
            Token::Float(text) => number::decode_float(text).map(Value::Float),
            Token::Rational(text) => number::decode_rational(text).map(Value::Float),
            Token::Complex(text) => number::decode_complex(text).map(Value::Complex),
            Token::Boolean(b) => Ok(Value::Bool(b)),
            Token::Character(c) => Ok(Value::Char(c)),
            Token::Identifier(name) => Ok(Value::symbol(name)),
            Token::Eof => Err(Error::unexpected_eof("while reading a datum")),
            Token::Error(e) => Err(e),
        }
    }

    fn read_list(&mut self, depth: usize) -> Result<Value, Error> {
        let mut items = Vec::new();

        loop {
            match self.tokens.next_token() {
                Token::CloseParen => return Ok(Value::list(items)),
                Token::Eof => return Err(Error::unexpected_eof("inside a list")),
                Token::Identifier(".") if items.is_empty() => {
                    return Err(Error::syntax("'.' must follow at least one list element"));
                }
                Token::Identifier(".") => {
                    let token = self.tokens.next_token();
                    if token == Token::CloseParen {
                        return Err(Error::syntax("missing datum after '.'"));
                    }
                    let tail = self.read_datum(token, depth + 1)?;

                    return match self.tokens.next_token() {
                        Token::CloseParen => Ok(Value::list_with_tail(items, tail)),
                        Token::Eof => Err(Error::unexpected_eof("inside a dotted list")),
                        Token::Error(e) => Err(e),
                        _ => Err(Error::syntax(
                            "expected ')' after the tail of a dotted list",
                        )),
                    };
                }
                token => items.push(self.read_datum(token, depth + 1)?),
            }
        }
    }

    fn read_vector(&mut self, depth: usize) -> Result<Value, Error> {
        let mut items = Vec::new();

        loop {
            match self.tokens.next_token() {
                Token::CloseParen => return Ok(Value::vector(items)),
                Token::Eof => return Err(Error::unexpected_eof("inside a vector")),
                token => items.push(self.read_datum(token, depth + 1)?),
            }
        }
    }

    /// `'x` and friends become `(quote x)` and friends
    fn read_abbreviation(&mut self, keyword: Keyword, depth: usize) -> Result<Value, Error> {
        let token = self.tokens.next_token();
        let datum = self.read_datum(token, depth + 1)?;
        Ok(Value::list([Value::Symbol(keyword.symbol()), datum]))
    }
}

impl Iterator for Reader<'_> {
    type Item = Result<Value, Error>;

    /// Yields each datum in turn; stops after the input is exhausted or after
    /// the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read() {
            Ok(value) if value.is_eof() => {
                self.finished = true;
                None
            }
            Ok(value) => Some(Ok(value)),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse exactly one S-expression. Empty input and trailing input are errors.
pub fn parse_scheme(input: &str) -> Result<Value, Error> {
    parse_scheme_with_config(input, &ParseConfig::default())
}

/// Parse exactly one S-expression using the given settings
pub fn parse_scheme_with_config(input: &str, config: &ParseConfig) -> Result<Value, Error> {
    let mut reader = Reader::with_config(input, config);
    let value = reader.read()?;
    if value.is_eof() {
        return Err(Error::syntax("empty input"));
    }

    match reader.tokens.next_token() {
        Token::Eof => Ok(value),
        Token::Error(e) => Err(e),
        _ => Err(Error::syntax(format!(
            "unexpected input after {value} near position {}",
            reader.tokens.position()
        ))),
    }
}

/// Parse every S-expression in `input`
pub fn parse_all(input: &str) -> Result<Vec<Value>, Error> {
    Reader::new(input).collect()
}
