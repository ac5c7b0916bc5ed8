//! Pull-based tokenizer.
//!
//! [`Tokenizer::next_token`] classifies one token at a time, so the reader
//! never tokenizes more text than the form it is building needs.

use nom::{
    IResult, Parser,
    bytes::complete::{take_till, take_till1, take_while1},
    character::complete::char,
    combinator::recognize,
};

use super::ParseConfig;
use super::number::{self, NumberKind};
use crate::Error;
use crate::ast::is_valid_symbol;

/// A classified token. Literal tokens borrow their undecoded text from the
/// input; decoding happens in the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    OpenParen,
    CloseParen,
    /// `#(`
    VectorStart,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    /// String body between the quotes, escapes not yet decoded
    String(&'a str),
    Integer(&'a str),
    Float(&'a str),
    Complex(&'a str),
    Rational(&'a str),
    Boolean(bool),
    Character(char),
    Identifier(&'a str),
    Eof,
    Error(Error),
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"' | ';')
}

fn whitespace(input: &str) -> IResult<&str, &str> {
    take_while1(char::is_whitespace).parse(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize((char(';'), take_till(|c: char| c == '\n'))).parse(input)
}

fn atom_text(input: &str) -> IResult<&str, &str> {
    take_till1(is_delimiter).parse(input)
}

/// Lazy, forward-only token source over a borrowed string
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    handle_comments: bool,
    failed: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, &ParseConfig::default())
    }

    pub fn with_config(input: &'a str, config: &ParseConfig) -> Self {
        Tokenizer {
            input,
            pos: 0,
            handle_comments: config.handle_comments,
            failed: false,
        }
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Produce the next token. Once the input is exhausted, or after an
    /// `Error` token, every further call answers `Eof`.
    pub fn next_token(&mut self) -> Token<'a> {
        if self.failed {
            return Token::Eof;
        }
        match self.lex() {
            Ok(token) => token,
            Err(e) => {
                self.failed = true;
                Token::Error(e)
            }
        }
    }

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.pos..]
    }

    /// Advance past a prefix of `rest()` given what a parser left over
    fn consume_to(&mut self, remaining: &str) {
        self.pos = self.input.len() - remaining.len();
    }

    fn malformed(&self, text: &str, start: usize) -> Error {
        Error::lex(format!("malformed token {text:?} at position {start}"))
    }

    /// Skip whitespace and comments
    fn skip_atmosphere(&mut self) -> Result<(), Error> {
        loop {
            let rest = self.rest();
            if let Ok((remaining, _)) = whitespace(rest) {
                self.consume_to(remaining);
            } else if !self.handle_comments {
                return Ok(());
            } else if let Ok((remaining, _)) = line_comment(rest) {
                self.consume_to(remaining);
            } else if rest.starts_with("#|") {
                self.skip_block_comment()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), Error> {
        let start = self.pos;
        self.pos += 2;
        let mut depth = 1usize;

        while depth > 0 {
            let rest = self.rest();
            if rest.starts_with("|#") {
                depth -= 1;
                self.pos += 2;
            } else if rest.starts_with("#|") {
                depth += 1;
                self.pos += 2;
            } else if let Some(c) = rest.chars().next() {
                self.pos += c.len_utf8();
            } else {
                return Err(Error::unexpected_eof(format!(
                    "in block comment starting at position {start}"
                )));
            }
        }
        Ok(())
    }

    fn lex(&mut self) -> Result<Token<'a>, Error> {
        self.skip_atmosphere()?;

        let rest = self.rest();
        let start = self.pos;
        let Some(first) = rest.chars().next() else {
            return Ok(Token::Eof);
        };

        let (token, len) = match first {
            '(' => (Token::OpenParen, 1),
            ')' => (Token::CloseParen, 1),
            '\'' => (Token::Quote, 1),
            '`' => (Token::Quasiquote, 1),
            ',' if rest.starts_with(",@") => (Token::UnquoteSplicing, 2),
            ',' => (Token::Unquote, 1),
            '#' if rest.starts_with("#(") => (Token::VectorStart, 2),
            '"' => return self.string(),
            '#' if rest.starts_with("#\\") => return self.character(),
            ';' => {
                // Only reachable with comment handling switched off
                return Err(Error::lex(format!("unexpected ';' at position {start}")));
            }
            _ => return self.atom(),
        };

        self.pos += len;
        Ok(token)
    }

    fn string(&mut self) -> Result<Token<'a>, Error> {
        let start = self.pos;
        let body = &self.rest()[1..];

        let mut escaped = false;
        for (i, c) in body.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    self.pos = start + 1 + i + 1;
                    return Ok(Token::String(&body[..i]));
                }
                _ => {}
            }
        }

        self.pos = self.input.len();
        Err(Error::unexpected_eof(format!(
            "in string starting at position {start}"
        )))
    }

    fn character(&mut self) -> Result<Token<'a>, Error> {
        let start = self.pos;
        let body = &self.rest()[2..];

        let Some(first) = body.chars().next() else {
            self.pos = self.input.len();
            return Err(Error::unexpected_eof(format!(
                "in character literal at position {start}"
            )));
        };

        // The first character is taken verbatim even when it is a delimiter,
        // so `#\(` and `#\ ` are single characters.
        let after_first = &body[first.len_utf8()..];
        let name_len = first.len_utf8()
            + after_first
                .find(is_delimiter)
                .unwrap_or(after_first.len());
        let name = &body[..name_len];
        self.pos = start + 2 + name_len;

        let c = match name {
            "space" => ' ',
            "newline" => '\n',
            "tab" => '\t',
            _ if name.len() == first.len_utf8() => first,
            _ => return Err(self.malformed(&self.input[start..self.pos], start)),
        };
        Ok(Token::Character(c))
    }

    fn atom(&mut self) -> Result<Token<'a>, Error> {
        let start = self.pos;
        let (remaining, text) = atom_text(self.rest()).map_err(|_| {
            Error::lex(format!("unexpected character at position {start}"))
        })?;
        self.consume_to(remaining);

        let token = match text {
            "#t" | "#true" => Token::Boolean(true),
            "#f" | "#false" => Token::Boolean(false),
            _ => match number::classify(text) {
                Some(NumberKind::Integer) => Token::Integer(text),
                Some(NumberKind::Rational) => Token::Rational(text),
                Some(NumberKind::Float) => Token::Float(text),
                Some(NumberKind::Complex) => Token::Complex(text),
                None if is_valid_symbol(text) => Token::Identifier(text),
                None => return Err(self.malformed(text, start)),
            },
        };
        Ok(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        match self.next_token() {
            Token::Eof => None,
            token => Some(token),
        }
    }
}
