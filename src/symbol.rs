//! Interned symbols and the fixed set of syntactic keywords.
//!
//! Symbols are small `Copy` handles into a thread-local [`StringInterner`], so
//! comparing two symbols is an integer comparison. Values built from symbols
//! are `Rc`-based and never cross threads, which keeps the table lock-free.

use std::cell::RefCell;
use std::fmt;

use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

thread_local! {
    static SYMBOLS: RefCell<StringInterner<DefaultBackend>> =
        RefCell::new(StringInterner::new());

    /// Interned keyword symbols, indexed by `Keyword as usize`
    static KEYWORDS: [Symbol; 12] = Keyword::ALL.map(|kw| Symbol::intern(kw.as_str()));
}

/// Name of the symbol the reader returns once the input is exhausted. The
/// tokenizer never produces it because identifiers cannot start with `#`.
pub(crate) const EOF_NAME: &str = "#<eof>";

/// An interned symbol name
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(DefaultSymbol);

impl Symbol {
    pub fn intern(name: &str) -> Self {
        SYMBOLS.with(|table| Symbol(table.borrow_mut().get_or_intern(name)))
    }

    /// Run `f` with the symbol's text without allocating.
    pub fn with_name<R>(self, f: impl FnOnce(&str) -> R) -> R {
        SYMBOLS.with(|table| {
            let table = table.borrow();
            // Symbols interned on another thread do not resolve here
            f(table.resolve(self.0).unwrap_or("#<unresolved>"))
        })
    }

    pub fn name(self) -> String {
        self.with_name(str::to_owned)
    }

    /// The syntactic keyword this symbol names, if any
    pub fn keyword(self) -> Option<Keyword> {
        KEYWORDS.with(|symbols| {
            symbols
                .iter()
                .position(|s| *s == self)
                .map(|i| Keyword::ALL[i])
        })
    }

    pub(crate) fn eof() -> Self {
        Symbol::intern(EOF_NAME)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::intern(name)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_name(|name| f.write_str(name))
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_name(|name| write!(f, "Symbol({name})"))
    }
}

/// Reserved symbols recognized structurally by the expander.
///
/// `append` and `cons` are the procedures quasiquote lowering emits; the
/// remaining keywords are special forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Quote,
    If,
    Define,
    DefineSyntax,
    Lambda,
    Set,
    Begin,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    Append,
    Cons,
}

impl Keyword {
    pub const ALL: [Keyword; 12] = [
        Keyword::Quote,
        Keyword::If,
        Keyword::Define,
        Keyword::DefineSyntax,
        Keyword::Lambda,
        Keyword::Set,
        Keyword::Begin,
        Keyword::Quasiquote,
        Keyword::Unquote,
        Keyword::UnquoteSplicing,
        Keyword::Append,
        Keyword::Cons,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Quote => "quote",
            Keyword::If => "if",
            Keyword::Define => "define",
            Keyword::DefineSyntax => "define-syntax",
            Keyword::Lambda => "lambda",
            Keyword::Set => "set!",
            Keyword::Begin => "begin",
            Keyword::Quasiquote => "quasiquote",
            Keyword::Unquote => "unquote",
            Keyword::UnquoteSplicing => "unquote-splicing",
            Keyword::Append => "append",
            Keyword::Cons => "cons",
        }
    }

    pub fn symbol(self) -> Symbol {
        KEYWORDS.with(|symbols| symbols[self as usize])
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning_is_stable() {
        let a = Symbol::intern("lambda-lifted");
        let b = Symbol::from("lambda-lifted");
        assert_eq!(a, b);
        assert_ne!(a, Symbol::intern("lambda-lifted?"));
        assert_eq!(a.name(), "lambda-lifted");
        assert_eq!(format!("{a}"), "lambda-lifted");
    }

    #[test]
    fn test_keyword_round_trip() {
        for kw in Keyword::ALL {
            assert_eq!(kw.symbol().keyword(), Some(kw), "{kw}");
        }
        assert_eq!(Symbol::intern("set!").keyword(), Some(Keyword::Set));
        assert_eq!(Symbol::intern("car").keyword(), None);
        assert_eq!(
            Symbol::intern("define-syntax").keyword(),
            Some(Keyword::DefineSyntax)
        );
        assert_eq!(Symbol::intern("let").keyword(), None);
    }

    #[test]
    fn test_eof_symbol_is_distinct() {
        assert_eq!(Symbol::eof().name(), EOF_NAME);
        assert_ne!(Symbol::eof(), Symbol::intern("eof"));
    }
}
