//! The lexical source consumed by the parser.
//!
//! The engine pulls one [`Lexeme`] at a time, and only when the current
//! state needs a lookahead. End of input is the empty token name with no
//! value ([`Lexeme::end`]). The end marker is never consumed by a shift, so
//! after returning it once the lexer is normally not called again.
//!
//! Any `FnMut(&Status<V>) -> Result<Lexeme<V>>` is a lexer, and
//! [`IterLexer`] adapts an iterator of lexemes.

use crate::Status;
use crate::tables::END_TOKEN;
use anyhow::Result;
use smartstring::alias::String;
use std::iter::Fuse;

/// A token name together with its semantic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme<V> {
    pub token: String,
    pub value: Option<V>,
}

impl<V> Lexeme<V> {
    pub fn new(token: impl AsRef<str>, value: V) -> Self {
        Self {
            token: String::from(token.as_ref()),
            value: Some(value),
        }
    }

    /// A token without a semantic value.
    pub fn bare(token: impl AsRef<str>) -> Self {
        Self {
            token: String::from(token.as_ref()),
            value: None,
        }
    }

    /// The end-of-input marker.
    pub fn end() -> Self {
        Self::bare(END_TOKEN)
    }

    pub fn is_end(&self) -> bool {
        self.token.as_str() == END_TOKEN
    }
}

/// Source of lookahead tokens.
///
/// The parser passes its current [`Status`] so the lexer can, for example,
/// behave differently while the parser is recovering from an error.
/// Returning an error aborts the run with
/// [`ParseError::Lexer`](crate::ParseError::Lexer).
pub trait Lexer<V> {
    fn lex(&mut self, status: &Status<V>) -> Result<Lexeme<V>>;
}

impl<V, F> Lexer<V> for F
where
    F: FnMut(&Status<V>) -> Result<Lexeme<V>>,
{
    fn lex(&mut self, status: &Status<V>) -> Result<Lexeme<V>> {
        self(status)
    }
}

/// Adapts an iterator of lexemes into a [`Lexer`].
///
/// When the iterator is exhausted, the end marker is returned on every
/// subsequent call.
pub struct IterLexer<I>
where
    I: Iterator,
{
    iter: Fuse<I>,
    fetched: usize,
}

impl<I> IterLexer<I>
where
    I: Iterator,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter().fuse(),
            fetched: 0,
        }
    }

    /// Number of lexemes taken from the underlying iterator.
    pub fn fetched(&self) -> usize {
        self.fetched
    }
}

impl<V, I> Lexer<V> for IterLexer<I>
where
    I: Iterator<Item = Lexeme<V>>,
{
    fn lex(&mut self, _status: &Status<V>) -> Result<Lexeme<V>> {
        match self.iter.next() {
            Some(lexeme) => {
                self.fetched += 1;
                Ok(lexeme)
            }
            None => Ok(Lexeme::end()),
        }
    }
}
