//! # Calculator Tokens
//!
//! Token kinds recognized by [`CalcLexer`](crate::CalcLexer) and the
//! semantic values they carry. The engine addresses terminals by name, so
//! each [`TokenID`] maps to the name used in the calculator tables.

use smartstring::alias::String;
use std::fmt;

/// The payload carried on the parser stack.
///
/// Numbers and identifiers come from the lexer; every `exp` reduction
/// produces a [`TokenValue::Number`].
///
/// # Example
/// ```rust
/// # use yapp_calc::TokenValue;
/// let value = TokenValue::Number(42);
/// assert_eq!(value.as_number(), Some(42));
/// assert_eq!(TokenValue::Ident("x".into()).as_number(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    /// Integer literal or computed value.
    Number(i64),

    /// Variable name.
    Ident(String),
}

impl TokenValue {
    pub fn as_number(&self) -> Option<i64> {
        match self {
            TokenValue::Number(n) => Some(*n),
            TokenValue::Ident(_) => None,
        }
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            TokenValue::Ident(name) => Some(name.as_str()),
            TokenValue::Number(_) => None,
        }
    }
}

/// Terminals of the calculator grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenID {
    Number,
    Ident,
    Newline,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Equals,
    LeftParen,
    RightParen,
    End,
}

impl TokenID {
    /// Terminal name as it appears in the parse tables.
    pub const fn name(self) -> &'static str {
        match self {
            TokenID::Number => "NUM",
            TokenID::Ident => "VAR",
            TokenID::Newline => "\n",
            TokenID::Plus => "+",
            TokenID::Minus => "-",
            TokenID::Asterisk => "*",
            TokenID::Slash => "/",
            TokenID::Equals => "=",
            TokenID::LeftParen => "(",
            TokenID::RightParen => ")",
            TokenID::End => yapp::END_TOKEN,
        }
    }

    /// Operator or punctuation for a single character.
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '\n' => TokenID::Newline,
            '+' => TokenID::Plus,
            '-' => TokenID::Minus,
            '*' => TokenID::Asterisk,
            '/' => TokenID::Slash,
            '=' => TokenID::Equals,
            '(' => TokenID::LeftParen,
            ')' => TokenID::RightParen,
            _ => return None,
        })
    }
}

/// Human-readable form of a terminal name, for diagnostics.
pub struct Describe<'a>(pub &'a str);

impl fmt::Display for Describe<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            "" => f.write_str("end of input"),
            "\n" => f.write_str("newline"),
            "NUM" => f.write_str("number"),
            "VAR" => f.write_str("variable"),
            other => write!(f, "'{}'", other.escape_default()),
        }
    }
}
