//! # Calculator Lexer
//!
//! [`CalcLexer`] scans calculator source text into [`Lexeme`]s for the
//! engine. Numbers and identifiers are matched with an anchored regex;
//! every other character becomes a single-character terminal, so stray
//! characters surface as syntax errors rather than lexer failures.
//!
//! Spaces, tabs, carriage returns and `#` comments are skipped. Newlines are
//! significant: they terminate statements. When the source does not end
//! with a newline, one is supplied before end of input.

use crate::{CalcError, TokenID, TokenValue};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use yapp::{Lexeme, Lexer, Status};

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?P<skip>[ \t\r]+|#[^\n]*)|(?P<num>[0-9]+)|(?P<var>[A-Za-z_][A-Za-z0-9_]*))")
        .unwrap()
});

/// Tokenizer over a borrowed source string.
///
/// # Example
/// ```rust
/// # use yapp::{Lexer, Status};
/// # use yapp_calc::{CalcLexer, TokenValue};
/// let mut lexer = CalcLexer::new("x = 4");
/// let status = Status::default();
/// let names: Vec<String> = std::iter::from_fn(|| {
///     let lexeme = lexer.lex(&status).unwrap();
///     (!lexeme.is_end()).then(|| lexeme.token.to_string())
/// })
/// .collect();
/// assert_eq!(names, ["VAR", "=", "NUM", "\n"]);
/// ```
#[derive(Debug)]
pub struct CalcLexer<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    // a statement is open and still lacks its newline
    open: bool,
}

impl<'a> CalcLexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            open: false,
        }
    }

    /// 1-based line of the scan position.
    pub fn line(&self) -> usize {
        self.line
    }

    fn token(&mut self, token_id: TokenID, value: Option<TokenValue>) -> Lexeme<TokenValue> {
        log::trace!("line {}: token {:?} {:?}", self.line, token_id, value);
        self.open = !matches!(token_id, TokenID::Newline | TokenID::End);
        Lexeme {
            token: token_id.name().into(),
            value,
        }
    }

    fn finish(&mut self) -> Lexeme<TokenValue> {
        if self.open {
            self.token(TokenID::Newline, None)
        } else {
            self.token(TokenID::End, None)
        }
    }
}

impl Lexer<TokenValue> for CalcLexer<'_> {
    fn lex(&mut self, _status: &Status<TokenValue>) -> Result<Lexeme<TokenValue>> {
        loop {
            let rest = &self.source[self.pos..];
            if let Some(caps) = TOKEN_RE.captures(rest) {
                let len = caps.get(0).map_or(0, |m| m.len());
                self.pos += len;
                if let Some(num) = caps.name("num") {
                    let n: i64 = num.as_str().parse().map_err(CalcError::from)?;
                    return Ok(self.token(TokenID::Number, Some(TokenValue::Number(n))));
                }
                if let Some(var) = caps.name("var") {
                    let name = TokenValue::Ident(var.as_str().into());
                    return Ok(self.token(TokenID::Ident, Some(name)));
                }
                continue;
            }

            let Some(c) = rest.chars().next() else {
                return Ok(self.finish());
            };
            self.pos += c.len_utf8();
            let lexeme = match TokenID::from_char(c) {
                Some(token_id) => self.token(token_id, None),
                None => {
                    log::debug!("line {}: unexpected character {:?}", self.line, c);
                    self.open = true;
                    Lexeme::bare(c.encode_utf8(&mut [0; 4]))
                }
            };
            if c == '\n' {
                self.line += 1;
            }
            return Ok(lexeme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yapp::ParseError;

    fn lex_all(source: &str) -> Vec<Lexeme<TokenValue>> {
        let mut lexer = CalcLexer::new(source);
        let status = Status::default();
        let mut out = Vec::new();
        loop {
            let lexeme = lexer.lex(&status).unwrap();
            if lexeme.is_end() {
                return out;
            }
            out.push(lexeme);
        }
    }

    fn names(lexemes: &[Lexeme<TokenValue>]) -> Vec<&str> {
        lexemes.iter().map(|l| l.token.as_str()).collect()
    }

    #[test]
    fn scans_expression() {
        let _ = env_logger::builder().is_test(true).try_init();
        let lexemes = lex_all("a = (12 + b_2) * -3\n");
        assert_eq!(
            names(&lexemes),
            ["VAR", "=", "(", "NUM", "+", "VAR", ")", "*", "-", "NUM", "\n"]
        );
        assert_eq!(lexemes[0].value, Some(TokenValue::Ident("a".into())));
        assert_eq!(lexemes[3].value, Some(TokenValue::Number(12)));
        assert_eq!(lexemes[5].value, Some(TokenValue::Ident("b_2".into())));
        assert_eq!(lexemes[9].value, Some(TokenValue::Number(3)));
        assert_eq!(lexemes[1].value, None);
    }

    #[test]
    fn skips_blanks_and_comments() {
        let lexemes = lex_all("  1\t# one\r\n# nothing\n2");
        assert_eq!(names(&lexemes), ["NUM", "\n", "\n", "NUM", "\n"]);
    }

    #[test]
    fn supplies_final_newline_once() {
        assert_eq!(names(&lex_all("7")), ["NUM", "\n"]);
        assert_eq!(names(&lex_all("7\n")), ["NUM", "\n"]);
        assert!(lex_all("").is_empty());

        let mut lexer = CalcLexer::new("1");
        let status = Status::default();
        lexer.lex(&status).unwrap();
        lexer.lex(&status).unwrap();
        assert!(lexer.lex(&status).unwrap().is_end());
        assert!(lexer.lex(&status).unwrap().is_end());
    }

    #[test]
    fn unknown_characters_are_their_own_tokens() {
        let lexemes = lex_all("1 % 2");
        assert_eq!(names(&lexemes), ["NUM", "%", "NUM", "\n"]);
        assert_eq!(lexemes[1].value, None);
        assert_eq!(names(&lex_all("1 %")), ["NUM", "%", "\n"]);
    }

    #[test]
    fn counts_lines() {
        let mut lexer = CalcLexer::new("1\n2\n");
        let status = Status::default();
        assert_eq!(lexer.line(), 1);
        lexer.lex(&status).unwrap();
        lexer.lex(&status).unwrap();
        assert_eq!(lexer.line(), 2);
        lexer.lex(&status).unwrap();
        lexer.lex(&status).unwrap();
        assert_eq!(lexer.line(), 3);
    }

    #[test]
    fn oversized_number_is_an_error() {
        let mut lexer = CalcLexer::new("99999999999999999999");
        let err = lexer.lex(&Status::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CalcError>(),
            Some(CalcError::ParseInt(_))
        ));
        // the engine reports it as a lexer failure
        let wrapped = ParseError::Lexer(err);
        assert!(wrapped.to_string().starts_with("lexer error"));
    }
}
