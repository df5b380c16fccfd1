//! # Calculator Parser
//!
//! This module couples the calculator parse tables with calculator-specific
//! semantic actions. It exposes:
//!
//! - [`CALC_TABLES`]: the LALR(1) tables of the grammar below, in JSON,
//! - [`CalcParserDriver`]: rule actions and the syntax-error hook,
//! - [`Calc`]: the evaluation context (variables, results, diagnostics),
//! - [`CalcParser`]: a thin adapter that runs [`CalcLexer`] through the
//!   engine.
//!
//! ```text
//! input: /* empty */ | input line
//! line:  '\n' | exp '\n' | error '\n'
//! exp:   NUM | VAR | VAR '=' exp
//!      | exp '+' exp | exp '-' exp | exp '*' exp | exp '/' exp
//!      | '-' exp %prec NEG | '(' exp ')'
//! ```
//!
//! `=` is right-associative with the lowest precedence, `+ -` and `* /` are
//! left-associative, and unary minus binds tightest.
//!
//! ## Behavior highlights
//! - Each non-blank line yields one entry in [`Calc::results`]: its value,
//!   or `None` when the line had an error.
//! - A syntax error skips the rest of the line (`error '\n'`) and parsing
//!   resumes on the next one.
//! - Division by zero, overflow and reading an unassigned variable force
//!   the same recovery from inside the rule action.

use crate::{CalcError, CalcLexer, SymTab, TokenValue, token::Describe};
use anyhow::{Result, anyhow, bail};
use std::sync::Arc;
use yapp::{
    ERROR_TOKEN, LogSink, Outcome, ParseError, Parser, ParserDriver, ParserStats, ParserTables,
    TraceFlags, TraceSink, Yy,
};

/// Parse tables of the calculator grammar.
pub const CALC_TABLES: &str = include_str!("calc_tables.json");

/// Loads and validates [`CALC_TABLES`].
pub fn calc_tables() -> Result<ParserTables, ParseError> {
    ParserTables::from_json(CALC_TABLES)
}

/// Productions of the calculator grammar, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProdID {
    /// `$start -> input $end`
    Start,
    /// `input ->`
    Input1,
    /// `input -> input line`
    Input2,
    /// `line -> '\n'`
    Line1,
    /// `line -> exp '\n'`
    Line2,
    /// `line -> error '\n'`
    Line3,
    /// `exp -> NUM`
    Exp1,
    /// `exp -> VAR`
    Exp2,
    /// `exp -> VAR '=' exp`
    Exp3,
    /// `exp -> exp '+' exp`
    Exp4,
    /// `exp -> exp '-' exp`
    Exp5,
    /// `exp -> exp '*' exp`
    Exp6,
    /// `exp -> exp '/' exp`
    Exp7,
    /// `exp -> '-' exp`
    Exp8,
    /// `exp -> '(' exp ')'`
    Exp9,
}

impl ProdID {
    const ALL: [ProdID; 15] = [
        ProdID::Start,
        ProdID::Input1,
        ProdID::Input2,
        ProdID::Line1,
        ProdID::Line2,
        ProdID::Line3,
        ProdID::Exp1,
        ProdID::Exp2,
        ProdID::Exp3,
        ProdID::Exp4,
        ProdID::Exp5,
        ProdID::Exp6,
        ProdID::Exp7,
        ProdID::Exp8,
        ProdID::Exp9,
    ];

    /// Maps a rule index of [`CALC_TABLES`] to its production.
    pub fn from_index(rule: usize) -> Option<Self> {
        Self::ALL.get(rule).copied()
    }
}

/// Evaluation context threaded through a calculator run.
#[derive(Debug, Default)]
pub struct Calc {
    /// Variable bindings.
    pub symtab: SymTab,
    /// One entry per non-blank line: its value, or `None` if it failed.
    pub results: Vec<Option<i64>>,
    /// Diagnostics, prefixed with the line they refer to.
    pub errors: Vec<String>,
    lines: usize,
    pending: Option<CalcError>,
}

impl Calc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines completed so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Records `err` and forces error recovery after the current reduction.
    fn fail(&mut self, yy: &mut Yy<'_, TokenValue>, err: CalcError) -> Option<TokenValue> {
        self.pending = Some(err);
        yy.error();
        None
    }

    fn arith(
        &mut self,
        yy: &mut Yy<'_, TokenValue>,
        result: Result<i64, CalcError>,
    ) -> Option<TokenValue> {
        match result {
            Ok(n) => Some(TokenValue::Number(n)),
            Err(err) => self.fail(yy, err),
        }
    }
}

/// Semantic actions of the calculator grammar.
///
/// Productions whose value is their first symbol (`exp -> NUM`, the
/// `input` list) have no action; the engine passes the value through.
#[derive(Debug, Default)]
pub struct CalcParserDriver;

impl ParserDriver for CalcParserDriver {
    type Value = TokenValue;
    type Context = Calc;

    fn has_action(&self, rule: usize) -> bool {
        !matches!(
            ProdID::from_index(rule),
            None | Some(ProdID::Start | ProdID::Input1 | ProdID::Input2 | ProdID::Exp1)
        )
    }

    fn reduce(
        &mut self,
        yy: &mut Yy<'_, TokenValue>,
        context: &mut Calc,
        rule: usize,
        values: Vec<Option<TokenValue>>,
    ) -> Result<Option<TokenValue>> {
        let Some(prod_id) = ProdID::from_index(rule) else {
            bail!("rule {rule} is not part of the calculator grammar");
        };
        let value = |i: usize| values.get(i).and_then(Option::as_ref);
        let number = |i: usize| {
            value(i)
                .and_then(TokenValue::as_number)
                .ok_or_else(|| anyhow!("{prod_id:?}: symbol {} is not a number", i + 1))
        };
        let ident = |i: usize| {
            value(i)
                .and_then(TokenValue::as_ident)
                .ok_or_else(|| anyhow!("{prod_id:?}: symbol {} is not a variable", i + 1))
        };

        let result = match prod_id {
            ProdID::Start | ProdID::Input1 | ProdID::Input2 | ProdID::Exp1 => value(0).cloned(),
            ProdID::Line1 => {
                // blank line
                context.lines += 1;
                None
            }
            ProdID::Line2 => {
                context.lines += 1;
                context.results.push(Some(number(0)?));
                None
            }
            ProdID::Line3 => {
                context.lines += 1;
                context.results.push(None);
                yy.errok();
                None
            }
            ProdID::Exp2 => match context.symtab.lookup(ident(0)?) {
                Ok(n) => Some(TokenValue::Number(n)),
                Err(err) => context.fail(yy, err.into()),
            },
            ProdID::Exp3 => {
                let n = number(2)?;
                context.symtab.assign(ident(0)?, n);
                Some(TokenValue::Number(n))
            }
            ProdID::Exp4 => {
                let sum = number(0)?.checked_add(number(2)?);
                context.arith(yy, sum.ok_or(CalcError::Overflow))
            }
            ProdID::Exp5 => {
                let diff = number(0)?.checked_sub(number(2)?);
                context.arith(yy, diff.ok_or(CalcError::Overflow))
            }
            ProdID::Exp6 => {
                let product = number(0)?.checked_mul(number(2)?);
                context.arith(yy, product.ok_or(CalcError::Overflow))
            }
            ProdID::Exp7 => {
                let (a, b) = (number(0)?, number(2)?);
                let quotient = if b == 0 {
                    Err(CalcError::DivisionByZero)
                } else {
                    a.checked_div(b).ok_or(CalcError::Overflow)
                };
                context.arith(yy, quotient)
            }
            ProdID::Exp8 => {
                let negated = number(1)?.checked_neg();
                context.arith(yy, negated.ok_or(CalcError::Overflow))
            }
            ProdID::Exp9 => value(1).cloned(),
        };
        Ok(result)
    }

    fn error(&mut self, yy: &mut Yy<'_, TokenValue>, context: &mut Calc) {
        let message = match context.pending.take() {
            Some(err) => err.to_string(),
            None => {
                let expected: Vec<String> = yy
                    .expected()
                    .into_iter()
                    .filter(|token| *token != ERROR_TOKEN)
                    .map(|token| Describe(token).to_string())
                    .collect();
                match yy.curtok() {
                    Some(token) => format!(
                        "syntax error near {}, expected one of: {}",
                        Describe(token),
                        expected.join(", ")
                    ),
                    None => "syntax error".into(),
                }
            }
        };
        let line = context.lines + 1;
        log::warn!("line {line}: {message}");
        context.errors.push(format!("line {line}: {message}"));
    }
}

/// The calculator: [`CalcLexer`] feeding the engine with a
/// [`CalcParserDriver`].
///
/// # Example
///
/// ```rust
/// # use yapp_calc::{Calc, CalcParser};
/// let mut calc = Calc::new();
/// let mut parser = CalcParser::try_new().unwrap();
/// let outcome = parser.eval("x = 6 * 7\nx / 0\nx - 2\n", &mut calc).unwrap();
/// assert!(outcome.is_accept());
/// assert_eq!(calc.results, vec![Some(42), None, Some(40)]);
/// assert_eq!(calc.errors, vec!["line 2: division by zero"]);
/// ```
pub struct CalcParser<S = LogSink> {
    parser: Parser<CalcParserDriver, S>,
}

impl CalcParser {
    /// Loads the calculator tables and builds a parser.
    pub fn try_new() -> Result<Self, ParseError> {
        Ok(Self::with_tables(Arc::new(calc_tables()?)))
    }

    /// Builds a parser over already loaded tables.
    pub fn with_tables(tables: Arc<ParserTables>) -> Self {
        Self {
            parser: Parser::new(tables, CalcParserDriver),
        }
    }
}

impl<S> CalcParser<S>
where
    S: TraceSink,
{
    pub fn with_sink<S2: TraceSink>(self, sink: S2) -> CalcParser<S2> {
        CalcParser {
            parser: self.parser.with_sink(sink),
        }
    }

    pub fn set_debug(&mut self, flags: TraceFlags) {
        self.parser.set_debug(flags);
    }

    pub fn sink(&self) -> &S {
        self.parser.sink()
    }

    /// Counters of the most recent [`eval`](Self::eval).
    pub fn stats(&self) -> ParserStats {
        self.parser.stats()
    }

    /// Evaluates every line of `source`, accumulating into `calc`.
    pub fn eval(
        &mut self,
        source: &str,
        calc: &mut Calc,
    ) -> Result<Outcome<TokenValue>, ParseError> {
        let mut lexer = CalcLexer::new(source);
        let outcome = self.parser.run(&mut lexer, calc)?;
        log::debug!(
            "evaluated {} lines, {} errors: {:?}",
            lexer.line() - 1,
            calc.errors.len(),
            outcome
        );
        Ok(outcome)
    }
}
