use crate::status::{Check, StackEntry, Status, Yy};
use crate::tables::{Action, ParserTables};
use crate::trace::{LogSink, TraceFlags, TraceSink};
use crate::{Lexeme, Lexer, ParseError};
use anyhow::Result;
use std::fmt::Write;
use std::mem;
use std::sync::Arc;

/// Semantic side of a grammar: rule actions and the error-report hook.
///
/// Tables only describe the automaton; a driver supplies what happens when
/// a rule is reduced. Rules for which [`has_action`](Self::has_action)
/// returns `false` produce their first right-hand-side value (or none for
/// empty rules) without calling [`reduce`](Self::reduce).
pub trait ParserDriver {
    /// Semantic value carried on the stack.
    type Value: Clone;

    /// Caller-owned state threaded through every action.
    type Context;

    fn has_action(&self, rule: usize) -> bool;

    /// Runs the action of `rule` on the values of its right-hand side, in
    /// left-to-right order. For inline rules, `values` holds the symbols
    /// preceding the rule's position.
    ///
    /// An error aborts the run with [`ParseError::Action`].
    fn reduce(
        &mut self,
        yy: &mut Yy<'_, Self::Value>,
        context: &mut Self::Context,
        rule: usize,
        values: Vec<Option<Self::Value>>,
    ) -> Result<Option<Self::Value>>;

    /// Called once per detected syntax error, before recovery starts.
    ///
    /// Calling [`Yy::errok`] here cancels recovery and resumes parsing with
    /// the same lookahead, so the hook must also change something (usually
    /// the lookahead, via [`Yy::set_curtok`]) for the parse to progress.
    fn error(&mut self, _yy: &mut Yy<'_, Self::Value>, _context: &mut Self::Context) {
        log::warn!("Parse error.");
    }
}

/// How a run ended without a [`ParseError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<V> {
    /// The input was accepted; holds the value of the accepting reduction.
    Accept(Option<V>),
    /// A rule action called [`Yy::abort`].
    Abort,
    /// Error recovery gave up.
    Fail(Failure),
}

impl<V> Outcome<V> {
    pub fn is_accept(&self) -> bool {
        matches!(self, Outcome::Accept(_))
    }

    /// The accepted value, if any.
    pub fn value(self) -> Option<V> {
        match self {
            Outcome::Accept(value) => value,
            _ => None,
        }
    }
}

/// Why error recovery gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// No state on the stack can shift the `error` token.
    StackExhausted,
    /// End of input was reached while discarding invalid tokens.
    EndOfInput,
}

/// Counters for the most recent run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Tokens fetched from the lexer.
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    /// Syntax errors that entered recovery.
    pub errors: usize,
    /// Lookahead tokens thrown away during recovery.
    pub discarded: usize,
    /// Stack entries popped while looking for an `error` shift.
    pub popped: usize,
}

/// Working memory of one run: the stack, the status and the counters.
pub(crate) struct ParserCtx<V> {
    pub(crate) stack: Vec<StackEntry<V>>,
    pub(crate) status: Status<V>,
    pub(crate) stats: ParserStats,
    // recovery was entered and its end has not been traced yet
    recovery_traced: bool,
}

impl<V> ParserCtx<V> {
    pub(crate) fn new() -> Self {
        Self {
            stack: vec![StackEntry {
                state: 0,
                value: None,
            }],
            status: Status::default(),
            stats: ParserStats::default(),
            recovery_traced: false,
        }
    }

    pub(crate) fn top_state(&self) -> Option<usize> {
        self.stack.last().map(|entry| entry.state)
    }

    /// Stack states as `0,3,5`.
    pub(crate) fn stack_states(&self) -> String {
        let mut output = String::new();
        for (i, entry) in self.stack.iter().enumerate() {
            if i > 0 {
                output.push(',');
            }
            let _ = write!(output, "{}", entry.state);
        }
        output
    }
}

enum Step<V> {
    Continue,
    Recover,
    Done(Outcome<V>),
}

/// The LALR(1) engine.
///
/// A `Parser` pairs shared, read-only [`ParserTables`] with a
/// [`ParserDriver`]. Each call to [`run`](Self::run) starts from a fresh
/// stack and status, so a parser can be reused for any number of inputs;
/// concurrent parses need one `Parser` each but can share the tables.
///
/// # Example
/// ```rust
/// # use yapp::{IterLexer, Lexeme, Outcome, Parser, ParserTables, RuleActions, Yy};
/// let tables = ParserTables::from_json(r#"{
///   "rules": [{"lhs": "$start", "len": 2}, {"lhs": "S", "len": 2}],
///   "states": [
///     {"actions": {"num": 2}, "gotos": {"S": 1}},
///     {"actions": {"": 3}},
///     {"actions": {"num": 4}},
///     {"default": 0},
///     {"default": -1}
///   ]
/// }"#).unwrap();
/// let actions = RuleActions::new().on(1, |_yy: &mut Yy<'_, i64>, _: &mut (), v| {
///     Ok(Some(v[0].unwrap_or(0) * v[1].unwrap_or(0)))
/// });
/// let mut parser = Parser::new(tables, actions);
/// let mut lexer = IterLexer::new([Lexeme::new("num", 6), Lexeme::new("num", 7)]);
/// assert_eq!(parser.run(&mut lexer, &mut ()).unwrap(), Outcome::Accept(Some(42)));
/// ```
pub struct Parser<D, S = LogSink>
where
    D: ParserDriver,
{
    tables: Arc<ParserTables>,
    driver: D,
    debug: TraceFlags,
    sink: S,
    stats: ParserStats,
}

impl<D> Parser<D>
where
    D: ParserDriver,
{
    pub fn new(tables: impl Into<Arc<ParserTables>>, driver: D) -> Self {
        Self {
            tables: tables.into(),
            driver,
            debug: TraceFlags::NONE,
            sink: LogSink,
            stats: ParserStats::default(),
        }
    }
}

impl<D, S> Parser<D, S>
where
    D: ParserDriver,
    S: TraceSink,
{
    /// Replaces the trace sink.
    pub fn with_sink<S2: TraceSink>(self, sink: S2) -> Parser<D, S2> {
        Parser {
            tables: self.tables,
            driver: self.driver,
            debug: self.debug,
            sink,
            stats: self.stats,
        }
    }

    /// Selects the trace categories sent to the sink.
    pub fn set_debug(&mut self, flags: TraceFlags) {
        self.debug = flags;
    }

    pub fn debug(&self) -> TraceFlags {
        self.debug
    }

    pub fn tables(&self) -> &Arc<ParserTables> {
        &self.tables
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Counters of the most recent run.
    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    /// Parses the tokens produced by `lexer`.
    ///
    /// Syntax errors are reported to [`ParserDriver::error`] and recovered
    /// from; only when recovery gives up does the run end with
    /// [`Outcome::Fail`]. Defects in the tables and errors raised by the
    /// lexer or by rule actions are returned as [`ParseError`].
    pub fn run<L>(
        &mut self,
        lexer: &mut L,
        context: &mut D::Context,
    ) -> Result<Outcome<D::Value>, ParseError>
    where
        L: Lexer<D::Value> + ?Sized,
    {
        let mut ctx = ParserCtx::new();
        let result = self.parse(lexer, context, &mut ctx);
        log::debug!("parser run finished: {:?}", ctx.stats);
        self.stats = ctx.stats;
        result
    }

    fn parse<L>(
        &mut self,
        lexer: &mut L,
        context: &mut D::Context,
        ctx: &mut ParserCtx<D::Value>,
    ) -> Result<Outcome<D::Value>, ParseError>
    where
        L: Lexer<D::Value> + ?Sized,
    {
        let tables = Arc::clone(&self.tables);
        loop {
            let Some(stateno) = ctx.top_state() else {
                return Ok(Outcome::Fail(Failure::StackExhausted));
            };
            let state = tables.state(stateno)?;
            self.trace(TraceFlags::STATE, || format!("In state {stateno}:"));
            self.trace(TraceFlags::STACK, || format!("Stack:[{}]", ctx.stack_states()));

            let mut act = state.default_action();
            if state.needs_token() {
                if ctx.status.token.is_none() {
                    self.fetch(lexer, ctx)?;
                }
                if let Some(action) = ctx.status.curtok().and_then(|t| state.action(t)) {
                    act = Some(action);
                }
            } else {
                self.trace(TraceFlags::TOKEN, || "Don't need token.".into());
            }

            let step = match act {
                Some(Action::Shift(next)) => {
                    self.shift(ctx, next);
                    Step::Continue
                }
                Some(Action::Reduce(rule)) => self.reduce(&tables, ctx, context, rule)?,
                Some(Action::Accept) => {
                    ctx.status.check = Check::Accept;
                    self.reduce(&tables, ctx, context, 0)?
                }
                None => Step::Recover,
            };

            match step {
                Step::Continue => continue,
                Step::Done(outcome) => return Ok(outcome),
                Step::Recover => {
                    if let Some(failure) = self.recover(&tables, lexer, ctx, context)? {
                        return Ok(Outcome::Fail(failure));
                    }
                }
            }
        }
    }

    fn shift(&mut self, ctx: &mut ParserCtx<D::Value>, next: usize) {
        self.trace(TraceFlags::ACTION, || format!("Shift and go to state {next}."));
        if ctx.status.errst > 0 {
            ctx.status.errst -= 1;
            self.end_of_recovery(ctx);
        }
        // the end marker stays as lookahead
        let value = if ctx.status.at_end() {
            ctx.status.value.clone()
        } else {
            ctx.status.token = None;
            ctx.status.value.take()
        };
        ctx.stack.push(StackEntry { state: next, value });
        ctx.stats.shifts += 1;
    }

    fn reduce(
        &mut self,
        tables: &ParserTables,
        ctx: &mut ParserCtx<D::Value>,
        context: &mut D::Context,
        rule_index: usize,
    ) -> Result<Step<D::Value>, ParseError> {
        let rule = tables.rule(rule_index)?;
        let prefix = if rule_index != 0 && self.debug.contains(TraceFlags::ACTION) {
            format!(
                "Reduce using rule {} ({},{}): ",
                rule_index,
                rule.lhs(),
                rule.len()
            )
        } else {
            String::new()
        };

        let dotpos = rule.dotpos();
        let available = ctx.stack.len();
        if dotpos > available || rule.len() >= available {
            return Err(ParseError::StackUnderflow {
                rule: rule_index,
                needed: dotpos.max(rule.len() + 1),
                available,
            });
        }
        ctx.status.dotpos = dotpos;

        let semval = if self.driver.has_action(rule_index) {
            let values = ctx.stack[available - dotpos..]
                .iter()
                .map(|entry| entry.value.clone())
                .collect();
            let mut yy = Yy {
                status: &mut ctx.status,
                stack: &ctx.stack,
                tables,
                rule: Some(rule_index),
            };
            self.driver
                .reduce(&mut yy, context, rule_index, values)
                .map_err(|source| ParseError::Action {
                    rule: rule_index,
                    source,
                })?
        } else if dotpos > 0 {
            ctx.stack[available - dotpos].value.clone()
        } else {
            None
        };

        ctx.stack.truncate(available - rule.len());
        ctx.stats.reductions += 1;

        match mem::take(&mut ctx.status.check) {
            Check::Accept => {
                self.trace(TraceFlags::ACTION, || format!("{prefix}Accept."));
                Ok(Step::Done(Outcome::Accept(semval)))
            }
            Check::Abort => {
                self.trace(TraceFlags::ACTION, || format!("{prefix}Abort."));
                Ok(Step::Done(Outcome::Abort))
            }
            Check::Error => {
                self.trace(TraceFlags::ACTION, || {
                    format!(
                        "{prefix}back to state {}, then forced error recovery.",
                        ctx.top_state().unwrap_or_default()
                    )
                });
                Ok(Step::Recover)
            }
            Check::Normal => {
                let Some(top) = ctx.top_state() else {
                    return Err(ParseError::StackUnderflow {
                        rule: rule_index,
                        needed: rule.len() + 1,
                        available,
                    });
                };
                let goto = tables
                    .state(top)?
                    .goto(rule.lhs())
                    .ok_or_else(|| ParseError::MissingGoto {
                        state: top,
                        lhs: rule.lhs().into(),
                    })?;
                self.trace(TraceFlags::ACTION, || {
                    format!("{prefix}back to state {top}, then go to state {goto}.")
                });
                self.end_of_recovery(ctx);
                ctx.stack.push(StackEntry {
                    state: goto,
                    value: semval,
                });
                Ok(Step::Continue)
            }
        }
    }

    fn fetch<L>(&mut self, lexer: &mut L, ctx: &mut ParserCtx<D::Value>) -> Result<(), ParseError>
    where
        L: Lexer<D::Value> + ?Sized,
    {
        let Lexeme { token, value } = lexer.lex(&ctx.status).map_err(ParseError::Lexer)?;
        ctx.stats.tokens += 1;
        self.trace(TraceFlags::TOKEN, || {
            format!("Need token. Got >{}<.", show_token(&token))
        });
        ctx.status.token = Some(token);
        ctx.status.value = value;
        Ok(())
    }

    /// Error recovery. Returns `None` when parsing can resume.
    fn recover<L>(
        &mut self,
        tables: &ParserTables,
        lexer: &mut L,
        ctx: &mut ParserCtx<D::Value>,
        context: &mut D::Context,
    ) -> Result<Option<Failure>, ParseError>
    where
        L: Lexer<D::Value> + ?Sized,
    {
        if ctx.status.errst == 0 {
            ctx.status.errst = 1;
            let mut yy = Yy {
                status: &mut ctx.status,
                stack: &ctx.stack,
                tables,
                rule: None,
            };
            self.driver.error(&mut yy, context);
            if ctx.status.errst == 0 {
                // errok from the hook
                return Ok(None);
            }
            self.trace(TraceFlags::RECOVERY, || "**Entering error recovery.".into());
            ctx.recovery_traced = true;
            ctx.status.nberr += 1;
            ctx.stats.errors += 1;
        }

        if ctx.status.errst == 3 {
            // a repeated error must consume input
            if ctx.status.token.is_none() {
                self.fetch(lexer, ctx)?;
            }
            if ctx.status.at_end() {
                self.trace(TraceFlags::RECOVERY, || "**At EOF: aborting.".into());
                return Ok(Some(Failure::EndOfInput));
            }
            let token = ctx.status.curtok().unwrap_or_default();
            self.trace(TraceFlags::RECOVERY, || {
                format!("**Discard invalid token >{}<.", show_token(token))
            });
            ctx.status.clear_token();
            ctx.stats.discarded += 1;
        }

        ctx.status.errst = 3;

        let target = loop {
            let Some(top) = ctx.top_state() else {
                self.trace(TraceFlags::RECOVERY, || {
                    "**No state left on stack: aborting.".into()
                });
                return Ok(Some(Failure::StackExhausted));
            };
            if let Some(next) = tables.state(top)?.error_shift() {
                break next;
            }
            self.trace(TraceFlags::RECOVERY, || format!("**Pop state {top}."));
            ctx.stack.pop();
            ctx.stats.popped += 1;
        };

        self.trace(TraceFlags::RECOVERY, || {
            format!("**Shift $error token and go to state {target}.")
        });
        ctx.stack.push(StackEntry {
            state: target,
            value: None,
        });
        Ok(None)
    }

    fn end_of_recovery(&mut self, ctx: &mut ParserCtx<D::Value>) {
        if ctx.recovery_traced && ctx.status.errst == 0 {
            self.trace(TraceFlags::RECOVERY, || "**End of error recovery.".into());
            ctx.recovery_traced = false;
        }
    }

    fn trace(&mut self, flag: TraceFlags, line: impl FnOnce() -> String) {
        if self.debug.contains(flag) {
            let line = line();
            self.sink.trace(flag, &line);
        }
    }
}

/// Token name with control and non-ASCII characters shown as `<XX>`.
fn show_token(token: &str) -> String {
    let mut output = String::new();
    for c in token.chars() {
        if (' '..='~').contains(&c) {
            output.push(c);
        } else {
            let mut buf = [0; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(output, "<{b:02X}>");
            }
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_parser_data::{INLINE_TABLES, STMT_TABLES, SUM_ERROR_TABLES, SUM_TABLES};
    use crate::{IterLexer, RuleActions};
    use anyhow::bail;
    use std::collections::VecDeque;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn num(n: i64) -> Lexeme<i64> {
        Lexeme::new("num", n)
    }

    fn tok(t: &str) -> Lexeme<i64> {
        Lexeme::bare(t)
    }

    fn tables(json: &str) -> Arc<ParserTables> {
        Arc::new(ParserTables::from_json(json).unwrap())
    }

    /// `E -> E + E` sums; `E -> error` counts placeholders in the context.
    fn sum_actions() -> RuleActions<i64, usize> {
        RuleActions::new()
            .on(2, |_yy: &mut Yy<'_, i64>, _: &mut usize, v| {
                Ok(Some(v[0].unwrap_or(0) + v[2].unwrap_or(0)))
            })
            .on(4, |_yy: &mut Yy<'_, i64>, placeholders: &mut usize, _| {
                *placeholders += 1;
                Ok(Some(0))
            })
    }

    #[test]
    fn sums_two_operands() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_TABLES), sum_actions());
        let mut lexer = IterLexer::new([num(1), tok("+"), num(2)]);
        let outcome = parser.run(&mut lexer, &mut 0).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(3)));
        assert_eq!(
            parser.stats(),
            ParserStats {
                tokens: 4,
                shifts: 4,
                reductions: 5,
                ..Default::default()
            }
        );
    }

    #[test]
    fn sums_are_left_associative() {
        init_logger();
        let actions = RuleActions::new().on(2, |_yy: &mut Yy<'_, i64>, _: &mut (), v| {
            Ok(Some(v[0].unwrap_or(0) - v[2].unwrap_or(0)))
        });
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        // "+" is subtraction here: (10 + 3) + 2 = 5, not 10 + (3 + 2) = 9
        let mut lexer = IterLexer::new([num(10), tok("+"), num(3), tok("+"), num(2)]);
        assert_eq!(parser.run(&mut lexer, &mut ()).unwrap(), Outcome::Accept(Some(5)));
    }

    #[test]
    fn truncated_input_is_a_hard_failure() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_TABLES), sum_actions());
        let mut lexer = IterLexer::new([num(1), tok("+")]);
        let outcome = parser.run(&mut lexer, &mut 0).unwrap();
        assert_eq!(outcome, Outcome::Fail(Failure::StackExhausted));
        let stats = parser.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.popped, 3);
    }

    struct FirstValue;

    impl ParserDriver for FirstValue {
        type Value = i64;
        type Context = ();

        fn has_action(&self, _rule: usize) -> bool {
            false
        }

        fn reduce(
            &mut self,
            _yy: &mut Yy<'_, i64>,
            _context: &mut (),
            _rule: usize,
            values: Vec<Option<i64>>,
        ) -> Result<Option<i64>> {
            Ok(values.into_iter().next().flatten())
        }
    }

    #[test]
    fn default_error_hook_does_not_resume() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_TABLES), FirstValue);
        let mut lexer = IterLexer::new([num(1), num(2)]);
        let outcome = parser.run(&mut lexer, &mut ()).unwrap();
        assert_eq!(outcome, Outcome::Fail(Failure::StackExhausted));
        let stats = parser.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.popped, 2);
    }

    #[test]
    fn end_of_input_while_discarding_fails() {
        init_logger();
        let mut parser = Parser::new(tables(STMT_TABLES), RuleActions::<i64>::new());
        let mut lexer = IterLexer::new([num(1), tok("+")]);
        let outcome = parser.run(&mut lexer, &mut ()).unwrap();
        assert_eq!(outcome, Outcome::Fail(Failure::EndOfInput));
        let stats = parser.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.discarded, 1);
    }

    #[test]
    fn error_production_yields_placeholder() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_ERROR_TABLES), sum_actions());
        let mut lexer = IterLexer::new([num(1), tok("+"), tok("+"), num(2)]);
        let mut placeholders = 0;
        let outcome = parser.run(&mut lexer, &mut placeholders).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(3)));
        assert_eq!(placeholders, 1);
        assert_eq!(parser.stats().errors, 1);
        assert_eq!(parser.stats().discarded, 0);
    }

    #[test]
    fn failing_error_production_consumes_input_until_end() {
        init_logger();
        let actions = RuleActions::new().on(4, |yy: &mut Yy<'_, i64>, _: &mut (), _| {
            yy.error();
            Ok(Some(0))
        });
        let mut parser = Parser::new(tables(SUM_ERROR_TABLES), actions);
        let mut lexer = IterLexer::new([num(1), tok("+"), tok("+"), num(2)]);
        let outcome = parser.run(&mut lexer, &mut ()).unwrap();
        assert_eq!(outcome, Outcome::Fail(Failure::EndOfInput));
        let stats = parser.stats();
        assert_eq!(stats.tokens, 5);
        assert_eq!(stats.discarded, 2);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn discards_tokens_until_resynchronized() {
        init_logger();
        let actions = RuleActions::new().on(2, |_yy: &mut Yy<'_, i64>, _: &mut (), _| Ok(Some(-1)));
        let mut parser = Parser::new(tables(STMT_TABLES), actions);
        let mut lexer = IterLexer::new([num(1), tok("+"), tok("+"), tok(";")]);
        let outcome = parser.run(&mut lexer, &mut ()).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(-1)));
        let stats = parser.stats();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.discarded, 2);
    }

    #[test]
    fn error_status_decays_after_three_shifts() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_ERROR_TABLES), sum_actions());
        let mut input: VecDeque<Lexeme<i64>> =
            VecDeque::from([num(1), tok("+"), tok("+"), num(2), tok("+"), num(3)]);
        let mut seen = Vec::new();
        let mut lexer = |status: &Status<i64>| -> Result<Lexeme<i64>> {
            seen.push(status.error_status());
            Ok(input.pop_front().unwrap_or_else(Lexeme::end))
        };
        let outcome = parser.run(&mut lexer, &mut 0).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(6)));
        assert_eq!(seen, vec![0, 0, 0, 2, 1, 0, 0]);
    }

    #[test]
    fn abort_stops_consuming_tokens() {
        init_logger();
        let actions = RuleActions::new().on(3, |yy: &mut Yy<'_, i64>, _: &mut (), v| {
            if v[0].is_some_and(|n| n < 0) {
                yy.abort();
            }
            Ok(v[0])
        });
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        let mut lexer = IterLexer::new([num(1), tok("+"), num(-5), tok("+"), num(3)]);
        assert_eq!(parser.run(&mut lexer, &mut ()).unwrap(), Outcome::Abort);
        assert_eq!(lexer.fetched(), 3);
    }

    #[test]
    fn accept_from_action_returns_its_value() {
        init_logger();
        let actions = RuleActions::new().on(2, |yy: &mut Yy<'_, i64>, _: &mut (), v| {
            yy.accept();
            Ok(Some(v[0].unwrap_or(0) + v[2].unwrap_or(0)))
        });
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        let mut lexer = IterLexer::new([num(4), tok("+"), num(5), tok("+"), num(6)]);
        assert_eq!(parser.run(&mut lexer, &mut ()).unwrap(), Outcome::Accept(Some(9)));
        // state 6 reduces by default, so the second "+" is never fetched
        assert_eq!(lexer.fetched(), 3);
    }

    #[test]
    fn forced_error_enters_recovery() {
        init_logger();
        let actions = RuleActions::new()
            .on(1, |yy: &mut Yy<'_, i64>, _: &mut Vec<&'static str>, v| {
                if v[0].is_some_and(|n| n < 0) {
                    yy.error();
                }
                Ok(v[0])
            })
            .on(2, |_yy: &mut Yy<'_, i64>, _: &mut Vec<&'static str>, _| Ok(Some(0)))
            .on_error(|yy: &mut Yy<'_, i64>, log: &mut Vec<&'static str>| {
                assert!(yy.recovering());
                log.push("error");
            });
        let mut parser = Parser::new(tables(STMT_TABLES), actions).with_sink(Vec::<String>::new());
        parser.set_debug(TraceFlags::ACTION);
        let mut lexer = IterLexer::new([num(-1), tok(";"), tok(";")]);
        let mut log = Vec::new();
        let outcome = parser.run(&mut lexer, &mut log).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(0)));
        assert_eq!(log, vec!["error"]);
        assert_eq!(parser.stats().errors, 1);
        assert!(parser.sink().contains(
            &"Reduce using rule 1 (S,2): back to state 0, then forced error recovery.".to_string()
        ));
    }

    #[test]
    fn errok_in_hook_resumes_without_counting() {
        init_logger();
        let actions = RuleActions::new().on_error(|yy: &mut Yy<'_, i64>, calls: &mut usize| {
            *calls += 1;
            assert_eq!(yy.curtok(), Some("num"));
            assert_eq!(yy.expected(), vec![""]);
            // treat the stray token as end of input
            yy.set_curtok(Some(""));
            yy.set_curval(None);
            yy.errok();
        });
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        let mut lexer = IterLexer::new([num(1), num(2)]);
        let mut calls = 0;
        let outcome = parser.run(&mut lexer, &mut calls).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(1)));
        assert_eq!(calls, 1);
        assert_eq!(parser.stats().errors, 0);
    }

    #[test]
    fn hook_sees_expected_tokens() {
        init_logger();
        let actions = RuleActions::new().on_error(
            |yy: &mut Yy<'_, i64>, seen: &mut Vec<(Option<String>, Vec<String>)>| {
                let expected = yy.expected().iter().map(|t| t.to_string()).collect();
                seen.push((yy.curtok().map(String::from), expected));
            },
        );
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        let mut lexer = IterLexer::new([num(1), tok("+")]);
        let mut seen = Vec::new();
        parser.run(&mut lexer, &mut seen).unwrap();
        assert_eq!(seen, vec![(Some(String::new()), vec!["num".to_string()])]);
    }

    #[test]
    fn inline_rule_reads_more_than_it_pops() {
        init_logger();
        type Calls = Vec<(usize, usize, Option<i64>)>;
        let actions = RuleActions::new()
            .on(2, |yy: &mut Yy<'_, i64>, calls: &mut Calls, v: Vec<Option<i64>>| {
                calls.push((2, v.len(), yy.semval(1).copied()));
                Ok(Some(v.iter().flatten().sum()))
            })
            .on(1, |yy: &mut Yy<'_, i64>, calls: &mut Calls, v: Vec<Option<i64>>| {
                calls.push((1, v.len(), yy.semval(4).copied()));
                Ok(v[3].map(|n| n * 10))
            });
        let mut parser = Parser::new(tables(INLINE_TABLES), actions).with_sink(Vec::<String>::new());
        parser.set_debug(TraceFlags::STACK);
        let mut lexer = IterLexer::new([num(1), num(2), num(3), tok(";")]);
        let mut calls = Calls::new();
        let outcome = parser.run(&mut lexer, &mut calls).unwrap();
        assert_eq!(outcome, Outcome::Accept(Some(60)));
        assert_eq!(calls, vec![(2, 3, Some(1)), (1, 5, Some(6))]);
        // nothing is popped by the inline reduction
        let stacks: Vec<&str> = parser.sink().iter().map(String::as_str).collect();
        assert!(stacks.contains(&"Stack:[0,2,4,5]"));
        assert!(stacks.contains(&"Stack:[0,2,4,5,6]"));
    }

    #[test]
    fn accept_leaves_only_the_sentinel() {
        init_logger();
        let actions = RuleActions::new().on(0, |yy: &mut Yy<'_, i64>, depth: &mut Option<usize>, v| {
            // values of S and $end, then the sentinel, then nothing
            assert_eq!(yy.semval(0), None);
            assert_eq!(yy.semval(-1), None);
            *depth = Some(v.len());
            Ok(v[0])
        });
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        let mut lexer = IterLexer::new([num(8)]);
        let mut depth = None;
        assert_eq!(parser.run(&mut lexer, &mut depth).unwrap(), Outcome::Accept(Some(8)));
        assert_eq!(depth, Some(2));
    }

    #[test]
    fn golden_trace() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_TABLES), sum_actions()).with_sink(Vec::<String>::new());
        parser.set_debug(TraceFlags::ALL);
        let mut lexer = IterLexer::new([num(1), tok("+"), num(2)]);
        parser.run(&mut lexer, &mut 0).unwrap();
        let expected = [
            "In state 0:",
            "Stack:[0]",
            "Need token. Got >num<.",
            "Shift and go to state 3.",
            "In state 3:",
            "Stack:[0,3]",
            "Don't need token.",
            "Reduce using rule 3 (E,1): back to state 0, then go to state 2.",
            "In state 2:",
            "Stack:[0,2]",
            "Need token. Got >+<.",
            "Shift and go to state 5.",
            "In state 5:",
            "Stack:[0,2,5]",
            "Need token. Got >num<.",
            "Shift and go to state 3.",
            "In state 3:",
            "Stack:[0,2,5,3]",
            "Don't need token.",
            "Reduce using rule 3 (E,1): back to state 5, then go to state 6.",
            "In state 6:",
            "Stack:[0,2,5,6]",
            "Don't need token.",
            "Reduce using rule 2 (E,3): back to state 0, then go to state 2.",
            "In state 2:",
            "Stack:[0,2]",
            "Need token. Got ><.",
            "Reduce using rule 1 (S,1): back to state 0, then go to state 1.",
            "In state 1:",
            "Stack:[0,1]",
            "Shift and go to state 4.",
            "In state 4:",
            "Stack:[0,1,4]",
            "Don't need token.",
            "Accept.",
        ];
        assert_eq!(parser.sink().as_slice(), expected);
    }

    #[test]
    fn recovery_trace() {
        init_logger();
        let mut parser =
            Parser::new(tables(SUM_ERROR_TABLES), sum_actions()).with_sink(Vec::<String>::new());
        parser.set_debug(TraceFlags::RECOVERY);
        let mut lexer = IterLexer::new([num(1), tok("+"), tok("+"), num(2)]);
        parser.run(&mut lexer, &mut 0).unwrap();
        assert_eq!(
            parser.sink().as_slice(),
            [
                "**Entering error recovery.",
                "**Shift $error token and go to state 7.",
                "**End of error recovery.",
            ]
        );
    }

    #[test]
    fn runs_are_deterministic_and_independent() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_ERROR_TABLES), sum_actions()).with_sink(Vec::<String>::new());
        parser.set_debug(TraceFlags::ALL);
        let input = [num(1), tok("+"), tok("+"), num(2), tok("+"), num(3)];

        let first = parser.run(&mut IterLexer::new(input.clone()), &mut 0).unwrap();
        let first_stats = parser.stats();
        let first_trace = mem::take(parser.sink_mut());

        let second = parser.run(&mut IterLexer::new(input), &mut 0).unwrap();
        assert_eq!(first, second);
        assert_eq!(first_stats, parser.stats());
        assert_eq!(&first_trace, parser.sink());
        assert_eq!(parser.stats().errors, 1);
    }

    #[test]
    fn lexer_errors_propagate() {
        init_logger();
        let mut parser = Parser::new(tables(SUM_TABLES), sum_actions());
        let mut lexer = |_: &Status<i64>| -> Result<Lexeme<i64>> { bail!("cancelled") };
        let err = parser.run(&mut lexer, &mut 0).unwrap_err();
        assert!(matches!(err, ParseError::Lexer(_)));
        assert!(err.to_string().contains("cancelled"));
    }

    #[test]
    fn action_errors_propagate() {
        init_logger();
        let actions = RuleActions::new()
            .on(3, |_yy: &mut Yy<'_, i64>, _: &mut (), _| -> Result<Option<i64>> { bail!("overflow") });
        let mut parser = Parser::new(tables(SUM_TABLES), actions);
        let err = parser.run(&mut IterLexer::new([num(1)]), &mut ()).unwrap_err();
        assert!(matches!(err, ParseError::Action { rule: 3, .. }));
    }

    #[test]
    fn missing_goto_is_a_grammar_defect() {
        init_logger();
        let json = SUM_TABLES.replace(r#""gotos": {"S": 1, "E": 2}"#, r#""gotos": {"S": 1}"#);
        let mut parser = Parser::new(tables(&json), sum_actions());
        let err = parser.run(&mut IterLexer::new([num(1)]), &mut 0).unwrap_err();
        assert!(matches!(err, ParseError::MissingGoto { state: 0, ref lhs } if lhs.as_str() == "E"));
    }

    #[test]
    fn over_long_rule_is_a_grammar_defect() {
        init_logger();
        let json = r#"{
          "rules": [{"lhs": "$start", "len": 2}, {"lhs": "S", "len": 3}],
          "states": [{"default": -1}]
        }"#;
        let mut parser = Parser::new(tables(json), RuleActions::<i64>::new());
        let err = parser.run(&mut IterLexer::new([num(1)]), &mut ()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::StackUnderflow {
                rule: 1,
                needed: 4,
                available: 1
            }
        ));
    }

    #[test]
    fn parallel_parses_share_tables() {
        init_logger();
        let shared = tables(SUM_TABLES);
        let results: Vec<Outcome<i64>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (1..=4)
                .map(|n| {
                    let shared = Arc::clone(&shared);
                    scope.spawn(move || {
                        let mut parser = Parser::new(shared, sum_actions());
                        let input: Vec<Lexeme<i64>> = (0..n)
                            .flat_map(|i| {
                                let plus = (i > 0).then(|| tok("+"));
                                plus.into_iter().chain([num(i)])
                            })
                            .collect();
                        parser.run(&mut IterLexer::new(input), &mut 0).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(
            results,
            vec![
                Outcome::Accept(Some(0)),
                Outcome::Accept(Some(1)),
                Outcome::Accept(Some(3)),
                Outcome::Accept(Some(6)),
            ]
        );
    }

    #[test]
    fn shows_control_characters() {
        assert_eq!(show_token("num"), "num");
        assert_eq!(show_token("\n"), "<0A>");
        assert_eq!(show_token("é"), "<C3><A9>");
        assert_eq!(show_token(""), "");
    }

    #[test]
    fn outcome_helpers() {
        assert!(Outcome::Accept(Some(1)).is_accept());
        assert_eq!(Outcome::Accept(Some(1)).value(), Some(1));
        assert_eq!(Outcome::<i64>::Abort.value(), None);
        assert!(!Outcome::<i64>::Fail(Failure::EndOfInput).is_accept());
    }
}
