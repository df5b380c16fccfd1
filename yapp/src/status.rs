//! Per-run parser status and the handle given to rule actions.
//!
//! [`Status`] is the transient bookkeeping of one parse: the pending
//! lookahead, the error-recovery counter, the cumulative error count, the
//! control-check flag and the dot position of the rule being reduced. The
//! lexer sees it read-only; rule actions and the error hook get a [`Yy`]
//! handle that can also issue the control operations (accept, abort, error,
//! errok) and inspect the stack and tables.

use crate::tables::{END_TOKEN, ParserTables};
use smartstring::alias::String;

/// Control flag set by rule actions and checked by the engine right after
/// each reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Check {
    #[default]
    Normal,
    Accept,
    Abort,
    Error,
}

/// An entry of the parse stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackEntry<V> {
    pub state: usize,
    pub value: Option<V>,
}

/// Transient state of one parser run.
#[derive(Debug, Clone)]
pub struct Status<V> {
    pub(crate) token: Option<String>,
    pub(crate) value: Option<V>,
    pub(crate) errst: u8,
    pub(crate) nberr: usize,
    pub(crate) check: Check,
    pub(crate) dotpos: usize,
}

impl<V> Default for Status<V> {
    fn default() -> Self {
        Self {
            token: None,
            value: None,
            errst: 0,
            nberr: 0,
            check: Check::Normal,
            dotpos: 0,
        }
    }
}

impl<V> Status<V> {
    /// The pending lookahead token, if one has been fetched.
    pub fn curtok(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Semantic value of the pending lookahead.
    pub fn curval(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Number of syntax errors reported so far in this run.
    pub fn nberr(&self) -> usize {
        self.nberr
    }

    /// Whether the parser is recovering from an error.
    pub fn recovering(&self) -> bool {
        self.errst != 0
    }

    /// Raw error-recovery counter: 0 normal, 1 error just detected, 3 (and
    /// decaying with each shift) resynchronizing.
    pub fn error_status(&self) -> u8 {
        self.errst
    }

    /// Number of values handed to the rule currently being reduced.
    pub fn dotpos(&self) -> usize {
        self.dotpos
    }

    pub fn check(&self) -> Check {
        self.check
    }

    pub(crate) fn at_end(&self) -> bool {
        self.token.as_deref() == Some(END_TOKEN)
    }

    pub(crate) fn clear_token(&mut self) {
        self.token = None;
        self.value = None;
    }
}

/// Handle passed to rule actions and to the error hook.
///
/// Control operations only touch the run's [`Status`]; the engine acts on
/// them once the action returns.
pub struct Yy<'a, V> {
    pub(crate) status: &'a mut Status<V>,
    pub(crate) stack: &'a [StackEntry<V>],
    pub(crate) tables: &'a ParserTables,
    pub(crate) rule: Option<usize>,
}

impl<'a, V> Yy<'a, V> {
    /// Accepts the input once the enclosing reduction completes, returning
    /// the value it produced.
    pub fn accept(&mut self) {
        self.status.check = Check::Accept;
    }

    /// Stops the parse without a result.
    pub fn abort(&mut self) {
        self.status.check = Check::Abort;
    }

    /// Enters error recovery right after the enclosing reduction, skipping
    /// its goto.
    pub fn error(&mut self) {
        self.status.check = Check::Error;
    }

    /// Leaves error recovery. Called from the error hook, the parse resumes
    /// immediately with the same lookahead and the error is not counted.
    pub fn errok(&mut self) {
        self.status.errst = 0;
    }

    pub fn recovering(&self) -> bool {
        self.status.recovering()
    }

    pub fn error_status(&self) -> u8 {
        self.status.errst
    }

    pub fn nberr(&self) -> usize {
        self.status.nberr
    }

    pub fn curtok(&self) -> Option<&str> {
        self.status.curtok()
    }

    /// Replaces the pending lookahead token; `None` forces a new fetch.
    pub fn set_curtok(&mut self, token: Option<&str>) {
        self.status.token = token.map(String::from);
    }

    pub fn curval(&self) -> Option<&V> {
        self.status.curval()
    }

    pub fn set_curval(&mut self, value: Option<V>) {
        self.status.value = value;
    }

    /// The rule being reduced, or `None` inside the error hook.
    pub fn rule(&self) -> Option<usize> {
        self.rule
    }

    pub fn dotpos(&self) -> usize {
        self.status.dotpos
    }

    /// Terminals acceptable in the state on top of the stack.
    pub fn expected(&self) -> Vec<&'a str> {
        let tables: &'a ParserTables = self.tables;
        self.stack
            .last()
            .and_then(|top| tables.state(top.state).ok())
            .map(|state| state.expected())
            .unwrap_or_default()
    }

    /// Value of the `index`-th (1-based) symbol of the rule being reduced.
    ///
    /// Indices `<= 0` reach further left into the stack, which is how inline
    /// rules read symbols preceding their position. Returns `None` outside of
    /// the stack or for symbols without a value.
    pub fn semval(&self, index: isize) -> Option<&'a V> {
        let stack: &'a [StackEntry<V>] = self.stack;
        let back = isize::try_from(self.status.dotpos)
            .ok()?
            .checked_add(1)?
            .checked_sub(index)?;
        let back = usize::try_from(back).ok().filter(|b| (1..=stack.len()).contains(b))?;
        stack[stack.len() - back].value.as_ref()
    }
}
