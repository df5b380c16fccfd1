//! Error type for table loading and parser execution.
//!
//! Syntax errors are *not* represented here: they are handled inside the
//! engine by the recovery protocol and surface, when unrecoverable, as an
//! [`Outcome::Fail`](crate::Outcome::Fail). [`ParseError`] is reserved for
//! conditions the engine cannot recover from on its own:
//!
//! - defects in the supplied tables (bad inline-rule markers, dangling state
//!   or rule references, missing gotos),
//! - failures raised by the lexer,
//! - failures raised by a rule action.

use smartstring::alias::String;
use thiserror::Error;

/// Errors that abort table loading or a parser run.
#[derive(Debug, Error)]
pub enum ParseError {
    /// An inline rule's left-hand side does not match `@<rule>-<length>`.
    #[error("in-line rule {rule} has ill-formed name {lhs:?}")]
    IllFormedInlineRule {
        /// Index of the offending rule.
        rule: usize,
        /// The left-hand side as found in the tables.
        lhs: String,
    },

    /// A state index outside of the state table.
    #[error("unknown state {state}")]
    UnknownState {
        /// The requested state.
        state: usize,
    },

    /// A rule index outside of the rule table.
    #[error("unknown rule {rule}")]
    UnknownRule {
        /// The requested rule.
        rule: usize,
    },

    /// The state uncovered by a reduction has no goto for the rule's
    /// left-hand side.
    #[error("state {state} has no goto for {lhs:?}")]
    MissingGoto {
        /// State on top of the stack after popping.
        state: usize,
        /// Nonterminal being reduced to.
        lhs: String,
    },

    /// A reduction needs more stack entries than are present.
    #[error("rule {rule} needs {needed} stack entries, only {available} available")]
    StackUnderflow {
        /// Rule being reduced.
        rule: usize,
        /// Entries the rule consumes (or reads, for inline rules).
        needed: usize,
        /// Entries on the stack.
        available: usize,
    },

    /// The serialized tables could not be decoded.
    #[error("invalid parser tables: {0}")]
    Tables(#[from] serde_json::Error),

    /// The lexer failed to produce a token.
    #[error("lexer error: {0}")]
    Lexer(#[source] anyhow::Error),

    /// A rule action failed.
    #[error("action for rule {rule} failed: {source}")]
    Action {
        /// Rule whose action failed.
        rule: usize,
        /// The error returned by the action.
        #[source]
        source: anyhow::Error,
    },
}
