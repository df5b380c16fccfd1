//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Runtime engine for precomputed LALR(1) parse tables.
//!
//! `yapp` drives a table-generated shift/reduce automaton over a stream of
//! tokens, calls user rule actions on each reduction and recovers from syntax
//! errors the yacc way: report once, shift the reserved `error` token, then
//! discard input until three tokens have been shifted successfully.
//!
//! Key components:
//! - [`tables`]: serialized and validated parse tables ([`ParserTables`])
//! - [`parser`]: the engine ([`Parser`]) and the [`ParserDriver`] trait that
//!   supplies rule actions and the error hook
//! - [`status`]: per-run status and the [`Yy`] handle given to actions
//! - [`lexer`]: the [`Lexer`] trait, [`Lexeme`] and [`IterLexer`]
//! - [`actions`]: [`RuleActions`], a closure-based driver
//! - [`trace`]: bitmask-gated debug tracing ([`TraceFlags`], [`TraceSink`])
//! - [`error`]: [`ParseError`]
//!
//! Tables are immutable and `Send + Sync`; share them through an
//! [`Arc`](std::sync::Arc) and give each thread its own [`Parser`].

pub mod actions;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod status;
pub mod tables;
pub mod trace;

#[cfg(test)]
mod test_parser_data;

pub use actions::RuleActions;
pub use error::ParseError;
pub use lexer::{IterLexer, Lexeme, Lexer};
pub use parser::{Failure, Outcome, Parser, ParserDriver, ParserStats};
pub use status::{Check, StackEntry, Status, Yy};
pub use tables::{
    Action, END_TOKEN, ERROR_TOKEN, ParserTables, Rule, RuleDef, State, StateDef, TablesDef,
};
pub use trace::{LogSink, TraceFlags, TraceFlagsError, TraceSink};
