//! Static LALR(1) tables consumed by the [`Parser`](crate::Parser).
//!
//! Tables come from an external generator in the classic Yapp layout: a
//! list of rules `(lhs, len)` and a list of states, each with an optional
//! default action, an optional per-token action map and a goto map. Actions
//! are encoded as integers: positive shifts to that state, negative reduces
//! by that rule, zero accepts.
//!
//! The serialized form ([`RuleDef`], [`StateDef`]) is decoded once into
//! [`ParserTables`], which validates every cross reference and parses the
//! inline-rule markers so that the engine never has to re-inspect strings
//! while running.

use crate::ParseError;
use serde::Deserialize;
use smartstring::alias::String;
use std::collections::HashMap;

/// Terminal name returned by the lexer at end of input.
pub const END_TOKEN: &str = "";

/// Reserved terminal shifted during error recovery.
pub const ERROR_TOKEN: &str = "error";

/// A decoded parser action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Push the lookahead and go to the given state.
    Shift(usize),
    /// Reduce using the given rule.
    Reduce(usize),
    /// Reduce using rule 0 and accept.
    Accept,
}

impl Action {
    /// Decodes the integer encoding used in serialized tables.
    pub fn decode(code: i64) -> Self {
        match code {
            0 => Action::Accept,
            c if c > 0 => Action::Shift(c as usize),
            c => Action::Reduce(c.unsigned_abs() as usize),
        }
    }
}

/// A rule as found in serialized tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuleDef {
    /// Left-hand side nonterminal, or an `@<rule>-<len>` inline marker.
    pub lhs: String,
    /// Number of stack entries the rule pops.
    pub len: usize,
}

impl RuleDef {
    pub fn new(lhs: impl AsRef<str>, len: usize) -> Self {
        Self {
            lhs: String::from(lhs.as_ref()),
            len,
        }
    }
}

/// A state as found in serialized tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StateDef {
    /// Action taken when no lookahead-specific action applies.
    #[serde(default)]
    pub default: Option<i64>,
    /// Lookahead-specific actions. Its presence means the state needs a
    /// lookahead token, even if the map is empty.
    #[serde(default)]
    pub actions: Option<HashMap<String, i64>>,
    /// Goto targets keyed by nonterminal.
    #[serde(default)]
    pub gotos: HashMap<String, usize>,
}

/// Serialized form of a full table set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TablesDef {
    pub rules: Vec<RuleDef>,
    pub states: Vec<StateDef>,
}

/// A decoded grammar rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    lhs: String,
    len: usize,
    inline_dotpos: Option<usize>,
}

impl Rule {
    /// Left-hand side nonterminal (the raw marker for inline rules).
    pub fn lhs(&self) -> &str {
        &self.lhs
    }

    /// Number of stack entries popped by a reduction.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the rule has an empty right-hand side.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// For inline rules, the number of trailing values handed to the action.
    pub fn inline_dotpos(&self) -> Option<usize> {
        self.inline_dotpos
    }

    /// Number of trailing stack values handed to the rule's action.
    pub fn dotpos(&self) -> usize {
        self.inline_dotpos.unwrap_or(self.len)
    }
}

/// A decoded automaton state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    default: Option<Action>,
    actions: Option<HashMap<String, Action>>,
    gotos: HashMap<String, usize>,
}

impl State {
    pub fn default_action(&self) -> Option<Action> {
        self.default
    }

    /// Whether the state consults a lookahead token.
    pub fn needs_token(&self) -> bool {
        self.actions.is_some()
    }

    /// Action bound to `token`, ignoring the default.
    pub fn action(&self, token: &str) -> Option<Action> {
        self.actions.as_ref()?.get(token).copied()
    }

    /// Target of shifting the `error` token, if this state can do it.
    pub fn error_shift(&self) -> Option<usize> {
        match self.action(ERROR_TOKEN) {
            Some(Action::Shift(next)) => Some(next),
            _ => None,
        }
    }

    pub fn goto(&self, lhs: &str) -> Option<usize> {
        self.gotos.get(lhs).copied()
    }

    /// Terminals with an explicit action, sorted by name.
    pub fn expected(&self) -> Vec<&str> {
        let mut tokens: Vec<&str> = self
            .actions
            .iter()
            .flat_map(|actions| actions.keys().map(|t| t.as_str()))
            .collect();
        tokens.sort_unstable();
        tokens
    }
}

/// Validated, immutable parse tables.
///
/// `ParserTables` is `Send + Sync`; wrap it in an [`Arc`](std::sync::Arc) to
/// share one table set between any number of concurrently running parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserTables {
    rules: Vec<Rule>,
    states: Vec<State>,
}

impl ParserTables {
    /// Decodes and validates serialized rules and states.
    ///
    /// Fails on an ill-formed inline marker, on any shift or goto naming a
    /// missing state, on any reduce naming a missing rule, and when rule 0
    /// or state 0 is absent.
    pub fn from_defs(rules: Vec<RuleDef>, states: Vec<StateDef>) -> Result<Self, ParseError> {
        if rules.is_empty() {
            return Err(ParseError::UnknownRule { rule: 0 });
        }
        if states.is_empty() {
            return Err(ParseError::UnknownState { state: 0 });
        }

        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(i, RuleDef { lhs, len })| -> Result<Rule, ParseError> {
                let inline_dotpos = if lhs.starts_with('@') {
                    Some(inline_dotpos(&lhs).ok_or(ParseError::IllFormedInlineRule {
                        rule: i,
                        lhs: lhs.clone(),
                    })?)
                } else {
                    None
                };
                Ok(Rule {
                    lhs,
                    len,
                    inline_dotpos,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        let n_rules = rules.len();
        let n_states = states.len();
        let check = |action: Action| match action {
            Action::Shift(s) if s >= n_states => Err(ParseError::UnknownState { state: s }),
            Action::Reduce(r) if r >= n_rules => Err(ParseError::UnknownRule { rule: r }),
            action => Ok(action),
        };

        let states = states
            .into_iter()
            .map(|def| -> Result<State, ParseError> {
                let default = def.default.map(Action::decode).map(check).transpose()?;
                let actions = def
                    .actions
                    .map(|actions| {
                        actions
                            .into_iter()
                            .map(|(token, code)| Ok((token, check(Action::decode(code))?)))
                            .collect::<Result<HashMap<String, Action>, ParseError>>()
                    })
                    .transpose()?;
                if let Some(&state) = def.gotos.values().find(|&&s| s >= n_states) {
                    return Err(ParseError::UnknownState { state });
                }
                Ok(State {
                    default,
                    actions,
                    gotos: def.gotos,
                })
            })
            .collect::<Result<Vec<_>, ParseError>>()?;

        log::debug!("loaded parser tables: {} rules, {} states", n_rules, n_states);
        Ok(Self { rules, states })
    }

    /// Loads tables from their JSON form (`{"rules": [...], "states": [...]}`).
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let TablesDef { rules, states } = serde_json::from_str(json)?;
        Self::from_defs(rules, states)
    }

    pub fn rule(&self, rule: usize) -> Result<&Rule, ParseError> {
        self.rules.get(rule).ok_or(ParseError::UnknownRule { rule })
    }

    pub fn state(&self, state: usize) -> Result<&State, ParseError> {
        self.states.get(state).ok_or(ParseError::UnknownState { state })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }
}

/// Parses the length out of an `@<digits>-<digits>` marker.
fn inline_dotpos(lhs: &str) -> Option<usize> {
    let (index, len) = lhs.strip_prefix('@')?.split_once('-')?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(index) || !all_digits(len) {
        return None;
    }
    len.parse().ok()
}
