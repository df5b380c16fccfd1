//! A [`ParserDriver`] built from closures.
//!
//! Generated grammars usually come with a hand-written driver that matches
//! on the rule index. For small grammars and tests it is more convenient to
//! register one closure per rule; rules without a closure pass their first
//! value through.

use crate::{ParserDriver, Yy};
use anyhow::Result;
use std::collections::HashMap;
use std::fmt;

type ActionFn<V, C> = dyn FnMut(&mut Yy<'_, V>, &mut C, Vec<Option<V>>) -> Result<Option<V>> + Send;
type ErrorFn<V, C> = dyn FnMut(&mut Yy<'_, V>, &mut C) + Send;

/// Registry of rule actions addressed by rule index.
///
/// # Example
/// ```rust
/// # use yapp::{RuleActions, Yy};
/// let actions: RuleActions<i64, ()> = RuleActions::new()
///     .on(2, |_yy: &mut Yy<'_, i64>, _: &mut (), v| Ok(Some(v[0].unwrap_or(0) + v[2].unwrap_or(0))))
///     .on_error(|yy: &mut Yy<'_, i64>, _: &mut ()| log::warn!("syntax error, expected {:?}", yy.expected()));
/// ```
pub struct RuleActions<V, C = ()> {
    actions: HashMap<usize, Box<ActionFn<V, C>>>,
    on_error: Option<Box<ErrorFn<V, C>>>,
}

impl<V, C> Default for RuleActions<V, C> {
    fn default() -> Self {
        Self {
            actions: HashMap::new(),
            on_error: None,
        }
    }
}

impl<V, C> RuleActions<V, C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `action` to `rule`, replacing any previous binding.
    pub fn on<F>(mut self, rule: usize, action: F) -> Self
    where
        F: FnMut(&mut Yy<'_, V>, &mut C, Vec<Option<V>>) -> Result<Option<V>> + Send + 'static,
    {
        self.actions.insert(rule, Box::new(action));
        self
    }

    /// Sets the error-report hook.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut Yy<'_, V>, &mut C) + Send + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }
}

impl<V, C> fmt::Debug for RuleActions<V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rules: Vec<usize> = self.actions.keys().copied().collect();
        rules.sort_unstable();
        f.debug_struct("RuleActions")
            .field("rules", &rules)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl<V: Clone, C> ParserDriver for RuleActions<V, C> {
    type Value = V;
    type Context = C;

    fn has_action(&self, rule: usize) -> bool {
        self.actions.contains_key(&rule)
    }

    fn reduce(
        &mut self,
        yy: &mut Yy<'_, V>,
        context: &mut C,
        rule: usize,
        values: Vec<Option<V>>,
    ) -> Result<Option<V>> {
        match self.actions.get_mut(&rule) {
            Some(action) => action(yy, context, values),
            None => Ok(values.into_iter().next().flatten()),
        }
    }

    fn error(&mut self, yy: &mut Yy<'_, V>, context: &mut C) {
        match self.on_error.as_mut() {
            Some(hook) => hook(yy, context),
            None => log::warn!("Parse error."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_reports_bound_rules() {
        let actions: RuleActions<i64> = RuleActions::new()
            .on(2, |_yy: &mut Yy<'_, i64>, _: &mut (), _| Ok(None))
            .on(5, |_yy: &mut Yy<'_, i64>, _: &mut (), _| Ok(None));
        assert!(actions.has_action(2));
        assert!(actions.has_action(5));
        assert!(!actions.has_action(0));
        assert_eq!(
            format!("{actions:?}"),
            "RuleActions { rules: [2, 5], on_error: false }"
        );
    }
}
