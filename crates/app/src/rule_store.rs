//! Rule store — the ordered, shared list of automation rules.

use std::sync::{Mutex, MutexGuard, PoisonError};

use autotask_domain::error::{AutoTaskError, ValidationError};
use autotask_domain::id::RuleId;
use autotask_domain::rule::{Action, Rule, RuleOptions};

/// Ordered collection of rules, shared between the UI boundary and a
/// running cycle.
///
/// Edits while a cycle is in flight take effect at the next rule boundary:
/// the loop re-reads the live list by index rather than iterating a frozen
/// snapshot.
#[derive(Debug, Default)]
pub struct RuleStore {
    rules: Mutex<Vec<Rule>>,
}

impl RuleStore {
    /// Create a store seeded with `rules` (typically the persisted list).
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules: Mutex::new(rules),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Rule>> {
        self.rules.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a new rule with a fresh session-unique id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptySelector`] for an empty selector.
    #[tracing::instrument(skip(self, options))]
    pub fn add(
        &self,
        action: Action,
        selector: &str,
        options: RuleOptions,
    ) -> Result<Rule, AutoTaskError> {
        if selector.is_empty() {
            return Err(ValidationError::EmptySelector.into());
        }
        let rule = Rule {
            id: RuleId::next(),
            action,
            selector: selector.to_owned(),
            options,
        };
        self.lock().push(rule.clone());
        Ok(rule)
    }

    /// Replace the entry with a matching id in place; its position is
    /// unchanged. Returns `false` (and changes nothing) for an unknown id.
    pub fn update(&self, rule: Rule) -> bool {
        let mut rules = self.lock();
        match rules.iter_mut().find(|existing| existing.id == rule.id) {
            Some(slot) => {
                *slot = rule;
                true
            }
            None => false,
        }
    }

    /// Delete the entry with the given id; no-op when absent.
    pub fn remove(&self, id: RuleId) -> bool {
        let mut rules = self.lock();
        let before = rules.len();
        rules.retain(|rule| rule.id != id);
        rules.len() != before
    }

    /// The rule at `index`, if still present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Rule> {
        self.lock().get(index).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clone the current list; persistence composes this into the config.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Rule> {
        self.lock().clone()
    }

    /// Replace the whole list (e.g. after a config load).
    pub fn replace(&self, rules: Vec<Rule>) {
        *self.lock() = rules;
    }
}
