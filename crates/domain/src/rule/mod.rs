//! Rule — one user-authored automation step.
//!
//! A rule names a CSS selector, the [`Action`] to perform on the element
//! that matches it, and per-rule switches in [`RuleOptions`]. Rules are
//! ordered: their position in the list defines execution order within a
//! cycle, and that order survives persistence round-trips.

mod action;
mod migrate;

pub use action::{Action, DeleteMode};
pub use migrate::{RawRule, RawRuleEntry, migrate};

use serde::{Deserialize, Serialize};

use crate::error::{AutoTaskError, ValidationError};
use crate::id::RuleId;

/// One automation step: wait for `selector`, then perform `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub action: Action,
    pub selector: String,
    #[serde(default)]
    pub options: RuleOptions,
}

/// Per-rule behavior switches.
///
/// The serialized field names keep the persisted wire format stable
/// (`ignoreWait`, `deleteActionType`, `parentSelector`, `customSelector`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuleOptions {
    /// Treat absence of the element as a skip rather than a failure.
    pub ignore_wait: bool,
    /// Which node a DELETE removes. Absent behaves like [`DeleteMode::Matched`].
    #[serde(rename = "deleteActionType", skip_serializing_if = "Option::is_none")]
    pub delete_mode: Option<DeleteMode>,
    /// Ancestor selector used by [`DeleteMode::Parent`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_selector: Option<String>,
    /// Batch selector used by [`DeleteMode::Custom`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_selector: Option<String>,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Validation`] when `selector` is empty
    /// ([`ValidationError::EmptySelector`]).
    pub fn validate(&self) -> Result<(), AutoTaskError> {
        if self.selector.is_empty() {
            return Err(ValidationError::EmptySelector.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    action: Option<Action>,
    selector: Option<String>,
    options: RuleOptions,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub fn selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn ignore_wait(mut self, ignore_wait: bool) -> Self {
        self.options.ignore_wait = ignore_wait;
        self
    }

    #[must_use]
    pub fn delete_mode(mut self, mode: DeleteMode) -> Self {
        self.options.delete_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn parent_selector(mut self, selector: impl Into<String>) -> Self {
        self.options.parent_selector = Some(selector.into());
        self
    }

    #[must_use]
    pub fn custom_selector(mut self, selector: impl Into<String>) -> Self {
        self.options.custom_selector = Some(selector.into());
        self
    }

    /// Consume the builder, validate, and return a [`Rule`].
    ///
    /// A fresh session-unique id is allocated when none was provided.
    ///
    /// # Errors
    ///
    /// Returns [`AutoTaskError::Validation`] if the selector is missing or
    /// empty.
    pub fn build(self) -> Result<Rule, AutoTaskError> {
        let rule = Rule {
            id: self.id.unwrap_or_else(RuleId::next),
            action: self.action.unwrap_or(Action::Click),
            selector: self.selector.unwrap_or_default(),
            options: self.options,
        };
        rule.validate()?;
        Ok(rule)
    }
}
