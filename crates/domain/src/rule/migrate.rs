//! Migration of legacy persisted rule shapes.
//!
//! Early versions stored bare selector strings; later ones stored objects
//! that may miss fields. [`migrate`] converts any mix of those into
//! well-formed [`Rule`]s without ever failing.

use serde::{Deserialize, Serialize};

use super::{Action, Rule, RuleOptions};
use crate::id::RuleId;

/// A rule as it may appear in persisted JSON, legacy shapes included.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawRule {
    /// Legacy: a bare selector string, implying a CLICK rule.
    Selector(String),
    /// Object shape, with any subset of fields present.
    Entry(RawRuleEntry),
}

/// The object shape of a persisted rule with every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRuleEntry {
    pub id: Option<i64>,
    pub action: Option<Action>,
    pub selector: Option<String>,
    pub options: Option<RuleOptions>,
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        Self::Entry(RawRuleEntry {
            id: Some(rule.id.as_i64()),
            action: Some(rule.action),
            selector: Some(rule.selector),
            options: Some(rule.options),
        })
    }
}

/// Convert raw persisted rules into well-formed rules, preserving order.
///
/// Ids already present are kept. Missing ids are assigned deterministically
/// as base-timestamp + index, so migrating many legacy entries at once
/// cannot collide. Re-migrating well-formed rules changes nothing.
#[must_use]
pub fn migrate(raw: Vec<RawRule>) -> Vec<Rule> {
    let mut fallback_id = crate::time::now().timestamp_millis();
    raw.into_iter()
        .map(|entry| {
            let assigned = fallback_id;
            fallback_id += 1;
            match entry {
                RawRule::Selector(selector) => Rule {
                    id: RuleId::from_raw(assigned),
                    action: Action::Click,
                    selector,
                    options: RuleOptions::default(),
                },
                RawRule::Entry(entry) => Rule {
                    id: entry.id.map_or(RuleId::from_raw(assigned), RuleId::from_raw),
                    action: entry.action.unwrap_or(Action::Click),
                    selector: entry.selector.unwrap_or_default(),
                    options: entry.options.unwrap_or_default(),
                },
            }
        })
        .collect()
}
