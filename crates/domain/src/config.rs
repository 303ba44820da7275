//! Persisted configuration — delays, panel placement, and the rule list.
//!
//! The serialized shape keeps the original wire format: camelCase keys and
//! the rule list under `selectors`. Loading is lossy by design: malformed
//! or missing fields fall back to defaults one by one, and legacy rule
//! shapes are migrated (see [`crate::rule::migrate`]). A config load never
//! fails.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rule::{RawRule, Rule, migrate};

/// Tunable settings persisted alongside the rule list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether the control panel is shown.
    pub visible: bool,
    /// Pause between full passes over the rule list, in milliseconds.
    #[serde(rename = "cycleDelay")]
    pub cycle_delay_ms: u64,
    /// Panel placement.
    pub position: Position,
    /// Pause between consecutive rules, in milliseconds.
    #[serde(rename = "stepDelay")]
    pub step_delay_ms: u64,
    /// How long a rule waits for its element, in milliseconds.
    #[serde(rename = "waitDelay")]
    pub wait_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            visible: false,
            cycle_delay_ms: 1000,
            position: Position::default(),
            step_delay_ms: 150,
            wait_delay_ms: 5000,
        }
    }
}

impl Settings {
    /// Pause between consecutive rules.
    #[must_use]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Timeout for the element wait.
    #[must_use]
    pub fn wait_delay(&self) -> Duration {
        Duration::from_millis(self.wait_delay_ms)
    }

    /// Pause between full passes over the rule list.
    #[must_use]
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }
}

/// Panel placement. `left` wins when both horizontal offsets are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub top: i32,
    pub left: Option<i32>,
    pub right: Option<i32>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            top: 10,
            left: Some(10),
            right: None,
        }
    }
}

/// The full persisted document: settings plus the ordered rule list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub settings: Settings,
    #[serde(rename = "selectors")]
    pub rules: Vec<Rule>,
}

impl Config {
    /// Assemble a config from runtime parts.
    #[must_use]
    pub fn new(settings: Settings, rules: Vec<Rule>) -> Self {
        Self { settings, rules }
    }

    /// Decode persisted JSON, tolerating missing fields, wrong value types,
    /// unparseable rule entries, and legacy rule shapes. Never fails;
    /// unusable input yields defaults.
    #[must_use]
    pub fn from_json_lossy(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(value) => Self::from_value_lossy(&value),
            Err(_) => Self::default(),
        }
    }

    fn from_value_lossy(value: &Value) -> Self {
        let defaults = Settings::default();
        let settings = Settings {
            visible: value
                .get("visible")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.visible),
            cycle_delay_ms: value
                .get("cycleDelay")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.cycle_delay_ms),
            position: value
                .get("position")
                .and_then(|position| serde_json::from_value(position.clone()).ok())
                .unwrap_or(defaults.position),
            step_delay_ms: value
                .get("stepDelay")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.step_delay_ms),
            wait_delay_ms: value
                .get("waitDelay")
                .and_then(Value::as_u64)
                .unwrap_or(defaults.wait_delay_ms),
        };

        let raw_rules: Vec<RawRule> = value
            .get("selectors")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            settings,
            rules: migrate(raw_rules),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Action;

    #[test]
    fn should_produce_original_defaults() {
        let config = Config::default();
        assert!(!config.settings.visible);
        assert_eq!(config.settings.step_delay_ms, 150);
        assert_eq!(config.settings.wait_delay_ms, 5000);
        assert_eq!(config.settings.cycle_delay_ms, 1000);
        assert_eq!(config.settings.position.top, 10);
        assert_eq!(config.settings.position.left, Some(10));
        assert_eq!(config.settings.position.right, None);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn should_expose_delays_as_durations() {
        let settings = Settings::default();
        assert_eq!(settings.step_delay(), Duration::from_millis(150));
        assert_eq!(settings.wait_delay(), Duration::from_millis(5000));
        assert_eq!(settings.cycle_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn should_serialize_with_camel_case_wire_keys() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert!(json.get("stepDelay").is_some());
        assert!(json.get("waitDelay").is_some());
        assert!(json.get("cycleDelay").is_some());
        assert!(json.get("selectors").is_some());
    }

    #[test]
    fn should_fall_back_to_defaults_on_malformed_json() {
        let config = Config::from_json_lossy("not json at all {{{");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn should_keep_known_fields_and_default_the_rest() {
        let config = Config::from_json_lossy(r#"{"stepDelay": 50, "visible": true}"#);
        assert_eq!(config.settings.step_delay_ms, 50);
        assert!(config.settings.visible);
        assert_eq!(config.settings.wait_delay_ms, 5000);
    }

    #[test]
    fn should_default_fields_with_wrong_types() {
        let config = Config::from_json_lossy(r#"{"stepDelay": "fast", "cycleDelay": -3}"#);
        assert_eq!(config.settings.step_delay_ms, 150);
        assert_eq!(config.settings.cycle_delay_ms, 1000);
    }

    #[test]
    fn should_migrate_legacy_selector_strings_in_rule_list() {
        let config = Config::from_json_lossy(r##"{"selectors": ["#a", ".b"]}"##);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].selector, "#a");
        assert_eq!(config.rules[0].action, Action::Click);
        assert_ne!(config.rules[0].id, config.rules[1].id);
    }

    #[test]
    fn should_skip_unusable_rule_entries() {
        let config = Config::from_json_lossy(r##"{"selectors": ["#a", 42, null, ".b"]}"##);
        assert_eq!(config.rules.len(), 2);
    }

    #[test]
    fn should_roundtrip_config_with_rules_preserving_order() {
        let rules = vec![
            Rule::builder().selector("#first").build().unwrap(),
            Rule::builder()
                .selector("#second")
                .action(Action::Stop)
                .build()
                .unwrap(),
        ];
        let config = Config::new(Settings::default(), rules);
        let json = serde_json::to_string(&config).unwrap();
        let parsed = Config::from_json_lossy(&json);
        assert_eq!(parsed, config);
    }
}
