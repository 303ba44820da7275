//! Action — the effect performed when a rule's element is found.

use serde::{Deserialize, Serialize};

/// What to do with a matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Scroll the element into view and dispatch a bubbling click on it.
    Click,
    /// Remove the element, or a related node per [`DeleteMode`].
    Delete,
    /// Halt the runner and disarm auto-resume. Needs no matched element.
    Stop,
}

/// Which node an [`Action::Delete`] rule removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// The matched element itself.
    #[serde(rename = "self")]
    Matched,
    /// The nearest ancestor (self included) matching the rule's
    /// `parent_selector`. No-op when the selector is absent or misses.
    Parent,
    /// Every element matching the rule's `custom_selector`, as a batch.
    Custom,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Click => write!(f, "click"),
            Self::Delete => write!(f, "delete"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

impl std::fmt::Display for DeleteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched => write!(f, "self"),
            Self::Parent => write!(f, "parent"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_actions_with_wire_values() {
        assert_eq!(serde_json::to_string(&Action::Click).unwrap(), "\"CLICK\"");
        assert_eq!(serde_json::to_string(&Action::Delete).unwrap(), "\"DELETE\"");
        assert_eq!(serde_json::to_string(&Action::Stop).unwrap(), "\"STOP\"");
    }

    #[test]
    fn should_serialize_delete_modes_with_wire_values() {
        assert_eq!(
            serde_json::to_string(&DeleteMode::Matched).unwrap(),
            "\"self\""
        );
        assert_eq!(
            serde_json::to_string(&DeleteMode::Parent).unwrap(),
            "\"parent\""
        );
        assert_eq!(
            serde_json::to_string(&DeleteMode::Custom).unwrap(),
            "\"custom\""
        );
    }

    #[test]
    fn should_roundtrip_action_through_serde_json() {
        for action in [Action::Click, Action::Delete, Action::Stop] {
            let json = serde_json::to_string(&action).unwrap();
            let parsed: Action = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, action);
        }
    }

    #[test]
    fn should_display_lowercase_names() {
        assert_eq!(Action::Click.to_string(), "click");
        assert_eq!(DeleteMode::Matched.to_string(), "self");
    }
}
