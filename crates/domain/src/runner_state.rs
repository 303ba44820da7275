//! Ephemeral runner state observed by the UI boundary.
//!
//! Created at process start with defaults and mutated exclusively by the
//! scheduler and the explicit start/stop entry points. Never persisted —
//! the auto-resume intent is stored separately as the autorun flag.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Running,
    Stopped,
    /// Armed for auto-resume, waiting for the page to finish loading.
    Waiting,
}

/// Per-rule highlight phase surfaced while a cycle is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    #[default]
    Idle,
    /// The rule's element wait is in progress.
    Waiting,
    /// The rule's action just executed.
    Success,
}

/// Process-wide runner state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerState {
    /// The cycle loop is in flight.
    pub is_running: bool,
    /// Armed for a flag-driven auto-start that has not happened yet.
    pub is_auto_run: bool,
    pub status: Status,
    /// Index of the rule currently being processed, for UI highlighting.
    pub highlighted_rule_index: Option<usize>,
    pub highlight: Highlight,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Waiting => write!(f, "waiting"),
        }
    }
}
