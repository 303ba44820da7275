//! Typed identifiers.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};

/// Unique identifier for a [`Rule`](crate::rule::Rule).
///
/// Ids are creation-time wall-clock milliseconds, bumped monotonically so
/// two rules created within the same millisecond never collide. They
/// serialize as plain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(i64);

static NEXT_RULE_ID: AtomicI64 = AtomicI64::new(0);

impl RuleId {
    /// Allocate the next session-unique identifier.
    #[must_use]
    pub fn next() -> Self {
        let now = crate::time::now().timestamp_millis();
        loop {
            let prev = NEXT_RULE_ID.load(Ordering::Relaxed);
            let id = prev.max(now - 1) + 1;
            if NEXT_RULE_ID
                .compare_exchange(prev, id, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Self(id);
            }
        }
    }

    /// Wrap an existing raw id (e.g. read back from storage).
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// Access the raw integer value.
    #[must_use]
    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RuleId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Unique identifier for a [`DocumentEvent`](crate::event::DocumentEvent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl Default for EventId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl EventId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
