//! Document events — change notifications from the page boundary.
//!
//! The wait primitive re-checks its selector on every notification; it
//! never inspects the payload, so kinds stay deliberately coarse.

use serde::{Deserialize, Serialize};

use crate::id::EventId;
use crate::time::Timestamp;

/// What changed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentEventKind {
    /// Nodes were added somewhere under the body.
    NodesAdded,
    /// Nodes were removed somewhere under the body.
    NodesRemoved,
    /// A full page navigation (reload) was triggered.
    Navigated,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub id: EventId,
    pub kind: DocumentEventKind,
    pub at: Timestamp,
}

impl DocumentEvent {
    /// Create a new event stamped with the current time.
    #[must_use]
    pub fn new(kind: DocumentEventKind) -> Self {
        Self {
            id: EventId::new(),
            kind,
            at: crate::time::now(),
        }
    }
}
