//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`AutoTaskError`] at the boundary: adapters box their error enums into
//! the [`AutoTaskError::Storage`] or [`AutoTaskError::Document`] variants.

use std::error::Error as StdError;

/// Top-level error for the autotask workspace.
#[derive(Debug, thiserror::Error)]
pub enum AutoTaskError {
    /// A rule failed invariant checks.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The persistence layer failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn StdError + Send + Sync>),

    /// The document boundary failed (e.g. a malformed selector).
    #[error("document error")]
    Document(#[source] Box<dyn StdError + Send + Sync>),
}

impl AutoTaskError {
    /// Wrap an adapter error as a storage failure.
    pub fn storage(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Storage(Box::new(err))
    }

    /// Wrap an adapter error as a document failure.
    pub fn document(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Document(Box::new(err))
    }
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A rule selector must not be empty.
    #[error("rule selector must not be empty")]
    EmptySelector,
}
