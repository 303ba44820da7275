//! # autotask-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Document` — the live page: query, click, remove, observe, reload
//!   - `ConfigStore` — durable config document and the auto-resume flag
//! - Provide the **core use-cases**:
//!   - `RuleStore` — the shared, ordered rule list
//!   - `wait_for_element` — resolve when a selector matches, or time out
//!   - `execute_rule_action` — the side effect performed on a match
//!   - `TaskRunner` — the cycle scheduler and its state machine
//!   - `ConfigSaver` — debounced persistence with forced flushes
//!   - `generate_selector` — stable CSS paths for arbitrary nodes
//! - Orchestrate domain objects without knowing *how* the page or the
//!   storage is implemented
//!
//! ## Dependency rule
//! Depends on `autotask-domain` only (plus `tokio` for channels and time).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod executor;
pub mod persistence;
pub mod ports;
pub mod rule_store;
pub mod runner;
pub mod selector;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;
