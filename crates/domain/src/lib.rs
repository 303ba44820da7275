//! # autotask-domain
//!
//! Pure domain model for the autotask page automation runner.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Rules** (one automation step: selector + action + options)
//! - Define the persisted **Config** (delays, panel placement, rule list)
//! - Define the ephemeral **RunnerState** observed by the UI boundary
//! - Define **DocumentEvents** (change notifications from the page boundary)
//! - Contain all invariant enforcement and legacy-format migration
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod config;
pub mod event;
pub mod rule;
pub mod runner_state;
