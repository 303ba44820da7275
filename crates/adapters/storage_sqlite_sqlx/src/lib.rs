//! # autotask-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `ConfigStore` port defined in `autotask-app::ports`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between the persisted JSON document and domain types, decoding
//!   leniently so a corrupted config never blocks startup
//!
//! ## Dependency rule
//! Depends on `autotask-app` (for port traits) and `autotask-domain` (for
//! domain types). The `app` and `domain` crates must never reference this
//! adapter.

mod config_store;
mod error;
mod pool;

pub use config_store::SqliteConfigStore;
pub use error::StorageError;
pub use pool::{Config, Database};
