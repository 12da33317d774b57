//! # dbup-rs-engine
//!
//! The migration engine for dbup-rs. Tracks the single integer schema
//! version of a database in a durable version table and walks an ordered
//! registry of migration steps to move the database between versions.
//!
//! ## Module Overview
//!
//! - [`naming`] - `VersionTableConfig`, the one-shot version-table naming
//!   resolution (including the legacy `md5(namespace)` scheme)
//! - [`dialect`] - `VersionTableDialect` and the MySQL/SQLite/PostgreSQL
//!   implementations for version-table SQL
//! - [`store`] - `VersionStore`, durable single-row storage of the version
//! - [`registry`] - `MigrationRegistry` and `MigrationStep`
//! - [`loader`] - registry loading from JSON/TOML files
//! - [`lock`] - the opt-in advisory migration lock
//! - [`engine`] - `Migrator`, the upgrade/downgrade walks, `CancelToken`
//!
//! ## Control flow
//!
//! A [`Migrator`] is constructed from an injected backend, a registry, and
//! a [`VersionTableConfig`]; construction resolves the version-table name
//! once (performing at most one legacy-to-new rename). `upgrade` and
//! `downgrade` then walk the registry one version at a time, executing
//! each step's commands in order and durably recording the new version
//! after every fully applied step.

#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]

pub mod dialect;
pub mod engine;
pub mod loader;
pub mod lock;
pub mod naming;
pub mod registry;
pub mod store;

/// The database's current migration level: a non-negative integer.
///
/// Kept as `i64` so that out-of-range inputs (a negative `set` target,
/// a `downgrade` floor of `-1`) are representable and rejected at runtime
/// with a validation error instead of failing to parse.
pub type SchemaVersion = i64;

// Re-export key types at the crate root.
pub use engine::{CancelToken, Migrator};
pub use loader::{registry_from_json, registry_from_path, registry_from_toml};
pub use lock::AdvisoryLock;
pub use naming::{VersionTableConfig, DEFAULT_VERSION_TABLE};
pub use registry::{MigrationRegistry, MigrationStep};
pub use store::VersionStore;
