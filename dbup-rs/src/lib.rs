//! # dbup-rs
//!
//! A linear schema-version migration engine for relational databases.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Enable the `sqlite` or `postgres` feature to get a concrete
//! backend, or implement
//! [`DatabaseBackend`](dbup_rs_backends::DatabaseBackend) for your own.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use dbup_rs::engine::{MigrationRegistry, MigrationStep, Migrator, VersionTableConfig};
//!
//! # #[cfg(feature = "sqlite")]
//! # async fn demo() -> dbup_rs::core::DbupResult<()> {
//! let backend = Arc::new(dbup_rs::backends::SqliteBackend::open("app.db")?);
//!
//! let mut registry = MigrationRegistry::new();
//! registry.insert(
//!     1,
//!     MigrationStep::new()
//!         .with_up(["CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"])
//!         .with_down(["DROP TABLE users"]),
//! )?;
//!
//! let migrator = Migrator::new(backend, registry, &VersionTableConfig::Default).await?;
//! migrator.upgrade(None, None).await?;
//! # Ok(())
//! # }
//! ```

/// Error types and logging setup.
pub use dbup_rs_core as core;

/// The `DatabaseBackend` trait and the SQLite/PostgreSQL drivers.
pub use dbup_rs_backends as backends;

/// The migration engine: version store, registry, naming, and walks.
pub use dbup_rs_engine as engine;
