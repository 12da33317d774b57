//! # dbup-rs-backends
//!
//! Database backends for dbup-rs. The [`DatabaseBackend`] trait is the
//! SQL-executor capability the migration engine depends on; the concrete
//! drivers are feature-gated:
//!
//! - `sqlite` — [`SqliteBackend`] over `rusqlite`
//! - `postgres` — [`PostgresBackend`] over `tokio-postgres`/`deadpool-postgres`

pub mod base;
#[cfg(feature = "postgres")]
pub mod postgresql;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use base::DatabaseBackend;
#[cfg(feature = "postgres")]
pub use postgresql::PostgresBackend;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
