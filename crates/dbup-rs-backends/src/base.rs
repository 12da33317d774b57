//! Base database backend trait.
//!
//! This module defines the [`DatabaseBackend`] trait that all driver
//! implementations must satisfy. The migration engine treats a backend as
//! an opaque capability: it issues one statement at a time and waits for
//! the outcome; it never retries, pools, or manages the connection
//! lifecycle itself.

use dbup_rs_core::DbupResult;

/// The core trait for database backends.
///
/// All methods are async because database operations are inherently
/// I/O-bound. Backends that use synchronous drivers (like `rusqlite`)
/// wrap operations in `spawn_blocking` to maintain the async interface.
///
/// A failed statement must surface as
/// [`DbupError::Execution`](dbup_rs_core::DbupError::Execution) carrying
/// both the driver's error text and the offending statement.
#[async_trait::async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Returns the vendor name (e.g., "sqlite", "postgresql", "mysql").
    ///
    /// The engine selects its SQL dialect for version-table maintenance
    /// based on this value.
    fn vendor(&self) -> &str;

    /// Executes a SQL statement that does not return rows.
    ///
    /// Returns the number of rows affected.
    async fn execute(&self, sql: &str) -> DbupResult<u64>;

    /// Executes a SQL query and returns the first column of the first
    /// row as an integer, or `None` if the query returned no rows.
    async fn query_scalar(&self, sql: &str) -> DbupResult<Option<i64>>;

    /// Returns whether a table with the given name exists.
    async fn table_exists(&self, table: &str) -> DbupResult<bool>;
}
