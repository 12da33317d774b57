//! SQLite database backend using `rusqlite`.
//!
//! This module provides the [`SqliteBackend`] which implements the
//! [`DatabaseBackend`](crate::base::DatabaseBackend) trait using `rusqlite`
//! wrapped in `tokio::task::spawn_blocking` for async compatibility.
//!
//! In-memory databases (`:memory:`) are supported, which the test suites
//! rely on heavily.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::base::DatabaseBackend;
use dbup_rs_core::{DbupError, DbupResult};

/// A SQLite database backend.
///
/// Uses `rusqlite` for database access with a `Mutex`-based concurrency
/// model. All operations are run via `tokio::task::spawn_blocking` to
/// avoid blocking the async runtime.
pub struct SqliteBackend {
    /// The path to the database file (or ":memory:").
    path: PathBuf,
    /// The connection, guarded by an async mutex.
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteBackend {
    /// Opens a new SQLite database at the given path.
    ///
    /// If the path is `:memory:`, an in-memory database is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl Into<PathBuf>) -> DbupResult<Self> {
        let path = path.into();
        let conn = if path.to_str() == Some(":memory:") {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&path)
        }
        .map_err(|e| DbupError::Operational(format!("SQLite open failed: {e}")))?;

        Ok(Self {
            path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory database (convenience constructor).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn memory() -> DbupResult<Self> {
        Self::open(":memory:")
    }

    /// Returns the database file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Runs a closure against the connection on a blocking task.
    async fn with_conn<T, F>(&self, f: F) -> DbupResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> DbupResult<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            f(&conn)
        })
        .await
        .map_err(|e| DbupError::Operational(format!("Task join error: {e}")))?
    }
}

#[async_trait::async_trait]
impl DatabaseBackend for SqliteBackend {
    fn vendor(&self) -> &str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> DbupResult<u64> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            let count = conn
                .execute(&sql, [])
                .map_err(|e| DbupError::execution(sql.as_str(), e))?;
            Ok(count as u64)
        })
        .await
    }

    async fn query_scalar(&self, sql: &str) -> DbupResult<Option<i64>> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| DbupError::execution(sql.as_str(), e))?;
            let mut rows = stmt.query([]).map_err(|e| DbupError::execution(sql.as_str(), e))?;
            match rows.next().map_err(|e| DbupError::execution(sql.as_str(), e))? {
                Some(row) => {
                    let value: i64 = row.get(0).map_err(|e| DbupError::execution(sql.as_str(), e))?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn table_exists(&self, table: &str) -> DbupResult<bool> {
        let table = table.to_string();
        self.with_conn(move |conn| {
            let sql = "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1";
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| DbupError::execution(sql, e))?;
            stmt.exists([&table])
                .map_err(|e| DbupError::execution(sql, e))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_memory_open() {
        let backend = SqliteBackend::memory().unwrap();
        assert_eq!(backend.vendor(), "sqlite");
    }

    #[tokio::test]
    async fn test_sqlite_execute_and_query_scalar() {
        let backend = SqliteBackend::memory().unwrap();
        backend
            .execute("CREATE TABLE t (n INT DEFAULT 0 PRIMARY KEY)")
            .await
            .unwrap();
        backend.execute("INSERT INTO t (n) VALUES (42)").await.unwrap();
        let value = backend.query_scalar("SELECT n FROM t LIMIT 1").await.unwrap();
        assert_eq!(value, Some(42));
    }

    #[tokio::test]
    async fn test_sqlite_query_scalar_no_rows() {
        let backend = SqliteBackend::memory().unwrap();
        backend
            .execute("CREATE TABLE t (n INT DEFAULT 0 PRIMARY KEY)")
            .await
            .unwrap();
        let value = backend.query_scalar("SELECT n FROM t LIMIT 1").await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn test_sqlite_table_exists() {
        let backend = SqliteBackend::memory().unwrap();
        assert!(!backend.table_exists("t").await.unwrap());
        backend
            .execute("CREATE TABLE t (n INT DEFAULT 0 PRIMARY KEY)")
            .await
            .unwrap();
        assert!(backend.table_exists("t").await.unwrap());
    }

    #[tokio::test]
    async fn test_sqlite_execution_error_carries_statement() {
        let backend = SqliteBackend::memory().unwrap();
        let err = backend
            .execute("DROP TABLE definitely_missing")
            .await
            .unwrap_err();
        match err {
            DbupError::Execution { statement, .. } => {
                assert_eq!(statement, "DROP TABLE definitely_missing");
            }
            other => panic!("expected execution error, got {other}"),
        }
    }
}
