//! Advisory migration lock.
//!
//! Two engines racing against the same version table can interleave
//! destructively (a read-modify-write race on the version, or duplicate
//! application of a step). The opt-in [`AdvisoryLock`] claims a
//! `<version_table>_lock` table with a single primary-key row for the
//! duration of a walk; a second claimant's insert hits the primary key
//! and fails, so only one migrator proceeds. The engine releases the
//! lock on every exit path, including error paths.

use dbup_rs_backends::DatabaseBackend;
use dbup_rs_core::{DbupError, DbupResult};

/// A held-row advisory lock alongside a version table.
#[derive(Debug, Clone)]
pub struct AdvisoryLock {
    table: String,
}

impl AdvisoryLock {
    /// Creates the lock paired with the given version table.
    pub fn for_version_table(version_table: &str) -> Self {
        Self {
            table: format!("{version_table}_lock"),
        }
    }

    /// Returns the lock-table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Claims the lock.
    ///
    /// # Errors
    ///
    /// Returns an operational error if another migrator already holds the
    /// lock, and a store error if the lock table cannot be created.
    pub async fn acquire(&self, backend: &dyn DatabaseBackend) -> DbupResult<()> {
        backend
            .execute(&format!(
                "CREATE TABLE IF NOT EXISTS {} (locked INT PRIMARY KEY)",
                self.table
            ))
            .await
            .map_err(DbupError::into_store_error)?;
        backend
            .execute(&format!("INSERT INTO {} (locked) VALUES (1)", self.table))
            .await
            .map_err(|e| {
                DbupError::Operational(format!(
                    "migration lock {} is held by another migrator, or could not be claimed: {e}",
                    self.table
                ))
            })?;
        Ok(())
    }

    /// Releases the lock.
    pub async fn release(&self, backend: &dyn DatabaseBackend) -> DbupResult<()> {
        backend
            .execute(&format!("DELETE FROM {}", self.table))
            .await
            .map_err(DbupError::into_store_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbup_rs_backends::SqliteBackend;

    #[tokio::test]
    async fn test_acquire_release_cycle() {
        let backend = SqliteBackend::memory().unwrap();
        let lock = AdvisoryLock::for_version_table("db_version");
        assert_eq!(lock.table(), "db_version_lock");

        lock.acquire(&backend).await.unwrap();
        lock.release(&backend).await.unwrap();
        // Reacquirable after release.
        lock.acquire(&backend).await.unwrap();
    }

    #[tokio::test]
    async fn test_second_acquire_fails_while_held() {
        let backend = SqliteBackend::memory().unwrap();
        let lock = AdvisoryLock::for_version_table("db_version");
        lock.acquire(&backend).await.unwrap();

        let err = lock.acquire(&backend).await.unwrap_err();
        assert!(matches!(err, DbupError::Operational(_)));
        assert!(err.to_string().contains("db_version_lock"));
        // The driver's own error text is preserved for diagnosis.
        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }
}
