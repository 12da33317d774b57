//! Durable single-row storage of the schema version.
//!
//! The [`VersionStore`] owns all reads and writes of the persisted
//! version under one resolved table name. Its subtlest contract is the
//! dual write in [`VersionStore::set`]: both the row value and the
//! column default must reflect the new version, so that a later
//! [`VersionStore::ensure`] on a table whose row was wiped externally
//! re-seeds to the last set version instead of silently resetting to 0.

use dbup_rs_backends::DatabaseBackend;
use dbup_rs_core::{DbupError, DbupResult};

use crate::dialect::{dialect_for, VersionTableDialect};
use crate::SchemaVersion;

/// Persists and retrieves the schema version under a fixed table name.
#[derive(Debug, Clone)]
pub struct VersionStore {
    table: String,
}

impl VersionStore {
    /// Creates a store over the given (already resolved) table name.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Returns the version-table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    fn dialect(&self, backend: &dyn DatabaseBackend) -> DbupResult<&'static dyn VersionTableDialect> {
        dialect_for(backend.vendor())
    }

    /// Idempotently guarantees the version table exists and holds
    /// exactly one row.
    ///
    /// A fresh table starts at version 0 via the column default; repeat
    /// calls never clobber an existing value.
    pub async fn ensure(&self, backend: &dyn DatabaseBackend) -> DbupResult<()> {
        let dialect = self.dialect(backend)?;
        backend
            .execute(&dialect.create_version_table(&self.table))
            .await
            .map_err(DbupError::into_store_error)?;
        backend
            .execute(&dialect.seed_version_row(&self.table))
            .await
            .map_err(DbupError::into_store_error)?;
        Ok(())
    }

    /// Returns the current version, ensuring the table first.
    ///
    /// # Errors
    ///
    /// Returns a store error if no row is retrievable even after
    /// [`VersionStore::ensure`], which indicates an unexpected external
    /// mutation.
    pub async fn get(&self, backend: &dyn DatabaseBackend) -> DbupResult<SchemaVersion> {
        self.ensure(backend).await?;
        let dialect = self.dialect(backend)?;
        let version = backend
            .query_scalar(&dialect.select_version(&self.table))
            .await
            .map_err(DbupError::into_store_error)?;
        version.ok_or_else(|| {
            DbupError::Store(format!("Still don't have an entry in {}", self.table))
        })
    }

    /// Durably persists `version`, updating both the row and the column
    /// default.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a negative version, and a store
    /// error if any of the writes fail.
    pub async fn set(&self, backend: &dyn DatabaseBackend, version: SchemaVersion) -> DbupResult<()> {
        if version < 0 {
            return Err(DbupError::Validation(
                "Versions must be positive integers".to_string(),
            ));
        }
        self.ensure(backend).await?;
        let dialect = self.dialect(backend)?;
        for sql in dialect.set_version(&self.table, version) {
            backend
                .execute(&sql)
                .await
                .map_err(DbupError::into_store_error)?;
        }
        Ok(())
    }
}
