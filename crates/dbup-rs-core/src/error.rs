//! Error types for dbup-rs.
//!
//! The taxonomy deliberately separates hard failures (anything that leaves
//! the caller unsure where the persisted schema version ended up) from
//! controlled outcomes: the migration engine reports "nothing to do" and
//! "cannot proceed, state is consistent" through its `bool` return value,
//! never through [`DbupError`].

use thiserror::Error;

/// The primary error type for dbup-rs.
#[derive(Error, Debug)]
pub enum DbupError {
    /// The caller-supplied configuration is unusable: an empty migration
    /// registry, a malformed registry file, or conflicting legacy and
    /// prefixed version tables both present in the database.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A supplied value failed validation, e.g. a negative schema version
    /// or a version-table prefix that is not a plain identifier.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The version table could not be created, read, or written, or was
    /// unexpectedly empty after being ensured.
    #[error("Version store error: {0}")]
    Store(String),

    /// A migration command failed against the database. Carries the
    /// driver's error text and the offending statement for diagnostics.
    #[error("Execution error: {message} (statement: {statement})")]
    Execution {
        /// The SQL statement that failed.
        statement: String,
        /// The driver's error text.
        message: String,
    },

    /// A driver-level failure outside any specific statement, such as a
    /// connection that could not be opened.
    #[error("Operational error: {0}")]
    Operational(String),
}

impl DbupError {
    /// Creates an [`DbupError::Execution`] from a statement and a driver error.
    pub fn execution(statement: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Execution {
            statement: statement.into(),
            message: message.to_string(),
        }
    }

    /// Re-labels this error as a version-store failure.
    ///
    /// The store funnels backend errors through here so that a broken
    /// version table surfaces as [`DbupError::Store`] rather than as a
    /// migration-statement failure.
    #[must_use]
    pub fn into_store_error(self) -> Self {
        match self {
            Self::Store(_) => self,
            other => Self::Store(other.to_string()),
        }
    }
}

/// A convenience type alias for `Result<T, DbupError>`.
pub type DbupResult<T> = Result<T, DbupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_error_carries_statement() {
        let err = DbupError::execution("DROP TABLE users", "no such table: users");
        let text = err.to_string();
        assert!(text.contains("no such table: users"));
        assert!(text.contains("DROP TABLE users"));
    }

    #[test]
    fn test_into_store_error_wraps_message() {
        let err = DbupError::execution("SELECT version FROM db_version", "gone");
        let store = err.into_store_error();
        assert!(matches!(store, DbupError::Store(_)));
        assert!(store.to_string().contains("SELECT version FROM db_version"));
    }

    #[test]
    fn test_into_store_error_is_idempotent() {
        let err = DbupError::Store("broken".into());
        let store = err.into_store_error();
        assert_eq!(store.to_string(), "Version store error: broken");
    }

    #[test]
    fn test_display_variants() {
        assert_eq!(
            DbupError::Configuration("empty registry".into()).to_string(),
            "Configuration error: empty registry"
        );
        assert_eq!(
            DbupError::Validation("negative version".into()).to_string(),
            "Validation error: negative version"
        );
        assert_eq!(
            DbupError::Operational("connect refused".into()).to_string(),
            "Operational error: connect refused"
        );
    }
}
