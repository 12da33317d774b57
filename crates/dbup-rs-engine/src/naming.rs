//! Version-table naming and the one-shot legacy-to-new reconciliation.
//!
//! Historically the version table was named `db_version`, or
//! `md5(namespace)_db_version` when a namespace was configured. The
//! current scheme derives the name from a plain prefix instead
//! (`<prefix>db_version`). [`VersionTableConfig`] captures the four
//! possible configurations as a tagged enum and resolves them to a
//! concrete table name exactly once, at engine construction, performing
//! at most one rename.

use dbup_rs_backends::DatabaseBackend;
use dbup_rs_core::{DbupError, DbupResult};

use crate::dialect::dialect_for;

/// The version-table name used when neither prefix nor namespace is
/// configured.
pub const DEFAULT_VERSION_TABLE: &str = "db_version";

/// How the version-table name is derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionTableConfig {
    /// No options: the fixed default name.
    Default,
    /// Name derived from a prefix: `<prefix>db_version`.
    Prefix(String),
    /// Legacy scheme, kept byte-for-byte compatible for pre-existing
    /// installations: `md5(namespace)_db_version`.
    LegacyNamespace(String),
    /// Both given: adopt the prefixed name, renaming the legacy table to
    /// it if only the legacy table exists. If both tables exist the
    /// configuration is unresolvable and construction fails.
    Migrating {
        /// The legacy namespace whose md5-derived table may still exist.
        namespace: String,
        /// The prefix of the table name to adopt.
        prefix: String,
    },
}

impl VersionTableConfig {
    /// Maps optional `prefix`/`namespace` settings (e.g. CLI flags) onto
    /// the tagged configuration.
    pub fn from_options(prefix: Option<&str>, namespace: Option<&str>) -> Self {
        match (prefix, namespace) {
            (None, None) => Self::Default,
            (Some(p), None) => Self::Prefix(p.to_string()),
            (None, Some(ns)) => Self::LegacyNamespace(ns.to_string()),
            (Some(p), Some(ns)) => Self::Migrating {
                namespace: ns.to_string(),
                prefix: p.to_string(),
            },
        }
    }

    /// The prefix-derived table name.
    pub fn prefixed_table(prefix: &str) -> String {
        format!("{prefix}{DEFAULT_VERSION_TABLE}")
    }

    /// The legacy md5-derived table name.
    pub fn legacy_table(namespace: &str) -> String {
        format!("{:x}_{DEFAULT_VERSION_TABLE}", md5::compute(namespace))
    }

    /// Resolves this configuration to a concrete table name, performing
    /// the legacy-to-new rename when applicable.
    ///
    /// Runs once, before any other engine operation; the result is fixed
    /// for the engine's lifetime.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed prefix, a configuration
    /// error when both the legacy and the new table exist, and a store
    /// error if the rename fails.
    pub async fn resolve(&self, backend: &dyn DatabaseBackend) -> DbupResult<String> {
        match self {
            Self::Default => Ok(DEFAULT_VERSION_TABLE.to_string()),
            Self::Prefix(prefix) => {
                validate_prefix(prefix)?;
                Ok(Self::prefixed_table(prefix))
            }
            Self::LegacyNamespace(namespace) => Ok(Self::legacy_table(namespace)),
            Self::Migrating { namespace, prefix } => {
                validate_prefix(prefix)?;
                let legacy = Self::legacy_table(namespace);
                let new = Self::prefixed_table(prefix);

                let legacy_exists = backend.table_exists(&legacy).await?;
                let new_exists = backend.table_exists(&new).await?;
                match (legacy_exists, new_exists) {
                    (true, true) => Err(DbupError::Configuration(format!(
                        "both version tables {legacy} and {new} exist; \
                         refusing to guess which one is authoritative"
                    ))),
                    (true, false) => {
                        let rename = dialect_for(backend.vendor())?.rename_table(&legacy, &new);
                        backend
                            .execute(&rename)
                            .await
                            .map_err(DbupError::into_store_error)?;
                        tracing::info!("Renamed legacy version table {legacy} to {new}");
                        Ok(new)
                    }
                    // Absent legacy table means a fresh install or an
                    // already-migrated one; either way the new name wins.
                    (false, _) => Ok(new),
                }
            }
        }
    }
}

/// Table names are interpolated into DDL (identifiers cannot be bound
/// parameters), so a prefix must be a plain identifier.
fn validate_prefix(prefix: &str) -> DbupResult<()> {
    if prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DbupError::Validation(format!(
            "version-table prefix '{prefix}' may only contain letters, digits and underscores"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_options_mapping() {
        assert_eq!(
            VersionTableConfig::from_options(None, None),
            VersionTableConfig::Default
        );
        assert_eq!(
            VersionTableConfig::from_options(Some("app_"), None),
            VersionTableConfig::Prefix("app_".into())
        );
        assert_eq!(
            VersionTableConfig::from_options(None, Some("myapp")),
            VersionTableConfig::LegacyNamespace("myapp".into())
        );
        assert_eq!(
            VersionTableConfig::from_options(Some("app_"), Some("myapp")),
            VersionTableConfig::Migrating {
                namespace: "myapp".into(),
                prefix: "app_".into()
            }
        );
    }

    #[test]
    fn test_prefixed_table() {
        assert_eq!(VersionTableConfig::prefixed_table("app_"), "app_db_version");
    }

    #[test]
    fn test_legacy_table_matches_historical_hash() {
        // md5("myapp") as the original computed it.
        assert_eq!(
            VersionTableConfig::legacy_table("myapp"),
            "8358a413eaf73ed74c998b8a083871af_db_version"
        );
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("app_1").is_ok());
        assert!(validate_prefix("").is_ok());
        assert!(validate_prefix("bad; DROP TABLE x;--").is_err());
        assert!(validate_prefix("no spaces").is_err());
    }
}
