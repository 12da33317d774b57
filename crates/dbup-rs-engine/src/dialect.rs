//! Version-table SQL generation per database vendor.
//!
//! The [`VersionTableDialect`] trait defines the statements the version
//! store needs: create, seed, select, the dual-write `set`, and rename.
//! Each vendor has its own implementation producing the correct SQL
//! dialect. `set_version` returns `Vec<String>` because the dual write is
//! always at least two statements, and SQLite needs a full table rebuild.
//!
//! Version values are validated non-negative before they reach a dialect,
//! and table names are resolved through [`naming`](crate::naming), so the
//! interpolations here never see untrusted input.

use dbup_rs_core::{DbupError, DbupResult};

use crate::SchemaVersion;

/// Generates version-table SQL for one database vendor.
pub trait VersionTableDialect: Send + Sync {
    /// Returns the vendor this dialect targets.
    fn vendor(&self) -> &'static str;

    /// `CREATE TABLE IF NOT EXISTS` for the version table, with a column
    /// default of 0.
    fn create_version_table(&self, table: &str) -> String;

    /// Inserts the single version row if and only if the table is empty,
    /// letting the column default supply the value.
    fn seed_version_row(&self, table: &str) -> String;

    /// Reads the current version.
    fn select_version(&self, table: &str) -> String;

    /// The dual write: makes both the column default and the row value
    /// equal `version`, so a later re-seed of a tampered-empty table
    /// restores the correct version rather than 0.
    fn set_version(&self, table: &str, version: SchemaVersion) -> Vec<String>;

    /// Renames the version table (used once, for the legacy-to-prefixed
    /// naming migration).
    fn rename_table(&self, old: &str, new: &str) -> String;
}

/// Returns the dialect for a backend vendor string.
///
/// # Errors
///
/// Returns a configuration error for vendors without a dialect.
pub fn dialect_for(vendor: &str) -> DbupResult<&'static dyn VersionTableDialect> {
    match vendor {
        "mysql" => Ok(&MySqlDialect),
        "sqlite" => Ok(&SqliteDialect),
        "postgres" | "postgresql" => Ok(&PostgresDialect),
        other => Err(DbupError::Configuration(format!(
            "no version-table dialect for vendor '{other}'"
        ))),
    }
}

/// MySQL dialect.
///
/// Emits the exact statements the historical tool issued, so an existing
/// installation keeps working against the same table unchanged.
pub struct MySqlDialect;

impl VersionTableDialect for MySqlDialect {
    fn vendor(&self) -> &'static str {
        "mysql"
    }

    fn create_version_table(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {table} ( version INT(10) UNSIGNED DEFAULT 0 PRIMARY KEY)")
    }

    fn seed_version_row(&self, table: &str) -> String {
        format!("INSERT IGNORE INTO {table} VALUES ()")
    }

    fn select_version(&self, table: &str) -> String {
        format!("SELECT version FROM {table} LIMIT 1")
    }

    fn set_version(&self, table: &str, version: SchemaVersion) -> Vec<String> {
        vec![
            format!("ALTER TABLE {table} MODIFY version INT(10) UNSIGNED DEFAULT {version}"),
            format!("UPDATE {table} SET version = {version}"),
        ]
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!("RENAME TABLE {old} TO {new}")
    }
}

/// SQLite dialect.
pub struct SqliteDialect;

impl VersionTableDialect for SqliteDialect {
    fn vendor(&self) -> &'static str {
        "sqlite"
    }

    fn create_version_table(&self, table: &str) -> String {
        // INT rather than INTEGER: an INTEGER PRIMARY KEY is a rowid alias
        // and would ignore the column default on DEFAULT VALUES inserts.
        format!("CREATE TABLE IF NOT EXISTS \"{table}\" (\"version\" INT DEFAULT 0 PRIMARY KEY)")
    }

    fn seed_version_row(&self, table: &str) -> String {
        format!("INSERT OR IGNORE INTO \"{table}\" DEFAULT VALUES")
    }

    fn select_version(&self, table: &str) -> String {
        format!("SELECT \"version\" FROM \"{table}\" LIMIT 1")
    }

    fn set_version(&self, table: &str, version: SchemaVersion) -> Vec<String> {
        // SQLite cannot alter a column default in place, so the one-row
        // table is rebuilt with the new default. The rebuild goes through
        // a shadow table and drops the old one only once the replacement
        // is fully populated: a failure at any point leaves either the
        // old table or a complete new one, never neither. The leading
        // drop clears a shadow table left behind by an earlier failure.
        vec![
            format!("DROP TABLE IF EXISTS \"{table}_new\""),
            format!(
                "CREATE TABLE \"{table}_new\" (\"version\" INT DEFAULT {version} PRIMARY KEY)"
            ),
            format!("INSERT INTO \"{table}_new\" (\"version\") VALUES ({version})"),
            format!("DROP TABLE IF EXISTS \"{table}\""),
            format!("ALTER TABLE \"{table}_new\" RENAME TO \"{table}\""),
        ]
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!("ALTER TABLE \"{old}\" RENAME TO \"{new}\"")
    }
}

/// PostgreSQL dialect.
pub struct PostgresDialect;

impl VersionTableDialect for PostgresDialect {
    fn vendor(&self) -> &'static str {
        "postgresql"
    }

    fn create_version_table(&self, table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS \"{table}\" (\"version\" BIGINT DEFAULT 0 PRIMARY KEY)")
    }

    fn seed_version_row(&self, table: &str) -> String {
        format!("INSERT INTO \"{table}\" DEFAULT VALUES ON CONFLICT DO NOTHING")
    }

    fn select_version(&self, table: &str) -> String {
        format!("SELECT \"version\" FROM \"{table}\" LIMIT 1")
    }

    fn set_version(&self, table: &str, version: SchemaVersion) -> Vec<String> {
        vec![
            format!("ALTER TABLE \"{table}\" ALTER COLUMN \"version\" SET DEFAULT {version}"),
            format!("UPDATE \"{table}\" SET \"version\" = {version}"),
        ]
    }

    fn rename_table(&self, old: &str, new: &str) -> String {
        format!("ALTER TABLE \"{old}\" RENAME TO \"{new}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_for_known_vendors() {
        assert_eq!(dialect_for("mysql").unwrap().vendor(), "mysql");
        assert_eq!(dialect_for("sqlite").unwrap().vendor(), "sqlite");
        assert_eq!(dialect_for("postgresql").unwrap().vendor(), "postgresql");
        assert_eq!(dialect_for("postgres").unwrap().vendor(), "postgresql");
    }

    #[test]
    fn test_dialect_for_unknown_vendor() {
        let err = dialect_for("oracle").err().unwrap();
        assert!(err.to_string().contains("oracle"));
    }

    #[test]
    fn test_mysql_matches_historical_statements() {
        let d = MySqlDialect;
        assert_eq!(
            d.create_version_table("db_version"),
            "CREATE TABLE IF NOT EXISTS db_version ( version INT(10) UNSIGNED DEFAULT 0 PRIMARY KEY)"
        );
        assert_eq!(
            d.seed_version_row("db_version"),
            "INSERT IGNORE INTO db_version VALUES ()"
        );
        assert_eq!(
            d.select_version("db_version"),
            "SELECT version FROM db_version LIMIT 1"
        );
        assert_eq!(
            d.set_version("db_version", 3),
            vec![
                "ALTER TABLE db_version MODIFY version INT(10) UNSIGNED DEFAULT 3".to_string(),
                "UPDATE db_version SET version = 3".to_string(),
            ]
        );
        assert_eq!(
            d.rename_table("old_t", "new_t"),
            "RENAME TABLE old_t TO new_t"
        );
    }

    #[test]
    fn test_sqlite_set_version_rebuilds_through_shadow_table() {
        let statements = SqliteDialect.set_version("db_version", 7);
        assert_eq!(statements.len(), 5);
        assert!(statements[1].contains("\"db_version_new\""));
        assert!(statements[1].contains("DEFAULT 7"));
        assert!(statements[2].contains("VALUES (7)"));
        // The old table survives until the replacement is populated.
        assert_eq!(statements[3], "DROP TABLE IF EXISTS \"db_version\"");
        assert_eq!(
            statements[4],
            "ALTER TABLE \"db_version_new\" RENAME TO \"db_version\""
        );
    }

    #[test]
    fn test_postgres_set_version_is_dual_write() {
        let statements = PostgresDialect.set_version("db_version", 2);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("SET DEFAULT 2"));
        assert!(statements[1].contains("SET \"version\" = 2"));
    }
}
