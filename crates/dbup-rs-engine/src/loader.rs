//! Registry loading from user-authored migration files.
//!
//! A migration file maps version keys to `{up, down}` entries:
//!
//! ```json
//! {
//!     "1": { "up": "CREATE TABLE users (id INT)", "down": "DROP TABLE users" },
//!     "2": { "up": ["ALTER TABLE users ADD name TEXT", "CREATE INDEX i ON users (name)"] }
//! }
//! ```
//!
//! `up`/`down` accept a single string or a list of strings; both forms
//! are normalized into an ordered `Vec<String>` here, so the engine never
//! special-cases the singular form. JSON and TOML are supported, selected
//! by file extension.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use dbup_rs_core::{DbupError, DbupResult};

use crate::registry::{MigrationRegistry, MigrationStep};

/// A single SQL command or an ordered list of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum SqlCommands {
    Single(String),
    Many(Vec<String>),
}

impl From<SqlCommands> for Vec<String> {
    fn from(commands: SqlCommands) -> Self {
        match commands {
            SqlCommands::Single(sql) => vec![sql],
            SqlCommands::Many(list) => list,
        }
    }
}

/// One file entry, before normalization.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    #[serde(default)]
    up: Option<SqlCommands>,
    #[serde(default)]
    down: Option<SqlCommands>,
}

impl From<RawStep> for MigrationStep {
    fn from(raw: RawStep) -> Self {
        Self {
            up: raw.up.map(Vec::from),
            down: raw.down.map(Vec::from),
        }
    }
}

fn build_registry(raw: BTreeMap<String, RawStep>) -> DbupResult<MigrationRegistry> {
    let mut registry = MigrationRegistry::new();
    for (key, step) in raw {
        let version: i64 = key.parse().map_err(|_| {
            DbupError::Configuration(format!(
                "migration version keys must be positive integers, got '{key}'"
            ))
        })?;
        registry.insert(version, step.into())?;
    }
    Ok(registry)
}

/// Parses a registry from JSON text.
///
/// # Errors
///
/// Returns a configuration error for malformed JSON or non-integer
/// version keys.
pub fn registry_from_json(text: &str) -> DbupResult<MigrationRegistry> {
    let raw: BTreeMap<String, RawStep> = serde_json::from_str(text)
        .map_err(|e| DbupError::Configuration(format!("invalid migration file: {e}")))?;
    build_registry(raw)
}

/// Parses a registry from TOML text.
///
/// # Errors
///
/// Returns a configuration error for malformed TOML or non-integer
/// version keys.
pub fn registry_from_toml(text: &str) -> DbupResult<MigrationRegistry> {
    let raw: BTreeMap<String, RawStep> = toml::from_str(text)
        .map_err(|e| DbupError::Configuration(format!("invalid migration file: {e}")))?;
    build_registry(raw)
}

/// Loads a registry from a `.json` or `.toml` file.
///
/// # Errors
///
/// Returns a configuration error if the file cannot be read, has an
/// unsupported extension, or does not parse.
pub fn registry_from_path(path: impl AsRef<Path>) -> DbupResult<MigrationRegistry> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| {
        DbupError::Configuration(format!("cannot read migration file {}: {e}", path.display()))
    })?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => registry_from_json(&text),
        Some("toml") => registry_from_toml(&text),
        _ => Err(DbupError::Configuration(format!(
            "unsupported migration file extension: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_single_string_is_normalized() {
        let registry = registry_from_json(
            r#"{ "1": { "up": "CREATE TABLE a (x INT)", "down": "DROP TABLE a" } }"#,
        )
        .unwrap();
        assert_eq!(
            registry.up_commands(1),
            Some(&["CREATE TABLE a (x INT)".to_string()][..])
        );
        assert_eq!(
            registry.down_commands(1),
            Some(&["DROP TABLE a".to_string()][..])
        );
    }

    #[test]
    fn test_json_list_form() {
        let registry = registry_from_json(
            r#"{ "2": { "up": ["A", "B"], "down": [] } }"#,
        )
        .unwrap();
        assert_eq!(
            registry.up_commands(2),
            Some(&["A".to_string(), "B".to_string()][..])
        );
        // Present but empty: a legal no-op direction.
        assert_eq!(registry.down_commands(2), Some(&[][..]));
    }

    #[test]
    fn test_json_missing_direction_stays_missing() {
        let registry = registry_from_json(r#"{ "1": { "up": "A" } }"#).unwrap();
        assert_eq!(registry.down_commands(1), None);
    }

    #[test]
    fn test_toml_form() {
        let registry = registry_from_toml(
            "[1]\nup = \"CREATE TABLE a (x INT)\"\ndown = \"DROP TABLE a\"\n\
             [2]\nup = [\"A\", \"B\"]\n",
        )
        .unwrap();
        assert_eq!(registry.latest(), Some(2));
        assert_eq!(
            registry.up_commands(2),
            Some(&["A".to_string(), "B".to_string()][..])
        );
    }

    #[test]
    fn test_non_integer_key_is_rejected() {
        let err = registry_from_json(r#"{ "one": { "up": "A" } }"#).unwrap_err();
        assert!(err.to_string().contains("'one'"));
    }

    #[test]
    fn test_non_positive_key_is_rejected() {
        assert!(registry_from_json(r#"{ "0": { "up": "A" } }"#).is_err());
        assert!(registry_from_json(r#"{ "-2": { "up": "A" } }"#).is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = registry_from_json(r#"{ "1": { "upp": "A" } }"#).unwrap_err();
        assert!(matches!(err, DbupError::Configuration(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = registry_from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, DbupError::Configuration(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = std::env::temp_dir().join("dbup_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("migrations.yaml");
        std::fs::write(&path, "1:\n  up: A\n").unwrap();
        let err = registry_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }
}
