//! # dbup-rs-cli
//!
//! The `dbup` command-line front end. A thin shell over
//! [`dbup_rs_engine::Migrator`]: it parses `up`/`down`/`set <n>`/`status`
//! invocations, loads the user-authored migration file, opens a backend,
//! and prints outcomes. Any propagated error is printed with an `[ERR]`
//! prefix and turns into a non-zero process exit; controlled aborts
//! ("nothing to do", a registry gap) report through log output and exit
//! zero.

use std::sync::Arc;

use dbup_rs_backends::DatabaseBackend;
use dbup_rs_core::{DbupError, DbupResult};
use dbup_rs_engine::{
    registry_from_path, MigrationRegistry, Migrator, SchemaVersion, VersionTableConfig,
};

/// Builds the `dbup` command-line interface.
pub fn cli() -> clap::Command {
    let from_arg = clap::Arg::new("from")
        .long("from")
        .value_name("VERSION")
        .help("Treat the database as being at this version instead of reading the version table");
    let to_arg = clap::Arg::new("to")
        .long("to")
        .value_name("VERSION")
        .help("Target version");

    clap::Command::new("dbup")
        .about("Linear schema-version migration tool")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            clap::Arg::new("database")
                .long("database")
                .value_name("PATH_OR_URL")
                .required(true)
                .help("SQLite file path or postgres:// connection URL"),
        )
        .arg(
            clap::Arg::new("migrations")
                .long("migrations")
                .value_name("FILE")
                .help("Migration file (.json or .toml) mapping versions to up/down SQL"),
        )
        .arg(
            clap::Arg::new("prefix")
                .long("prefix")
                .value_name("PREFIX")
                .help("Version-table name prefix (<prefix>db_version)"),
        )
        .arg(
            clap::Arg::new("namespace")
                .long("namespace")
                .value_name("NAMESPACE")
                .help("Legacy namespace (md5-derived version-table name)"),
        )
        .arg(
            clap::Arg::new("lock")
                .long("lock")
                .action(clap::ArgAction::SetTrue)
                .help("Hold an advisory lock for the duration of the migration"),
        )
        .arg(
            clap::Arg::new("log-level")
                .long("log-level")
                .default_value("info")
                .help("Log level filter"),
        )
        .subcommand(
            clap::Command::new("up")
                .about("Upgrade to the latest (or a given) version")
                .arg(from_arg.clone())
                .arg(to_arg.clone()),
        )
        .subcommand(
            clap::Command::new("down")
                .about("Downgrade one step (or to a given version)")
                .arg(from_arg)
                .arg(to_arg),
        )
        .subcommand(
            clap::Command::new("set")
                .about("Force the stored schema version without executing any migrations")
                .arg(
                    clap::Arg::new("version")
                        .value_name("VERSION")
                        .required(true),
                ),
        )
        .subcommand(clap::Command::new("status").about("Print the stored schema version"))
}

/// Executes a parsed `dbup` invocation.
pub async fn run(matches: &clap::ArgMatches) -> DbupResult<()> {
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    dbup_rs_core::logging::setup_logging(level);

    let database = matches
        .get_one::<String>("database")
        .ok_or_else(|| DbupError::Configuration("--database is required".to_string()))?;
    let registry = match matches.get_one::<String>("migrations") {
        Some(path) => registry_from_path(path)?,
        None => MigrationRegistry::new(),
    };
    let naming = VersionTableConfig::from_options(
        matches.get_one::<String>("prefix").map(String::as_str),
        matches.get_one::<String>("namespace").map(String::as_str),
    );

    let backend = open_backend(database)?;
    let mut migrator = Migrator::new(backend, registry, &naming).await?;
    if matches.get_flag("lock") {
        migrator = migrator.with_advisory_lock();
    }

    match matches.subcommand() {
        Some(("up", sub)) => {
            let reached = migrator
                .upgrade(version_opt(sub, "from")?, version_opt(sub, "to")?)
                .await?;
            if reached {
                println!(
                    "Database is now at schema version v.{}",
                    migrator.current_version().await?
                );
            }
            Ok(())
        }
        Some(("down", sub)) => {
            let reached = migrator
                .downgrade(version_opt(sub, "from")?, version_opt(sub, "to")?)
                .await?;
            if reached {
                println!(
                    "Database is now at schema version v.{}",
                    migrator.current_version().await?
                );
            }
            Ok(())
        }
        Some(("set", sub)) => {
            let version = sub
                .get_one::<String>("version")
                .ok_or_else(|| DbupError::Validation("a version is required".to_string()))?;
            let version = parse_version(version)?;
            migrator.force_version(version).await?;
            println!("Forced schema version to v.{version} (no migrations executed)");
            Ok(())
        }
        Some(("status", _)) => {
            println!(
                "Database is at schema version v.{} (version table: {})",
                migrator.current_version().await?,
                migrator.version_table()
            );
            Ok(())
        }
        _ => Err(DbupError::Configuration("unknown subcommand".to_string())),
    }
}

/// Parses a user-supplied version string.
///
/// Non-integer input is a validation error; negative integers parse here
/// and are rejected by the engine, which owns that rule.
fn parse_version(value: &str) -> DbupResult<SchemaVersion> {
    value.parse().map_err(|_| {
        DbupError::Validation(format!("Versions must be positive integers, got '{value}'"))
    })
}

fn version_opt(matches: &clap::ArgMatches, id: &str) -> DbupResult<Option<SchemaVersion>> {
    matches
        .get_one::<String>(id)
        .map(|value| parse_version(value))
        .transpose()
}

/// Opens a backend for a SQLite path or a `postgres://` URL.
fn open_backend(database: &str) -> DbupResult<Arc<dyn DatabaseBackend>> {
    if database.starts_with("postgres://") || database.starts_with("postgresql://") {
        #[cfg(feature = "postgres")]
        {
            return Ok(Arc::new(dbup_rs_backends::PostgresBackend::from_url(
                database,
            )?));
        }
        #[cfg(not(feature = "postgres"))]
        {
            return Err(DbupError::Configuration(
                "this build has no PostgreSQL support; rebuild with the 'postgres' feature"
                    .to_string(),
            ));
        }
    }
    #[cfg(feature = "sqlite")]
    {
        Ok(Arc::new(dbup_rs_backends::SqliteBackend::open(database)?))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Err(DbupError::Configuration(
            "this build has no SQLite support; rebuild with the 'sqlite' feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_structure() {
        cli().debug_assert();
    }

    #[test]
    fn test_up_with_bounds_parses() {
        let matches = cli()
            .try_get_matches_from(["dbup", "--database", "app.db", "up", "--from", "2", "--to", "5"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "up");
        assert_eq!(version_opt(sub, "from").unwrap(), Some(2));
        assert_eq!(version_opt(sub, "to").unwrap(), Some(5));
    }

    #[test]
    fn test_database_is_required() {
        assert!(cli().try_get_matches_from(["dbup", "up"]).is_err());
    }

    #[test]
    fn test_set_requires_a_version() {
        assert!(cli()
            .try_get_matches_from(["dbup", "--database", "app.db", "set"])
            .is_err());
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("7").unwrap(), 7);
        assert_eq!(parse_version("-1").unwrap(), -1);
        assert!(matches!(
            parse_version("abc").unwrap_err(),
            DbupError::Validation(_)
        ));
    }
}
