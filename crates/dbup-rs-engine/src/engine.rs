//! The migration engine.
//!
//! [`Migrator`] walks the registry one version at a time. An upgrade
//! traverses `from+1 ..= to` strictly increasing; a downgrade traverses
//! `from ..= to+1` strictly decreasing. After every fully applied step
//! the new version is durably recorded, so a crash between steps leaves
//! the schema at a well-defined, already-fully-applied version.
//!
//! Two outcome channels are deliberately kept apart:
//!
//! - a hard failure (a statement error, a broken version store)
//!   propagates as `Err` and implies the caller cannot assume where the
//!   persisted version ended up within the failing step;
//! - a controlled stop (nothing to do, a gap in the registry, the
//!   version-0 floor, cancellation) returns `Ok(false)` and guarantees
//!   the persisted version is exactly the last fully applied one.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dbup_rs_backends::DatabaseBackend;
use dbup_rs_core::{DbupError, DbupResult};

use crate::lock::AdvisoryLock;
use crate::naming::VersionTableConfig;
use crate::registry::MigrationRegistry;
use crate::store::VersionStore;
use crate::SchemaVersion;

/// A cooperative cancellation flag.
///
/// Checked between steps only, never mid-step: a step's commands are not
/// individually interruptible-safe, so a cancelled walk still finishes
/// the step it is on and stops at that committed version.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// The migration engine.
///
/// Owns the version store exclusively; nothing else mutates the persisted
/// version. The registry is caller-supplied and read-only for the
/// engine's lifetime.
pub struct Migrator {
    backend: Arc<dyn DatabaseBackend>,
    registry: MigrationRegistry,
    store: VersionStore,
    lock: Option<AdvisoryLock>,
    cancel: Option<CancelToken>,
}

impl Migrator {
    /// Constructs an engine over an injected backend.
    ///
    /// The version-table name is resolved here, once, from `naming` (see
    /// [`VersionTableConfig::resolve`]); this may perform the one-time
    /// legacy-to-new table rename and fails if both candidate tables
    /// exist.
    pub async fn new(
        backend: Arc<dyn DatabaseBackend>,
        registry: MigrationRegistry,
        naming: &VersionTableConfig,
    ) -> DbupResult<Self> {
        let table = naming.resolve(&*backend).await?;
        Ok(Self {
            backend,
            registry,
            store: VersionStore::new(table),
            lock: None,
            cancel: None,
        })
    }

    /// Enables the advisory migration lock for upgrade/downgrade calls.
    #[must_use]
    pub fn with_advisory_lock(mut self) -> Self {
        self.lock = Some(AdvisoryLock::for_version_table(self.store.table()));
        self
    }

    /// Attaches a cancellation token, checked between steps.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the resolved version-table name.
    pub fn version_table(&self) -> &str {
        self.store.table()
    }

    /// Returns the migration registry.
    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    /// Returns the persisted schema version, creating and seeding the
    /// version table if absent.
    pub async fn current_version(&self) -> DbupResult<SchemaVersion> {
        self.store.get(&*self.backend).await
    }

    /// Forces the persisted version to `version` without executing any
    /// registry commands.
    ///
    /// An escape hatch for manually declaring "the schema is already at
    /// version N" after manual intervention; not a migration.
    pub async fn force_version(&self, version: SchemaVersion) -> DbupResult<()> {
        self.store.set(&*self.backend, version).await
    }

    /// Upgrades from `from` (default: the persisted version) to `to`
    /// (default: the highest registered version).
    ///
    /// Returns `Ok(true)` when `to` was reached, `Ok(false)` when there
    /// was nothing to do or the walk stopped at a registry gap or on
    /// cancellation.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty registry; a failing
    /// migration command propagates as an execution error with no
    /// compensation for already-executed commands of that step.
    pub async fn upgrade(
        &self,
        from: Option<SchemaVersion>,
        to: Option<SchemaVersion>,
    ) -> DbupResult<bool> {
        self.registry.ensure_known()?;
        self.acquire_lock().await?;
        let outcome = self.upgrade_walk(from, to).await;
        self.release_lock(outcome).await
    }

    /// Downgrades from `from` (default: the persisted version) to `to`
    /// (default: `from - 1`, a single-step rollback).
    ///
    /// Returns `Ok(false)` without issuing any commands when there is
    /// nothing to do or the resolved target is below the version-0 floor;
    /// otherwise behaves symmetrically to [`Migrator::upgrade`].
    pub async fn downgrade(
        &self,
        from: Option<SchemaVersion>,
        to: Option<SchemaVersion>,
    ) -> DbupResult<bool> {
        self.registry.ensure_known()?;
        self.acquire_lock().await?;
        let outcome = self.downgrade_walk(from, to).await;
        self.release_lock(outcome).await
    }

    async fn upgrade_walk(
        &self,
        from: Option<SchemaVersion>,
        to: Option<SchemaVersion>,
    ) -> DbupResult<bool> {
        let to = match to {
            Some(to) => to,
            None => self.registry.latest().ok_or_else(|| {
                DbupError::Configuration("no migrations registered".to_string())
            })?,
        };
        let from = match from {
            Some(from) => from,
            None => self.store.get(&*self.backend).await?,
        };

        if from >= to {
            tracing::info!("Nothing to upgrade from v.{from} to v.{to}.");
            return Ok(false);
        }

        tracing::info!("Upgrading from v.{from} to v.{to}");

        for ver in (from + 1)..=to {
            if self.cancelled(ver - 1) {
                return Ok(false);
            }
            let Some(commands) = self.registry.up_commands(ver) else {
                tracing::warn!(
                    "Don't know how to upgrade from v.{} to v.{ver}. Aborting.",
                    ver - 1
                );
                return Ok(false);
            };
            self.apply(commands).await?;
            self.store.set(&*self.backend, ver).await?;
            tracing::info!("Upgraded to v.{ver}");
        }

        Ok(true)
    }

    async fn downgrade_walk(
        &self,
        from: Option<SchemaVersion>,
        to: Option<SchemaVersion>,
    ) -> DbupResult<bool> {
        let from = match from {
            Some(from) => from,
            None => self.store.get(&*self.backend).await?,
        };
        // No explicit target: roll back a single step.
        let to = to.unwrap_or(from - 1);

        if from <= to {
            tracing::info!("Nothing to downgrade from v.{from} to v.{to}.");
            return Ok(false);
        }
        if to < 0 {
            tracing::warn!("Can't downgrade lower than v.0");
            return Ok(false);
        }

        tracing::info!("Downgrading from v.{from} to v.{to}");

        let mut ver = from;
        while ver > to {
            let next = ver - 1;
            if self.cancelled(ver) {
                return Ok(false);
            }
            let Some(commands) = self.registry.down_commands(ver) else {
                tracing::warn!("Don't know how to downgrade from v.{ver} to v.{next}. Aborting.");
                return Ok(false);
            };
            self.apply(commands).await?;
            self.store.set(&*self.backend, next).await?;
            tracing::info!("Downgraded to v.{next}");
            ver = next;
        }

        Ok(true)
    }

    /// Executes one step's commands, in order, failing fast.
    async fn apply(&self, commands: &[String]) -> DbupResult<()> {
        for sql in commands {
            self.backend.execute(sql).await?;
        }
        Ok(())
    }

    fn cancelled(&self, at: SchemaVersion) -> bool {
        let cancelled = self
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled);
        if cancelled {
            tracing::warn!("Migration cancelled; stopping at v.{at}");
        }
        cancelled
    }

    async fn acquire_lock(&self) -> DbupResult<()> {
        match &self.lock {
            Some(lock) => lock.acquire(&*self.backend).await,
            None => Ok(()),
        }
    }

    /// Releases the lock on every exit path. A walk error takes
    /// precedence over a release error.
    async fn release_lock(&self, outcome: DbupResult<bool>) -> DbupResult<bool> {
        let released = match &self.lock {
            Some(lock) => lock.release(&*self.backend).await,
            None => Ok(()),
        };
        match (outcome, released) {
            (Err(walk_err), _) => Err(walk_err),
            (Ok(_), Err(release_err)) => Err(release_err),
            (Ok(reached), Ok(())) => Ok(reached),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
