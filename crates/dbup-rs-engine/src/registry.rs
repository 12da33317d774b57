//! The version-keyed collection of migration steps.
//!
//! A [`MigrationRegistry`] maps positive version numbers to
//! [`MigrationStep`]s. It is supplied by the caller and read-only to the
//! engine; versions need not be contiguous in storage, but the engine
//! aborts a walk at the first gap in the traversed range.

use std::collections::BTreeMap;

use dbup_rs_core::{DbupError, DbupResult};

use crate::SchemaVersion;

/// One migration step: the commands that transform the schema from
/// `v-1` to `v` (`up`) and back (`down`).
///
/// A present-but-empty command list is a legal no-op step; an absent
/// list makes the step non-traversable in that direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationStep {
    /// Commands applied, in order, when upgrading to this version.
    pub up: Option<Vec<String>>,
    /// Commands applied, in order, when downgrading from this version.
    pub down: Option<Vec<String>>,
}

impl MigrationStep {
    /// Creates a step with neither direction defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ordered upgrade commands.
    #[must_use]
    pub fn with_up<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.up = Some(commands.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the ordered downgrade commands.
    #[must_use]
    pub fn with_down<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.down = Some(commands.into_iter().map(Into::into).collect());
        self
    }
}

/// An ordered mapping from version number to [`MigrationStep`].
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    steps: BTreeMap<SchemaVersion, MigrationStep>,
}

impl MigrationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a step under the given version, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `version` is not positive; version 0
    /// means "no schema" and cannot carry a step.
    pub fn insert(&mut self, version: SchemaVersion, step: MigrationStep) -> DbupResult<()> {
        if version < 1 {
            return Err(DbupError::Validation(format!(
                "migration versions must be positive integers, got {version}"
            )));
        }
        self.steps.insert(version, step);
        Ok(())
    }

    /// Returns the step registered under `version`, if any.
    pub fn get(&self, version: SchemaVersion) -> Option<&MigrationStep> {
        self.steps.get(&version)
    }

    /// Returns the highest registered version.
    pub fn latest(&self) -> Option<SchemaVersion> {
        self.steps.last_key_value().map(|(v, _)| *v)
    }

    /// Returns the upgrade commands for `version`, or `None` if the
    /// version or its `up` direction is missing.
    pub fn up_commands(&self, version: SchemaVersion) -> Option<&[String]> {
        self.steps.get(&version).and_then(|step| step.up.as_deref())
    }

    /// Returns the downgrade commands for `version`, or `None` if the
    /// version or its `down` direction is missing.
    pub fn down_commands(&self, version: SchemaVersion) -> Option<&[String]> {
        self.steps.get(&version).and_then(|step| step.down.as_deref())
    }

    /// Returns the number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no steps are registered.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fails with a configuration error if the registry is empty.
    ///
    /// Called at the start of every walk so the caller learns about an
    /// empty registry immediately, not mid-traversal.
    pub fn ensure_known(&self) -> DbupResult<()> {
        if self.steps.is_empty() {
            return Err(DbupError::Configuration(
                "Don't know anything about the data schema. Is the migration registry empty?"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
