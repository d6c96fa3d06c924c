//! The composition root.
//!
//! [`Quay`] owns the source registry, the version directory, and the user
//! config for one root directory, and exposes the operations higher-level
//! commands build on: init/load/store, config access, the add-source flow,
//! and gated operation execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use directories::BaseDirs;

use crate::core::config::{UserConfig, KEY_CURRENT, KEY_PLATFORM};
use crate::core::version::{LocalVersion, VersionDirectory};
use crate::ops::Operation;
use crate::sources::registry::SourceRegistry;
use crate::sources::updater::{SourceEvent, SourceUpdater, UpdateOutcome};
use crate::util::fs::{ensure_dir, FileSystem};

/// Local state for one root directory.
#[derive(Debug)]
pub struct Quay {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    sources: SourceRegistry,
    versions: VersionDirectory,
    config: UserConfig,
}

impl Quay {
    /// Create the root layout and discover existing on-disk state.
    ///
    /// Creates `<root>`, `<root>/sources`, and `<root>/versions` as needed
    /// (failure to create any of them is fatal) and binds the config path.
    /// Cache files are not parsed until [`Quay::load`].
    pub fn init(root: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let root = root.into();
        ensure_dir(fs.as_ref(), &root)?;

        let sources = SourceRegistry::init(&root, Arc::clone(&fs))?;
        let versions = VersionDirectory::init(&root, Arc::clone(&fs))?;
        let config = UserConfig::new(&root, Arc::clone(&fs));

        Ok(Quay {
            root,
            fs,
            sources,
            versions,
            config,
        })
    }

    /// Conventional default root (`~/.quay`), when the platform exposes a
    /// home directory.
    pub fn default_root() -> Option<PathBuf> {
        BaseDirs::new().map(|dirs| dirs.home_dir().join(".quay"))
    }

    /// Parse every component's cache file and reconcile with the
    /// filesystem.
    ///
    /// Corrupt or missing caches degrade to empty state; load never fails.
    pub fn load(&mut self) {
        self.sources.load();
        self.versions.load();
        self.config.load();
    }

    /// Flush every component to disk.
    pub fn store(&self) -> Result<()> {
        self.sources.store()?;
        self.versions.store()?;
        self.config.store()
    }

    /// Root directory this state lives under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The filesystem this state is backed by, for operation bodies.
    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// The known-source registry.
    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    /// The installed-version directory.
    pub fn versions(&self) -> &VersionDirectory {
        &self.versions
    }

    /// Look up an installed version by name.
    pub fn version(&self, name: &str) -> Option<&LocalVersion> {
        self.versions.get(name)
    }

    /// Get a config value, or the empty string if the key is absent.
    pub fn get_config(&self, key: &str) -> &str {
        self.config.get(key)
    }

    /// Set a config value; persists immediately.
    pub fn set_config(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.config.set(key, value)
    }

    /// Remove a config value in memory only; [`Quay::store`] makes the
    /// removal durable.
    pub fn unset_config(&mut self, key: &str) {
        self.config.unset(key);
    }

    /// The configured target platform identifier, or empty.
    pub fn platform(&self) -> &str {
        self.get_config(KEY_PLATFORM)
    }

    /// Name of the active version, or empty.
    pub fn current_version(&self) -> &str {
        self.get_config(KEY_CURRENT)
    }

    /// Record `version` as the active version; persists immediately.
    pub fn set_current_version(&mut self, version: &str) -> Result<()> {
        self.set_config(KEY_CURRENT, version)
    }

    /// Clear the active version in memory only.
    pub fn unset_current_version(&mut self) {
        self.unset_config(KEY_CURRENT);
    }

    /// Register a new source via its updater.
    ///
    /// An already-known base URL is an idempotent no-op and emits nothing.
    /// Otherwise the updater runs synchronously: progress is forwarded to
    /// `events` as it arrives, a successful outcome registers and persists
    /// the produced info before the terminal event fires, and a failed one
    /// only reports its reason. A failed persist is a storage error and
    /// propagates.
    pub fn add_source(
        &mut self,
        events: &mut dyn FnMut(SourceEvent),
        updater: &mut dyn SourceUpdater,
    ) -> Result<()> {
        if self.sources.contains(updater.base_url()) {
            tracing::debug!("source {} already registered", updater.base_url());
            return Ok(());
        }

        match updater.update(&mut |progress| events(SourceEvent::Progress(progress))) {
            UpdateOutcome::Success(info) => {
                self.sources.add_source_info(info)?;
                events(SourceEvent::Added);
            }
            UpdateOutcome::Failed(reason) => {
                tracing::warn!("source update for {} failed: {}", updater.base_url(), reason);
                events(SourceEvent::Failed(reason));
            }
        }

        Ok(())
    }

    /// Execute an operation with single-owner semantics.
    ///
    /// With `wait_if_running` the call blocks until a concurrent execution
    /// of the same operation finishes; without it, it fails immediately
    /// with an ownership-conflict error. The gate is released even when the
    /// body errors.
    pub fn perform(&mut self, op: &dyn Operation, wait_if_running: bool) -> Result<()> {
        let _running = op.gate().acquire(wait_if_running)?;
        op.run(self)
    }
}
