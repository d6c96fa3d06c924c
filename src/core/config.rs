//! User configuration store.
//!
//! A flat string key/value map persisted as `<root>/config.json`:
//!
//! ```json
//! {
//!     "platform": "linux-x64",
//!     "current": "3.4.2"
//! }
//! ```
//!
//! `set` persists immediately; `unset` only mutates memory and relies on a
//! later `store`. An empty map is never written, so a missing file and an
//! empty map mean the same thing on the next load.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::util::fs::FileSystem;

/// Name of the config file under the root directory.
pub const CONFIG_FILE: &str = "config.json";

/// Reserved key holding the target platform identifier.
pub const KEY_PLATFORM: &str = "platform";

/// Reserved key holding the name of the active version.
pub const KEY_CURRENT: &str = "current";

/// Flat string key/value settings for one root directory.
#[derive(Debug, Clone)]
pub struct UserConfig {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    values: BTreeMap<String, String>,
}

impl UserConfig {
    /// Bind the store to `<root>/config.json`. No I/O happens here.
    pub fn new(root: &Path, fs: Arc<dyn FileSystem>) -> Self {
        UserConfig {
            path: root.join(CONFIG_FILE),
            fs,
            values: BTreeMap::new(),
        }
    }

    /// Load settings from disk.
    ///
    /// A missing or unreadable file means "no config yet". A file that is
    /// not a JSON object is ignored, and entries whose value is not a JSON
    /// string are skipped.
    pub fn load(&mut self) {
        let contents = match self.fs.read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return,
        };

        let root: Value = match serde_json::from_str(&contents) {
            Ok(root) => root,
            Err(err) => {
                tracing::warn!("ignoring malformed config {}: {}", self.path.display(), err);
                return;
            }
        };

        let Value::Object(entries) = root else {
            tracing::warn!("ignoring config {}: not a JSON object", self.path.display());
            return;
        };

        for (key, value) in entries {
            match value {
                Value::String(value) => {
                    self.values.insert(key, value);
                }
                other => {
                    tracing::debug!("skipping non-string config entry `{}`: {}", key, other);
                }
            }
        }
    }

    /// Get a value, or the empty string if the key is absent.
    ///
    /// Absence and an empty value are not distinguished.
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    /// Set a value and immediately persist the whole store.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.values.insert(key.into(), value.into());
        self.store()
    }

    /// Remove a key in memory only.
    ///
    /// Call [`UserConfig::store`] to make the removal durable.
    pub fn unset(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Persist the store, overwriting the config file.
    ///
    /// An empty map writes nothing: a missing file and an empty map must
    /// stay indistinguishable on the next load.
    pub fn store(&self) -> Result<()> {
        if self.values.is_empty() {
            return Ok(());
        }

        let contents =
            serde_json::to_string_pretty(&self.values).context("failed to serialize config")?;
        self.fs
            .write(&self.path, &contents)
            .with_context(|| format!("failed to write config file: {}", self.path.display()))
    }

    /// Path of the backing config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of settings currently in memory.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no settings are held in memory.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
