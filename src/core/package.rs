//! Installed package state.
//!
//! Each installed package lives in its own directory under a version:
//! `<root>/versions/<v>/packages/<name>/info.json`:
//!
//! ```json
//! {
//!     "info": { "name": "runtime", "full-name": "runtime 3.4.2", ... },
//!     "files": ["bin/run", "lib/librun.so"]
//! }
//! ```
//!
//! Loading is best-effort: a package with missing or untrustworthy metadata
//! keeps its default empty state and is dropped from the in-memory view by
//! the owning version's reconciliation pass. Nothing is ever deleted from
//! disk here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::util::fs::FileSystem;

/// Name of the per-package metadata file.
pub const PKG_FILE: &str = "info.json";

/// Source-supplied package metadata.
///
/// Only `name` and `full_name` are interpreted by the local state; every
/// other key the source recorded is carried verbatim in `extra` so it
/// survives a store/load round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageInfo {
    /// Bare package name; must match the directory the package lives in.
    pub name: String,

    /// Versioned display name, e.g. `runtime 3.4.2`.
    #[serde(rename = "full-name")]
    pub full_name: String,

    /// Package version, when the source supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    /// Remaining source-supplied metadata, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PackageInfo {
    /// Whether this metadata is complete enough to trust.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.full_name.is_empty()
    }
}

/// On-disk shape of `info.json`.
#[derive(Serialize, Deserialize)]
struct PackageRecord {
    info: PackageInfo,
    files: Vec<String>,
}

/// One installed package inside one version.
#[derive(Debug, Clone)]
pub struct LocalPackage {
    path: PathBuf,
    owner_version: String,
    fs: Arc<dyn FileSystem>,
    info: PackageInfo,
    files: Vec<String>,
}

impl LocalPackage {
    /// Track the package directory at `path`, owned by `owner_version`.
    ///
    /// Metadata stays at its default empty state until [`LocalPackage::load`].
    pub fn new(
        path: impl Into<PathBuf>,
        owner_version: impl Into<String>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        LocalPackage {
            path: path.into(),
            owner_version: owner_version.into(),
            fs,
            info: PackageInfo::default(),
            files: Vec::new(),
        }
    }

    /// Directory name, which doubles as the package's identity key.
    pub fn dir_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }

    /// Load metadata and the installed-file manifest from `info.json`.
    ///
    /// A missing, unreadable, or structurally wrong file (no `info` object,
    /// no `files` array) leaves the package in its default empty state; the
    /// owning version decides what to drop.
    pub fn load(&mut self) {
        let info_file = self.path.join(PKG_FILE);
        let contents = match self.fs.read_to_string(&info_file) {
            Ok(contents) => contents,
            Err(_) => return,
        };

        match serde_json::from_str::<PackageRecord>(&contents) {
            Ok(record) => {
                self.info = record.info;
                self.files = record.files;
            }
            Err(err) => {
                tracing::debug!("skipping invalid package {}: {}", info_file.display(), err);
            }
        }
    }

    /// Write metadata and the file manifest back to `info.json`.
    pub fn store(&self) -> Result<()> {
        let record = PackageRecord {
            info: self.info.clone(),
            files: self.files.clone(),
        };
        let contents = serde_json::to_string_pretty(&record)
            .context("failed to serialize package info")?;

        let info_file = self.path.join(PKG_FILE);
        self.fs
            .write(&info_file, &contents)
            .with_context(|| format!("failed to write package info file: {}", info_file.display()))
    }

    /// Whether the loaded metadata is trustworthy for this directory:
    /// complete, and recording the same name the directory carries.
    pub fn is_valid(&self) -> bool {
        self.info.is_complete() && self.dir_name() == self.info.name
    }

    /// Manifest entries that are missing on disk, as relative paths.
    ///
    /// Purely diagnostic; nothing is repaired or deleted.
    pub fn missing_files(&self) -> Vec<&str> {
        self.files
            .iter()
            .filter(|relative| !self.fs.file_exists(&self.path.join(relative.as_str())))
            .map(String::as_str)
            .collect()
    }

    /// Package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the version this package is installed under.
    pub fn owner_version(&self) -> &str {
        &self.owner_version
    }

    /// Source-supplied metadata.
    pub fn info(&self) -> &PackageInfo {
        &self.info
    }

    /// Replace the source-supplied metadata.
    pub fn set_info(&mut self, info: PackageInfo) {
        self.info = info;
    }

    /// Relative paths of the files this package installed.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Replace the installed-file manifest.
    pub fn set_files(&mut self, files: Vec<String>) {
        self.files = files;
    }
}
