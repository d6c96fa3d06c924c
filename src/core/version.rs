//! Installed version discovery and reconciliation.
//!
//! `<root>/versions/` holds one directory per installed version:
//!
//! ```text
//! versions/3.4.2/packages/<pkg>/info.json
//! versions/3.4.2/bin
//! versions/current            # alias to the active version, never scanned
//! ```
//!
//! Discovery is a shallow scan; reconciliation drops packages whose metadata
//! cannot be trusted from the in-memory view without touching the disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use semver::Version;

use crate::core::package::LocalPackage;
use crate::util::fs::{ensure_dir, FileSystem};

/// Directory under the root that holds installed versions.
pub const VERSIONS_DIR: &str = "versions";

/// Reserved alias name for the active version.
pub const CURRENT_NAME: &str = "current";

/// Subdirectory of a version that holds its packages.
pub const PKG_DIR: &str = "packages";

/// Subdirectory of a version that holds executables.
pub const BIN_DIR: &str = "bin";

/// Subdirectory of a version that holds libraries.
pub const LIB_DIR: &str = "lib";

/// Subdirectory of a version that holds headers.
pub const INCLUDE_DIR: &str = "include";

/// Subdirectory of a version that holds importable modules.
pub const IMPORTS_DIR: &str = "imports";

/// Shallow listing of subdirectory names, excluding the self/parent
/// pseudo-entries some platforms report.
///
/// A directory that exists but cannot be listed degrades to "no entries";
/// only creation failures are fatal in this layer.
fn list_dirs(fs: &dyn FileSystem, path: &Path) -> Vec<String> {
    let entries = match fs.list_dir(path) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!("cannot list {}: {}", path.display(), err);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter(|entry| entry.is_dir())
        .map(|entry| entry.name)
        .filter(|name| name != "." && name != "..")
        .collect()
}

/// One installed toolchain version.
#[derive(Debug, Clone)]
pub struct LocalVersion {
    name: String,
    path: PathBuf,
    packages: HashMap<String, LocalPackage>,
}

impl LocalVersion {
    /// Discover the version at `path`, scanning its packages directory.
    ///
    /// Packages are tracked but not loaded; call [`LocalVersion::load`] to
    /// read their metadata.
    pub fn scan(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let name = name.into();
        let path = path.into();
        let packages_dir = path.join(PKG_DIR);

        let mut packages = HashMap::new();
        for dir_name in list_dirs(fs.as_ref(), &packages_dir) {
            let package_dir = packages_dir.join(&dir_name);
            packages.insert(
                dir_name,
                LocalPackage::new(package_dir, name.clone(), Arc::clone(&fs)),
            );
        }

        LocalVersion {
            name,
            path,
            packages,
        }
    }

    /// Load every package and rebuild the mapping, keeping only packages
    /// whose metadata is complete and agrees with their directory name.
    ///
    /// Reconciliation only: untrusted entries are dropped from the
    /// in-memory view, never deleted from disk.
    pub fn load(&mut self) {
        let mut checked = HashMap::with_capacity(self.packages.len());
        for (dir_name, mut package) in self.packages.drain() {
            package.load();
            if !package.is_valid() {
                tracing::warn!(
                    "skipping invalid package `{}` in version `{}`",
                    dir_name,
                    self.name
                );
                continue;
            }
            checked.insert(dir_name, package);
        }
        self.packages = checked;
    }

    /// Persist every package's metadata.
    pub fn store(&self) -> Result<()> {
        for package in self.packages.values() {
            package.store()?;
        }
        Ok(())
    }

    /// Version name (= directory name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mapping from package name to package.
    pub fn packages(&self) -> &HashMap<String, LocalPackage> {
        &self.packages
    }

    /// Look up a package by name.
    pub fn package(&self, name: &str) -> Option<&LocalPackage> {
        self.packages.get(name)
    }

    /// Parsed semver for versions named like `3.4.2`, used for ordering.
    pub fn semver(&self) -> Option<Version> {
        Version::parse(&self.name).ok()
    }

    /// Packages directory of this version.
    pub fn packages_dir(&self) -> PathBuf {
        self.path.join(PKG_DIR)
    }

    /// Executable directory of this version.
    pub fn bin_dir(&self) -> PathBuf {
        self.path.join(BIN_DIR)
    }

    /// Library directory of this version.
    pub fn lib_dir(&self) -> PathBuf {
        self.path.join(LIB_DIR)
    }

    /// Header directory of this version.
    pub fn include_dir(&self) -> PathBuf {
        self.path.join(INCLUDE_DIR)
    }

    /// Module import directory of this version.
    pub fn imports_dir(&self) -> PathBuf {
        self.path.join(IMPORTS_DIR)
    }
}

/// The set of all installed versions under `<root>/versions`.
#[derive(Debug, Clone)]
pub struct VersionDirectory {
    path: PathBuf,
    versions: Vec<LocalVersion>,
}

impl VersionDirectory {
    /// Ensure the versions root exists and discover installed versions.
    ///
    /// The reserved `current` alias is a pointer to a real version
    /// directory, not a version, and is excluded from the scan.
    pub fn init(root: &Path, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let path = root.join(VERSIONS_DIR);
        ensure_dir(fs.as_ref(), &path)?;

        let mut versions = Vec::new();
        for name in list_dirs(fs.as_ref(), &path) {
            if name == CURRENT_NAME {
                continue;
            }
            let version_path = path.join(&name);
            versions.push(LocalVersion::scan(name, version_path, Arc::clone(&fs)));
        }

        Ok(VersionDirectory { path, versions })
    }

    /// Reconcile every version against its cache files.
    pub fn load(&mut self) {
        for version in &mut self.versions {
            version.load();
        }
    }

    /// Persist every version's package metadata.
    pub fn store(&self) -> Result<()> {
        for version in &self.versions {
            version.store()?;
        }
        Ok(())
    }

    /// The versions root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All installed versions, in scan order.
    pub fn versions(&self) -> &[LocalVersion] {
        &self.versions
    }

    /// Look up a version by name.
    pub fn get(&self, name: &str) -> Option<&LocalVersion> {
        self.versions.iter().find(|version| version.name() == name)
    }

    /// Path of the reserved alias to the active version.
    pub fn current_path(&self) -> PathBuf {
        self.path.join(CURRENT_NAME)
    }

    /// Versions ordered for display: semver order where the name parses,
    /// then the rest lexically.
    pub fn versions_sorted(&self) -> Vec<&LocalVersion> {
        let mut sorted: Vec<&LocalVersion> = self.versions.iter().collect();
        sorted.sort_by(|a, b| match (a.semver(), b.semver()) {
            (Some(a_version), Some(b_version)) => a_version.cmp(&b_version),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.name().cmp(b.name()),
        });
        sorted
    }
}
