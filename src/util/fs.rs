//! Filesystem boundary.
//!
//! Every component that touches the disk goes through the [`FileSystem`]
//! trait, injected at construction. Production code uses [`StdFs`]; tests
//! substitute an in-memory implementation.

use std::fmt;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};

/// Kind of a directory entry returned by [`FileSystem::list_dir`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
}

/// One entry of a shallow directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Bare entry name, without the parent path.
    pub name: String,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        DirEntry {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    /// Create a directory entry.
    pub fn dir(name: impl Into<String>) -> Self {
        DirEntry {
            name: name.into(),
            kind: EntryKind::Dir,
        }
    }

    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// Filesystem operations the local-state components depend on.
///
/// Read failures are reported as `io::Error` so callers can tell an absent
/// file from a denied one; the loaders here treat both as "not there yet".
/// Write and directory-creation failures are storage errors and are always
/// propagated by callers.
pub trait FileSystem: fmt::Debug + Send + Sync {
    /// Whether `path` exists and is a directory.
    fn dir_exists(&self, path: &Path) -> bool;

    /// Whether `path` exists and is a regular file.
    fn file_exists(&self, path: &Path) -> bool;

    /// Create `path` and any missing parents.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Shallow listing of `path`.
    ///
    /// Implementations may include the platform's self/parent
    /// pseudo-entries; callers filter them out.
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Read an entire file as UTF-8.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Overwrite `path` with `contents`.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// Ensure a directory exists, creating it if necessary.
///
/// Creation failure means the environment cannot hold the root layout and
/// is fatal.
pub fn ensure_dir(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    if !fs.dir_exists(path) {
        fs.create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl FileSystem for StdFs {
    fn dir_exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            // path().is_dir() follows symlinks, so an aliased directory
            // still shows up as a directory entry.
            let kind = if entry.path().is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            entries.push(DirEntry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}
