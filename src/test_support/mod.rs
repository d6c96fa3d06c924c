//! Test utilities and mocks for quay unit tests.
//!
//! Provides an in-memory [`FileSystem`] so the registry components can be
//! exercised without touching the disk, plus fixture helpers for building
//! the standard root layout.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::MemoryFs;
//!
//! #[test]
//! fn test_example() {
//!     let fs = Arc::new(MemoryFs::new());
//!     fs.add_file("/root/config.json", r#"{"platform": "linux-x64"}"#);
//!
//!     // Drive components against `fs`...
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::sources::registry::SourceRootInfo;
use crate::sources::updater::{SourceUpdater, UpdateOutcome};
use crate::util::fs::{DirEntry, FileSystem};

/// In-memory filesystem for testing without real I/O.
///
/// The read-only switch makes every mutation fail with a permission error,
/// which is how tests drive the fatal storage-error paths.
#[derive(Debug, Default)]
pub struct MemoryFs {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    read_only: bool,
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        MemoryFs::default()
    }

    /// Add a directory, including all parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        add_dir_locked(&mut state, path.as_ref());
    }

    /// Add a file with the given content, creating parent directories.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock().unwrap();
        if let Some(parent) = path.parent() {
            add_dir_locked(&mut state, parent);
        }
        state.files.insert(path, contents.into());
    }

    /// Refuse all mutations from now on.
    pub fn set_read_only(&self, read_only: bool) {
        self.state.lock().unwrap().read_only = read_only;
    }

    /// Current content of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    /// Whether a file exists.
    pub fn has_file(&self, path: impl AsRef<Path>) -> bool {
        self.state.lock().unwrap().files.contains_key(path.as_ref())
    }
}

fn add_dir_locked(state: &mut State, path: &Path) {
    let mut current = PathBuf::new();
    for component in path.components() {
        current.push(component);
        state.dirs.insert(current.clone());
    }
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("read-only filesystem: {}", path.display()),
    )
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

impl FileSystem for MemoryFs {
    fn dir_exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().dirs.contains(path)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.state.lock().unwrap().files.contains_key(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.read_only {
            return Err(denied(path));
        }
        add_dir_locked(&mut state, path);
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state.lock().unwrap();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }

        let mut entries = Vec::new();
        for dir in &state.dirs {
            if dir.parent() == Some(path) {
                if let Some(name) = dir.file_name() {
                    entries.push(DirEntry::dir(name.to_string_lossy()));
                }
            }
        }
        for file in state.files.keys() {
            if file.parent() == Some(path) {
                if let Some(name) = file.file_name() {
                    entries.push(DirEntry::file(name.to_string_lossy()));
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.read_only {
            return Err(denied(path));
        }
        match path.parent() {
            Some(parent) if !state.dirs.contains(parent) => return Err(not_found(parent)),
            _ => {}
        }
        state.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

/// Canned [`SourceUpdater`] for driving the add-source flow in tests.
#[derive(Debug, Clone)]
pub struct ScriptedUpdater {
    base_url: String,
    outcome: UpdateOutcome,
    progress: Vec<u32>,
}

impl ScriptedUpdater {
    /// An updater that succeeds with `info`.
    pub fn succeeding(base_url: impl Into<String>, info: SourceRootInfo) -> Self {
        ScriptedUpdater {
            base_url: base_url.into(),
            outcome: UpdateOutcome::Success(info),
            progress: Vec::new(),
        }
    }

    /// An updater that fails with `reason`.
    pub fn failing(base_url: impl Into<String>, reason: impl Into<String>) -> Self {
        ScriptedUpdater {
            base_url: base_url.into(),
            outcome: UpdateOutcome::Failed(reason.into()),
            progress: Vec::new(),
        }
    }

    /// Progress values to report before the terminal outcome.
    pub fn with_progress(mut self, progress: &[u32]) -> Self {
        self.progress = progress.to_vec();
        self
    }
}

impl SourceUpdater for ScriptedUpdater {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn update(&mut self, progress: &mut dyn FnMut(u32)) -> UpdateOutcome {
        for value in &self.progress {
            progress(*value);
        }
        self.outcome.clone()
    }
}

/// JSON for a package's `info.json` with the given identity and manifest.
pub fn package_record(name: &str, full_name: &str, files: &[&str]) -> String {
    serde_json::json!({
        "info": {
            "name": name,
            "full-name": full_name,
        },
        "files": files,
    })
    .to_string()
}

/// Lay out one package under `<root>/versions/<version>/packages/<dir_name>`.
pub fn install_package(fs: &MemoryFs, root: &Path, version: &str, dir_name: &str, record: &str) {
    let package_dir = root
        .join("versions")
        .join(version)
        .join("packages")
        .join(dir_name);
    fs.add_file(package_dir.join("info.json"), record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::fs::EntryKind;
    use std::sync::Arc;

    #[test]
    fn test_memory_fs_basic() {
        let fs = MemoryFs::new();
        fs.add_file("/root/config.json", "{}");

        assert!(fs.dir_exists(Path::new("/root")));
        assert!(fs.file_exists(Path::new("/root/config.json")));
        assert!(!fs.file_exists(Path::new("/root/other.json")));
        assert_eq!(
            fs.read_to_string(Path::new("/root/config.json")).unwrap(),
            "{}"
        );
    }

    #[test]
    fn test_memory_fs_parents_created() {
        let fs = MemoryFs::new();
        fs.add_dir("/a/b/c");

        assert!(fs.dir_exists(Path::new("/a")));
        assert!(fs.dir_exists(Path::new("/a/b")));
        assert!(fs.dir_exists(Path::new("/a/b/c")));
    }

    #[test]
    fn test_memory_fs_list_dir() {
        let fs = MemoryFs::new();
        fs.add_dir("/root/versions/3.0.0");
        fs.add_file("/root/versions/notes.txt", "x");

        let entries = fs.list_dir(Path::new("/root/versions")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "3.0.0");
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[1].name, "notes.txt");
        assert_eq!(entries[1].kind, EntryKind::File);
    }

    #[test]
    fn test_memory_fs_list_missing_dir() {
        let fs = MemoryFs::new();
        let err = fs.list_dir(Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_fs_write_requires_parent() {
        let fs = MemoryFs::new();
        let err = fs.write(Path::new("/missing/file.json"), "{}").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_fs_read_only() {
        let fs = MemoryFs::new();
        fs.add_dir("/root");
        fs.set_read_only(true);

        let err = fs.write(Path::new("/root/config.json"), "{}").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        let err = fs.create_dir_all(Path::new("/root/sources")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_install_package_layout() {
        let fs = Arc::new(MemoryFs::new());
        let record = package_record("runtime", "runtime 3.0.0", &["bin/run"]);
        install_package(&fs, Path::new("/root"), "3.0.0", "runtime", &record);

        assert!(fs.has_file("/root/versions/3.0.0/packages/runtime/info.json"));
        let contents = fs
            .contents("/root/versions/3.0.0/packages/runtime/info.json")
            .unwrap();
        assert!(contents.contains("\"full-name\":\"runtime 3.0.0\""));
    }
}
