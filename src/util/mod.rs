//! Shared utilities

pub mod fs;

pub use fs::{DirEntry, EntryKind, FileSystem, StdFs};
