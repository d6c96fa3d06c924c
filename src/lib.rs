//! Quay - local state for a multi-version toolchain manager
//!
//! This crate tracks installed tool versions, the packages inside each
//! version, known package sources, and user configuration, all persisted
//! under one root directory:
//!
//! ```text
//! <root>/sources/sources.json
//! <root>/versions/<v>/packages/<pkg>/info.json
//! <root>/versions/current
//! <root>/config.json
//! ```
//!
//! Higher-level commands get a consistent, crash-tolerant view of what is
//! installed and configured: storage failures are loud, while corrupt or
//! missing cache entries silently degrade to "absent". Network fetching,
//! archive handling, and command-line front ends are external; they plug in
//! through the [`SourceUpdater`] and [`Operation`] traits.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for quay unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides an in-memory filesystem and fixtures for the standard root
/// layout.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    LocalPackage, LocalVersion, PackageInfo, Quay, UserConfig, VersionDirectory,
};
pub use crate::ops::{OpError, OpGate, Operation};
pub use crate::sources::{
    SourceEvent, SourceRegistry, SourceRootInfo, SourceUpdater, UpdateOutcome,
};
pub use crate::util::fs::{FileSystem, StdFs};
