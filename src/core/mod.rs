//! Core local-state model.
//!
//! This module contains the persistent state components and their
//! composition root:
//! - User configuration (flat key/value store)
//! - Installed packages and versions
//! - [`Quay`], the facade tying everything to one root directory

pub mod config;
pub mod package;
pub mod quay;
pub mod version;

pub use config::{UserConfig, CONFIG_FILE, KEY_CURRENT, KEY_PLATFORM};
pub use package::{LocalPackage, PackageInfo, PKG_FILE};
pub use quay::Quay;
pub use version::{LocalVersion, VersionDirectory, CURRENT_NAME, PKG_DIR, VERSIONS_DIR};
