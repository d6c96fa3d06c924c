//! Known package sources.
//!
//! Sources are cached in `<root>/sources/sources.json`, one JSON object
//! keyed by base URL:
//!
//! ```json
//! {
//!     "https://example.org/repo": { "base-url": "https://example.org/repo", ... }
//! }
//! ```
//!
//! The cache is read all-or-nothing: a corrupt file is indistinguishable
//! from a first run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::{ensure_dir, FileSystem};

/// Directory under the root that holds source state.
pub const SOURCES_DIR: &str = "sources";

/// Name of the source cache file.
pub const SOURCE_CACHE_FILE: &str = "sources.json";

/// One known package source.
///
/// Identity is the exact `base_url` string. An info is never edited in
/// place; a fresh updater run produces a replacement wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRootInfo {
    /// Base URL the source is fetched from; the registry's identity key.
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Optional human-readable label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Remaining source-supplied metadata, carried verbatim.
    #[serde(flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl SourceRootInfo {
    /// A new info with no metadata beyond the base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        SourceRootInfo {
            base_url: base_url.into(),
            name: None,
            meta: serde_json::Map::new(),
        }
    }

    /// Attach a human-readable label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The set of known sources, cached as one JSON file.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    sources: Vec<SourceRootInfo>,
}

impl SourceRegistry {
    /// Ensure `<root>/sources` exists and bind the cache path.
    pub fn init(root: &Path, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let path = root.join(SOURCES_DIR);
        ensure_dir(fs.as_ref(), &path)?;
        Ok(SourceRegistry {
            path,
            fs,
            sources: Vec::new(),
        })
    }

    fn cache_file(&self) -> PathBuf {
        self.path.join(SOURCE_CACHE_FILE)
    }

    /// Load the source cache.
    ///
    /// If the file is missing, is not a JSON object, or any entry fails to
    /// parse, the registry stays empty — never partially populated.
    pub fn load(&mut self) {
        let cache_file = self.cache_file();
        let contents = match self.fs.read_to_string(&cache_file) {
            Ok(contents) => contents,
            // Maybe first run.
            Err(_) => return,
        };

        match serde_json::from_str::<BTreeMap<String, SourceRootInfo>>(&contents) {
            Ok(entries) => {
                self.sources = entries.into_values().collect();
            }
            Err(err) => {
                tracing::warn!(
                    "ignoring corrupt source cache {}: {}",
                    cache_file.display(),
                    err
                );
            }
        }
    }

    /// Whether `url` exactly matches a known source's base URL.
    pub fn contains(&self, url: &str) -> bool {
        self.sources.iter().any(|source| source.base_url == url)
    }

    /// Look up a source by base URL.
    pub fn get(&self, url: &str) -> Option<&SourceRootInfo> {
        self.sources.iter().find(|source| source.base_url == url)
    }

    /// Append a source and immediately persist the whole registry.
    pub fn add_source_info(&mut self, info: SourceRootInfo) -> Result<()> {
        self.sources.push(info);
        self.store()
    }

    /// Overwrite the cache file with every known source, keyed by base URL.
    pub fn store(&self) -> Result<()> {
        let mut entries = BTreeMap::new();
        for source in &self.sources {
            entries.insert(source.base_url.as_str(), source);
        }

        let contents = serde_json::to_string_pretty(&entries)
            .context("failed to serialize source cache")?;

        let cache_file = self.cache_file();
        self.fs
            .write(&cache_file, &contents)
            .with_context(|| format!("failed to write source cache file: {}", cache_file.display()))
    }

    /// All known sources.
    pub fn sources(&self) -> &[SourceRootInfo] {
        &self.sources
    }

    /// The sources directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of known sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether no sources are known.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
