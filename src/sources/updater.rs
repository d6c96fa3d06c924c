//! Source update protocol.
//!
//! Fetching and validating a remote source is external to this crate. An
//! updater implements [`SourceUpdater`]; the core runs it, forwards its
//! progress to the caller, and on success registers the produced
//! [`SourceRootInfo`]. See
//! [`Quay::add_source`](crate::core::quay::Quay::add_source).

use crate::sources::registry::SourceRootInfo;

/// Terminal outcome of one updater run.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The source was fetched and validated.
    Success(SourceRootInfo),
    /// The update failed; the reason is reported to the caller.
    Failed(String),
}

/// Events delivered to the caller of `add_source`.
///
/// Zero or more `Progress` events precede exactly one terminal event;
/// `Added` and `Failed` are mutually exclusive.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    /// Update progress, roughly 0–100.
    Progress(u32),
    /// The source was registered and persisted.
    Added,
    /// The update failed with the given reason.
    Failed(String),
}

/// A fetcher for one source, bound to its base URL.
///
/// `update` may block on network or disk I/O; this layer adds no
/// scheduling of its own, so a stuck updater blocks its caller.
pub trait SourceUpdater {
    /// The base URL this updater fetches.
    fn base_url(&self) -> &str;

    /// Fetch and validate the source, reporting progress as work happens.
    fn update(&mut self, progress: &mut dyn FnMut(u32)) -> UpdateOutcome;
}
