//! Per-resource outcome of a sync run.

use std::fmt;
use std::path::PathBuf;

use crate::archive::ArchiveError;

/// Why one capture (or the live copy) was not persisted.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("persist failed: {0:#}")]
    Persist(anyhow::Error),
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl CaptureError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CaptureError::Archive(e) if e.is_not_found())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CaptureError::Archive(ArchiveError::Cancelled))
    }
}

/// Failure that aborted a whole resource. Sibling resources are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceFailure {
    /// Destination directory could not be created or read.
    #[error("filesystem: {0}")]
    Filesystem(String),
    /// The archive timeline could not be fetched or parsed.
    #[error("timeline: {0}")]
    Timeline(String),
}

/// What happened to the live copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveOutcome {
    /// Live fetching was turned off for this run.
    Disabled,
    /// A copy younger than the freshness window already exists.
    Fresh,
    /// A new live copy was written under this file name.
    Fetched(String),
    /// The fetch or write failed; archived captures were still processed.
    Failed(String),
    Cancelled,
}

impl fmt::Display for LiveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveOutcome::Disabled => f.write_str("disabled"),
            LiveOutcome::Fresh => f.write_str("fresh"),
            LiveOutcome::Fetched(_) => f.write_str("fetched"),
            LiveOutcome::Failed(e) => write!(f, "failed ({})", e),
            LiveOutcome::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Counters and status for one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReport {
    pub url: String,
    pub dir: PathBuf,
    pub live: LiveOutcome,
    /// Captures fetched and persisted this run (written or linked).
    pub fetched: u32,
    /// Timeline entries already saved on disk.
    pub skipped: u32,
    /// Repeated timestamps in the timeline.
    pub duplicates: u32,
    /// Captures the timeline listed but the archive no longer serves.
    pub not_found: u32,
    pub failed: u32,
    /// Subset of `fetched` stored as hard links to identical content.
    pub deduplicated: u32,
    /// Run stopped early on user request.
    pub cancelled: bool,
    pub failure: Option<ResourceFailure>,
}

impl ResourceReport {
    pub fn new(url: impl Into<String>, dir: PathBuf) -> Self {
        Self {
            url: url.into(),
            dir,
            live: LiveOutcome::Disabled,
            fetched: 0,
            skipped: 0,
            duplicates: 0,
            not_found: 0,
            failed: 0,
            deduplicated: 0,
            cancelled: false,
            failure: None,
        }
    }

    /// True unless the resource as a whole failed. Individual capture failures
    /// are warnings.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for ResourceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(failure) = &self.failure {
            return write!(f, "{}: FAILED {}", self.url, failure);
        }
        write!(
            f,
            "{}: {} new ({} linked), {} already saved, {} duplicate, {} not found, {} failed; live {}",
            self.url,
            self.fetched,
            self.deduplicated,
            self.skipped,
            self.duplicates,
            self.not_found,
            self.failed,
            self.live
        )?;
        if self.cancelled {
            f.write_str(" [cancelled]")?;
        }
        Ok(())
    }
}
