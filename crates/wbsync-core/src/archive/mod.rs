//! Archive service interface and the Wayback Machine client.
//!
//! The orchestrator only sees [`ArchiveService`]; timeline and snapshot
//! fetches are thin, retry-free calls that return typed errors.

mod cdx;
mod http;
mod wayback;

pub use cdx::parse_cdx_json;
pub use http::HttpOptions;
pub use wayback::WaybackClient;

use crate::capture::{Snapshot, SnapshotTarget, TimelineEntry};
use crate::retry::{classify_curl_error, ErrorKind};

/// Failure talking to the archive (or to the live origin).
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// Transport failure (DNS, connect, timeout, reset).
    #[error("network error: {message}")]
    Network { kind: ErrorKind, message: String },
    /// Non-success HTTP status other than 404.
    #[error("HTTP {status} from {url}")]
    Http { status: u32, url: String },
    /// The archive has no capture of `url` at `target`.
    #[error("no capture of {url} at {target}")]
    NotFound { url: String, target: String },
    /// Response body could not be understood.
    #[error("malformed archive response: {0}")]
    Parse(String),
    /// A retryable failure persisted through every allowed attempt.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ArchiveError>,
    },
    /// The run was cancelled before the call was made.
    #[error("cancelled")]
    Cancelled,
}

impl ArchiveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. })
    }
}

impl From<curl::Error> for ArchiveError {
    fn from(e: curl::Error) -> Self {
        ArchiveError::Network {
            kind: classify_curl_error(&e),
            message: e.to_string(),
        }
    }
}

/// Source of timelines and snapshots.
///
/// Implementations block the calling thread; async callers use
/// `tokio::task::spawn_blocking`.
pub trait ArchiveService: Send + Sync {
    /// All captures the archive knows for `url`. Order and uniqueness are not
    /// guaranteed.
    fn timeline(&self, url: &str) -> Result<Vec<TimelineEntry>, ArchiveError>;

    /// Raw bytes and headers of one capture, or of the live resource.
    fn snapshot(&self, url: &str, target: &SnapshotTarget) -> Result<Snapshot, ArchiveError>;
}
