//! Capture data model: timestamps, timeline entries, fetched snapshots.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::metadata::HeaderMap;

/// Layout of a 14-digit archive timestamp (`YYYYMMDDhhmmss`, UTC).
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// A 14-digit instant identifier naming one archived observation of a resource.
///
/// Equality and hashing use the digit string; ordering of the fixed-width
/// string matches calendar order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaptureTimestamp(String);

impl CaptureTimestamp {
    /// Width of the timestamp prefix on persisted file names.
    pub const LEN: usize = 14;

    /// Parses a 14-digit timestamp. Returns `None` unless `s` is exactly 14 ASCII
    /// digits naming a valid calendar instant (month 13 or Feb 30 are rejected).
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != Self::LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok()?;
        Some(Self(s.to_string()))
    }

    /// Timestamp for an instant, truncated to whole seconds.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self(instant.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar instant (UTC) named by this timestamp.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        // Validated on construction; the fallback is unreachable.
        NaiveDateTime::parse_from_str(&self.0, TIMESTAMP_FORMAT)
            .map(|naive| naive.and_utc())
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl fmt::Display for CaptureTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CaptureTimestamp {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InvalidTimestamp(s.to_string()))
    }
}

/// Error for a string that is not a valid 14-digit capture timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid capture timestamp: {0:?}")]
pub struct InvalidTimestamp(pub String);

/// One capture reported by the archive's timeline for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub timestamp: CaptureTimestamp,
    /// URL the archive recorded for this capture (may differ from the requested
    /// URL in scheme, `www.` prefix, or query).
    pub url: String,
}

/// What to fetch: a specific archived capture, or the resource as it is now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotTarget {
    Archived(CaptureTimestamp),
    Live,
}

impl SnapshotTarget {
    pub fn is_live(&self) -> bool {
        matches!(self, SnapshotTarget::Live)
    }
}

impl fmt::Display for SnapshotTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotTarget::Archived(ts) => write!(f, "{}", ts),
            SnapshotTarget::Live => f.write_str("live"),
        }
    }
}

/// Raw bytes and headers of one fetched capture. Lives for one fetch/persist cycle.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub target: SnapshotTarget,
    pub body: Vec<u8>,
    pub headers: HeaderMap,
    /// When the response was received.
    pub fetched_at: DateTime<Utc>,
}

/// A remote resource to synchronize, e.g. one file linked from a catalog page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub url: String,
    /// Human-readable label (link text on the catalog page), if known.
    pub title: Option<String>,
    /// Version label shown next to the link, e.g. `Aktualisiert am: 14.12.2020`.
    pub version: Option<String>,
}

impl Resource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            version: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// First `dd.mm.yyyy` or `yyyy-mm-dd` date in the version label.
    pub fn version_date(&self) -> Option<NaiveDate> {
        self.version.as_deref()?.split_whitespace().find_map(|word| {
            let word = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
            NaiveDate::parse_from_str(word, "%d.%m.%Y")
                .or_else(|_| NaiveDate::parse_from_str(word, "%Y-%m-%d"))
                .ok()
        })
    }
}
