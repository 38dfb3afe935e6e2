//! Reconstruct what a resource directory already holds.
//!
//! Persisted captures are named `<14-digit timestamp>_<filename>`; live pulls
//! are named `<timestamp>live_<filename>` where the timestamp is the fetch
//! instant. Anything else in the directory is foreign and ignored.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use crate::capture::CaptureTimestamp;
use crate::storage::TEMP_SUFFIX;

/// Marker between the timestamp prefix and `_` on live copies.
pub const LIVE_MARKER: &str = "live";

/// One recognised file in a resource directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIndexEntry {
    pub file_name: String,
    pub timestamp: CaptureTimestamp,
    pub is_live: bool,
    pub size_bytes: u64,
    pub modified: SystemTime,
}

impl LocalIndexEntry {
    /// Zero-byte files are leftovers of failed attempts and do not count.
    pub fn is_saved(&self) -> bool {
        self.size_bytes > 0
    }

    /// Age of a live copy: time since the later of its mtime and the fetch
    /// instant in its name (mtime may carry the origin's Last-Modified).
    pub fn age(&self, now: SystemTime) -> Duration {
        let fetched: SystemTime = self.timestamp.to_datetime().into();
        let newest = fetched.max(self.modified);
        now.duration_since(newest).unwrap_or(Duration::ZERO)
    }
}

/// Snapshot of a resource directory taken at the start of a sync.
#[derive(Debug, Clone, Default)]
pub struct LocalIndex {
    entries: Vec<LocalIndexEntry>,
}

impl LocalIndex {
    /// Scan `dir`. Read failures (including a missing directory) are returned;
    /// unreadable individual entries are skipped.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(dir)? {
            let Ok(dirent) = dirent else { continue };
            let Ok(file_name) = dirent.file_name().into_string() else {
                continue;
            };
            let Some((timestamp, is_live)) = classify_file_name(&file_name) else {
                continue;
            };
            let Ok(meta) = fs::metadata(dirent.path()) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            entries.push(LocalIndexEntry {
                file_name,
                timestamp,
                is_live,
                size_bytes: meta.len(),
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.file_name.cmp(&b.file_name)));
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[LocalIndexEntry] {
        &self.entries
    }

    /// Archived capture timestamps with a nonzero-size file.
    pub fn saved_timestamps(&self) -> HashSet<CaptureTimestamp> {
        self.entries
            .iter()
            .filter(|e| !e.is_live && e.is_saved())
            .map(|e| e.timestamp.clone())
            .collect()
    }

    /// Most recent saved live copy, by fetch timestamp.
    pub fn latest_live(&self) -> Option<&LocalIndexEntry> {
        self.entries
            .iter()
            .filter(|e| e.is_live && e.is_saved())
            .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
    }

    /// True if a saved live copy is younger than `window` at `now`.
    pub fn has_fresh_live(&self, window: Duration, now: SystemTime) -> bool {
        self.entries
            .iter()
            .filter(|e| e.is_live && e.is_saved())
            .any(|e| e.age(now) < window)
    }
}

/// Recognise a persisted file name, returning its timestamp and whether it is
/// a live copy. Temp files and names without a valid prefix yield `None`.
pub fn classify_file_name(name: &str) -> Option<(CaptureTimestamp, bool)> {
    if name.starts_with('.') || name.ends_with(TEMP_SUFFIX) {
        return None;
    }
    let prefix = name.get(..CaptureTimestamp::LEN)?;
    let timestamp = CaptureTimestamp::parse(prefix)?;
    let rest = &name[CaptureTimestamp::LEN..];
    if rest.starts_with('_') {
        Some((timestamp, false))
    } else if rest
        .strip_prefix(LIVE_MARKER)
        .is_some_and(|r| r.starts_with('_'))
    {
        Some((timestamp, true))
    } else {
        None
    }
}

/// File name for a persisted capture: `<ts>_<filename>` or `<ts>live_<filename>`.
pub fn persisted_file_name(timestamp: &CaptureTimestamp, is_live: bool, filename: &str) -> String {
    if is_live {
        format!("{}{}_{}", timestamp, LIVE_MARKER, filename)
    } else {
        format!("{}_{}", timestamp, filename)
    }
}
