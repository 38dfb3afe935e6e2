//! Parsing of the Wayback CDX server's JSON output.

use super::ArchiveError;
use crate::capture::{CaptureTimestamp, TimelineEntry};

/// Parse `output=json` CDX rows into timeline entries.
///
/// The first row names the columns; `timestamp` and `original` are required.
/// An empty body or `[]` is an empty timeline. Rows are returned in the order
/// the server sent them, duplicates included.
pub fn parse_cdx_json(body: &[u8]) -> Result<Vec<TimelineEntry>, ArchiveError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let rows: Vec<Vec<String>> = serde_json::from_slice(body)
        .map_err(|e| ArchiveError::Parse(format!("CDX JSON: {}", e)))?;
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ArchiveError::Parse(format!("CDX header lacks {:?} column", name)))
    };
    let ts_col = column("timestamp")?;
    let url_col = column("original")?;

    let mut entries = Vec::new();
    for (i, row) in rows.enumerate() {
        let (Some(ts), Some(url)) = (row.get(ts_col), row.get(url_col)) else {
            return Err(ArchiveError::Parse(format!("CDX row {} is too short", i + 1)));
        };
        let timestamp = CaptureTimestamp::parse(ts).ok_or_else(|| {
            ArchiveError::Parse(format!("CDX row {} has invalid timestamp {:?}", i + 1, ts))
        })?;
        entries.push(TimelineEntry {
            timestamp,
            url: url.clone(),
        });
    }
    Ok(entries)
}
