//! Wayback Machine client: CDX timeline plus `id_` raw snapshots.

use chrono::Utc;

use super::cdx::parse_cdx_json;
use super::http::{self, HttpOptions, HttpResponse};
use super::{ArchiveError, ArchiveService};
use crate::capture::{Snapshot, SnapshotTarget, TimelineEntry};

/// Default public archive endpoint.
pub const DEFAULT_BASE_URL: &str = "https://web.archive.org";

/// Columns requested from the CDX server.
const CDX_FIELDS: &str = "timestamp,original,statuscode";

/// Blocking client for a Wayback-compatible archive.
#[derive(Debug, Clone)]
pub struct WaybackClient {
    base_url: String,
    http: HttpOptions,
}

impl WaybackClient {
    pub fn new(base_url: impl Into<String>, http: HttpOptions) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// CDX query URL for a resource's timeline.
    pub fn timeline_url(&self, url: &str) -> Result<String, ArchiveError> {
        let mut cdx = url::Url::parse(&format!("{}/cdx/search/cdx", self.base_url))
            .map_err(|e| ArchiveError::Parse(format!("invalid archive base URL: {}", e)))?;
        cdx.query_pairs_mut()
            .append_pair("url", url)
            .append_pair("output", "json")
            .append_pair("fl", CDX_FIELDS);
        Ok(cdx.into())
    }

    /// Request URL for a capture (`id_` returns the original bytes unmodified),
    /// or the resource itself for a live pull.
    pub fn snapshot_url(&self, url: &str, target: &SnapshotTarget) -> String {
        match target {
            SnapshotTarget::Archived(ts) => format!("{}/web/{}id_/{}", self.base_url, ts, url),
            SnapshotTarget::Live => url.to_string(),
        }
    }
}

impl Default for WaybackClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, HttpOptions::default())
    }
}

impl ArchiveService for WaybackClient {
    fn timeline(&self, url: &str) -> Result<Vec<TimelineEntry>, ArchiveError> {
        let request_url = self.timeline_url(url)?;
        let response = http::get(&request_url, &self.http)?;
        if !response.is_success() {
            return Err(ArchiveError::Http {
                status: response.status,
                url: request_url,
            });
        }
        parse_cdx_json(&response.body)
    }

    fn snapshot(&self, url: &str, target: &SnapshotTarget) -> Result<Snapshot, ArchiveError> {
        let request_url = self.snapshot_url(url, target);
        let HttpResponse {
            status,
            headers,
            body,
        } = http::get(&request_url, &self.http)?;
        let fetched_at = Utc::now();
        match status {
            200..=299 => Ok(Snapshot {
                target: target.clone(),
                body,
                headers,
                fetched_at,
            }),
            404 | 410 => Err(ArchiveError::NotFound {
                url: url.to_string(),
                target: target.to_string(),
            }),
            _ => Err(ArchiveError::Http {
                status,
                url: request_url,
            }),
        }
    }
}
