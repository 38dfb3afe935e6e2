//! Sync orchestration: bring one resource directory up to date with the
//! archive, and run many resources as a bounded batch.
//!
//! Per resource the steps are: prepare the directory and scan what it holds,
//! refresh the live copy if it is stale, fetch the timeline, then fetch and
//! persist every capture not already on disk. Only directory and timeline
//! failures abort a resource; single-capture failures are counted and logged.

mod batch;
mod report;


pub use batch::run_batch;
pub use report::{CaptureError, LiveOutcome, ResourceFailure, ResourceReport};

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::archive::{ArchiveError, ArchiveService};
use crate::capture::{CaptureTimestamp, Resource, Snapshot, SnapshotTarget, TimelineEntry};
use crate::capture_db::{CaptureDb, CaptureRecord};
use crate::checksum;
use crate::config::SyncConfig;
use crate::control::SyncControl;
use crate::local_index::{persisted_file_name, LocalIndex};
use crate::metadata;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::storage::{PersistenceWriter, WriteOutcome};
use crate::url_model::{self, NameSanitizer};

/// Synchronizes resources against one archive service.
///
/// Shared by all workers of a batch (wrap in `Arc`); holds only read-only
/// configuration plus the cancellation flag.
pub struct Synchronizer {
    service: Arc<dyn ArchiveService>,
    cfg: Arc<SyncConfig>,
    sanitizer: NameSanitizer,
    retry: RetryPolicy,
    db: Option<CaptureDb>,
    control: Arc<SyncControl>,
    fetch_live: bool,
}

impl Synchronizer {
    pub fn new(service: Arc<dyn ArchiveService>, cfg: Arc<SyncConfig>) -> Self {
        let sanitizer = NameSanitizer::new(cfg.illegal_chars());
        let retry = cfg.retry_policy();
        Self {
            service,
            cfg,
            sanitizer,
            retry,
            db: None,
            control: Arc::new(SyncControl::new()),
            fetch_live: true,
        }
    }

    /// Record digests in `db` and, when `content_dedup` is on, hard-link
    /// byte-identical captures.
    pub fn with_capture_db(mut self, db: CaptureDb) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_control(mut self, control: Arc<SyncControl>) -> Self {
        self.control = control;
        self
    }

    pub fn with_live(mut self, fetch_live: bool) -> Self {
        self.fetch_live = fetch_live;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn control(&self) -> &Arc<SyncControl> {
        &self.control
    }

    /// Directory owned by `resource` under the destination root.
    pub fn resource_dir(&self, resource: &Resource) -> PathBuf {
        self.cfg
            .destination_root
            .join(url_model::resource_dir(&self.sanitizer, &resource.url))
    }

    /// Synchronize one resource. Never fails as a whole; the report carries
    /// the resource-level failure, if any.
    pub async fn sync_resource(&self, resource: &Resource) -> ResourceReport {
        let dir = self.resource_dir(resource);
        let mut report = ResourceReport::new(&resource.url, dir.clone());

        let PreparedDir { path, index } = match prepare_dir(dir.clone()).await {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::error!(url = %resource.url, "resource directory unusable: {:#}", e);
                report.failure = Some(ResourceFailure::Filesystem(format!("{:#}", e)));
                return report;
            }
        };
        let writer = PersistenceWriter::new(path);

        report.live = self.sync_live(resource, &index, &writer).await;
        if report.live == LiveOutcome::Cancelled || self.control.is_cancelled() {
            report.cancelled = true;
            return report;
        }

        let timeline = match self.fetch_timeline(&resource.url).await {
            Ok(timeline) => timeline,
            Err(e) if e.is_cancelled() => {
                report.cancelled = true;
                return report;
            }
            Err(e) => {
                tracing::error!(url = %resource.url, "timeline fetch failed: {}", e);
                report.failure = Some(ResourceFailure::Timeline(e.to_string()));
                return report;
            }
        };
        tracing::debug!(
            url = %resource.url,
            entries = timeline.len(),
            saved = index.saved_timestamps().len(),
            "timeline fetched"
        );

        let mut saved = index.saved_timestamps();
        let mut seen = HashSet::new();
        for entry in timeline {
            if !seen.insert(entry.timestamp.clone()) {
                report.duplicates += 1;
                continue;
            }
            if saved.contains(&entry.timestamp) {
                report.skipped += 1;
                continue;
            }
            if self.control.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let target = SnapshotTarget::Archived(entry.timestamp.clone());
            match self.capture(resource, &entry.url, &target, &writer).await {
                Ok(WriteOutcome::AlreadyPresent { .. }) => {
                    saved.insert(entry.timestamp);
                    report.skipped += 1;
                }
                Ok(outcome) => {
                    if matches!(outcome, WriteOutcome::Linked { .. }) {
                        report.deduplicated += 1;
                    }
                    tracing::info!("saved {}", outcome.path().display());
                    saved.insert(entry.timestamp);
                    report.fetched += 1;
                }
                Err(e) if e.is_not_found() => {
                    tracing::info!(url = %entry.url, timestamp = %entry.timestamp, "capture no longer served: {}", e);
                    report.not_found += 1;
                }
                Err(e) if e.is_cancelled() => {
                    report.cancelled = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(url = %entry.url, timestamp = %entry.timestamp, "capture failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!("{}", report);
        report
    }

    async fn sync_live(
        &self,
        resource: &Resource,
        index: &LocalIndex,
        writer: &PersistenceWriter,
    ) -> LiveOutcome {
        if !self.fetch_live {
            return LiveOutcome::Disabled;
        }
        if index.has_fresh_live(self.cfg.freshness_window(), SystemTime::now()) {
            tracing::debug!(url = %resource.url, "live copy is fresh");
            return LiveOutcome::Fresh;
        }
        if self.control.is_cancelled() {
            return LiveOutcome::Cancelled;
        }
        match self
            .capture(resource, &resource.url, &SnapshotTarget::Live, writer)
            .await
        {
            Ok(outcome) => {
                tracing::info!("saved live copy {}", outcome.path().display());
                LiveOutcome::Fetched(file_name_of(outcome.path()))
            }
            Err(e) if e.is_cancelled() => LiveOutcome::Cancelled,
            Err(e) => {
                tracing::warn!(url = %resource.url, "live fetch failed: {}", e);
                LiveOutcome::Failed(e.to_string())
            }
        }
    }

    /// Fetch one snapshot and persist it: metadata, naming, optional dedup,
    /// atomic write, manifest row.
    async fn capture(
        &self,
        resource: &Resource,
        fetch_url: &str,
        target: &SnapshotTarget,
        writer: &PersistenceWriter,
    ) -> Result<WriteOutcome, CaptureError> {
        let snapshot = self.fetch_snapshot(fetch_url, target).await?;

        let meta = metadata::extract(&snapshot.headers);
        for problem in &meta.problems {
            if problem.affects_persistence() {
                tracing::warn!(url = %fetch_url, target = %target, "ignoring header: {}", problem);
            } else {
                tracing::debug!(url = %fetch_url, target = %target, "ignoring header: {}", problem);
            }
        }
        tracing::debug!(
            url = %fetch_url,
            target = %target,
            bytes = snapshot.body.len(),
            retrieved_at = ?meta.retrieved_at,
            "snapshot fetched"
        );

        let filename =
            url_model::derive_filename(&self.sanitizer, &resource.url, meta.filename.as_deref());
        let timestamp = match target {
            SnapshotTarget::Archived(ts) => ts.clone(),
            SnapshotTarget::Live => CaptureTimestamp::from_datetime(snapshot.fetched_at),
        };
        let file_name = persisted_file_name(&timestamp, target.is_live(), &filename);

        let size = snapshot.body.len() as u64;
        let digest = self
            .db
            .is_some()
            .then(|| checksum::sha256_bytes(&snapshot.body));
        let link_source = match &digest {
            Some(digest) if self.cfg.content_dedup => {
                self.find_identical(writer, digest, size, &file_name).await
            }
            _ => None,
        };

        let outcome = persist(
            writer.clone(),
            file_name.clone(),
            snapshot.body,
            meta.last_modified,
            link_source,
        )
        .await?;

        if let (Some(db), Some(digest)) = (&self.db, digest) {
            if !matches!(outcome, WriteOutcome::AlreadyPresent { .. }) {
                let record = CaptureRecord {
                    directory: dir_key(writer.dir()),
                    file_name,
                    resource_url: resource.url.clone(),
                    timestamp: timestamp.to_string(),
                    live: target.is_live(),
                    digest,
                    size: size as i64,
                    saved_at: 0,
                };
                if let Err(e) = db.record(&record).await {
                    tracing::warn!("capture manifest update failed: {:#}", e);
                }
            }
        }

        Ok(outcome)
    }

    /// Existing file in this directory with the same digest and size, if the
    /// manifest knows one. Rows whose file is gone or has changed size are
    /// dropped so a later identical file can take their place.
    async fn find_identical(
        &self,
        writer: &PersistenceWriter,
        digest: &str,
        size: u64,
        file_name: &str,
    ) -> Option<String> {
        let db = self.db.as_ref()?;
        let directory = dir_key(writer.dir());
        loop {
            let rec = match db.find_by_digest(&directory, digest).await {
                Ok(Some(rec)) => rec,
                Ok(None) => return None,
                Err(e) => {
                    tracing::warn!("capture manifest lookup failed: {:#}", e);
                    return None;
                }
            };
            if writer.has_size(&rec.file_name, size) {
                return (rec.file_name != file_name).then_some(rec.file_name);
            }
            tracing::debug!(file = %rec.file_name, "forgetting stale manifest row");
            match db.forget(&directory, &rec.file_name).await {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("capture manifest cleanup failed: {:#}", e);
                    return None;
                }
            }
        }
    }

    async fn fetch_timeline(&self, url: &str) -> Result<Vec<TimelineEntry>, CaptureError> {
        let service = Arc::clone(&self.service);
        let control = Arc::clone(&self.control);
        let retry = self.retry;
        let url = url.to_string();
        let timeline = tokio::task::spawn_blocking(move || {
            run_with_retry(&retry, |_| {
                if control.is_cancelled() {
                    return Err(ArchiveError::Cancelled);
                }
                service.timeline(&url)
            })
        })
        .await??;
        Ok(timeline)
    }

    async fn fetch_snapshot(
        &self,
        url: &str,
        target: &SnapshotTarget,
    ) -> Result<Snapshot, CaptureError> {
        let service = Arc::clone(&self.service);
        let control = Arc::clone(&self.control);
        let retry = self.retry;
        let url = url.to_string();
        let target = target.clone();
        let snapshot = tokio::task::spawn_blocking(move || {
            run_with_retry(&retry, |attempt| {
                if control.is_cancelled() {
                    return Err(ArchiveError::Cancelled);
                }
                if attempt > 1 {
                    tracing::debug!(url = %url, target = %target, attempt, "retrying snapshot fetch");
                }
                service.snapshot(&url, &target)
            })
        })
        .await??;
        Ok(snapshot)
    }
}

/// A resource directory ready for writing.
struct PreparedDir {
    /// Canonical path; also the manifest key, so runs from different working
    /// directories agree.
    path: PathBuf,
    index: LocalIndex,
}

/// Create the resource directory, drop temp files a killed run left behind,
/// and take the local index snapshot. Runs under the per-directory lock.
async fn prepare_dir(dir: PathBuf) -> Result<PreparedDir> {
    tokio::task::spawn_blocking(move || -> Result<PreparedDir> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create directory {}", dir.display()))?;
        let path = std::fs::canonicalize(&dir)
            .with_context(|| format!("resolve directory {}", dir.display()))?;
        match PersistenceWriter::new(&path).discard_partials() {
            Ok(removed) if !removed.is_empty() => {
                tracing::info!(dir = %path.display(), ?removed, "removed interrupted writes")
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("could not clear interrupted writes: {:#}", e),
        }
        let index =
            LocalIndex::scan(&path).with_context(|| format!("read directory {}", dir.display()))?;
        Ok(PreparedDir { path, index })
    })
    .await
    .context("index task join")?
}

/// Link to `link_source` when given (falling back to a copy if linking
/// fails), otherwise write `body`.
async fn persist(
    writer: PersistenceWriter,
    file_name: String,
    body: Vec<u8>,
    last_modified: Option<chrono::DateTime<chrono::Utc>>,
    link_source: Option<String>,
) -> Result<WriteOutcome, CaptureError> {
    let outcome = tokio::task::spawn_blocking(move || -> Result<WriteOutcome> {
        if let Some(source) = link_source {
            match writer.link(&source, &file_name) {
                Ok(outcome) => return Ok(outcome),
                Err(e) => tracing::warn!("hard link failed, storing a copy: {:#}", e),
            }
        }
        writer.write(&file_name, &body, last_modified)
    })
    .await?
    .map_err(CaptureError::Persist)?;
    Ok(outcome)
}

/// Manifest key for a resource directory.
fn dir_key(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
