//! Run many resources concurrently.
//!
//! Keeps up to `max_concurrent` resources in flight; when one finishes, the
//! next queued resource is started until the queue is empty. Resources that
//! map to the same directory are serialized through a per-directory lock.

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::capture::Resource;

use super::{ResourceReport, Synchronizer};

/// Synchronize `resources` with at most `max_concurrent` in flight.
/// Reports come back in input order. Once cancellation is requested, resources
/// not yet started are reported as cancelled without touching the disk.
pub async fn run_batch(
    sync: Arc<Synchronizer>,
    resources: Vec<Resource>,
    max_concurrent: usize,
) -> Result<Vec<ResourceReport>> {
    let max_concurrent = max_concurrent.max(1);
    let mut dir_locks: HashMap<PathBuf, Arc<Mutex<()>>> = HashMap::new();
    let mut reports: Vec<Option<ResourceReport>> = vec![None; resources.len()];
    let mut queue = resources.into_iter().enumerate();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_concurrent {
            let Some((i, resource)) = queue.next() else {
                break;
            };
            let dir = sync.resource_dir(&resource);
            if sync.control().is_cancelled() {
                let mut report = ResourceReport::new(&resource.url, dir);
                report.cancelled = true;
                reports[i] = Some(report);
                continue;
            }
            let lock = Arc::clone(dir_locks.entry(dir).or_default());
            let sync = Arc::clone(&sync);
            join_set.spawn(async move {
                let _guard = lock.lock().await;
                (i, sync.sync_resource(&resource).await)
            });
        }

        if join_set.is_empty() {
            break;
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        let (i, report) = res.map_err(|e| anyhow::anyhow!("resource task join: {}", e))?;
        if let Some(failure) = &report.failure {
            tracing::error!(url = %report.url, "resource failed: {}", failure);
        }
        reports[i] = Some(report);
    }

    Ok(reports.into_iter().flatten().collect())
}
