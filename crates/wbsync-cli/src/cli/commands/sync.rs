//! `wbsync sync` – synchronize explicit resource URLs.

use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use wbsync_core::archive::{ArchiveService, WaybackClient};
use wbsync_core::capture::Resource;
use wbsync_core::capture_db::CaptureDb;
use wbsync_core::config::SyncConfig;
use wbsync_core::control::SyncControl;
use wbsync_core::sync::{self, ResourceReport, Synchronizer};

use crate::cli::interrupt;
use crate::cli::SyncOptions;

pub async fn run_sync(cfg: SyncConfig, urls: Vec<String>, opts: &SyncOptions) -> Result<()> {
    let resources = urls.into_iter().map(Resource::new).collect();
    sync_resources(apply_options(cfg, opts), resources, !opts.no_live).await
}

/// Command-line overrides on top of the loaded config.
pub(super) fn apply_options(mut cfg: SyncConfig, opts: &SyncOptions) -> SyncConfig {
    if let Some(dest) = &opts.dest {
        cfg.destination_root = dest.clone();
    }
    if let Some(jobs) = opts.jobs {
        cfg.max_concurrent_resources = jobs;
    }
    if let Some(secs) = opts.freshness_secs {
        cfg.freshness_window_secs = secs;
    }
    cfg
}

pub(super) fn archive_client(cfg: &SyncConfig) -> Arc<dyn ArchiveService> {
    Arc::new(WaybackClient::new(
        cfg.archive_base_url.clone(),
        cfg.http_options(),
    ))
}

/// Run a batch and print one line per resource. Fails only if every resource
/// failed.
pub(super) async fn sync_resources(
    cfg: SyncConfig,
    resources: Vec<Resource>,
    fetch_live: bool,
) -> Result<()> {
    if resources.is_empty() {
        println!("No resources to synchronize.");
        return Ok(());
    }

    let cfg = Arc::new(cfg);
    let control = Arc::new(SyncControl::new());
    let listener = interrupt::spawn_interrupt_listener(Arc::clone(&control));

    let mut synchronizer = Synchronizer::new(archive_client(&cfg), Arc::clone(&cfg))
        .with_control(control)
        .with_live(fetch_live);
    match CaptureDb::open_default().await {
        Ok(db) => synchronizer = synchronizer.with_capture_db(db),
        Err(e) => tracing::warn!("capture manifest unavailable, dedup disabled: {:#}", e),
    }

    let started = Instant::now();
    let total = resources.len();
    let reports = sync::run_batch(
        Arc::new(synchronizer),
        resources,
        cfg.max_concurrent_resources,
    )
    .await?;
    listener.abort();

    for report in &reports {
        println!("{}", report);
    }
    tracing::info!(
        "synchronized {} resource(s) in {:.1}s",
        total,
        started.elapsed().as_secs_f64()
    );
    check_reports(&reports)
}

fn check_reports(reports: &[ResourceReport]) -> Result<()> {
    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if !reports.is_empty() && failed == reports.len() {
        anyhow::bail!("all {} resource(s) failed", failed);
    }
    if failed > 0 {
        eprintln!("{} of {} resource(s) failed", failed, reports.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use wbsync_core::sync::ResourceFailure;

    fn report(url: &str, failed: bool) -> ResourceReport {
        let mut r = ResourceReport::new(url, PathBuf::from("files"));
        if failed {
            r.failure = Some(ResourceFailure::Timeline("HTTP 503".to_string()));
        }
        r
    }

    #[test]
    fn options_override_config() {
        let opts = SyncOptions {
            dest: Some(PathBuf::from("/srv/mirror")),
            jobs: Some(8),
            no_live: true,
            freshness_secs: Some(60),
        };
        let cfg = apply_options(SyncConfig::default(), &opts);
        assert_eq!(cfg.destination_root, PathBuf::from("/srv/mirror"));
        assert_eq!(cfg.max_concurrent_resources, 8);
        assert_eq!(cfg.freshness_window_secs, 60);

        let cfg = apply_options(SyncConfig::default(), &SyncOptions::default());
        assert_eq!(cfg.destination_root, PathBuf::from("files"));
    }

    #[test]
    fn only_total_failure_is_an_error() {
        assert!(check_reports(&[report("a", true), report("b", false)]).is_ok());
        assert!(check_reports(&[report("a", true), report("b", true)]).is_err());
        assert!(check_reports(&[]).is_ok());
    }
}
