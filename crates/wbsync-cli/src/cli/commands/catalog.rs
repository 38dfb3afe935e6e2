//! `wbsync catalog` – discover resources on a catalog page and sync them.

use anyhow::{Context, Result};
use wbsync_core::catalog::{self, CatalogQuery};
use wbsync_core::config::SyncConfig;

use super::sync::{apply_options, archive_client, sync_resources};
use crate::cli::SyncOptions;

pub async fn run_catalog(
    cfg: SyncConfig,
    catalog_url: &str,
    query: CatalogQuery,
    across_timeline: bool,
    opts: &SyncOptions,
) -> Result<()> {
    let cfg = apply_options(cfg, opts);
    let service = archive_client(&cfg);
    let retry = cfg.retry_policy();
    let url = catalog_url.to_string();

    let resources = tokio::task::spawn_blocking(move || {
        catalog::discover(service.as_ref(), &url, &query, across_timeline, &retry)
    })
    .await
    .context("catalog task join")??;

    println!("Found {} resource(s) on {}", resources.len(), catalog_url);
    for r in &resources {
        let mut line = format!("  {}", r.url);
        if let Some(title) = &r.title {
            line.push_str(&format!("  ({})", title));
        }
        match (r.version_date(), &r.version) {
            (Some(date), _) => line.push_str(&format!("  [{}]", date)),
            (None, Some(version)) => line.push_str(&format!("  [{}]", version)),
            (None, None) => {}
        }
        println!("{}", line);
    }

    sync_resources(cfg, resources, !opts.no_live).await
}
