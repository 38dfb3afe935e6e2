//! `wbsync index` – list what a resource directory holds.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::SystemTime;
use wbsync_core::config::SyncConfig;
use wbsync_core::local_index::LocalIndex;

pub async fn run_index(dir: &Path, cfg: &SyncConfig) -> Result<()> {
    let index = {
        let owned = dir.to_path_buf();
        tokio::task::spawn_blocking(move || LocalIndex::scan(&owned))
            .await
            .context("index task join")?
            .with_context(|| format!("read directory {}", dir.display()))?
    };

    if index.entries().is_empty() {
        println!("No captures in {}.", dir.display());
        return Ok(());
    }

    println!("{:<16} {:<6} {:>12} {}", "TIMESTAMP", "KIND", "SIZE", "FILE");
    for e in index.entries() {
        let kind = if e.is_live { "live" } else { "arch" };
        let size = if e.is_saved() {
            e.size_bytes.to_string()
        } else {
            "empty".to_string()
        };
        println!(
            "{:<16} {:<6} {:>12} {}",
            e.timestamp.as_str(),
            kind,
            size,
            e.file_name
        );
    }

    let now = SystemTime::now();
    let fresh = index.has_fresh_live(cfg.freshness_window(), now);
    println!(
        "{} archived capture(s); live copy {}",
        index.saved_timestamps().len(),
        match index.latest_live() {
            Some(live) if fresh => format!("fresh ({}s old)", live.age(now).as_secs()),
            Some(live) => format!("stale ({}s old)", live.age(now).as_secs()),
            None => "missing".to_string(),
        }
    );
    Ok(())
}
