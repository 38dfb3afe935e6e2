//! `wbsync status` – per-directory summary from the capture manifest.

use anyhow::Result;
use wbsync_core::capture_db::CaptureDb;

pub async fn run_status() -> Result<()> {
    let db = CaptureDb::open_default().await?;
    let summaries = db.summaries().await?;
    if summaries.is_empty() {
        println!("No captures recorded.");
    } else {
        println!(
            "{:<6} {:<6} {:<8} {:>12} {}",
            "FILES", "LIVE", "UNIQUE", "BYTES", "DIRECTORY"
        );
        for s in summaries {
            println!(
                "{:<6} {:<6} {:<8} {:>12} {}",
                s.files, s.live_files, s.distinct_digests, s.stored_bytes, s.directory
            );
        }
    }
    Ok(())
}
