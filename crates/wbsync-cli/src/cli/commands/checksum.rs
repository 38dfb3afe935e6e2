//! `wbsync checksum` – SHA-256 of a file (same digest the manifest records).

use anyhow::Result;
use std::path::Path;
use wbsync_core::checksum;

pub async fn run_checksum(path: &Path) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    Ok(())
}
