use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::archive::HttpOptions;
use crate::retry::RetryPolicy;
use crate::url_model::{IllegalChars, DEFAULT_ILLEGAL_CHARS};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per archive call (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.5 = 500ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/wbsync/config.toml`.
///
/// Read once at startup and shared read-only between workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root under which each resource gets its own directory.
    pub destination_root: PathBuf,
    /// A live copy younger than this is not fetched again.
    pub freshness_window_secs: u64,
    /// Resources synchronized at once in a batch.
    pub max_concurrent_resources: usize,
    /// Connect timeout for each archive or live request.
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout for each archive or live request.
    pub request_timeout_secs: u64,
    /// Wayback-compatible archive endpoint.
    pub archive_base_url: String,
    /// Hard-link byte-identical captures instead of storing them twice.
    pub content_dedup: bool,
    /// Characters replaced with `_` in file and directory names (control
    /// characters are always replaced).
    pub illegal_chars: String,
    /// Optional retry policy; if missing, built-in defaults are used.
    pub retry: Option<RetryConfig>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            destination_root: PathBuf::from("files"),
            freshness_window_secs: 2 * 60 * 60,
            max_concurrent_resources: 4,
            connect_timeout_secs: 15,
            request_timeout_secs: 120,
            archive_base_url: crate::archive::WaybackClient::default().base_url().to_string(),
            content_dedup: true,
            illegal_chars: DEFAULT_ILLEGAL_CHARS.to_string(),
            retry: None,
        }
    }
}

impl SyncConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(RetryPolicy::from)
            .unwrap_or_default()
    }

    pub fn illegal_chars(&self) -> IllegalChars {
        IllegalChars::new(&self.illegal_chars)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("wbsync")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<SyncConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = SyncConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<SyncConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: SyncConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
