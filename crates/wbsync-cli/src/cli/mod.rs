//! CLI for the wbsync archive synchronizer.

mod commands;
mod interrupt;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use wbsync_core::config;

use commands::{run_catalog, run_checksum, run_index, run_status, run_sync};

/// Top-level CLI for wbsync.
#[derive(Debug, Parser)]
#[command(name = "wbsync")]
#[command(about = "wbsync: mirror every archived capture of web resources", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options shared by commands that synchronize resources.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncOptions {
    /// Destination root (overrides `destination_root` from config).
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,
    /// Synchronize up to N resources concurrently.
    #[arg(long, value_name = "N")]
    pub jobs: Option<usize>,
    /// Do not fetch the current live copy.
    #[arg(long)]
    pub no_live: bool,
    /// Live copies younger than this many seconds are not fetched again.
    #[arg(long, value_name = "S")]
    pub freshness_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every archived capture (and a live copy) of the given URLs.
    Sync {
        /// Resource URLs.
        #[arg(required = true)]
        urls: Vec<String>,
        #[command(flatten)]
        opts: SyncOptions,
    },

    /// Discover resources on a catalog page, then sync them.
    Catalog {
        /// Catalog page URL.
        url: String,
        /// CSS selector matching one element per resource.
        #[arg(long)]
        selector: String,
        /// Attribute holding the resource URL.
        #[arg(long, default_value = "href")]
        attr: String,
        /// CSS selector (within each item) for the resource title.
        #[arg(long)]
        title_selector: Option<String>,
        /// CSS selector (within each item) for a version label.
        #[arg(long)]
        version_selector: Option<String>,
        /// Read the version label from this attribute instead of the text.
        #[arg(long, requires = "version_selector")]
        version_attr: Option<String>,
        /// Also scan every archived capture of the catalog page.
        #[arg(long)]
        across_timeline: bool,
        #[command(flatten)]
        opts: SyncOptions,
    },

    /// List the captures saved in a resource directory.
    Index {
        /// Resource directory.
        dir: PathBuf,
    },

    /// Summarize the capture manifest.
    Status,

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: String,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Sync { urls, opts } => run_sync(cfg, urls, &opts).await?,
            CliCommand::Catalog {
                url,
                selector,
                attr,
                title_selector,
                version_selector,
                version_attr,
                across_timeline,
                opts,
            } => {
                let mut query = wbsync_core::catalog::CatalogQuery::new(selector).with_url_attr(attr);
                if let Some(title) = title_selector {
                    query = query.with_title_selector(title);
                }
                if let Some(version) = version_selector {
                    query = query.with_version_selector(version, version_attr);
                }
                run_catalog(cfg, &url, query, across_timeline, &opts).await?;
            }
            CliCommand::Index { dir } => run_index(&dir, &cfg).await?,
            CliCommand::Status => run_status().await?,
            CliCommand::Checksum { path } => run_checksum(Path::new(&path)).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
