//! SQLite-backed capture manifest.
//!
//! Handles connection, migrations, and timestamp helpers. Record CRUD lives in
//! `read` and `write`.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the capture manifest.
///
/// The default database lives under the XDG state directory:
/// `~/.local/state/wbsync/captures.db`.
#[derive(Clone)]
pub struct CaptureDb {
    pub(super) pool: Pool<Sqlite>,
}

impl CaptureDb {
    /// Open (or create) the default manifest and run migrations.
    pub async fn open_default() -> Result<Self> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("wbsync")?;
        let state_dir = xdg_dirs.get_state_home().join("wbsync");
        Self::open_at(state_dir.join("captures.db")).await
    }

    /// Open (or create) the manifest at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let db = CaptureDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open a private in-memory manifest (nothing touches disk).
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = CaptureDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // One row per persisted file name. Hard-linked duplicates get their own
        // row with the same digest.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS captures (
                directory TEXT NOT NULL,
                file_name TEXT NOT NULL,
                resource_url TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                live INTEGER NOT NULL,
                digest TEXT NOT NULL,
                size INTEGER NOT NULL,
                saved_at INTEGER NOT NULL,
                PRIMARY KEY (directory, file_name)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS captures_by_digest
            ON captures (directory, digest);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Current time as Unix seconds (for `saved_at`).
pub(super) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
