//! Manifest writes.

use anyhow::Result;

use super::db::{unix_timestamp, CaptureDb};
use super::types::CaptureRecord;

impl CaptureDb {
    /// Insert or replace the row for `record.directory`/`record.file_name`.
    /// `saved_at` is set to now.
    pub async fn record(&self, record: &CaptureRecord) -> Result<()> {
        let now = unix_timestamp();
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO captures (
                directory, file_name, resource_url, timestamp,
                live, digest, size, saved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.directory)
        .bind(&record.file_name)
        .bind(&record.resource_url)
        .bind(&record.timestamp)
        .bind(record.live)
        .bind(&record.digest)
        .bind(record.size)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Drop the row for a file that no longer exists. Returns rows removed.
    pub async fn forget(&self, directory: &str, file_name: &str) -> Result<u64> {
        let r = sqlx::query(
            r#"
            DELETE FROM captures
            WHERE directory = ?1 AND file_name = ?2
            "#,
        )
        .bind(directory)
        .bind(file_name)
        .execute(&self.pool)
        .await?;
        Ok(r.rows_affected())
    }
}
