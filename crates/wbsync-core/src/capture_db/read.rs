//! Manifest reads: digest lookup, per-directory listing, summaries.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::db::CaptureDb;
use super::types::{CaptureRecord, DirectorySummary};

fn record_from_row(row: &SqliteRow) -> CaptureRecord {
    CaptureRecord {
        directory: row.get("directory"),
        file_name: row.get("file_name"),
        resource_url: row.get("resource_url"),
        timestamp: row.get("timestamp"),
        live: row.get("live"),
        digest: row.get("digest"),
        size: row.get("size"),
        saved_at: row.get("saved_at"),
    }
}

impl CaptureDb {
    /// Earliest-saved file in `directory` with content `digest`, if any.
    pub async fn find_by_digest(
        &self,
        directory: &str,
        digest: &str,
    ) -> Result<Option<CaptureRecord>> {
        let row = sqlx::query(
            r#"
            SELECT directory, file_name, resource_url, timestamp, live, digest, size, saved_at
            FROM captures
            WHERE directory = ?1 AND digest = ?2
            ORDER BY saved_at ASC, file_name ASC
            LIMIT 1
            "#,
        )
        .bind(directory)
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(record_from_row))
    }

    /// All files recorded for `directory`, oldest timestamp first.
    pub async fn list_directory(&self, directory: &str) -> Result<Vec<CaptureRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT directory, file_name, resource_url, timestamp, live, digest, size, saved_at
            FROM captures
            WHERE directory = ?1
            ORDER BY timestamp ASC, file_name ASC
            "#,
        )
        .bind(directory)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(record_from_row).collect())
    }

    /// One summary per directory, most recently saved first.
    pub async fn summaries(&self) -> Result<Vec<DirectorySummary>> {
        let rows = sqlx::query(
            r#"
            SELECT directory,
                   MAX(resource_url) AS resource_url,
                   COUNT(*) AS files,
                   SUM(live) AS live_files,
                   COUNT(DISTINCT digest) AS distinct_digests,
                   MAX(saved_at) AS last_saved_at
            FROM captures
            GROUP BY directory
            ORDER BY last_saved_at DESC, directory ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let directory: String = row.get("directory");
            let stored_bytes = self.stored_bytes(&directory).await?;
            out.push(DirectorySummary {
                directory,
                resource_url: row.get("resource_url"),
                files: row.get("files"),
                live_files: row.get("live_files"),
                distinct_digests: row.get("distinct_digests"),
                stored_bytes,
                last_saved_at: row.get("last_saved_at"),
            });
        }
        Ok(out)
    }

    /// Sum of sizes counting each digest once.
    async fn stored_bytes(&self, directory: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(size), 0) AS total
            FROM (
                SELECT MAX(size) AS size
                FROM captures
                WHERE directory = ?1
                GROUP BY digest
            )
            "#,
        )
        .bind(directory)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("total"))
    }
}
