//! Types stored in and returned by the capture manifest.

/// One persisted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRecord {
    /// Resource directory the file lives in.
    pub directory: String,
    pub file_name: String,
    pub resource_url: String,
    /// 14-digit capture timestamp (fetch instant for live copies).
    pub timestamp: String,
    pub live: bool,
    /// Lowercase hex SHA-256 of the content.
    pub digest: String,
    pub size: i64,
    /// Unix seconds when the row was written; filled in by `record`.
    pub saved_at: i64,
}

/// Per-directory rollup used by `wbsync status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySummary {
    pub directory: String,
    pub resource_url: String,
    pub files: i64,
    pub live_files: i64,
    pub distinct_digests: i64,
    /// Bytes actually stored (one copy per distinct digest).
    pub stored_bytes: i64,
    pub last_saved_at: i64,
}
