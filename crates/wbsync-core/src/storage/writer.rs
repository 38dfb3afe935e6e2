//! Atomic, skip-if-present file writer for one resource directory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use filetime::FileTime;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{TEMP_PREFIX, TEMP_SUFFIX};

/// What a persist call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New file written with `bytes` bytes.
    Written { path: PathBuf, bytes: u64 },
    /// New name created as a hard link to an identical existing file.
    Linked { path: PathBuf, source: PathBuf },
    /// A nonzero-size file already had this name; nothing was touched.
    AlreadyPresent { path: PathBuf },
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Written { path, .. }
            | WriteOutcome::Linked { path, .. }
            | WriteOutcome::AlreadyPresent { path } => path,
        }
    }
}

/// Writes captures into one resource directory. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PersistenceWriter {
    dir: PathBuf,
}

impl PersistenceWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn final_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// True if `file_name` exists with nonzero size.
    pub fn is_present(&self, file_name: &str) -> bool {
        fs::metadata(self.final_path(file_name))
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false)
    }

    /// True if `file_name` exists with exactly `size` bytes.
    pub fn has_size(&self, file_name: &str, size: u64) -> bool {
        fs::metadata(self.final_path(file_name))
            .map(|m| m.is_file() && m.len() == size)
            .unwrap_or(false)
    }

    /// Write `bytes` under `file_name`, unless a nonzero-size file already has
    /// that name. The mtime is set to `last_modified` when given, otherwise it
    /// is the write time. A zero-size leftover is replaced.
    ///
    /// The temp file is removed on every error path; only a completed write is
    /// renamed into place.
    pub fn write(
        &self,
        file_name: &str,
        bytes: &[u8],
        last_modified: Option<DateTime<Utc>>,
    ) -> Result<WriteOutcome> {
        let final_path = self.final_path(file_name);
        if self.is_present(file_name) {
            return Ok(WriteOutcome::AlreadyPresent { path: final_path });
        }

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.dir)
            .with_context(|| format!("failed to create temp file in {}", self.dir.display()))?;
        temp.write_all(bytes)
            .with_context(|| format!("failed to write {}", temp.path().display()))?;
        temp.as_file()
            .sync_all()
            .context("storage sync failed")?;

        if let Some(instant) = last_modified {
            let mtime = FileTime::from_unix_time(instant.timestamp(), instant.timestamp_subsec_nanos());
            filetime::set_file_handle_times(temp.as_file(), None, Some(mtime))
                .with_context(|| format!("failed to set mtime on {}", temp.path().display()))?;
        }

        temp.persist(&final_path).map_err(|e| {
            anyhow::Error::new(e.error).context(format!(
                "failed to rename temp file to {}",
                final_path.display()
            ))
        })?;

        Ok(WriteOutcome::Written {
            path: final_path,
            bytes: bytes.len() as u64,
        })
    }

    /// Delete `.`-prefixed `.part` files left by an interrupted write (a
    /// killed process never runs the temp file's cleanup). Only call while no
    /// other writer is active in this directory. Returns the names removed.
    pub fn discard_partials(&self) -> Result<Vec<String>> {
        let mut removed = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read {}", self.dir.display()))?;
        for entry in entries.flatten() {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !(name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)) {
                continue;
            }
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            fs::remove_file(entry.path())
                .with_context(|| format!("failed to remove {}", entry.path().display()))?;
            removed.push(name);
        }
        Ok(removed)
    }

    /// Create `file_name` as a hard link to `source_name` in the same directory.
    /// Both names then share one physical copy (and one mtime).
    pub fn link(&self, source_name: &str, file_name: &str) -> Result<WriteOutcome> {
        let final_path = self.final_path(file_name);
        if self.is_present(file_name) {
            return Ok(WriteOutcome::AlreadyPresent { path: final_path });
        }
        let source = self.final_path(source_name);
        if final_path.exists() {
            fs::remove_file(&final_path)
                .with_context(|| format!("failed to remove empty {}", final_path.display()))?;
        }
        fs::hard_link(&source, &final_path).with_context(|| {
            format!(
                "failed to link {} to {}",
                final_path.display(),
                source.display()
            )
        })?;
        Ok(WriteOutcome::Linked {
            path: final_path,
            source,
        })
    }
}
