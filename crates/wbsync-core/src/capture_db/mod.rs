//! Persistent capture manifest (SQLite via sqlx).
//!
//! Records every persisted file with its content digest so byte-identical
//! captures under different timestamps can share one physical file. The
//! resource directories stay the source of truth for what is saved; this
//! database is advisory.

mod db;
mod read;
mod types;
mod write;

pub use db::CaptureDb;
pub use types::{CaptureRecord, DirectorySummary};

#[cfg(test)]
mod tests;
