//! Persistence of fetched captures.
//!
//! Bytes go to a hidden temp file in the destination directory, get their
//! mtime set, and are atomically renamed to the final name. A crash mid-write
//! leaves only a dot-prefixed `.part` file; the local index ignores it and
//! the next sync of that directory deletes it.

mod writer;

pub use writer::{PersistenceWriter, WriteOutcome};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Temporary file prefix; keeps temp files out of the timestamp namespace.
pub const TEMP_PREFIX: &str = ".";
