//! CLI command handlers, one file per command.

mod catalog;
mod checksum;
mod index;
mod status;
mod sync;

pub use catalog::run_catalog;
pub use checksum::run_checksum;
pub use index::run_index;
pub use status::run_status;
pub use sync::run_sync;
