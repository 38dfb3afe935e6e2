//! Run control: a shared cancellation flag.
//!
//! The CLI sets the flag on Ctrl-C. Workers check it before issuing each new
//! fetch; a write already in progress is allowed to finish its atomic rename.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared between the signal handler and every resource worker.
#[derive(Debug, Default)]
pub struct SyncControl {
    cancelled: AtomicBool,
}

impl SyncControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop issuing new fetches. Idempotent.
    pub fn request_cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn cancel_is_visible_through_clones() {
        let control = Arc::new(SyncControl::new());
        let worker_view = Arc::clone(&control);
        assert!(!worker_view.is_cancelled());
        control.request_cancel();
        control.request_cancel();
        assert!(worker_view.is_cancelled());
    }
}
