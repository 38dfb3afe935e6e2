//! Ctrl-C handling: first interrupt stops new fetches, second exits.

use std::sync::Arc;
use wbsync_core::control::SyncControl;

/// Spawns a task that requests cancellation on the first Ctrl-C. In-flight
/// writes finish; no new fetches start. A second Ctrl-C exits immediately.
pub fn spawn_interrupt_listener(control: Arc<SyncControl>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("cannot listen for Ctrl-C: {}", e);
            return;
        }
        control.request_cancel();
        eprintln!("interrupt: finishing current writes, no new fetches (Ctrl-C again to abort)");
        tracing::info!("cancellation requested");
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    })
}
