//! Process-wide shutdown state.
//!
//! `SHUTDOWN` is set by Ctrl+C. The scheduler checks it between cycles and
//! while sleeping; a cycle already in flight always runs to completion.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            // Second Ctrl+C: stop waiting for the current cycle.
            std::process::exit(130);
        }
        crate::log!("scheduler"; "interrupt received, stopping after the current cycle...");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering - worst case is one more sleep slice before stopping
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
