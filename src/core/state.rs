//! Process-wide shutdown state.
//!
//! A single cancellation token shared by every actor: Ctrl+C cancels it, and
//! each actor loop selects on `cancelled()` to stop. A second Ctrl+C exits
//! immediately.

use std::sync::LazyLock;

use tokio_util::sync::CancellationToken;

/// Cancelled once shutdown has been requested (Ctrl+C received)
static SHUTDOWN: LazyLock<CancellationToken> = LazyLock::new(CancellationToken::new);

/// Setup the global Ctrl+C handler. Call once at program start
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.is_cancelled() {
            // Second Ctrl+C: something is stuck, stop waiting for it
            std::process::exit(130);
        }
        crate::log!("watch"; "shutting down...");
        SHUTDOWN.cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Token cancelled on shutdown; clones observe the same state.
pub fn shutdown_token() -> CancellationToken {
    SHUTDOWN.clone()
}
