//! OS signal handling.
//!
//! # Design Decisions
//! - Uses Tokio's signal handling for SIGTERM/SIGINT
//! - SIGIO is left alone: the Nexus installs its own handler with sigaction

use tokio::signal::unix::{signal, SignalKind};

/// Wait for SIGINT or SIGTERM.
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = terminate.recv() => tracing::info!("Received SIGTERM"),
        _ = interrupt.recv() => tracing::info!("Received SIGINT"),
    }
    Ok(())
}
