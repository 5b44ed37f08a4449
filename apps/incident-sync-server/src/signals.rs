//! Process stop triggers for the server.

use anyhow::{Context, Result};
use tokio::signal;

/// Resolves once the process is asked to stop: Ctrl+C, or SIGTERM on unix.
///
/// # Errors
/// Returns an error if a signal listener cannot be installed.
pub async fn wait_for_shutdown() -> Result<()> {
    let trigger = tokio::select! {
        res = signal::ctrl_c() => {
            res.context("failed to listen for Ctrl+C")?;
            "ctrl-c"
        }
        res = terminate() => {
            res?;
            "sigterm"
        }
    };

    tracing::info!(signal = trigger, "Stop requested, finishing in-flight incident calls");
    Ok(())
}

#[cfg(unix)]
async fn terminate() -> Result<()> {
    signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?
        .recv()
        .await;
    Ok(())
}

#[cfg(not(unix))]
async fn terminate() -> Result<()> {
    std::future::pending().await
}
