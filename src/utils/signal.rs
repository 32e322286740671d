//! Termination signal handling.

use anyhow::{Context, Result};

/// Wait until the process receives SIGINT, SIGTERM, or SIGHUP and return the
/// signal's name. Only SIGINT (Ctrl-C) is watched on non-Unix platforms.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
#[cfg(unix)]
pub async fn shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;

    let name = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for SIGINT")?;
            "SIGINT"
        }
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
    };

    tracing::debug!("Received {name}");
    Ok(name)
}

/// Wait until the process receives SIGINT, SIGTERM, or SIGHUP and return the
/// signal's name. Only SIGINT (Ctrl-C) is watched on non-Unix platforms.
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    tracing::debug!("Received SIGINT");
    Ok("SIGINT")
}
