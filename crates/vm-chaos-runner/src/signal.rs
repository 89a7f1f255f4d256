//! OS signal forwarding into the abort token

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Cancel `token` on the first SIGINT or SIGTERM.
///
/// If no handler can be installed the token is left untouched and the run
/// continues without abort support.
pub fn forward_shutdown_signals(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                warn!("[Abort]: Received {signal}, reverting chaos on all targets");
                token.cancel();
            }
            Err(e) => error!("Failed to listen for shutdown signals: {e}"),
        }
    })
}

#[cfg(unix)]
async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl+C")
}
