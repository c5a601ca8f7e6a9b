//! Signal handling for both processes

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::infrastructure::web::HealthState;

/// Resolves on SIGINT or SIGTERM
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Flags shutdown and cancels `token` once `signal` resolves
pub fn spawn_shutdown_trigger<F>(signal: F, health: HealthState, token: CancellationToken)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = signal => {
                info!("Shutdown requested");
                health.begin_shutdown();
                health.set_ready(false);
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

/// Waits for `work` at most `timeout`; returns false when it had to give up
pub async fn drain<F>(work: F, timeout: Duration) -> bool
where
    F: Future,
{
    match tokio::time::timeout(timeout, work).await {
        Ok(_) => true,
        Err(_) => {
            warn!(timeout = ?timeout, "In-flight work did not finish before the shutdown timeout");
            false
        }
    }
}
