//! Graceful shutdown trigger.

use std::future::Future;

/// Resolves once `signal` fires.
///
/// If the signal handler cannot be installed the error is logged and this
/// never resolves, so the server keeps running instead of exiting at once.
pub async fn wait_for<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal, continuing without it");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down...");
}
