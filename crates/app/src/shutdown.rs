use tokio::signal;

/// Resolves once the process receives Ctrl-C.
///
/// If the signal handler cannot be installed the future resolves
/// immediately so the caller still stops the session cleanly.
pub async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested via Ctrl-C"),
        Err(e) => tracing::error!("Failed to install Ctrl-C handler: {}", e),
    }
}
