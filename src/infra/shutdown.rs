//! Graceful shutdown.

/// Completes when ctrl-c is pressed.
pub async fn shutdown_signal(name: &'static str) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to fetch ctrl_c: {}", e);
    }
    tracing::info!("{} shutting down", name);
}
