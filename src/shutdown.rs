use tokio_util::sync::CancellationToken;

/// Install a shutdown handler listening for Ctrl-C and, on unix, SIGTERM.
///
/// Returns a `CancellationToken` cancelled when either signal arrives. The
/// run loop watches this token and stops the engine gracefully; in-flight
/// executions still run to completion.
pub fn install_shutdown_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received Ctrl-C, shutting down");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down");
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received Ctrl-C, shutting down");
        }

        token_clone.cancel();
    });

    token
}
