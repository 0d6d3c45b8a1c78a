use tokio::signal;
use tracing::{error, warn};

/// Resolves on Ctrl+C or SIGTERM. If a handler cannot be installed, that
/// signal is never awaited and the error is logged.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Ctrl+C received, stopping mail service"),
        _ = terminate => warn!("SIGTERM received, stopping mail service"),
    }
}
