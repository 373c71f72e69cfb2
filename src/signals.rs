use tracing::{error, info};

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Resolve when the process is asked to stop (SIGTERM or SIGINT).
///
/// If a handler cannot be installed the error is logged and that signal is
/// ignored; Ctrl+C remains available.
#[cfg(unix)]
pub async fn shutdown_signal() {
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to setup SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = terminate => info!("SIGTERM received, initiating graceful shutdown"),
        _ = ctrl_c() => info!("SIGINT received, initiating graceful shutdown"),
    }
}

/// Windows: only Ctrl+C is supported
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    ctrl_c().await;
    info!("Ctrl+C received, initiating shutdown");
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
