//! OS signal handling.
//!
//! - SIGINT / SIGTERM trigger graceful shutdown
//! - SIGHUP triggers a config reload, not shutdown

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::lifecycle::Shutdown;
use crate::reload::{ReloadCoordinator, ReloadTrigger};

/// Wait for Ctrl+C or SIGTERM, then fire `shutdown`.
pub async fn shutdown_on_signal(shutdown: Shutdown) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}

/// Reload the config on every SIGHUP until shutdown.
#[cfg(unix)]
pub async fn reload_on_sighup(coordinator: Arc<ReloadCoordinator>, mut shutdown: broadcast::Receiver<()>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGHUP handler");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            received = hangup.recv() => {
                if received.is_none() {
                    break;
                }
                tracing::info!("SIGHUP received");
                let _ = coordinator.reload(ReloadTrigger::Signal).await;
            }
        }
    }
}

#[cfg(not(unix))]
pub async fn reload_on_sighup(_coordinator: Arc<ReloadCoordinator>, _shutdown: broadcast::Receiver<()>) {}
