//! Admin API, served on its own listener so it never shadows a stub path.

pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::reload::ReloadCoordinator;
use self::handlers::*;

pub fn setup_admin_router(coordinator: Arc<ReloadCoordinator>) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/routes", get(get_routes))
        .route("/admin/reload", post(post_reload))
        .with_state(coordinator)
}

/// Serve the admin API until shutdown.
pub async fn serve_admin(
    listener: TcpListener,
    coordinator: Arc<ReloadCoordinator>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");
    axum::serve(listener, setup_admin_router(coordinator))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
