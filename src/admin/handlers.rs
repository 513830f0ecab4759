use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::reload::{ReloadCoordinator, ReloadStatus, ReloadTrigger};
use crate::routing::RouteSummary;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub empty_query: &'static str,
    pub reload: ReloadStatus,
}

#[derive(Serialize)]
pub struct RouteListing {
    pub generation: u64,
    pub routes: Vec<RouteSummary>,
}

pub async fn get_status(State(coordinator): State<Arc<ReloadCoordinator>>) -> Json<SystemStatus> {
    let table = coordinator.dispatcher().snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        empty_query: table.empty_query_policy().as_str(),
        reload: coordinator.status(),
    })
}

pub async fn get_routes(State(coordinator): State<Arc<ReloadCoordinator>>) -> Json<RouteListing> {
    let table = coordinator.dispatcher().snapshot();
    Json(RouteListing {
        generation: table.generation(),
        routes: table.routes(),
    })
}

pub async fn post_reload(State(coordinator): State<Arc<ReloadCoordinator>>) -> impl IntoResponse {
    match coordinator.reload(ReloadTrigger::Admin).await {
        Ok(outcome) => (StatusCode::OK, Json(serde_json::json!(outcome))),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": e.kind(),
                "message": e.to_string(),
                "generation": coordinator.dispatcher().generation(),
            })),
        ),
    }
}
