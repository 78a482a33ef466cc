use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::pipeline::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/agent/run", post(trigger_run))
        .route("/agent/status", get(agent_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct RunResp {
    status: &'static str,
    message: &'static str,
    articles_stored: usize,
}

#[derive(serde::Serialize)]
struct BusyResp {
    status: &'static str,
    message: &'static str,
}

/// Manually trigger one ingestion cycle. Shares the cycle gate with the
/// scheduler: if a cycle is already in flight this reports busy instead of
/// queueing a second one.
async fn trigger_run(
    State(state): State<AppState>,
) -> Result<Json<RunResp>, (StatusCode, Json<BusyResp>)> {
    match state.orchestrator.try_run_cycle().await {
        Some(stored) => Ok(Json(RunResp {
            status: "success",
            message: "ingestion cycle executed",
            articles_stored: stored,
        })),
        None => Err((
            StatusCode::CONFLICT,
            Json(BusyResp {
                status: "busy",
                message: "an ingestion cycle is already running",
            }),
        )),
    }
}

#[derive(serde::Serialize)]
struct StatusResp {
    status: &'static str,
    description: &'static str,
}

async fn agent_status() -> Json<StatusResp> {
    Json(StatusResp {
        status: "running",
        description: "Web3 content ingestion agent",
    })
}
