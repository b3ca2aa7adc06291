use axum::{Json, extract::State};
use chrono::Utc;

use apihub_types::models::{HealthResponse, Uptime};

use crate::state::AppState;

/// GET /health: liveness check, no auth.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime: Uptime::from_duration(state.started_at.elapsed()),
        timestamp: Utc::now(),
    })
}
