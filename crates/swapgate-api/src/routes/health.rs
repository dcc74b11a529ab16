//! Health check endpoint

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health - Check API health and current batch height
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let height = state.engine().await.height();
    Json(HealthResponse::ok(height))
}
