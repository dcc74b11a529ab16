//! Governance state query

use axum::{extract::State, routing::get, Json, Router};

use swap_engine::GovernanceSnapshot;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_governance))
}

/// GET /governance - Owner, admins, feeds, blacklist and shutdown flag
async fn get_governance(State(state): State<AppState>) -> Json<GovernanceSnapshot> {
    Json(state.engine().await.governance().snapshot())
}
