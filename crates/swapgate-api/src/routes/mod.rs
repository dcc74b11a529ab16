//! API route handlers

pub mod batch;
pub mod fees;
pub mod governance;
pub mod health;
pub mod ledger;
pub mod liquidity;
pub mod prices;
pub mod routes;
pub mod swap;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/swap", post(swap::swap_tokens))
        .nest("/batch", batch::router())
        .nest("/routes", routes::router())
        .nest("/prices", prices::router())
        .nest("/liquidity", liquidity::router())
        .nest("/fees", fees::router())
        .nest("/governance", governance::router())
        .nest("/ledger", ledger::router())
        .with_state(state)
}
