//! Fee configuration queries

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::dto::{AmountQuery, FeeCalculationResponse, FeesResponse};
use crate::AppState;

/// Create fee routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_fees))
        .route("/calculate", get(calculate_fee))
}

/// GET /fees - Current rate and recipient
async fn get_fees(State(state): State<AppState>) -> Json<FeesResponse> {
    let engine = state.engine().await;
    Json(FeesResponse {
        rate_bps: engine.fees().rate_bps(),
        recipient: engine.fees().recipient().clone(),
    })
}

/// GET /fees/calculate?amount=
async fn calculate_fee(
    State(state): State<AppState>,
    Query(query): Query<AmountQuery>,
) -> Json<FeeCalculationResponse> {
    let engine = state.engine().await;
    Json(FeeCalculationResponse {
        amount: query.amount,
        rate_bps: engine.fees().rate_bps(),
        fee: engine.calculate_fee(query.amount),
    })
}
