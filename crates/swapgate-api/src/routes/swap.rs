//! Single-swap convenience route

use axum::{extract::State, http::StatusCode, Json};

use swap_engine::{Operation, Outcome, SwapReceipt};

use crate::dto::{engine_error, ApiError, SwapCallRequest};
use crate::AppState;

/// POST /swap - Run one swap in its own batch
///
/// Failures map to the router's error status instead of a batch receipt.
pub async fn swap_tokens(
    State(state): State<AppState>,
    Json(request): Json<SwapCallRequest>,
) -> Result<Json<SwapReceipt>, (StatusCode, Json<ApiError>)> {
    let mut engine = state.engine_mut().await;
    let receipt = engine.execute(request.sender, Operation::SwapTokens(request.swap));

    match receipt.result {
        Ok(Outcome::Swapped(swap)) => Ok(Json(swap)),
        Ok(Outcome::Done) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new("internal_error", "swap produced no receipt")),
        )),
        Err(e) => Err(engine_error(&e)),
    }
}
