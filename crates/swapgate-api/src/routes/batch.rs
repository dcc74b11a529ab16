//! Batch submission routes

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::dto::{
    engine_error, AdvanceRequest, ApiError, BatchRequest, BatchResponse, HeightResponse,
};
use crate::AppState;

/// Create batch routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_batch))
        .route("/advance", post(advance))
}

/// POST /batch - Execute calls in order as one batch
///
/// Individual call failures are reported per receipt; the batch itself
/// always executes.
async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, (StatusCode, Json<ApiError>)> {
    if request.calls.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request(
                "batch has no calls; use /batch/advance to mine empty batches",
            )),
        ));
    }

    let mut engine = state.engine_mut().await;
    let batch = engine.execute_batch(request.calls);
    tracing::info!(
        "Batch {} executed via API ({} calls)",
        batch.height,
        batch.receipts.len()
    );

    Ok(Json(BatchResponse {
        height: batch.height,
        receipts: batch.receipts.into_iter().map(Into::into).collect(),
    }))
}

/// POST /batch/advance - Mine empty batches
async fn advance(
    State(state): State<AppState>,
    Json(request): Json<AdvanceRequest>,
) -> Result<Json<HeightResponse>, (StatusCode, Json<ApiError>)> {
    let height = state
        .engine_mut()
        .await
        .advance(request.blocks)
        .map_err(|e| engine_error(&e))?;
    Ok(Json(HeightResponse { height }))
}
