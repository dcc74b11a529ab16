//! Price oracle queries

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use swap_engine::BestPrice;
use swapgate_core::AssetId;

use crate::dto::{
    AmountQuery, ApiError, BestPriceRequest, ImpactResponse, PriceResponse, StaleResponse,
};
use crate::AppState;

/// Create price routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/best", post(get_best_price))
        .route("/:asset", get(get_token_price))
        .route("/:asset/stale", get(is_price_stale))
        .route("/:asset/impact", get(get_price_with_impact))
}

fn price_not_set(asset: &AssetId) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::not_found(format!("No price set for {}", asset))),
    )
}

/// GET /prices/:asset - Last published price
async fn get_token_price(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Result<Json<PriceResponse>, (StatusCode, Json<ApiError>)> {
    let asset = AssetId::new(asset);
    let engine = state.engine().await;
    let entry = engine
        .get_token_price(&asset)
        .ok_or_else(|| price_not_set(&asset))?;

    Ok(Json(PriceResponse {
        stale: engine.is_price_stale(&asset),
        manipulation_flag: engine.oracle().active_flag(&asset, engine.height()),
        price: entry.price,
        last_update_height: entry.last_update_height,
        asset,
    }))
}

/// GET /prices/:asset/stale - Staleness at the current height
async fn is_price_stale(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Json<StaleResponse> {
    let asset = AssetId::new(asset);
    let engine = state.engine().await;
    Json(StaleResponse {
        stale: engine.is_price_stale(&asset),
        height: engine.height(),
        asset,
    })
}

/// GET /prices/:asset/impact?amount= - Per-unit price after depth impact
async fn get_price_with_impact(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Query(query): Query<AmountQuery>,
) -> Result<Json<ImpactResponse>, (StatusCode, Json<ApiError>)> {
    let asset = AssetId::new(asset);
    let engine = state.engine().await;
    let price = engine
        .oracle()
        .calculate_price_with_impact(query.amount, &asset)
        .ok_or_else(|| price_not_set(&asset))?;

    Ok(Json(ImpactResponse {
        depth: engine.oracle().market_depth(&asset),
        amount: query.amount,
        price_with_impact: price,
        asset,
    }))
}

/// POST /prices/best - Best realizable output among candidate paths
async fn get_best_price(
    State(state): State<AppState>,
    Json(request): Json<BestPriceRequest>,
) -> Result<Json<BestPrice>, (StatusCode, Json<ApiError>)> {
    let engine = state.engine().await;
    engine
        .get_best_price(request.amount, &request.candidates)
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found("No candidate path yields an output")),
            )
        })
}
