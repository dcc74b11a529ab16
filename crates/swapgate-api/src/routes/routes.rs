//! Route registry and best-route queries

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use swap_engine::{Route, RouteQuote};
use swapgate_core::AssetId;

use crate::dto::{AmountQuery, ApiError, RouteQuotesResponse};
use crate::AppState;

/// Create route-registry routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:asset_in/:asset_out", get(get_route))
        .route("/:asset_in/:asset_out/best", get(get_best_route))
        .route("/:asset_in/:asset_out/quotes", get(get_route_quotes))
}

/// GET /routes/:asset_in/:asset_out - Registered route for a pair
async fn get_route(
    State(state): State<AppState>,
    Path((asset_in, asset_out)): Path<(String, String)>,
) -> Result<Json<Route>, (StatusCode, Json<ApiError>)> {
    let engine = state.engine().await;
    engine
        .get_routes(&AssetId::new(&asset_in), &AssetId::new(&asset_out))
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!(
                    "No route registered for {} -> {}",
                    asset_in, asset_out
                ))),
            )
        })
}

/// GET /routes/:asset_in/:asset_out/best?amount= - Best priced candidate
async fn get_best_route(
    State(state): State<AppState>,
    Path((asset_in, asset_out)): Path<(String, String)>,
    Query(query): Query<AmountQuery>,
) -> Result<Json<RouteQuote>, (StatusCode, Json<ApiError>)> {
    let engine = state.engine().await;
    engine
        .get_best_route(
            query.amount,
            &AssetId::new(&asset_in),
            &AssetId::new(&asset_out),
        )
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::new(
                    "route_not_found",
                    format!(
                        "No route can carry {} from {} to {}",
                        query.amount, asset_in, asset_out
                    ),
                )),
            )
        })
}

/// GET /routes/:asset_in/:asset_out/quotes?amount= - Every candidate, best first
async fn get_route_quotes(
    State(state): State<AppState>,
    Path((asset_in, asset_out)): Path<(String, String)>,
    Query(query): Query<AmountQuery>,
) -> Json<RouteQuotesResponse> {
    let engine = state.engine().await;
    let quotes = engine.get_route_quotes(
        query.amount,
        &AssetId::new(asset_in),
        &AssetId::new(asset_out),
    );
    let count = quotes.len();
    Json(RouteQuotesResponse { quotes, count })
}
