//! Liquidity tracker queries

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use swapgate_core::{AssetId, ExchangeId};

use crate::dto::{ApiError, LiquidityResponse, OptionalAmountQuery};
use crate::AppState;

/// Create liquidity routes
pub fn router() -> Router<AppState> {
    Router::new().route("/:exchange/:asset_in/:asset_out", get(get_pool_liquidity))
}

/// GET /liquidity/:exchange/:asset_in/:asset_out[?amount=]
///
/// With `amount`, also reports whether the tracked liquidity covers it.
async fn get_pool_liquidity(
    State(state): State<AppState>,
    Path((exchange, asset_in, asset_out)): Path<(String, String, String)>,
    Query(query): Query<OptionalAmountQuery>,
) -> Result<Json<LiquidityResponse>, (StatusCode, Json<ApiError>)> {
    let exchange = ExchangeId::new(exchange);
    let asset_in = AssetId::new(asset_in);
    let asset_out = AssetId::new(asset_out);

    let engine = state.engine().await;
    let entry = engine
        .get_pool_liquidity(&exchange, &asset_in, &asset_out)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ApiError::not_found(format!(
                    "No liquidity tracked for {} {} -> {}",
                    exchange, asset_in, asset_out
                ))),
            )
        })?;

    let sufficient = query.amount.map(|amount| {
        engine
            .liquidity()
            .check_liquidity(&exchange, &asset_in, &asset_out, amount)
    });

    Ok(Json(LiquidityResponse {
        exchange,
        asset_in,
        asset_out,
        liquidity: entry.liquidity,
        last_update_height: entry.last_update_height,
        sufficient,
    }))
}
