//! Demo ledger routes
//!
//! The in-memory ledger stands in for a real asset-transfer system, so these
//! endpoints let a client fund and approve accounts directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use swap_engine::AssetLedger;
use swapgate_core::{AccountId, AssetId};

use crate::dto::{AccountBalanceResponse, ApiError, LedgerRequest};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/approve", post(approve))
        .route("/mint", post(mint))
        .route("/:asset/:account", get(get_account))
}

fn unknown_asset(asset: &AssetId) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(
            "invalid_token",
            format!("Asset {} is not registered with the ledger", asset),
        )),
    )
}

/// POST /ledger/approve - Set the allowance an account grants the engine
async fn approve(
    State(state): State<AppState>,
    Json(request): Json<LedgerRequest>,
) -> Result<Json<AccountBalanceResponse>, (StatusCode, Json<ApiError>)> {
    let mut engine = state.engine_mut().await;
    if !engine.ledger().is_asset(&request.asset) {
        return Err(unknown_asset(&request.asset));
    }

    let ledger = engine.ledger_mut();
    ledger.approve(&request.asset, &request.account, request.amount);
    Ok(Json(AccountBalanceResponse {
        balance: ledger.balance_of(&request.asset, &request.account),
        allowance: ledger.allowance(&request.asset, &request.account),
        asset: request.asset,
        account: request.account,
    }))
}

/// POST /ledger/mint - Credit an account
async fn mint(
    State(state): State<AppState>,
    Json(request): Json<LedgerRequest>,
) -> Result<Json<AccountBalanceResponse>, (StatusCode, Json<ApiError>)> {
    let mut engine = state.engine_mut().await;
    if !engine.ledger().is_asset(&request.asset) {
        return Err(unknown_asset(&request.asset));
    }

    let ledger = engine.ledger_mut();
    ledger.mint(&request.asset, &request.account, request.amount);
    tracing::info!(
        "Minted {} {} to {}",
        request.amount,
        request.asset,
        request.account
    );
    Ok(Json(AccountBalanceResponse {
        balance: ledger.balance_of(&request.asset, &request.account),
        allowance: ledger.allowance(&request.asset, &request.account),
        asset: request.asset,
        account: request.account,
    }))
}

/// GET /ledger/:asset/:account - Balance and allowance
async fn get_account(
    State(state): State<AppState>,
    Path((asset, account)): Path<(String, String)>,
) -> Json<AccountBalanceResponse> {
    let asset = AssetId::new(asset);
    let account = AccountId::new(account);
    let engine = state.engine().await;
    let ledger = engine.ledger();
    Json(AccountBalanceResponse {
        balance: ledger.balance_of(&asset, &account),
        allowance: ledger.allowance(&asset, &account),
        asset,
        account,
    })
}
