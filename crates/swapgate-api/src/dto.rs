//! Data Transfer Objects for API requests and responses

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use swap_engine::{Call, ManipulationFlag, Outcome, Receipt, RouteQuote, SwapRequest};
use swapgate_core::{AccountId, Amount, AssetId, BlockHeight, ExchangeId, Price};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub height: BlockHeight,
}

impl HealthResponse {
    pub fn ok(height: BlockHeight) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            height,
        }
    }
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// POST /batch body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub calls: Vec<Call>,
}

/// Result of one call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDto {
    pub index: usize,
    pub operation: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl From<Receipt> for ReceiptDto {
    fn from(receipt: Receipt) -> Self {
        let (outcome, error) = match receipt.result {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(ApiError::from(&e))),
        };
        Self {
            index: receipt.index,
            operation: receipt.operation.to_string(),
            ok: error.is_none(),
            outcome,
            error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    pub height: BlockHeight,
    pub receipts: Vec<ReceiptDto>,
}

/// POST /batch/advance body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvanceRequest {
    pub blocks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeightResponse {
    pub height: BlockHeight,
}

/// POST /swap body: the swap fields plus the calling account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapCallRequest {
    pub sender: AccountId,
    #[serde(flatten)]
    pub swap: SwapRequest,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountQuery {
    pub amount: Amount,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionalAmountQuery {
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteQuotesResponse {
    pub quotes: Vec<RouteQuote>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub asset: AssetId,
    pub price: Price,
    pub last_update_height: BlockHeight,
    pub stale: bool,
    pub manipulation_flag: Option<ManipulationFlag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleResponse {
    pub asset: AssetId,
    pub stale: bool,
    pub height: BlockHeight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactResponse {
    pub asset: AssetId,
    pub amount: Amount,
    pub depth: Amount,
    pub price_with_impact: Price,
}

/// POST /prices/best body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestPriceRequest {
    pub amount: Amount,
    pub candidates: Vec<Vec<AssetId>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityResponse {
    pub exchange: ExchangeId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub liquidity: Amount,
    pub last_update_height: BlockHeight,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sufficient: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeesResponse {
    pub rate_bps: u64,
    pub recipient: AccountId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeCalculationResponse {
    pub amount: Amount,
    pub rate_bps: u64,
    pub fee: Amount,
}

// ---------------------------------------------------------------------------
// Demo ledger
// ---------------------------------------------------------------------------

/// POST /ledger/approve and /ledger/mint body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRequest {
    pub asset: AssetId,
    pub account: AccountId,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceResponse {
    pub asset: AssetId,
    pub account: AccountId,
    pub balance: Amount,
    pub allowance: Amount,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// Code within the failing component's code space
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            numeric_code: None,
            component: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

impl From<&swapgate_core::Error> for ApiError {
    fn from(e: &swapgate_core::Error) -> Self {
        Self {
            code: e.error_code().to_string(),
            message: e.to_string(),
            numeric_code: Some(e.code()),
            component: Some(e.component().to_string()),
        }
    }
}

/// Map an engine error onto its HTTP status and body
pub fn engine_error(e: &swapgate_core::Error) -> (StatusCode, Json<ApiError>) {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::from(e)))
}
