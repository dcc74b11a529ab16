//! Error types for Swapgate
//!
//! Each component owns its own error enum and numeric code space. Codes are
//! only meaningful at the API boundary; engine logic matches on variants.

use thiserror::Error;

use crate::{AccountId, Amount, AssetId, BlockHeight, ExchangeId};

/// Core errors that can occur in Swapgate
#[derive(Debug, Error)]
pub enum Error {
    #[error("Governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("Fee error: {0}")]
    Fee(#[from] FeeError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Liquidity error: {0}")]
    Liquidity(#[from] LiquidityError),

    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    #[error("Swap error: {0}")]
    Swap(#[from] SwapError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Block height {height} cannot advance by {blocks}")]
    HeightExhausted { height: BlockHeight, blocks: u64 },
}

/// Governance control errors
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: AccountId },

    #[error("Invalid governance parameter: {reason}")]
    InvalidParameter { reason: String },
}

/// Fee configuration errors
#[derive(Debug, Error)]
pub enum FeeError {
    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: AccountId },

    #[error("Fee rate {rate_bps} bps exceeds limit of {max_bps} bps")]
    FeeLimitExceeded { rate_bps: u64, max_bps: u64 },
}

/// Price oracle errors
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: AccountId },

    #[error("Invalid price for {asset}: price must be positive")]
    InvalidPrice { asset: AssetId },
}

/// Liquidity tracker errors
#[derive(Debug, Error)]
pub enum LiquidityError {
    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: AccountId },
}

/// Route registry errors
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("Caller {caller} is not authorized")]
    Unauthorized { caller: AccountId },

    #[error("Route path has {length} assets, maximum is {max}")]
    MaxRouteLengthExceeded { length: usize, max: usize },

    #[error("Invalid route path: {reason}")]
    InvalidPath { reason: String },

    #[error("Route path revisits {asset}")]
    CircularRouteDetected { asset: AssetId },

    #[error("Route {asset_in} -> {asset_out} was already written at height {height}")]
    ConcurrentRouteUpdate {
        asset_in: AssetId,
        asset_out: AssetId,
        height: BlockHeight,
    },
}

/// Swap router errors
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("System is paused by emergency shutdown")]
    SystemPaused,

    #[error("Asset {asset} is blacklisted")]
    BlacklistedToken { asset: AssetId },

    #[error("Swap amount must be greater than zero")]
    ZeroAmount,

    #[error("Swap amount {amount} exceeds maximum of {max}")]
    MaxAmountExceeded { amount: Amount, max: Amount },

    #[error("Invalid recipient: {recipient}")]
    InvalidRecipient { recipient: AccountId },

    #[error("Invalid token: {asset}")]
    InvalidToken { asset: AssetId },

    #[error("No route from {asset_in} to {asset_out}")]
    RouteNotFound { asset_in: AssetId, asset_out: AssetId },

    #[error("Insufficient liquidity to route {amount} from {asset_in} to {asset_out}")]
    InsufficientLiquidity {
        asset_in: AssetId,
        asset_out: AssetId,
        amount: Amount,
    },

    #[error("Price for {asset} is stale or unset")]
    StalePriceData { asset: AssetId },

    #[error("Price of {asset} moved {deviation_bps} bps, beyond the caller's tolerance")]
    PriceManipulationDetected { asset: AssetId, deviation_bps: u64 },

    #[error("Output below minimum: expected {expected}, need {min}")]
    ExcessiveSlippage { expected: Amount, min: Amount },

    #[error("Insufficient allowance for {asset}: need {required}, have {available}")]
    InsufficientAllowance {
        asset: AssetId,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient balance of {asset}: need {required}, have {available}")]
    InsufficientBalance {
        asset: AssetId,
        required: Amount,
        available: Amount,
    },

    #[error("Execution failed on {exchange}: {reason}")]
    DexExecutionFailure { exchange: ExchangeId, reason: String },
}

/// Result type alias for Swapgate operations
pub type Result<T> = std::result::Result<T, Error>;

impl GovernanceError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1,
            Self::InvalidParameter { .. } => 2,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidParameter { .. } => "invalid_parameter",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::InvalidParameter { .. } => 400,
        }
    }
}

impl FeeError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1,
            Self::FeeLimitExceeded { .. } => 2,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::FeeLimitExceeded { .. } => "fee_limit_exceeded",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::FeeLimitExceeded { .. } => 400,
        }
    }
}

impl OracleError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1,
            Self::InvalidPrice { .. } => 2,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::InvalidPrice { .. } => "invalid_price",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::InvalidPrice { .. } => 400,
        }
    }
}

impl LiquidityError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
        }
    }

    pub fn status_code(&self) -> u16 {
        403
    }
}

impl RouteError {
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized { .. } => 1,
            Self::MaxRouteLengthExceeded { .. } => 3,
            Self::InvalidPath { .. } => 4,
            Self::CircularRouteDetected { .. } => 10,
            Self::ConcurrentRouteUpdate { .. } => 15,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::MaxRouteLengthExceeded { .. } => "max_route_length_exceeded",
            Self::InvalidPath { .. } => "invalid_path",
            Self::CircularRouteDetected { .. } => "circular_route_detected",
            Self::ConcurrentRouteUpdate { .. } => "concurrent_route_update",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized { .. } => 403,
            Self::ConcurrentRouteUpdate { .. } => 409,
            _ => 400,
        }
    }
}

impl SwapError {
    pub fn code(&self) -> u32 {
        match self {
            Self::RouteNotFound { .. } => 3,
            Self::StalePriceData { .. } => 4,
            Self::InvalidToken { .. } => 5,
            Self::ZeroAmount => 6,
            Self::InsufficientAllowance { .. } => 7,
            Self::DexExecutionFailure { .. } => 8,
            Self::PriceManipulationDetected { .. } => 9,
            Self::ExcessiveSlippage { .. } => 12,
            Self::MaxAmountExceeded { .. } => 13,
            Self::BlacklistedToken { .. } => 14,
            Self::InvalidRecipient { .. } => 16,
            Self::SystemPaused => 17,
            Self::InsufficientLiquidity { .. } => 18,
            Self::InsufficientBalance { .. } => 19,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SystemPaused => "system_paused",
            Self::BlacklistedToken { .. } => "blacklisted_token",
            Self::ZeroAmount => "zero_amount",
            Self::MaxAmountExceeded { .. } => "max_amount_exceeded",
            Self::InvalidRecipient { .. } => "invalid_recipient",
            Self::InvalidToken { .. } => "invalid_token",
            Self::RouteNotFound { .. } => "route_not_found",
            Self::InsufficientLiquidity { .. } => "insufficient_liquidity",
            Self::StalePriceData { .. } => "stale_price_data",
            Self::PriceManipulationDetected { .. } => "price_manipulation_detected",
            Self::ExcessiveSlippage { .. } => "excessive_slippage",
            Self::InsufficientAllowance { .. } => "insufficient_allowance",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::DexExecutionFailure { .. } => "dex_execution_failure",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::ZeroAmount
            | Self::MaxAmountExceeded { .. }
            | Self::InvalidRecipient { .. }
            | Self::InvalidToken { .. } => 400,
            Self::BlacklistedToken { .. } => 403,
            Self::RouteNotFound { .. } => 404,
            Self::InsufficientLiquidity { .. }
            | Self::ExcessiveSlippage { .. }
            | Self::InsufficientAllowance { .. }
            | Self::InsufficientBalance { .. }
            | Self::PriceManipulationDetected { .. } => 422,
            Self::DexExecutionFailure { .. } => 502,
            Self::SystemPaused | Self::StalePriceData { .. } => 503,
        }
    }
}

impl Error {
    /// Numeric code within the failing component's code space
    pub fn code(&self) -> u32 {
        match self {
            Self::Governance(e) => e.code(),
            Self::Fee(e) => e.code(),
            Self::Oracle(e) => e.code(),
            Self::Liquidity(e) => e.code(),
            Self::Route(e) => e.code(),
            Self::Swap(e) => e.code(),
            Self::Config(_) | Self::Serialization(_) | Self::HeightExhausted { .. } => 0,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Governance(e) => e.error_code(),
            Self::Fee(e) => e.error_code(),
            Self::Oracle(e) => e.error_code(),
            Self::Liquidity(e) => e.error_code(),
            Self::Route(e) => e.error_code(),
            Self::Swap(e) => e.error_code(),
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
            Self::HeightExhausted { .. } => "height_exhausted",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Governance(e) => e.status_code(),
            Self::Fee(e) => e.status_code(),
            Self::Oracle(e) => e.status_code(),
            Self::Liquidity(e) => e.status_code(),
            Self::Route(e) => e.status_code(),
            Self::Swap(e) => e.status_code(),
            Self::Config(_) => 500,
            Self::Serialization(_) => 400,
            Self::HeightExhausted { .. } => 409,
        }
    }

    /// Component that produced the error
    pub fn component(&self) -> &'static str {
        match self {
            Self::Governance(_) => "governance",
            Self::Fee(_) => "fees",
            Self::Oracle(_) => "oracle",
            Self::Liquidity(_) => "liquidity",
            Self::Route(_) => "routes",
            Self::Swap(_) => "router",
            Self::Config(_) | Self::Serialization(_) => "core",
            Self::HeightExhausted { .. } => "engine",
        }
    }
}
