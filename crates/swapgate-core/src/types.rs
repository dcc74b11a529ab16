//! Core type definitions for Swapgate

use serde::{Deserialize, Serialize};
use std::fmt;

/// Asset identifier (token contract principal)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account identifier (caller, recipient, admin)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the identifier can receive funds.
    ///
    /// Rejects empty or oversized identifiers, characters outside
    /// `[A-Za-z0-9._-]`, and the null account (an alphabetic prefix
    /// followed only by zeros, e.g. `SP000...`).
    pub fn is_well_formed(&self) -> bool {
        let id = self.0.as_str();
        if id.is_empty() || id.len() > constants::MAX_ACCOUNT_ID_LEN {
            return false;
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return false;
        }

        let body = id.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        !(!body.is_empty() && body.chars().all(|c| c == '0'))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Exchange identifier (key into the exchange registry)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(pub String);

impl ExchangeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Batch height (sequence counter)
pub type BlockHeight = u64;

/// Unsigned asset quantity
pub type Amount = u64;

/// Fixed-point price, scaled by [`constants::PRICE_SCALE`]
pub type Price = u64;

/// Constants
pub mod constants {
    use super::{Amount, BlockHeight, Price};

    /// 1.0 in fixed-point price units
    pub const PRICE_SCALE: Price = 1_000_000;

    /// Basis-point denominator (100% = 10_000 bps)
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Protocol fee ceiling (1%)
    pub const MAX_FEE_BPS: u64 = 100;

    /// Default protocol fee (0.3%)
    pub const DEFAULT_FEE_BPS: u64 = 30;

    /// Maximum number of assets in a route path
    pub const MAX_ROUTE_LENGTH: usize = 10;

    /// Minimum number of assets in a route path (one hop)
    pub const MIN_ROUTE_LENGTH: usize = 2;

    /// Price age (in batches) at which a price is stale
    pub const STALENESS_THRESHOLD: BlockHeight = 100;

    /// Largest accepted swap input
    pub const DEFAULT_MAX_TRANSACTION_AMOUNT: Amount = 1_000_000_000_000_000;

    /// Fixed routing penalty per hop, in output units
    pub const DEFAULT_HOP_COST: Amount = 1_000;

    /// Market depth assumed for an asset with no explicit depth
    pub const DEFAULT_MARKET_DEPTH: Amount = 1_000_000_000_000;

    /// Price move (bps) within the window that raises a manipulation flag
    pub const DEFAULT_MAX_DEVIATION_BPS: u64 = 1_500;

    /// Window (batches) in which two updates are compared
    pub const DEFAULT_MANIPULATION_WINDOW: BlockHeight = 10;

    /// Batches a manipulation flag stays active
    pub const DEFAULT_MANIPULATION_COOLDOWN: BlockHeight = 10;

    /// Upper bound on identifier length
    pub const MAX_ACCOUNT_ID_LEN: usize = 128;
}
