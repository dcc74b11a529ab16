//! Batch operations
//!
//! A batch is an ordered list of [`Call`]s. The engine applies them one at a
//! time at a single height; each call sees the writes of the calls before it.

use serde::{Deserialize, Serialize};

use swapgate_core::{AccountId, Amount, AssetId, BlockHeight, Error, ExchangeId, Price};

use crate::router::{SwapReceipt, SwapRequest};

/// Every mutating engine operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    AddAdmin {
        account: AccountId,
    },
    RemoveAdmin {
        account: AccountId,
    },
    AddToBlacklist {
        asset: AssetId,
    },
    RemoveFromBlacklist {
        asset: AssetId,
    },
    EmergencyShutdown,
    ResumeOperations,
    AddPriceFeed {
        account: AccountId,
    },
    RemovePriceFeed {
        account: AccountId,
    },
    SetFee {
        rate_bps: u64,
    },
    SetFeeRecipient {
        recipient: AccountId,
    },
    SetMaxTransactionAmount {
        amount: Amount,
    },
    UpdatePrice {
        asset: AssetId,
        price: Price,
    },
    RevalidatePrice {
        asset: AssetId,
    },
    SetMarketDepth {
        asset: AssetId,
        depth: Amount,
    },
    UpdateLiquidity {
        exchange: ExchangeId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount: Amount,
    },
    AddRoute {
        asset_in: AssetId,
        asset_out: AssetId,
        path: Vec<AssetId>,
        exchange: ExchangeId,
    },
    SwapTokens(SwapRequest),
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddAdmin { .. } => "add_admin",
            Self::RemoveAdmin { .. } => "remove_admin",
            Self::AddToBlacklist { .. } => "add_to_blacklist",
            Self::RemoveFromBlacklist { .. } => "remove_from_blacklist",
            Self::EmergencyShutdown => "emergency_shutdown",
            Self::ResumeOperations => "resume_operations",
            Self::AddPriceFeed { .. } => "add_price_feed",
            Self::RemovePriceFeed { .. } => "remove_price_feed",
            Self::SetFee { .. } => "set_fee",
            Self::SetFeeRecipient { .. } => "set_fee_recipient",
            Self::SetMaxTransactionAmount { .. } => "set_max_transaction_amount",
            Self::UpdatePrice { .. } => "update_price",
            Self::RevalidatePrice { .. } => "revalidate_price",
            Self::SetMarketDepth { .. } => "set_market_depth",
            Self::UpdateLiquidity { .. } => "update_liquidity",
            Self::AddRoute { .. } => "add_route",
            Self::SwapTokens(_) => "swap_tokens",
        }
    }
}

/// An operation issued by an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub sender: AccountId,
    pub operation: Operation,
}

impl Call {
    pub fn new(sender: AccountId, operation: Operation) -> Self {
        Self { sender, operation }
    }
}

/// Successful result of one call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Swapped(SwapReceipt),
}

/// Result of one call within a batch
#[derive(Debug)]
pub struct Receipt {
    pub index: usize,
    pub operation: &'static str,
    pub result: Result<Outcome, Error>,
}

impl Receipt {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn swap_receipt(&self) -> Option<&SwapReceipt> {
        match &self.result {
            Ok(Outcome::Swapped(receipt)) => Some(receipt),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        self.result.as_ref().err()
    }
}

#[derive(Debug)]
pub struct BatchReceipt {
    pub height: BlockHeight,
    pub receipts: Vec<Receipt>,
}
