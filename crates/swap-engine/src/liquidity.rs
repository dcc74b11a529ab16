//! Liquidity Tracker
//!
//! Tracked depth per (exchange, asset in, asset out). Entries are overwritten
//! on every update and stamped with the batch height of the write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use swapgate_core::{AccountId, Amount, AssetId, BlockHeight, ExchangeId, LiquidityError};

use crate::governance::Governance;

/// Tracked liquidity for one directed pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityEntry {
    pub liquidity: Amount,
    pub last_update_height: BlockHeight,
}

type PoolKey = (ExchangeId, AssetId, AssetId);

#[derive(Debug, Clone, Default)]
pub struct LiquidityTracker {
    pools: BTreeMap<PoolKey, LiquidityEntry>,
}

impl LiquidityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn update_liquidity(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        exchange: ExchangeId,
        asset_in: AssetId,
        asset_out: AssetId,
        amount: Amount,
        height: BlockHeight,
    ) -> Result<(), LiquidityError> {
        if !gov.is_admin(caller) {
            return Err(LiquidityError::Unauthorized {
                caller: caller.clone(),
            });
        }

        tracing::debug!(
            "Liquidity {} {}->{} = {} at height {}",
            exchange,
            asset_in,
            asset_out,
            amount,
            height
        );
        self.pools.insert(
            (exchange, asset_in, asset_out),
            LiquidityEntry {
                liquidity: amount,
                last_update_height: height,
            },
        );
        Ok(())
    }

    /// Tracked amount covers `amount`. Untracked pools hold nothing.
    pub fn check_liquidity(
        &self,
        exchange: &ExchangeId,
        asset_in: &AssetId,
        asset_out: &AssetId,
        amount: Amount,
    ) -> bool {
        self.depth(exchange, asset_in, asset_out) >= amount
    }

    pub fn get_pool_liquidity(
        &self,
        exchange: &ExchangeId,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Option<LiquidityEntry> {
        self.pools
            .get(&(exchange.clone(), asset_in.clone(), asset_out.clone()))
            .copied()
    }

    pub fn depth(&self, exchange: &ExchangeId, asset_in: &AssetId, asset_out: &AssetId) -> Amount {
        self.get_pool_liquidity(exchange, asset_in, asset_out)
            .map(|e| e.liquidity)
            .unwrap_or(0)
    }
}
