//! Price Oracle
//!
//! Per-asset fixed-point prices published by the feed role, with staleness,
//! depth-impact pricing and a manipulation guard.
//!
//! ## Manipulation guard
//!
//! An update is compared against the previous price when that price was
//! recorded within `window_blocks`. A move beyond `max_deviation_bps` raises a
//! flag on the asset that lasts `cooldown_blocks`. While a flag is active,
//! further updates are measured against the flag's reference (the last price
//! before the jump): returning within bounds clears it, moving further keeps
//! it raised. Updates always commit; the flag only gates swaps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use swapgate_core::{
    AccountId, Amount, AssetId, BlockHeight, EngineConfig, ManipulationConfig, OracleError, Price,
};

use crate::calculator;
use crate::governance::Governance;

/// Last published price of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub price: Price,
    pub last_update_height: BlockHeight,
}

/// Raised when a price jumps too far too fast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManipulationFlag {
    pub reference_price: Price,
    pub price: Price,
    pub deviation_bps: u64,
    pub raised_at: BlockHeight,
    pub expires_at: BlockHeight,
}

impl ManipulationFlag {
    pub fn is_active(&self, height: BlockHeight) -> bool {
        height < self.expires_at
    }
}

/// Best candidate found by [`PriceOracle::get_best_price`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestPrice {
    pub route_index: usize,
    pub path: Vec<AssetId>,
    pub output: Amount,
    pub effective_price: Price,
}

#[derive(Debug, Clone)]
pub struct PriceOracle {
    prices: BTreeMap<AssetId, PriceEntry>,
    depths: BTreeMap<AssetId, Amount>,
    flags: BTreeMap<AssetId, ManipulationFlag>,
    staleness_threshold: BlockHeight,
    default_depth: Amount,
    guard: ManipulationConfig,
}

impl PriceOracle {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            prices: BTreeMap::new(),
            depths: BTreeMap::new(),
            flags: BTreeMap::new(),
            staleness_threshold: config.staleness_threshold,
            default_depth: config.default_market_depth,
            guard: config.manipulation.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    pub fn update_price(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        asset: AssetId,
        price: Price,
        height: BlockHeight,
    ) -> Result<(), OracleError> {
        if !gov.is_price_feed(caller) {
            return Err(OracleError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if price == 0 {
            return Err(OracleError::InvalidPrice { asset });
        }

        self.check_manipulation(&asset, price, height);

        tracing::debug!("Price {} = {} at height {}", asset, price, height);
        self.prices.insert(
            asset,
            PriceEntry {
                price,
                last_update_height: height,
            },
        );
        Ok(())
    }

    fn check_manipulation(&mut self, asset: &AssetId, price: Price, height: BlockHeight) {
        let active = self
            .flags
            .get(asset)
            .filter(|flag| flag.is_active(height))
            .copied();

        let reference = match (active, self.prices.get(asset)) {
            (Some(flag), _) => flag.reference_price,
            (None, Some(prev))
                if height.saturating_sub(prev.last_update_height) <= self.guard.window_blocks =>
            {
                prev.price
            }
            _ => {
                self.flags.remove(asset);
                return;
            }
        };

        let deviation_bps = calculator::deviation_bps(reference, price);
        if deviation_bps <= self.guard.max_deviation_bps {
            if active.is_some() {
                tracing::info!("Price of {} back within bounds, flag cleared", asset);
            }
            self.flags.remove(asset);
            return;
        }

        let raised_at = active.map(|f| f.raised_at).unwrap_or(height);
        tracing::warn!(
            "Possible price manipulation on {}: {} -> {} ({} bps)",
            asset,
            reference,
            price,
            deviation_bps
        );
        self.flags.insert(
            asset.clone(),
            ManipulationFlag {
                reference_price: reference,
                price,
                deviation_bps,
                raised_at,
                expires_at: height.saturating_add(self.guard.cooldown_blocks),
            },
        );
    }

    /// Depth used by impact pricing for `asset`
    pub fn set_market_depth(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        asset: AssetId,
        depth: Amount,
    ) -> Result<(), OracleError> {
        if !gov.is_price_feed(caller) {
            return Err(OracleError::Unauthorized {
                caller: caller.clone(),
            });
        }
        tracing::debug!("Market depth {} = {}", asset, depth);
        self.depths.insert(asset, depth);
        Ok(())
    }

    /// Accept the current price and clear any manipulation flag
    pub fn revalidate_price(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        asset: &AssetId,
    ) -> Result<(), OracleError> {
        if !gov.is_admin(caller) && !gov.is_price_feed(caller) {
            return Err(OracleError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if self.flags.remove(asset).is_some() {
            tracing::info!("Price of {} revalidated by {}", asset, caller);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn get_token_price(&self, asset: &AssetId) -> Option<PriceEntry> {
        self.prices.get(asset).copied()
    }

    /// Unset prices count as stale
    pub fn is_price_stale(&self, asset: &AssetId, height: BlockHeight) -> bool {
        match self.prices.get(asset) {
            Some(entry) => {
                height.saturating_sub(entry.last_update_height) >= self.staleness_threshold
            }
            None => true,
        }
    }

    pub fn market_depth(&self, asset: &AssetId) -> Amount {
        self.depths
            .get(asset)
            .copied()
            .unwrap_or(self.default_depth)
    }

    pub fn active_flag(&self, asset: &AssetId, height: BlockHeight) -> Option<ManipulationFlag> {
        self.flags
            .get(asset)
            .filter(|flag| flag.is_active(height))
            .copied()
    }

    pub fn get_manipulation_flag(&self, asset: &AssetId) -> Option<ManipulationFlag> {
        self.flags.get(asset).copied()
    }

    /// Per-unit price an order of `amount` realizes against the asset's depth
    pub fn calculate_price_with_impact(&self, amount: Amount, asset: &AssetId) -> Option<Price> {
        let entry = self.prices.get(asset)?;
        Some(calculator::price_with_impact(
            entry.price,
            amount,
            self.market_depth(asset),
        ))
    }

    /// Output of `amount` pushed through `path` at oracle prices and depths
    pub fn quote_path(&self, amount: Amount, path: &[AssetId]) -> Option<Amount> {
        if path.len() < 2 {
            return None;
        }
        let mut current = amount;
        for hop in path.windows(2) {
            let price_in = self.prices.get(&hop[0])?.price;
            let price_out = self.prices.get(&hop[1])?.price;
            current = calculator::quote_hop(current, price_in, price_out, self.market_depth(&hop[0]));
        }
        Some(current)
    }

    /// Best realizable output among `candidates`. Earlier candidates win ties.
    pub fn get_best_price(&self, amount: Amount, candidates: &[Vec<AssetId>]) -> Option<BestPrice> {
        let mut best: Option<BestPrice> = None;

        for (route_index, path) in candidates.iter().enumerate() {
            let output = match self.quote_path(amount, path) {
                Some(out) if out > 0 => out,
                _ => continue,
            };
            if best.as_ref().map_or(true, |b| output > b.output) {
                best = Some(BestPrice {
                    route_index,
                    path: path.clone(),
                    output,
                    effective_price: calculator::effective_price(amount, output),
                });
            }
        }

        best
    }
}
