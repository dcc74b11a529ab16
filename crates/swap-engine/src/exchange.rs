//! Exchange execution capability
//!
//! Every venue the router can execute on implements [`Exchange`] and is
//! registered under its [`ExchangeId`]. [`ConstantProductExchange`] is the
//! reference venue used by the demo server and the tests.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use swapgate_core::{AccountId, Amount, AssetId, ExchangeConfig, ExchangeId};

use crate::calculator;

/// Failures reported by an exchange
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExchangeError {
    #[error("No pool for {asset_in} -> {asset_out}")]
    PoolNotFound { asset_in: AssetId, asset_out: AssetId },

    #[error("Input amount must be positive")]
    ZeroInput,

    #[error("Output {amount_out} below minimum {min_amount_out}")]
    InsufficientOutput {
        amount_out: Amount,
        min_amount_out: Amount,
    },

    #[error("Pool reserves cannot cover {amount_out}")]
    InsufficientReserves { amount_out: Amount },

    #[error("Exchange rejected swap: {0}")]
    Rejected(String),
}

/// Per-exchange execution capability
pub trait Exchange: Send + Sync {
    fn id(&self) -> &ExchangeId;

    /// Ledger account holding the venue's inventory
    fn account(&self) -> &AccountId;

    /// Copy of the venue's current state, used to undo a failed swap
    fn snapshot(&self) -> Box<dyn Exchange>;

    fn get_amount_out(
        &self,
        amount_in: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Result<Amount, ExchangeError>;

    fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: Amount,
        min_amount_out: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Result<Amount, ExchangeError>;
}

/// Exchanges keyed by identifier
#[derive(Default)]
pub struct ExchangeRegistry {
    exchanges: BTreeMap<ExchangeId, Box<dyn Exchange>>,
}

impl ExchangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exchange, replacing any previous one with the same id
    pub fn register(&mut self, exchange: Box<dyn Exchange>) {
        let id = exchange.id().clone();
        tracing::info!("Exchange registered: {}", id);
        self.exchanges.insert(id, exchange);
    }

    pub fn get(&self, id: &ExchangeId) -> Option<&dyn Exchange> {
        self.exchanges.get(id).map(|e| e.as_ref())
    }

    pub fn get_mut(&mut self, id: &ExchangeId) -> Option<&mut (dyn Exchange + 'static)> {
        self.exchanges.get_mut(id).map(|e| e.as_mut())
    }

    pub fn contains(&self, id: &ExchangeId) -> bool {
        self.exchanges.contains_key(id)
    }

    pub fn ids(&self) -> Vec<ExchangeId> {
        self.exchanges.keys().cloned().collect()
    }

    /// Snapshot the named exchanges; unknown ids are skipped
    pub fn checkpoint(&self, ids: &[ExchangeId]) -> Vec<Box<dyn Exchange>> {
        ids.iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|id| self.exchanges.get(id))
            .map(|exchange| exchange.snapshot())
            .collect()
    }

    /// Put snapshots taken by [`ExchangeRegistry::checkpoint`] back in place
    pub fn restore(&mut self, saved: Vec<Box<dyn Exchange>>) {
        for exchange in saved {
            self.exchanges.insert(exchange.id().clone(), exchange);
        }
    }
}

impl std::fmt::Debug for ExchangeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeRegistry")
            .field("exchanges", &self.exchanges.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Constant-product reference exchange
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Reserves {
    x: Amount,
    y: Amount,
}

/// x*y=k pools with a flat pool fee
#[derive(Debug, Clone)]
pub struct ConstantProductExchange {
    id: ExchangeId,
    account: AccountId,
    fee_num: u32,
    fee_denom: u32,
    /// Keyed by the ordered pair (x < y)
    pools: BTreeMap<(AssetId, AssetId), Reserves>,
}

impl ConstantProductExchange {
    pub fn new(id: ExchangeId, fee_num: u32, fee_denom: u32) -> Self {
        Self {
            account: AccountId::new(id.as_str()),
            id,
            fee_num,
            fee_denom,
            pools: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Self {
        let mut exchange = Self::new(config.id.clone(), config.fee_num, config.fee_denom);
        for pool in &config.pools {
            exchange.add_pool(
                pool.asset_x.clone(),
                pool.asset_y.clone(),
                pool.reserve_x,
                pool.reserve_y,
            );
        }
        exchange
    }

    pub fn add_pool(&mut self, asset_x: AssetId, asset_y: AssetId, reserve_x: Amount, reserve_y: Amount) {
        if asset_x <= asset_y {
            self.pools.insert(
                (asset_x, asset_y),
                Reserves {
                    x: reserve_x,
                    y: reserve_y,
                },
            );
        } else {
            self.pools.insert(
                (asset_y, asset_x),
                Reserves {
                    x: reserve_y,
                    y: reserve_x,
                },
            );
        }
    }

    /// (reserve_in, reserve_out) for a direction
    pub fn reserves(&self, asset_in: &AssetId, asset_out: &AssetId) -> Option<(Amount, Amount)> {
        if asset_in <= asset_out {
            self.pools
                .get(&(asset_in.clone(), asset_out.clone()))
                .map(|r| (r.x, r.y))
        } else {
            self.pools
                .get(&(asset_out.clone(), asset_in.clone()))
                .map(|r| (r.y, r.x))
        }
    }

    fn set_reserves(&mut self, asset_in: &AssetId, asset_out: &AssetId, r_in: Amount, r_out: Amount) {
        if asset_in <= asset_out {
            self.add_pool(asset_in.clone(), asset_out.clone(), r_in, r_out);
        } else {
            self.add_pool(asset_out.clone(), asset_in.clone(), r_out, r_in);
        }
    }
}

impl Exchange for ConstantProductExchange {
    fn id(&self) -> &ExchangeId {
        &self.id
    }

    fn account(&self) -> &AccountId {
        &self.account
    }

    fn snapshot(&self) -> Box<dyn Exchange> {
        Box::new(self.clone())
    }

    fn get_amount_out(
        &self,
        amount_in: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Result<Amount, ExchangeError> {
        if amount_in == 0 {
            return Err(ExchangeError::ZeroInput);
        }
        let (r_in, r_out) =
            self.reserves(asset_in, asset_out)
                .ok_or_else(|| ExchangeError::PoolNotFound {
                    asset_in: asset_in.clone(),
                    asset_out: asset_out.clone(),
                })?;

        let amount_out =
            calculator::calculate_output(r_in, r_out, amount_in, self.fee_num, self.fee_denom);
        if amount_out == 0 || amount_out >= r_out {
            return Err(ExchangeError::InsufficientReserves { amount_out });
        }
        Ok(amount_out)
    }

    fn swap_exact_tokens_for_tokens(
        &mut self,
        amount_in: Amount,
        min_amount_out: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Result<Amount, ExchangeError> {
        let amount_out = self.get_amount_out(amount_in, asset_in, asset_out)?;
        if amount_out < min_amount_out {
            return Err(ExchangeError::InsufficientOutput {
                amount_out,
                min_amount_out,
            });
        }

        let (r_in, r_out) = self
            .reserves(asset_in, asset_out)
            .ok_or_else(|| ExchangeError::PoolNotFound {
                asset_in: asset_in.clone(),
                asset_out: asset_out.clone(),
            })?;
        self.set_reserves(
            asset_in,
            asset_out,
            r_in.saturating_add(amount_in),
            r_out - amount_out,
        );
        Ok(amount_out)
    }
}
