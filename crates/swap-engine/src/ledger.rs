//! Asset-transfer capability
//!
//! The router never moves balances itself. It asks an [`AssetLedger`] whether
//! an asset exists, what a sender holds and has approved, and to transfer the
//! fee, the principal and the output. Each exchange settles through its own
//! inventory account on the ledger.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use swapgate_core::{AccountId, Amount, AssetId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Unknown asset: {0}")]
    UnknownAsset(AssetId),

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Insufficient allowance: need {required}, have {available}")]
    InsufficientAllowance { required: Amount, available: Amount },
}

pub trait AssetLedger: Send + Sync {
    /// Saved ledger state, restored when a swap fails part way through
    type Checkpoint;

    fn is_asset(&self, asset: &AssetId) -> bool;

    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount;

    /// Amount `owner` has approved the engine to move
    fn allowance(&self, asset: &AssetId, owner: &AccountId) -> Amount;

    fn transfer(
        &mut self,
        asset: &AssetId,
        amount: Amount,
        sender: &AccountId,
        recipient: &AccountId,
    ) -> Result<(), TransferError>;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn restore(&mut self, checkpoint: Self::Checkpoint);
}

/// Balances and allowances held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    assets: BTreeSet<AssetId>,
    balances: BTreeMap<(AssetId, AccountId), Amount>,
    allowances: BTreeMap<(AssetId, AccountId), Amount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_assets(assets: impl IntoIterator<Item = AssetId>) -> Self {
        let mut ledger = Self::new();
        for asset in assets {
            ledger.register_asset(asset);
        }
        ledger
    }

    pub fn register_asset(&mut self, asset: AssetId) {
        self.assets.insert(asset);
    }

    pub fn mint(&mut self, asset: &AssetId, account: &AccountId, amount: Amount) {
        let balance = self
            .balances
            .entry((asset.clone(), account.clone()))
            .or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Set the allowance `owner` grants the engine
    pub fn approve(&mut self, asset: &AssetId, owner: &AccountId, amount: Amount) {
        self.allowances
            .insert((asset.clone(), owner.clone()), amount);
    }

    /// Stock an exchange's inventory account and let the engine settle from it
    pub fn fund_exchange(&mut self, account: &AccountId, asset: &AssetId, amount: Amount) {
        self.mint(asset, account, amount);
        self.approve(asset, account, Amount::MAX);
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.assets.iter()
    }
}

impl AssetLedger for InMemoryLedger {
    type Checkpoint = InMemoryLedger;

    fn is_asset(&self, asset: &AssetId) -> bool {
        self.assets.contains(asset)
    }

    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .get(&(asset.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, asset: &AssetId, owner: &AccountId) -> Amount {
        self.allowances
            .get(&(asset.clone(), owner.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Moves `amount` from `sender`, consuming both balance and allowance
    fn transfer(
        &mut self,
        asset: &AssetId,
        amount: Amount,
        sender: &AccountId,
        recipient: &AccountId,
    ) -> Result<(), TransferError> {
        if !self.is_asset(asset) {
            return Err(TransferError::UnknownAsset(asset.clone()));
        }

        let allowance = self.allowance(asset, sender);
        if allowance < amount {
            return Err(TransferError::InsufficientAllowance {
                required: amount,
                available: allowance,
            });
        }
        let balance = self.balance_of(asset, sender);
        if balance < amount {
            return Err(TransferError::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }

        self.allowances
            .insert((asset.clone(), sender.clone()), allowance - amount);
        self.balances
            .insert((asset.clone(), sender.clone()), balance - amount);
        self.mint(asset, recipient, amount);
        Ok(())
    }

    fn checkpoint(&self) -> Self::Checkpoint {
        self.clone()
    }

    fn restore(&mut self, checkpoint: Self::Checkpoint) {
        *self = checkpoint;
    }
}
