//! Governance Control
//!
//! Owner/admin roles, price-feed role, asset blacklist, transaction ceiling
//! and the emergency-shutdown flag. Every mutating engine operation consults
//! this registry before touching its own state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use swapgate_core::{AccountId, Amount, AssetId, EngineConfig, GovernanceError};

/// Governance state
#[derive(Debug, Clone)]
pub struct Governance {
    owner: AccountId,
    admins: BTreeSet<AccountId>,
    price_feeds: BTreeSet<AccountId>,
    blacklist: BTreeSet<AssetId>,
    emergency_shutdown: bool,
    max_transaction_amount: Amount,
}

/// Read-only snapshot for queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    pub owner: AccountId,
    pub admins: Vec<AccountId>,
    pub price_feeds: Vec<AccountId>,
    pub blacklist: Vec<AssetId>,
    pub emergency_shutdown: bool,
    pub max_transaction_amount: Amount,
}

impl Governance {
    pub fn new(config: &EngineConfig) -> Self {
        let mut price_feeds: BTreeSet<AccountId> = config.price_feeds.iter().cloned().collect();
        price_feeds.insert(config.owner.clone());

        Self {
            owner: config.owner.clone(),
            admins: BTreeSet::new(),
            price_feeds,
            blacklist: BTreeSet::new(),
            emergency_shutdown: false,
            max_transaction_amount: config.max_transaction_amount,
        }
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }

    /// The owner always counts as an admin
    pub fn is_admin(&self, account: &AccountId) -> bool {
        self.is_owner(account) || self.admins.contains(account)
    }

    pub fn is_price_feed(&self, account: &AccountId) -> bool {
        self.price_feeds.contains(account)
    }

    pub fn is_blacklisted(&self, asset: &AssetId) -> bool {
        self.blacklist.contains(asset)
    }

    pub fn is_paused(&self) -> bool {
        self.emergency_shutdown
    }

    pub fn max_transaction_amount(&self) -> Amount {
        self.max_transaction_amount
    }

    fn require_owner(&self, caller: &AccountId) -> Result<(), GovernanceError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }

    fn require_admin(&self, caller: &AccountId) -> Result<(), GovernanceError> {
        if self.is_admin(caller) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }

    /// Grant admin rights (owner only)
    pub fn add_admin(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> Result<(), GovernanceError> {
        self.require_owner(caller)?;
        tracing::info!("Admin added: {}", account);
        self.admins.insert(account);
        Ok(())
    }

    /// Revoke admin rights (owner only)
    pub fn remove_admin(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), GovernanceError> {
        self.require_owner(caller)?;
        if self.admins.remove(account) {
            tracing::info!("Admin removed: {}", account);
        }
        Ok(())
    }

    /// Grant the price-feed role (owner only)
    pub fn add_price_feed(
        &mut self,
        caller: &AccountId,
        account: AccountId,
    ) -> Result<(), GovernanceError> {
        self.require_owner(caller)?;
        tracing::info!("Price feed added: {}", account);
        self.price_feeds.insert(account);
        Ok(())
    }

    /// Revoke the price-feed role (owner only)
    pub fn remove_price_feed(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<(), GovernanceError> {
        self.require_owner(caller)?;
        if self.price_feeds.remove(account) {
            tracing::info!("Price feed removed: {}", account);
        }
        Ok(())
    }

    pub fn add_to_blacklist(
        &mut self,
        caller: &AccountId,
        asset: AssetId,
    ) -> Result<(), GovernanceError> {
        self.require_admin(caller)?;
        tracing::info!("Asset blacklisted: {}", asset);
        self.blacklist.insert(asset);
        Ok(())
    }

    pub fn remove_from_blacklist(
        &mut self,
        caller: &AccountId,
        asset: &AssetId,
    ) -> Result<(), GovernanceError> {
        self.require_admin(caller)?;
        if self.blacklist.remove(asset) {
            tracing::info!("Asset removed from blacklist: {}", asset);
        }
        Ok(())
    }

    /// Pause all swaps. Calling it again while paused is a no-op.
    pub fn emergency_shutdown(&mut self, caller: &AccountId) -> Result<(), GovernanceError> {
        self.require_admin(caller)?;
        if !self.emergency_shutdown {
            tracing::warn!("Emergency shutdown activated by {}", caller);
        }
        self.emergency_shutdown = true;
        Ok(())
    }

    /// Lift the emergency shutdown (owner only)
    pub fn resume_operations(&mut self, caller: &AccountId) -> Result<(), GovernanceError> {
        self.require_owner(caller)?;
        if self.emergency_shutdown {
            tracing::info!("Operations resumed by {}", caller);
        }
        self.emergency_shutdown = false;
        Ok(())
    }

    pub fn set_max_transaction_amount(
        &mut self,
        caller: &AccountId,
        amount: Amount,
    ) -> Result<(), GovernanceError> {
        self.require_admin(caller)?;
        if amount == 0 {
            return Err(GovernanceError::InvalidParameter {
                reason: "max transaction amount must be positive".to_string(),
            });
        }
        tracing::info!("Max transaction amount set to {}", amount);
        self.max_transaction_amount = amount;
        Ok(())
    }

    pub fn snapshot(&self) -> GovernanceSnapshot {
        GovernanceSnapshot {
            owner: self.owner.clone(),
            admins: self.admins.iter().cloned().collect(),
            price_feeds: self.price_feeds.iter().cloned().collect(),
            blacklist: self.blacklist.iter().cloned().collect(),
            emergency_shutdown: self.emergency_shutdown,
            max_transaction_amount: self.max_transaction_amount,
        }
    }
}
