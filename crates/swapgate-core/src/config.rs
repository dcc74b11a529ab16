//! Configuration types for Swapgate

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::{AccountId, Amount, AssetId, BlockHeight, Error, ExchangeId};

/// Manipulation guard tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManipulationConfig {
    /// Largest tolerated move between two updates inside the window (bps)
    #[serde(default = "default_max_deviation_bps")]
    pub max_deviation_bps: u64,

    /// Two updates further apart than this are not compared
    #[serde(default = "default_window_blocks")]
    pub window_blocks: BlockHeight,

    /// How long a raised flag stays active
    #[serde(default = "default_cooldown_blocks")]
    pub cooldown_blocks: BlockHeight,
}

fn default_max_deviation_bps() -> u64 {
    constants::DEFAULT_MAX_DEVIATION_BPS
}

fn default_window_blocks() -> BlockHeight {
    constants::DEFAULT_MANIPULATION_WINDOW
}

fn default_cooldown_blocks() -> BlockHeight {
    constants::DEFAULT_MANIPULATION_COOLDOWN
}

impl Default for ManipulationConfig {
    fn default() -> Self {
        Self {
            max_deviation_bps: default_max_deviation_bps(),
            window_blocks: default_window_blocks(),
            cooldown_blocks: default_cooldown_blocks(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Contract owner (manages the admin set)
    pub owner: AccountId,

    /// Accounts allowed to publish prices in addition to the owner
    #[serde(default)]
    pub price_feeds: Vec<AccountId>,

    /// Initial protocol fee in basis points
    #[serde(default = "default_fee_rate_bps")]
    pub fee_rate_bps: u64,

    /// Initial fee recipient
    pub fee_recipient: AccountId,

    /// Largest accepted swap input
    #[serde(default = "default_max_transaction_amount")]
    pub max_transaction_amount: Amount,

    /// Price age (in batches) at which a price is stale
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold: BlockHeight,

    /// Routing penalty per hop
    #[serde(default = "default_hop_cost")]
    pub hop_cost: Amount,

    /// Market depth used for assets without an explicit depth
    #[serde(default = "default_market_depth")]
    pub default_market_depth: Amount,

    #[serde(default)]
    pub manipulation: ManipulationConfig,
}

fn default_fee_rate_bps() -> u64 {
    constants::DEFAULT_FEE_BPS
}

fn default_max_transaction_amount() -> Amount {
    constants::DEFAULT_MAX_TRANSACTION_AMOUNT
}

fn default_staleness_threshold() -> BlockHeight {
    constants::STALENESS_THRESHOLD
}

fn default_hop_cost() -> Amount {
    constants::DEFAULT_HOP_COST
}

fn default_market_depth() -> Amount {
    constants::DEFAULT_MARKET_DEPTH
}

impl EngineConfig {
    /// Create a config owned by `owner`, who also receives fees
    pub fn with_owner(owner: AccountId) -> Self {
        Self {
            fee_recipient: owner.clone(),
            owner,
            ..Self::default()
        }
    }

    /// Reject configurations the engine cannot start from
    pub fn validate(&self) -> Result<(), Error> {
        if !self.owner.is_well_formed() {
            return Err(Error::Config(format!("malformed owner: {}", self.owner)));
        }
        if !self.fee_recipient.is_well_formed() {
            return Err(Error::Config(format!(
                "malformed fee recipient: {}",
                self.fee_recipient
            )));
        }
        if self.fee_rate_bps > constants::MAX_FEE_BPS {
            return Err(Error::Config(format!(
                "fee rate {} bps exceeds {} bps",
                self.fee_rate_bps,
                constants::MAX_FEE_BPS
            )));
        }
        if self.staleness_threshold == 0 {
            return Err(Error::Config("staleness threshold must be positive".into()));
        }
        if self.max_transaction_amount == 0 {
            return Err(Error::Config(
                "max transaction amount must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let owner = AccountId::new("deployer");
        Self {
            owner: owner.clone(),
            price_feeds: Vec::new(),
            fee_rate_bps: default_fee_rate_bps(),
            fee_recipient: owner,
            max_transaction_amount: default_max_transaction_amount(),
            staleness_threshold: default_staleness_threshold(),
            hop_cost: default_hop_cost(),
            default_market_depth: default_market_depth(),
            manipulation: ManipulationConfig::default(),
        }
    }
}

/// One liquidity pool of a reference exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    pub asset_x: AssetId,
    pub asset_y: AssetId,
    pub reserve_x: Amount,
    pub reserve_y: Amount,
}

/// Reference constant-product exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    pub id: ExchangeId,

    /// Pool fee numerator (e.g., 997)
    #[serde(default = "default_fee_num")]
    pub fee_num: u32,

    /// Pool fee denominator (e.g., 1000)
    #[serde(default = "default_fee_denom")]
    pub fee_denom: u32,

    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

fn default_fee_num() -> u32 {
    997
}

fn default_fee_denom() -> u32 {
    1000
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Engine settings
    #[serde(default)]
    pub engine: EngineConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Assets known to the asset ledger
    #[serde(default)]
    pub assets: Vec<AssetId>,

    /// Exchanges registered at startup
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
}

fn default_api_port() -> u16 {
    19080
}

impl AppConfig {
    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Self =
            serde_json::from_str(&raw).map_err(|e| Error::Serialization(e.to_string()))?;
        config.engine.validate()?;
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            api_port: default_api_port(),
            assets: Vec::new(),
            exchanges: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_port, 19080);
        assert_eq!(config.engine.fee_rate_bps, 30);
        assert_eq!(config.engine.staleness_threshold, 100);
        assert_eq!(config.engine.max_transaction_amount, 1_000_000_000_000_000);
        assert!(config.engine.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.engine.owner, config.engine.owner);
        assert_eq!(parsed.api_port, config.api_port);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{
            "engine": { "owner": "admin", "fee_recipient": "treasury" },
            "exchanges": [{ "id": "dex-a" }]
        }"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.engine.owner, AccountId::new("admin"));
        assert_eq!(parsed.engine.hop_cost, constants::DEFAULT_HOP_COST);
        assert_eq!(parsed.engine.manipulation.window_blocks, 10);
        assert_eq!(parsed.exchanges[0].fee_num, 997);
        assert!(parsed.exchanges[0].pools.is_empty());
    }

    #[test]
    fn test_validate_rejects_fee_above_limit() {
        let config = EngineConfig {
            fee_rate_bps: 101,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_with_owner() {
        let config = EngineConfig::with_owner(AccountId::new("alice"));
        assert_eq!(config.fee_recipient, AccountId::new("alice"));
        assert!(config.validate().is_ok());
    }
}
