//! Application state shared across API handlers

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use swap_engine::{ConstantProductExchange, Engine, Exchange, InMemoryLedger};
use swapgate_core::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    engine: RwLock<Engine<InMemoryLedger>>,
}

impl AppState {
    /// Wrap an already-built engine
    pub fn new(config: AppConfig, engine: Engine<InMemoryLedger>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                engine: RwLock::new(engine),
            }),
        }
    }

    /// Build the engine described by `config`: configured assets in an
    /// in-memory ledger and one constant-product venue per exchange entry,
    /// its inventory account stocked with the pool reserves
    pub fn with_config(config: AppConfig) -> Result<Self, swapgate_core::Error> {
        let mut ledger = InMemoryLedger::with_assets(config.assets.iter().cloned());
        let mut venues = Vec::with_capacity(config.exchanges.len());

        for exchange in &config.exchanges {
            tracing::info!(
                "Registering exchange {} with {} pools",
                exchange.id,
                exchange.pools.len()
            );
            let venue = ConstantProductExchange::from_config(exchange);
            for pool in &exchange.pools {
                ledger.fund_exchange(venue.account(), &pool.asset_x, pool.reserve_x);
                ledger.fund_exchange(venue.account(), &pool.asset_y, pool.reserve_y);
            }
            venues.push(venue);
        }

        let mut engine = Engine::new(&config.engine, ledger)?;
        for venue in venues {
            engine.register_exchange(Box::new(venue));
        }

        Ok(Self::new(config, engine))
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    /// Shared access for queries
    pub async fn engine(&self) -> RwLockReadGuard<'_, Engine<InMemoryLedger>> {
        self.inner.engine.read().await
    }

    /// Exclusive access for batches; holding it serializes batch execution
    pub async fn engine_mut(&self) -> RwLockWriteGuard<'_, Engine<InMemoryLedger>> {
        self.inner.engine.write().await
    }
}
