//! Swap route aggregation engine
//!
//! Components, leaves first:
//! - [`governance`]: owner/admin roles, blacklist, emergency shutdown
//! - [`fees`]: protocol fee rate and recipient
//! - [`oracle`]: prices, staleness, impact pricing, manipulation guard
//! - [`liquidity`]: tracked depth per directed pool
//! - [`routes`]: route registry and best-route selection
//! - [`router`]: the swap state machine
//!
//! [`engine::Engine`] owns all of them and runs [`batch::Call`]s in order.

pub mod batch;
pub mod calculator;
pub mod engine;
pub mod exchange;
pub mod fees;
pub mod governance;
pub mod ledger;
pub mod liquidity;
pub mod oracle;
pub mod router;
pub mod routes;

pub use batch::{BatchReceipt, Call, Operation, Outcome, Receipt};
pub use engine::Engine;
pub use exchange::{ConstantProductExchange, Exchange, ExchangeError, ExchangeRegistry};
pub use fees::FeeManager;
pub use governance::{Governance, GovernanceSnapshot};
pub use ledger::{AssetLedger, InMemoryLedger, TransferError};
pub use liquidity::{LiquidityEntry, LiquidityTracker};
pub use oracle::{BestPrice, ManipulationFlag, PriceEntry, PriceOracle};
pub use router::{SwapReceipt, SwapRequest, SwapRouter, SwapState};
pub use routes::{HopQuote, PlannedHop, Route, RouteEvaluation, RouteManager, RouteQuote};
