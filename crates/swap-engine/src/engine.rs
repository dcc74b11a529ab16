//! Sequential batch executor
//!
//! [`Engine`] owns every registry, the exchange registry and the asset
//! ledger. Batches run strictly in order. The height is bumped once per batch
//! before its first call, and a failing call leaves state exactly as the
//! previous call left it. Once the height reaches `u64::MAX` no further batch
//! runs; every call in it is rejected with [`Error::HeightExhausted`].

use swapgate_core::{
    AccountId, Amount, AssetId, BlockHeight, EngineConfig, Error, ExchangeId, Result,
};

use crate::batch::{BatchReceipt, Call, Operation, Outcome, Receipt};
use crate::exchange::{Exchange, ExchangeRegistry};
use crate::fees::FeeManager;
use crate::governance::Governance;
use crate::ledger::{AssetLedger, InMemoryLedger};
use crate::liquidity::{LiquidityEntry, LiquidityTracker};
use crate::oracle::{BestPrice, PriceEntry, PriceOracle};
use crate::routes::{Route, RouteManager, RouteQuote};
use crate::router::SwapRouter;

pub struct Engine<L: AssetLedger = InMemoryLedger> {
    height: BlockHeight,
    governance: Governance,
    fees: FeeManager,
    oracle: PriceOracle,
    liquidity: LiquidityTracker,
    routes: RouteManager,
    exchanges: ExchangeRegistry,
    ledger: L,
}

impl<L: AssetLedger> Engine<L> {
    pub fn new(config: &EngineConfig, ledger: L) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            "Engine started: owner={}, fee={} bps, staleness={} batches",
            config.owner,
            config.fee_rate_bps,
            config.staleness_threshold
        );
        Ok(Self {
            height: 0,
            governance: Governance::new(config),
            fees: FeeManager::new(config),
            oracle: PriceOracle::new(config),
            liquidity: LiquidityTracker::new(),
            routes: RouteManager::new(config.hop_cost),
            exchanges: ExchangeRegistry::new(),
            ledger,
        })
    }

    pub fn register_exchange(&mut self, exchange: Box<dyn Exchange>) {
        self.exchanges.register(exchange);
    }

    // ------------------------------------------------------------------
    // Batches
    // ------------------------------------------------------------------

    pub fn execute_batch(&mut self, calls: Vec<Call>) -> BatchReceipt {
        let Some(height) = self.height.checked_add(1) else {
            tracing::warn!("Batch rejected: height {} is exhausted", self.height);
            return self.reject_batch(calls);
        };
        self.height = height;

        let receipts: Vec<Receipt> = calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| {
                let operation = call.operation.name();
                let result = self.apply(&call.sender, call.operation);
                if let Err(e) = &result {
                    tracing::debug!("Call {} ({}) at height {} failed: {}", index, operation, height, e);
                }
                Receipt {
                    index,
                    operation,
                    result,
                }
            })
            .collect();

        let failed = receipts.iter().filter(|r| !r.is_ok()).count();
        tracing::debug!(
            "Batch {} executed: {} calls, {} failed",
            height,
            receipts.len(),
            failed
        );
        BatchReceipt { height, receipts }
    }

    /// Run a single call in its own batch
    pub fn execute(&mut self, sender: AccountId, operation: Operation) -> Receipt {
        let mut batch = self.execute_batch(vec![Call::new(sender, operation)]);
        batch.receipts.remove(0)
    }

    fn reject_batch(&self, calls: Vec<Call>) -> BatchReceipt {
        let receipts = calls
            .into_iter()
            .enumerate()
            .map(|(index, call)| Receipt {
                index,
                operation: call.operation.name(),
                result: Err(Error::HeightExhausted {
                    height: self.height,
                    blocks: 1,
                }),
            })
            .collect();
        BatchReceipt {
            height: self.height,
            receipts,
        }
    }

    /// Mine `n` empty batches
    pub fn advance(&mut self, n: u64) -> Result<BlockHeight> {
        self.height = self
            .height
            .checked_add(n)
            .ok_or(Error::HeightExhausted {
                height: self.height,
                blocks: n,
            })?;
        Ok(self.height)
    }

    fn apply(&mut self, sender: &AccountId, operation: Operation) -> Result<Outcome> {
        let height = self.height;
        let gov = &mut self.governance;

        match operation {
            Operation::AddAdmin { account } => gov.add_admin(sender, account)?,
            Operation::RemoveAdmin { account } => gov.remove_admin(sender, &account)?,
            Operation::AddToBlacklist { asset } => gov.add_to_blacklist(sender, asset)?,
            Operation::RemoveFromBlacklist { asset } => gov.remove_from_blacklist(sender, &asset)?,
            Operation::EmergencyShutdown => gov.emergency_shutdown(sender)?,
            Operation::ResumeOperations => gov.resume_operations(sender)?,
            Operation::AddPriceFeed { account } => gov.add_price_feed(sender, account)?,
            Operation::RemovePriceFeed { account } => gov.remove_price_feed(sender, &account)?,
            Operation::SetMaxTransactionAmount { amount } => {
                gov.set_max_transaction_amount(sender, amount)?
            }
            Operation::SetFee { rate_bps } => {
                self.fees.set_fee(&self.governance, sender, rate_bps)?
            }
            Operation::SetFeeRecipient { recipient } => {
                self.fees
                    .set_fee_recipient(&self.governance, sender, recipient)?
            }
            Operation::UpdatePrice { asset, price } => {
                self.oracle
                    .update_price(&self.governance, sender, asset, price, height)?
            }
            Operation::RevalidatePrice { asset } => {
                self.oracle
                    .revalidate_price(&self.governance, sender, &asset)?
            }
            Operation::SetMarketDepth { asset, depth } => {
                self.oracle
                    .set_market_depth(&self.governance, sender, asset, depth)?
            }
            Operation::UpdateLiquidity {
                exchange,
                asset_in,
                asset_out,
                amount,
            } => self.liquidity.update_liquidity(
                &self.governance,
                sender,
                exchange,
                asset_in,
                asset_out,
                amount,
                height,
            )?,
            Operation::AddRoute {
                asset_in,
                asset_out,
                path,
                exchange,
            } => self.routes.add_route(
                &self.governance,
                sender,
                asset_in,
                asset_out,
                path,
                exchange,
                height,
            )?,
            Operation::SwapTokens(request) => {
                let mut router = SwapRouter {
                    governance: &self.governance,
                    fees: &self.fees,
                    oracle: &self.oracle,
                    liquidity: &self.liquidity,
                    routes: &self.routes,
                    exchanges: &mut self.exchanges,
                    ledger: &mut self.ledger,
                    height,
                };
                let receipt = router.swap_tokens(sender, &request)?;
                return Ok(Outcome::Swapped(receipt));
            }
        }
        Ok(Outcome::Done)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn height(&self) -> BlockHeight {
        self.height
    }

    pub fn governance(&self) -> &Governance {
        &self.governance
    }

    pub fn fees(&self) -> &FeeManager {
        &self.fees
    }

    pub fn oracle(&self) -> &PriceOracle {
        &self.oracle
    }

    pub fn liquidity(&self) -> &LiquidityTracker {
        &self.liquidity
    }

    pub fn routes(&self) -> &RouteManager {
        &self.routes
    }

    pub fn exchanges(&self) -> &ExchangeRegistry {
        &self.exchanges
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn get_routes(&self, asset_in: &AssetId, asset_out: &AssetId) -> Option<&Route> {
        self.routes.get_routes(asset_in, asset_out)
    }

    pub fn get_best_route(
        &self,
        amount: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Option<RouteQuote> {
        self.routes.get_best_route(
            amount,
            asset_in,
            asset_out,
            &self.fees,
            &self.oracle,
            &self.liquidity,
        )
    }

    pub fn get_route_quotes(
        &self,
        amount: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Vec<RouteQuote> {
        self.routes.get_route_quotes(
            amount,
            asset_in,
            asset_out,
            &self.fees,
            &self.oracle,
            &self.liquidity,
        )
    }

    pub fn get_token_price(&self, asset: &AssetId) -> Option<PriceEntry> {
        self.oracle.get_token_price(asset)
    }

    pub fn is_price_stale(&self, asset: &AssetId) -> bool {
        self.oracle.is_price_stale(asset, self.height)
    }

    pub fn get_best_price(&self, amount: Amount, candidates: &[Vec<AssetId>]) -> Option<BestPrice> {
        self.oracle.get_best_price(amount, candidates)
    }

    pub fn get_pool_liquidity(
        &self,
        exchange: &ExchangeId,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Option<LiquidityEntry> {
        self.liquidity.get_pool_liquidity(exchange, asset_in, asset_out)
    }

    pub fn calculate_fee(&self, amount: Amount) -> Amount {
        self.fees.calculate_fee(amount)
    }
}

impl<L: AssetLedger + std::fmt::Debug> std::fmt::Debug for Engine<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("height", &self.height)
            .field("governance", &self.governance)
            .field("exchanges", &self.exchanges)
            .field("ledger", &self.ledger)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::{ConstantProductExchange, ExchangeError};
    use crate::router::SwapRequest;
    use swapgate_core::constants::PRICE_SCALE;
    use swapgate_core::{RouteError, SwapError};

    fn owner() -> AccountId {
        AccountId::new("deployer")
    }

    fn trader() -> AccountId {
        AccountId::new("wallet_2")
    }

    fn a() -> AssetId {
        AssetId::new("token-a")
    }

    fn b() -> AssetId {
        AssetId::new("token-b")
    }

    fn c() -> AssetId {
        AssetId::new("token-c")
    }

    fn d() -> AssetId {
        AssetId::new("token-d")
    }

    fn dex() -> ExchangeId {
        ExchangeId::new("dex-a")
    }

    fn dex_b() -> ExchangeId {
        ExchangeId::new("dex-b")
    }

    fn account_of(exchange: &ExchangeId) -> AccountId {
        AccountId::new(exchange.as_str())
    }

    /// Quotes 1:1, refuses to execute
    #[derive(Clone)]
    struct FailingExchange {
        id: ExchangeId,
        account: AccountId,
        fail_quotes: bool,
    }

    impl FailingExchange {
        fn new(id: ExchangeId, fail_quotes: bool) -> Self {
            Self {
                account: account_of(&id),
                id,
                fail_quotes,
            }
        }
    }

    impl Exchange for FailingExchange {
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
            _asset_in: &AssetId,
            _asset_out: &AssetId,
        ) -> std::result::Result<Amount, ExchangeError> {
            if self.fail_quotes {
                Err(ExchangeError::Rejected("venue offline".into()))
            } else {
                Ok(amount_in)
            }
        }

        fn swap_exact_tokens_for_tokens(
            &mut self,
            _amount_in: Amount,
            _min_amount_out: Amount,
            _asset_in: &AssetId,
            _asset_out: &AssetId,
        ) -> std::result::Result<Amount, ExchangeError> {
            Err(ExchangeError::Rejected("venue offline".into()))
        }
    }

    fn price_op(asset: AssetId, price: u64) -> Operation {
        Operation::UpdatePrice { asset, price }
    }

    fn swap_op(amount_in: Amount, min_amount_out: Amount) -> Operation {
        Operation::SwapTokens(SwapRequest {
            amount_in,
            min_amount_out,
            asset_in: a(),
            asset_out: b(),
            recipient: trader(),
        })
    }

    /// Route A->B with deep liquidity and fresh prices, set up in batch 1
    fn make_engine() -> Engine {
        let config = EngineConfig::with_owner(owner());
        let mut ledger = InMemoryLedger::with_assets([a(), b(), c(), d()]);
        ledger.mint(&a(), &trader(), 1_000_000_000);
        ledger.approve(&a(), &trader(), 1_000_000_000);
        ledger.fund_exchange(&account_of(&dex()), &b(), 1_000_000_000_000);
        ledger.fund_exchange(&account_of(&dex()), &c(), 1_000_000_000_000);

        let mut engine = Engine::new(&config, ledger).unwrap();
        let mut venue = ConstantProductExchange::new(dex(), 997, 1000);
        venue.add_pool(a(), b(), 1_000_000_000_000, 1_000_000_000_000);
        venue.add_pool(a(), c(), 1_000_000_000_000, 1_000_000_000_000);
        engine.register_exchange(Box::new(venue));

        let setup = engine.execute_batch(vec![
            Call::new(owner(), price_op(a(), PRICE_SCALE)),
            Call::new(owner(), price_op(b(), PRICE_SCALE)),
            Call::new(
                owner(),
                Operation::UpdateLiquidity {
                    exchange: dex(),
                    asset_in: a(),
                    asset_out: b(),
                    amount: 1_000_000_000_000,
                },
            ),
            Call::new(
                owner(),
                Operation::AddRoute {
                    asset_in: a(),
                    asset_out: b(),
                    path: vec![a(), b()],
                    exchange: dex(),
                },
            ),
        ]);
        assert_eq!(setup.height, 1);
        assert!(setup.receipts.iter().all(|r| r.is_ok()));
        engine
    }

    /// Adds the only A->D path: A->C on dex-a, then C->D on `second`
    fn add_two_exchange_path(engine: &mut Engine, second: Box<dyn Exchange>) {
        engine.register_exchange(second);
        engine
            .ledger_mut()
            .fund_exchange(&account_of(&dex_b()), &d(), 1_000_000_000_000);

        let liquidity = |exchange: ExchangeId, asset_in: AssetId, asset_out: AssetId| {
            Call::new(
                owner(),
                Operation::UpdateLiquidity {
                    exchange,
                    asset_in,
                    asset_out,
                    amount: 1_000_000_000_000,
                },
            )
        };
        let route = |asset_in: AssetId, asset_out: AssetId, exchange: ExchangeId| {
            Call::new(
                owner(),
                Operation::AddRoute {
                    path: vec![asset_in.clone(), asset_out.clone()],
                    asset_in,
                    asset_out,
                    exchange,
                },
            )
        };
        let batch = engine.execute_batch(vec![
            Call::new(owner(), price_op(c(), PRICE_SCALE)),
            Call::new(owner(), price_op(d(), PRICE_SCALE)),
            liquidity(dex(), a(), c()),
            liquidity(dex_b(), c(), d()),
            route(a(), c(), dex()),
            route(c(), d(), dex_b()),
        ]);
        assert!(batch.receipts.iter().all(|r| r.is_ok()));
    }

    fn swap_to_d(amount_in: Amount) -> Operation {
        Operation::SwapTokens(SwapRequest {
            amount_in,
            min_amount_out: 0,
            asset_in: a(),
            asset_out: d(),
            recipient: trader(),
        })
    }

    fn quote_on(
        engine: &Engine,
        exchange: &ExchangeId,
        asset_in: &AssetId,
        asset_out: &AssetId,
    ) -> Amount {
        engine
            .exchanges()
            .get(exchange)
            .unwrap()
            .get_amount_out(1_000_000, asset_in, asset_out)
            .unwrap()
    }

    fn swap_error(receipt: &Receipt) -> &SwapError {
        match receipt.error() {
            Some(Error::Swap(e)) => e,
            other => panic!("expected swap error, got {:?}", other),
        }
    }

    #[test]
    fn test_end_to_end_swap() {
        let mut engine = make_engine();
        let receipt = engine.execute(trader(), swap_op(1_000, 950));

        let swap = receipt.swap_receipt().unwrap();
        assert!(swap.realized_output >= 950);
        assert_eq!(swap.height, 2);
        assert_eq!(swap.recipient, trader());
        assert_eq!(engine.ledger().balance_of(&a(), &owner()), 3);
        assert_eq!(engine.ledger().balance_of(&a(), &trader()), 1_000_000_000 - 1_000);
        assert_eq!(engine.ledger().balance_of(&b(), &trader()), swap.realized_output);
    }

    #[test]
    fn test_zero_amount_and_double_min_out() {
        let mut engine = make_engine();
        let batch = engine.execute_batch(vec![
            Call::new(trader(), swap_op(0, 0)),
            Call::new(trader(), swap_op(1_000, 2_000)),
        ]);
        assert!(matches!(swap_error(&batch.receipts[0]), SwapError::ZeroAmount));
        assert!(matches!(
            swap_error(&batch.receipts[1]),
            SwapError::ExcessiveSlippage { .. }
        ));
    }

    #[test]
    fn test_shutdown_blocks_every_swap() {
        let mut engine = make_engine();
        let batch = engine.execute_batch(vec![
            Call::new(owner(), Operation::EmergencyShutdown),
            Call::new(trader(), swap_op(1_000, 950)),
            Call::new(trader(), swap_op(0, 0)),
            Call::new(trader(), swap_op(u64::MAX, u64::MAX)),
        ]);
        for receipt in &batch.receipts[1..] {
            assert!(matches!(swap_error(receipt), SwapError::SystemPaused));
        }

        // Admins cannot lift it, the owner can
        engine.execute(owner(), Operation::AddAdmin { account: trader() });
        let receipt = engine.execute(trader(), Operation::ResumeOperations);
        assert!(!receipt.is_ok());
        assert!(engine.governance().is_paused());
        engine.execute(owner(), Operation::ResumeOperations);
        assert!(engine.execute(trader(), swap_op(1_000, 950)).is_ok());
    }

    #[test]
    fn test_price_goes_stale_after_threshold() {
        let mut engine = make_engine();
        assert!(!engine.is_price_stale(&a()));

        engine.advance(99).unwrap();
        assert!(!engine.is_price_stale(&a()));
        engine.advance(1).unwrap();
        assert!(engine.is_price_stale(&a()));

        let receipt = engine.execute(trader(), swap_op(1_000, 950));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::StalePriceData { .. }
        ));
    }

    #[test]
    fn test_concurrent_route_update_in_batch() {
        let mut engine = make_engine();
        let add = |path: Vec<AssetId>| {
            Call::new(
                owner(),
                Operation::AddRoute {
                    asset_in: a(),
                    asset_out: b(),
                    path,
                    exchange: dex(),
                },
            )
        };
        let c = AssetId::new("token-c");

        let batch = engine.execute_batch(vec![add(vec![a(), b()]), add(vec![a(), c, b()])]);
        assert!(batch.receipts[0].is_ok());
        assert!(matches!(
            batch.receipts[1].error(),
            Some(Error::Route(RouteError::ConcurrentRouteUpdate { .. }))
        ));
        assert_eq!(batch.receipts[1].error().map(|e| e.code()), Some(15));
    }

    #[test]
    fn test_read_your_writes_within_batch() {
        let mut engine = make_engine();
        // A 10% move stays under the manipulation threshold
        let batch = engine.execute_batch(vec![
            Call::new(owner(), price_op(b(), 1_100_000)),
            Call::new(trader(), swap_op(1_000, 0)),
        ]);
        let swap = batch.receipts[1].swap_receipt().unwrap();
        assert!(swap.expected_output < 910);
        assert!(swap.expected_output > 900);
    }

    #[test]
    fn test_sudden_jump_blocks_tight_swaps() {
        let mut engine = make_engine();
        let batch = engine.execute_batch(vec![
            Call::new(owner(), price_op(b(), 2 * PRICE_SCALE)),
            Call::new(trader(), swap_op(1_000, 473)),
        ]);
        assert!(matches!(
            swap_error(&batch.receipts[1]),
            SwapError::PriceManipulationDetected {
                deviation_bps: 10_000,
                ..
            }
        ));

        // Revalidation lifts the flag
        engine.execute(owner(), Operation::RevalidatePrice { asset: b() });
        assert!(engine.execute(trader(), swap_op(1_000, 473)).is_ok());
    }

    #[test]
    fn test_large_jump_accepted_within_caller_tolerance() {
        let mut engine = make_engine();
        // -20% on the output asset, caller accepts 25% slippage
        engine.execute(owner(), price_op(b(), 800_000));
        let quote = engine.get_best_route(1_000, &a(), &b()).unwrap();
        let min = quote.expected_output * 3 / 4;

        let receipt = engine.execute(trader(), swap_op(1_000, min));
        assert!(receipt.is_ok(), "{:?}", receipt.error());
    }

    #[test]
    fn test_flag_expires_after_cooldown() {
        let mut engine = make_engine();
        engine.execute(owner(), price_op(b(), 2 * PRICE_SCALE));
        engine.advance(10).unwrap();
        assert!(engine.execute(trader(), swap_op(1_000, 473)).is_ok());
    }

    #[test]
    fn test_flash_crash_recovery() {
        let mut engine = make_engine();
        let batch = engine.execute_batch(vec![
            Call::new(owner(), price_op(a(), PRICE_SCALE / 2)),
            Call::new(owner(), price_op(a(), PRICE_SCALE * 9 / 10)),
        ]);
        assert!(batch.receipts.iter().all(|r| r.is_ok()));

        let entry = engine.get_token_price(&a()).unwrap();
        assert_eq!(entry.price, 900_000);
        assert_eq!(entry.last_update_height, batch.height);
    }

    #[test]
    fn test_failing_exchange_leaves_no_trace() {
        let mut engine = make_engine();
        engine.register_exchange(Box::new(FailingExchange::new(dex(), true)));
        let receipt = engine.execute(trader(), swap_op(1_000, 0));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::DexExecutionFailure { .. }
        ));
        assert_eq!(engine.ledger().balance_of(&a(), &trader()), 1_000_000_000);
        assert_eq!(engine.ledger().balance_of(&a(), &owner()), 0);
    }

    #[test]
    fn test_execution_failure_surfaces_as_dex_error() {
        let mut engine = make_engine();
        engine.register_exchange(Box::new(FailingExchange::new(dex(), false)));
        let receipt = engine.execute(trader(), swap_op(1_000, 0));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::DexExecutionFailure { .. }
        ));
        // No fee charged, no principal taken
        assert_eq!(engine.ledger().balance_of(&a(), &owner()), 0);
        assert_eq!(engine.ledger().balance_of(&a(), &trader()), 1_000_000_000);
    }

    #[test]
    fn test_unauthorized_calls_do_not_stop_batch() {
        let mut engine = make_engine();
        let batch = engine.execute_batch(vec![
            Call::new(trader(), Operation::SetFee { rate_bps: 50 }),
            Call::new(trader(), price_op(a(), 5 * PRICE_SCALE)),
            Call::new(owner(), Operation::SetFee { rate_bps: 101 }),
            Call::new(owner(), Operation::SetFee { rate_bps: 50 }),
        ]);
        assert_eq!(batch.receipts[0].error().map(|e| e.code()), Some(1));
        assert_eq!(batch.receipts[1].error().map(|e| e.component()), Some("oracle"));
        assert_eq!(batch.receipts[2].error().map(|e| e.code()), Some(2));
        assert!(batch.receipts[3].is_ok());
        assert_eq!(engine.fees().rate_bps(), 50);
        assert_eq!(engine.get_token_price(&a()).unwrap().price, PRICE_SCALE);
    }

    #[test]
    fn test_blacklist_and_max_amount() {
        let mut engine = make_engine();
        engine.execute(owner(), Operation::SetMaxTransactionAmount { amount: 500 });
        let receipt = engine.execute(trader(), swap_op(1_000, 0));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::MaxAmountExceeded { max: 500, .. }
        ));

        engine.execute(owner(), Operation::AddToBlacklist { asset: b() });
        let receipt = engine.execute(trader(), swap_op(100, 0));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::BlacklistedToken { .. }
        ));
    }

    #[test]
    fn test_route_not_found_and_insufficient_liquidity() {
        let mut engine = make_engine();
        let mut req = SwapRequest {
            amount_in: 1_000,
            min_amount_out: 0,
            asset_in: a(),
            asset_out: c(),
            recipient: trader(),
        };
        let receipt = engine.execute(trader(), Operation::SwapTokens(req.clone()));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::RouteNotFound { .. }
        ));

        engine.execute(
            owner(),
            Operation::UpdateLiquidity {
                exchange: dex(),
                asset_in: a(),
                asset_out: b(),
                amount: 100,
            },
        );
        req.asset_out = b();
        let receipt = engine.execute(trader(), Operation::SwapTokens(req));
        assert!(matches!(
            swap_error(&receipt),
            SwapError::InsufficientLiquidity { .. }
        ));
    }

    #[test]
    fn test_small_vs_large_route_choice() {
        let mut engine = make_engine();
        let c = c();
        let deep = dex_b();
        let batch = engine.execute_batch(vec![
            Call::new(owner(), price_op(c.clone(), PRICE_SCALE)),
            Call::new(
                owner(),
                Operation::AddRoute {
                    asset_in: a(),
                    asset_out: c.clone(),
                    path: vec![a(), c.clone()],
                    exchange: deep.clone(),
                },
            ),
            Call::new(
                owner(),
                Operation::AddRoute {
                    asset_in: c.clone(),
                    asset_out: b(),
                    path: vec![c.clone(), b()],
                    exchange: deep.clone(),
                },
            ),
            Call::new(
                owner(),
                Operation::UpdateLiquidity {
                    exchange: deep.clone(),
                    asset_in: a(),
                    asset_out: c.clone(),
                    amount: 1_000_000_000_000_000,
                },
            ),
            Call::new(
                owner(),
                Operation::UpdateLiquidity {
                    exchange: deep,
                    asset_in: c.clone(),
                    asset_out: b(),
                    amount: 1_000_000_000_000_000,
                },
            ),
        ]);
        assert!(batch.receipts.iter().all(|r| r.is_ok()));

        let small = engine.get_best_route(100_000, &a(), &b()).unwrap();
        assert_eq!(small.path, vec![a(), b()]);

        let large = engine.get_best_route(100_000_000_000, &a(), &b()).unwrap();
        assert_eq!(large.path, vec![a(), c, b()]);
    }

    #[test]
    fn test_two_exchange_swap_settles() {
        let mut engine = make_engine();
        let mut second = ConstantProductExchange::new(dex_b(), 997, 1000);
        second.add_pool(c(), d(), 1_000_000_000_000, 1_000_000_000_000);
        add_two_exchange_path(&mut engine, Box::new(second));

        let receipt = engine.execute(trader(), swap_to_d(1_000_000));
        let swap = receipt.swap_receipt().unwrap();
        assert_eq!(swap.path, vec![a(), c(), d()]);
        assert_eq!(swap.exchanges, vec![dex(), dex_b()]);
        assert_eq!(swap.fee, 3_000);

        let ledger = engine.ledger();
        assert_eq!(ledger.balance_of(&a(), &trader()), 1_000_000_000 - 1_000_000);
        assert_eq!(ledger.balance_of(&d(), &trader()), swap.realized_output);
        assert_eq!(ledger.balance_of(&a(), &account_of(&dex())), 997_000);
        // The intermediate asset was handed from dex-a to dex-b
        assert!(ledger.balance_of(&c(), &account_of(&dex_b())) > 0);
        assert_eq!(ledger.balance_of(&c(), &trader()), 0);
    }

    #[test]
    fn test_second_hop_failure_rolls_back_first_hop() {
        let mut engine = make_engine();
        add_two_exchange_path(&mut engine, Box::new(FailingExchange::new(dex_b(), false)));
        let before = quote_on(&engine, &dex(), &a(), &c());
        let dex_a_inventory = engine.ledger().balance_of(&c(), &account_of(&dex()));

        let receipt = engine.execute(trader(), swap_to_d(1_000_000));
        match swap_error(&receipt) {
            SwapError::DexExecutionFailure { exchange, .. } => assert_eq!(exchange, &dex_b()),
            other => panic!("unexpected error {:?}", other),
        }

        assert_eq!(quote_on(&engine, &dex(), &a(), &c()), before);
        let ledger = engine.ledger();
        assert_eq!(ledger.balance_of(&a(), &trader()), 1_000_000_000);
        assert_eq!(ledger.balance_of(&a(), &owner()), 0);
        assert_eq!(ledger.balance_of(&c(), &account_of(&dex())), dex_a_inventory);
        assert_eq!(ledger.balance_of(&c(), &account_of(&dex_b())), 0);
    }

    #[test]
    fn test_height_exhaustion_rejects_batches() {
        let mut engine = make_engine();
        assert!(matches!(
            engine.advance(u64::MAX),
            Err(Error::HeightExhausted { height: 1, .. })
        ));
        assert_eq!(engine.height(), 1);

        assert_eq!(engine.advance(u64::MAX - 1).unwrap(), u64::MAX);
        let batch = engine.execute_batch(vec![Call::new(trader(), swap_op(1_000, 950))]);
        assert_eq!(batch.height, u64::MAX);
        assert!(matches!(
            batch.receipts[0].error(),
            Some(Error::HeightExhausted { .. })
        ));
        assert_eq!(engine.ledger().balance_of(&a(), &trader()), 1_000_000_000);

        let empty = engine.execute_batch(Vec::new());
        assert!(empty.receipts.is_empty());
        assert_eq!(engine.height(), u64::MAX);
    }
}
