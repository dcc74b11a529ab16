//! Swap Router
//!
//! Orchestrates a swap through a fixed sequence of states:
//!
//! ```text
//! Idle -> Validating -> RouteResolution -> PriceValidation -> Execution -> Settled
//!                 \____________\_________________\_______________\______-> Failed
//! ```
//!
//! Every gate before `Execution` is read-only. `Execution` quotes all hops on
//! their exchanges before anything moves, then settles: the fee and the
//! principal leave the sender, each hop runs on its exchange with the asset
//! handed between inventory accounts, and the output is paid to the
//! recipient. If any settlement step fails, the ledger and every exchange on
//! the route are restored to their checkpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use swapgate_core::{AccountId, Amount, AssetId, BlockHeight, ExchangeId, SwapError};

use crate::calculator;
use crate::exchange::ExchangeRegistry;
use crate::fees::FeeManager;
use crate::governance::Governance;
use crate::ledger::{AssetLedger, TransferError};
use crate::liquidity::LiquidityTracker;
use crate::oracle::PriceOracle;
use crate::routes::{RouteManager, RouteQuote};

/// Caller-supplied swap parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub amount_in: Amount,
    pub min_amount_out: Amount,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub recipient: AccountId,
}

/// Settled swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub path: Vec<AssetId>,
    pub exchanges: Vec<ExchangeId>,
    pub amount_in: Amount,
    pub fee: Amount,
    pub expected_output: Amount,
    pub realized_output: Amount,
    pub recipient: AccountId,
    pub height: BlockHeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    Idle,
    Validating,
    RouteResolution,
    PriceValidation,
    Execution,
    Settled,
    Failed,
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::RouteResolution => "route_resolution",
            Self::PriceValidation => "price_validation",
            Self::Execution => "execution",
            Self::Settled => "settled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Borrowed view of the engine for one swap
pub struct SwapRouter<'a, L: AssetLedger> {
    pub governance: &'a Governance,
    pub fees: &'a FeeManager,
    pub oracle: &'a PriceOracle,
    pub liquidity: &'a LiquidityTracker,
    pub routes: &'a RouteManager,
    pub exchanges: &'a mut ExchangeRegistry,
    pub ledger: &'a mut L,
    pub height: BlockHeight,
}

fn advance(state: &mut SwapState, next: SwapState) {
    tracing::debug!("swap state {} -> {}", state, next);
    *state = next;
}

fn unregistered(exchange: &ExchangeId) -> SwapError {
    SwapError::DexExecutionFailure {
        exchange: exchange.clone(),
        reason: "exchange not registered".to_string(),
    }
}

/// Failed transfer out of the sender's own funds
fn sender_transfer_error(asset: &AssetId, e: TransferError) -> SwapError {
    match e {
        TransferError::InsufficientAllowance {
            required,
            available,
        } => SwapError::InsufficientAllowance {
            asset: asset.clone(),
            required,
            available,
        },
        TransferError::InsufficientBalance {
            required,
            available,
        } => SwapError::InsufficientBalance {
            asset: asset.clone(),
            required,
            available,
        },
        TransferError::UnknownAsset(asset) => SwapError::InvalidToken { asset },
    }
}

/// Failed transfer out of an exchange's inventory
fn settlement_error(exchange: &ExchangeId, e: TransferError) -> SwapError {
    SwapError::DexExecutionFailure {
        exchange: exchange.clone(),
        reason: format!("settlement failed: {}", e),
    }
}

impl<'a, L: AssetLedger> SwapRouter<'a, L> {
    pub fn swap_tokens(
        &mut self,
        sender: &AccountId,
        request: &SwapRequest,
    ) -> Result<SwapReceipt, SwapError> {
        let mut state = SwapState::Idle;
        let result = self.run(&mut state, sender, request);

        match &result {
            Ok(receipt) => {
                advance(&mut state, SwapState::Settled);
                tracing::info!(
                    "Swap settled: {} {} -> {} {} via {:?} for {}",
                    receipt.amount_in,
                    request.asset_in,
                    receipt.realized_output,
                    request.asset_out,
                    receipt.path,
                    receipt.recipient
                );
            }
            Err(e) => {
                let failed_in = state;
                advance(&mut state, SwapState::Failed);
                tracing::warn!("Swap rejected during {}: {}", failed_in, e);
            }
        }
        result
    }

    fn run(
        &mut self,
        state: &mut SwapState,
        sender: &AccountId,
        request: &SwapRequest,
    ) -> Result<SwapReceipt, SwapError> {
        advance(state, SwapState::Validating);
        self.validate_request(request)?;

        advance(state, SwapState::RouteResolution);
        let quote = self.resolve_route(request)?;

        advance(state, SwapState::PriceValidation);
        self.validate_price(sender, request, &quote)?;

        advance(state, SwapState::Execution);
        self.execute(sender, request, quote)
    }

    // ------------------------------------------------------------------
    // Validating
    // ------------------------------------------------------------------

    fn validate_request(&self, request: &SwapRequest) -> Result<(), SwapError> {
        if self.governance.is_paused() {
            return Err(SwapError::SystemPaused);
        }
        for asset in [&request.asset_in, &request.asset_out] {
            if self.governance.is_blacklisted(asset) {
                return Err(SwapError::BlacklistedToken {
                    asset: asset.clone(),
                });
            }
        }
        if request.amount_in == 0 {
            return Err(SwapError::ZeroAmount);
        }
        let max = self.governance.max_transaction_amount();
        if request.amount_in > max {
            return Err(SwapError::MaxAmountExceeded {
                amount: request.amount_in,
                max,
            });
        }
        if !request.recipient.is_well_formed() {
            return Err(SwapError::InvalidRecipient {
                recipient: request.recipient.clone(),
            });
        }
        for asset in [&request.asset_in, &request.asset_out] {
            if !self.ledger.is_asset(asset) {
                return Err(SwapError::InvalidToken {
                    asset: asset.clone(),
                });
            }
        }
        if request.asset_in == request.asset_out {
            return Err(SwapError::InvalidToken {
                asset: request.asset_out.clone(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // RouteResolution
    // ------------------------------------------------------------------

    fn resolve_route(&self, request: &SwapRequest) -> Result<RouteQuote, SwapError> {
        let evaluation = self.routes.evaluate_routes(
            request.amount_in,
            &request.asset_in,
            &request.asset_out,
            self.fees,
            self.oracle,
            self.liquidity,
        );

        if evaluation.candidates == 0 {
            return Err(SwapError::RouteNotFound {
                asset_in: request.asset_in.clone(),
                asset_out: request.asset_out.clone(),
            });
        }

        match evaluation.quotes.into_iter().next() {
            Some(quote) => Ok(quote),
            None => match evaluation.missing_price {
                Some(asset) => Err(SwapError::StalePriceData { asset }),
                None => Err(SwapError::InsufficientLiquidity {
                    asset_in: request.asset_in.clone(),
                    asset_out: request.asset_out.clone(),
                    amount: request.amount_in,
                }),
            },
        }
    }

    // ------------------------------------------------------------------
    // PriceValidation
    // ------------------------------------------------------------------

    fn validate_price(
        &self,
        sender: &AccountId,
        request: &SwapRequest,
        quote: &RouteQuote,
    ) -> Result<(), SwapError> {
        for asset in &quote.path {
            if self.oracle.is_price_stale(asset, self.height) {
                return Err(SwapError::StalePriceData {
                    asset: asset.clone(),
                });
            }
        }

        // A flagged move is accepted only by callers who opted into at least
        // that much slippage
        let tolerance_bps =
            calculator::slippage_tolerance_bps(quote.expected_output, request.min_amount_out);
        for asset in &quote.path {
            if let Some(flag) = self.oracle.active_flag(asset, self.height) {
                if flag.deviation_bps > tolerance_bps {
                    return Err(SwapError::PriceManipulationDetected {
                        asset: asset.clone(),
                        deviation_bps: flag.deviation_bps,
                    });
                }
            }
        }

        if quote.expected_output < request.min_amount_out {
            return Err(SwapError::ExcessiveSlippage {
                expected: quote.expected_output,
                min: request.min_amount_out,
            });
        }

        let available = self.ledger.allowance(&request.asset_in, sender);
        if available < request.amount_in {
            return Err(SwapError::InsufficientAllowance {
                asset: request.asset_in.clone(),
                required: request.amount_in,
                available,
            });
        }
        let available = self.ledger.balance_of(&request.asset_in, sender);
        if available < request.amount_in {
            return Err(SwapError::InsufficientBalance {
                asset: request.asset_in.clone(),
                required: request.amount_in,
                available,
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    fn execute(
        &mut self,
        sender: &AccountId,
        request: &SwapRequest,
        quote: RouteQuote,
    ) -> Result<SwapReceipt, SwapError> {
        let net_in = quote.amount_in - quote.fee;
        self.preflight(request, &quote, net_in)?;

        let exchanges = quote.exchanges();
        let saved_ledger = self.ledger.checkpoint();
        let saved_exchanges = self.exchanges.checkpoint(&exchanges);

        let realized = match self.settle(sender, request, &quote, net_in) {
            Ok(realized) => realized,
            Err(e) => {
                self.ledger.restore(saved_ledger);
                self.exchanges.restore(saved_exchanges);
                tracing::debug!("Settlement rolled back: {}", e);
                return Err(e);
            }
        };

        Ok(SwapReceipt {
            exchanges,
            path: quote.path,
            amount_in: quote.amount_in,
            fee: quote.fee,
            expected_output: quote.expected_output,
            realized_output: realized,
            recipient: request.recipient.clone(),
            height: self.height,
        })
    }

    /// Quote every hop on its exchange; nothing moves
    fn preflight(
        &self,
        request: &SwapRequest,
        quote: &RouteQuote,
        net_in: Amount,
    ) -> Result<(), SwapError> {
        if quote.hops.is_empty() {
            return Err(SwapError::RouteNotFound {
                asset_in: request.asset_in.clone(),
                asset_out: request.asset_out.clone(),
            });
        }

        let mut simulated = net_in;
        for hop in &quote.hops {
            let exchange = self
                .exchanges
                .get(&hop.exchange)
                .ok_or_else(|| unregistered(&hop.exchange))?;
            simulated = exchange
                .get_amount_out(simulated, &hop.asset_in, &hop.asset_out)
                .map_err(|e| SwapError::DexExecutionFailure {
                    exchange: hop.exchange.clone(),
                    reason: e.to_string(),
                })?;
        }
        if simulated < request.min_amount_out {
            return Err(SwapError::ExcessiveSlippage {
                expected: simulated,
                min: request.min_amount_out,
            });
        }
        Ok(())
    }

    /// Move the fee, the principal, every hop and the output. The caller
    /// rolls back on error.
    fn settle(
        &mut self,
        sender: &AccountId,
        request: &SwapRequest,
        quote: &RouteQuote,
        net_in: Amount,
    ) -> Result<Amount, SwapError> {
        if quote.fee > 0 {
            let fee_recipient = self.fees.recipient().clone();
            self.ledger
                .transfer(&request.asset_in, quote.fee, sender, &fee_recipient)
                .map_err(|e| sender_transfer_error(&request.asset_in, e))?;
        }

        let last = quote.hops.len() - 1;
        let mut holder = sender.clone();
        let mut amount = net_in;
        let mut paying_exchange = None;

        for (i, hop) in quote.hops.iter().enumerate() {
            let exchange = self
                .exchanges
                .get_mut(&hop.exchange)
                .ok_or_else(|| unregistered(&hop.exchange))?;
            let venue = exchange.account().clone();

            if holder != venue {
                self.ledger
                    .transfer(&hop.asset_in, amount, &holder, &venue)
                    .map_err(|e| match &paying_exchange {
                        None => sender_transfer_error(&hop.asset_in, e),
                        Some(previous) => settlement_error(previous, e),
                    })?;
            }

            let min_out = if i == last { request.min_amount_out } else { 0 };
            amount = exchange
                .swap_exact_tokens_for_tokens(amount, min_out, &hop.asset_in, &hop.asset_out)
                .map_err(|e| SwapError::DexExecutionFailure {
                    exchange: hop.exchange.clone(),
                    reason: e.to_string(),
                })?;
            holder = venue;
            paying_exchange = Some(hop.exchange.clone());
        }

        if amount < request.min_amount_out {
            return Err(SwapError::ExcessiveSlippage {
                expected: amount,
                min: request.min_amount_out,
            });
        }

        if holder != request.recipient {
            let exchange = quote.hops[last].exchange.clone();
            self.ledger
                .transfer(&request.asset_out, amount, &holder, &request.recipient)
                .map_err(|e| settlement_error(&exchange, e))?;
        }
        Ok(amount)
    }
}
