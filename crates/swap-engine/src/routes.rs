//! Route Manager
//!
//! Registry of admin-defined routes keyed by (asset in, asset out), plus the
//! routing algorithm that turns the registry into ranked, priced candidates.
//!
//! ## Candidates
//!
//! Each registered route is a segment: a path of assets executed on one
//! exchange. Candidates for a pair are the acyclic chains of segments from
//! the source to the destination, found breadth-first. The registered direct
//! route is the one-segment chain.
//!
//! ## Pricing
//!
//! The protocol fee is taken from the input. Each hop converts at the oracle
//! rate and pays depth impact against the hop's tracked liquidity. A hop whose
//! liquidity cannot cover its input discards the candidate. The net output
//! subtracts a fixed cost per hop, so small orders favor short routes and
//! large orders favor deep ones.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use swapgate_core::constants::{MAX_ROUTE_LENGTH, MIN_ROUTE_LENGTH};
use swapgate_core::{AccountId, Amount, AssetId, BlockHeight, ExchangeId, RouteError};

use crate::calculator;
use crate::fees::FeeManager;
use crate::governance::Governance;
use crate::liquidity::LiquidityTracker;
use crate::oracle::PriceOracle;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A registered route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub path: Vec<AssetId>,
    pub exchange: ExchangeId,
    pub registered_at: BlockHeight,
}

/// One hop of a candidate, before pricing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedHop {
    pub exchange: ExchangeId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
}

/// One priced hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopQuote {
    pub exchange: ExchangeId,
    pub asset_in: AssetId,
    pub asset_out: AssetId,
    pub amount_in: Amount,
    pub amount_out: Amount,
    pub liquidity: Amount,
}

/// A fully priced candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub path: Vec<AssetId>,
    pub hops: Vec<HopQuote>,
    pub amount_in: Amount,
    pub fee: Amount,
    pub expected_output: Amount,
    pub hop_cost: Amount,
    pub net_output: Amount,
}

impl RouteQuote {
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    pub fn exchanges(&self) -> Vec<ExchangeId> {
        self.hops.iter().map(|h| h.exchange.clone()).collect()
    }
}

/// Result of pricing every candidate for a pair
#[derive(Debug, Clone, Default)]
pub struct RouteEvaluation {
    /// Number of candidates found in the registry
    pub candidates: usize,
    /// Surviving candidates, best first
    pub quotes: Vec<RouteQuote>,
    /// Candidates dropped because a hop lacked liquidity
    pub insufficient_liquidity: usize,
    /// First asset whose missing price made a candidate unquotable
    pub missing_price: Option<AssetId>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RouteManager {
    routes: BTreeMap<(AssetId, AssetId), Route>,
    hop_cost: Amount,
}

impl RouteManager {
    pub fn new(hop_cost: Amount) -> Self {
        Self {
            routes: BTreeMap::new(),
            hop_cost,
        }
    }

    pub fn hop_cost(&self) -> Amount {
        self.hop_cost
    }

    /// Register a route, superseding any earlier route for the pair.
    ///
    /// Checks run in order: caller is admin, path length, endpoints, cycles,
    /// then whether the pair was already written at `height`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_route(
        &mut self,
        gov: &Governance,
        caller: &AccountId,
        asset_in: AssetId,
        asset_out: AssetId,
        path: Vec<AssetId>,
        exchange: ExchangeId,
        height: BlockHeight,
    ) -> Result<(), RouteError> {
        if !gov.is_admin(caller) {
            return Err(RouteError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if path.len() > MAX_ROUTE_LENGTH {
            return Err(RouteError::MaxRouteLengthExceeded {
                length: path.len(),
                max: MAX_ROUTE_LENGTH,
            });
        }
        if path.len() < MIN_ROUTE_LENGTH {
            return Err(RouteError::InvalidPath {
                reason: format!("path needs at least {} assets", MIN_ROUTE_LENGTH),
            });
        }
        if path.first() != Some(&asset_in) || path.last() != Some(&asset_out) {
            return Err(RouteError::InvalidPath {
                reason: format!("path must run from {} to {}", asset_in, asset_out),
            });
        }

        let mut seen = BTreeSet::new();
        for asset in &path {
            if !seen.insert(asset) {
                return Err(RouteError::CircularRouteDetected {
                    asset: asset.clone(),
                });
            }
        }

        let key = (asset_in, asset_out);
        if let Some(existing) = self.routes.get(&key) {
            if existing.registered_at == height {
                return Err(RouteError::ConcurrentRouteUpdate {
                    asset_in: key.0,
                    asset_out: key.1,
                    height,
                });
            }
        }

        tracing::info!(
            "Route {} -> {} registered on {} ({} hops)",
            key.0,
            key.1,
            exchange,
            path.len() - 1
        );
        let route = Route {
            asset_in: key.0.clone(),
            asset_out: key.1.clone(),
            path,
            exchange,
            registered_at: height,
        };
        self.routes.insert(key, route);
        Ok(())
    }

    pub fn get_routes(&self, asset_in: &AssetId, asset_out: &AssetId) -> Option<&Route> {
        self.routes.get(&(asset_in.clone(), asset_out.clone()))
    }

    pub fn all_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.values()
    }

    fn routes_from<'a>(&'a self, asset: &'a AssetId) -> impl Iterator<Item = &'a Route> + 'a {
        self.routes
            .range((asset.clone(), AssetId::new(""))..)
            .take_while(move |((from, _), _)| from == asset)
            .map(|(_, route)| route)
    }

    // -----------------------------------------------------------------------
    // Candidate enumeration
    // -----------------------------------------------------------------------

    /// All acyclic chains of registered routes from `asset_in` to `asset_out`
    pub fn candidate_paths(&self, asset_in: &AssetId, asset_out: &AssetId) -> Vec<Vec<PlannedHop>> {
        let mut results: Vec<Vec<PlannedHop>> = Vec::new();
        if asset_in == asset_out {
            return results;
        }

        type SearchState = (AssetId, Vec<PlannedHop>, BTreeSet<AssetId>);
        let mut queue: VecDeque<SearchState> = VecDeque::new();

        let mut initial_visited = BTreeSet::new();
        initial_visited.insert(asset_in.clone());
        queue.push_back((asset_in.clone(), Vec::new(), initial_visited));

        while let Some((current, hops, visited)) = queue.pop_front() {
            for route in self.routes_from(&current) {
                let segment = &route.path[1..];

                // Keep the concatenated path acyclic and bounded
                if segment.iter().any(|a| visited.contains(a)) {
                    continue;
                }
                if visited.len() + segment.len() > MAX_ROUTE_LENGTH {
                    continue;
                }

                let mut new_hops = hops.clone();
                for pair in route.path.windows(2) {
                    new_hops.push(PlannedHop {
                        exchange: route.exchange.clone(),
                        asset_in: pair[0].clone(),
                        asset_out: pair[1].clone(),
                    });
                }

                if &route.asset_out == asset_out {
                    results.push(new_hops);
                } else {
                    let mut new_visited = visited.clone();
                    new_visited.extend(segment.iter().cloned());
                    queue.push_back((route.asset_out.clone(), new_hops, new_visited));
                }
            }
        }

        results
    }

    // -----------------------------------------------------------------------
    // Pricing
    // -----------------------------------------------------------------------

    /// Price every candidate for the pair and rank the survivors
    pub fn evaluate_routes(
        &self,
        amount: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
        fees: &FeeManager,
        oracle: &PriceOracle,
        liquidity: &LiquidityTracker,
    ) -> RouteEvaluation {
        let candidates = self.candidate_paths(asset_in, asset_out);
        let fee = fees.calculate_fee(amount);
        let net_in = amount - fee;

        let mut evaluation = RouteEvaluation {
            candidates: candidates.len(),
            ..RouteEvaluation::default()
        };

        'candidates: for planned in candidates {
            let mut hops = Vec::with_capacity(planned.len());
            let mut current = net_in;

            for hop in planned {
                let (price_in, price_out) = match (
                    oracle.get_token_price(&hop.asset_in),
                    oracle.get_token_price(&hop.asset_out),
                ) {
                    (Some(p_in), Some(p_out)) => (p_in.price, p_out.price),
                    (None, _) => {
                        evaluation.missing_price.get_or_insert(hop.asset_in);
                        continue 'candidates;
                    }
                    (_, None) => {
                        evaluation.missing_price.get_or_insert(hop.asset_out);
                        continue 'candidates;
                    }
                };

                let depth = liquidity.depth(&hop.exchange, &hop.asset_in, &hop.asset_out);
                if depth < current {
                    evaluation.insufficient_liquidity += 1;
                    continue 'candidates;
                }

                let out = calculator::quote_hop(current, price_in, price_out, depth);
                hops.push(HopQuote {
                    exchange: hop.exchange,
                    asset_in: hop.asset_in,
                    asset_out: hop.asset_out,
                    amount_in: current,
                    amount_out: out,
                    liquidity: depth,
                });
                current = out;
            }

            let mut path: Vec<AssetId> = Vec::with_capacity(hops.len() + 1);
            if let Some(first) = hops.first() {
                path.push(first.asset_in.clone());
            }
            path.extend(hops.iter().map(|h| h.asset_out.clone()));

            let hop_cost = self.hop_cost.saturating_mul(hops.len() as u64);
            evaluation.quotes.push(RouteQuote {
                path,
                hops,
                amount_in: amount,
                fee,
                expected_output: current,
                hop_cost,
                net_output: current.saturating_sub(hop_cost),
            });
        }

        evaluation.quotes.sort_by(|a, b| {
            b.net_output
                .cmp(&a.net_output)
                .then_with(|| a.hop_count().cmp(&b.hop_count()))
                .then_with(|| a.path.cmp(&b.path))
        });

        tracing::debug!(
            "Evaluated {} candidates for {} {} -> {}: {} quoted, {} short on liquidity",
            evaluation.candidates,
            amount,
            asset_in,
            asset_out,
            evaluation.quotes.len(),
            evaluation.insufficient_liquidity
        );
        evaluation
    }

    /// Highest net output; ties go to fewer hops
    pub fn get_best_route(
        &self,
        amount: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
        fees: &FeeManager,
        oracle: &PriceOracle,
        liquidity: &LiquidityTracker,
    ) -> Option<RouteQuote> {
        self.evaluate_routes(amount, asset_in, asset_out, fees, oracle, liquidity)
            .quotes
            .into_iter()
            .next()
    }

    pub fn get_route_quotes(
        &self,
        amount: Amount,
        asset_in: &AssetId,
        asset_out: &AssetId,
        fees: &FeeManager,
        oracle: &PriceOracle,
        liquidity: &LiquidityTracker,
    ) -> Vec<RouteQuote> {
        self.evaluate_routes(amount, asset_in, asset_out, fees, oracle, liquidity)
            .quotes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use swapgate_core::constants::PRICE_SCALE;
    use swapgate_core::EngineConfig;

    struct Fixture {
        gov: Governance,
        fees: FeeManager,
        oracle: PriceOracle,
        liquidity: LiquidityTracker,
        routes: RouteManager,
    }

    fn owner() -> AccountId {
        AccountId::new("deployer")
    }

    fn asset(name: &str) -> AssetId {
        AssetId::new(name)
    }

    fn path(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|n| asset(n)).collect()
    }

    fn make_fixture() -> Fixture {
        let config = EngineConfig::with_owner(owner());
        let gov = Governance::new(&config);
        let mut oracle = PriceOracle::new(&config);
        for name in ["A", "B", "C"] {
            oracle
                .update_price(&gov, &owner(), asset(name), PRICE_SCALE, 1)
                .unwrap();
        }
        Fixture {
            fees: FeeManager::new(&config),
            oracle,
            liquidity: LiquidityTracker::new(),
            routes: RouteManager::new(config.hop_cost),
            gov,
        }
    }

    /// Direct A->B on a shallow venue, A->C->B on a deep one
    fn make_split_venues() -> Fixture {
        let mut fx = make_fixture();
        let dex_a = ExchangeId::new("dex-a");
        let dex_b = ExchangeId::new("dex-b");

        fx.routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("B"), path(&["A", "B"]), dex_a.clone(), 1)
            .unwrap();
        fx.routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("C"), path(&["A", "C"]), dex_b.clone(), 1)
            .unwrap();
        fx.routes
            .add_route(&fx.gov, &owner(), asset("C"), asset("B"), path(&["C", "B"]), dex_b.clone(), 1)
            .unwrap();

        fx.liquidity
            .update_liquidity(&fx.gov, &owner(), dex_a, asset("A"), asset("B"), 1_000_000_000_000, 1)
            .unwrap();
        fx.liquidity
            .update_liquidity(&fx.gov, &owner(), dex_b.clone(), asset("A"), asset("C"), 1_000_000_000_000_000, 1)
            .unwrap();
        fx.liquidity
            .update_liquidity(&fx.gov, &owner(), dex_b, asset("C"), asset("B"), 1_000_000_000_000_000, 1)
            .unwrap();
        fx
    }

    fn best(fx: &Fixture, amount: Amount) -> Option<RouteQuote> {
        fx.routes.get_best_route(
            amount,
            &asset("A"),
            &asset("B"),
            &fx.fees,
            &fx.oracle,
            &fx.liquidity,
        )
    }

    #[test]
    fn test_add_and_get_route() {
        let mut fx = make_fixture();
        fx.routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("B"), path(&["A", "C", "B"]), ExchangeId::new("dex-a"), 4)
            .unwrap();

        let route = fx.routes.get_routes(&asset("A"), &asset("B")).unwrap();
        assert_eq!(route.path, path(&["A", "C", "B"]));
        assert_eq!(route.registered_at, 4);
        assert!(fx.routes.get_routes(&asset("B"), &asset("A")).is_none());
    }

    #[test]
    fn test_add_route_requires_admin() {
        let mut fx = make_fixture();
        let err = fx
            .routes
            .add_route(&fx.gov, &AccountId::new("wallet_1"), asset("A"), asset("B"), path(&["A", "B"]), ExchangeId::new("dex-a"), 1)
            .unwrap_err();
        assert!(matches!(err, RouteError::Unauthorized { .. }));
    }

    #[test]
    fn test_eleven_asset_path_rejected() {
        let mut fx = make_fixture();
        let long: Vec<AssetId> = (0..11).map(|i| asset(&format!("T{}", i))).collect();
        let err = fx
            .routes
            .add_route(&fx.gov, &owner(), asset("T0"), asset("T10"), long, ExchangeId::new("dex-a"), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            RouteError::MaxRouteLengthExceeded { length: 11, max: 10 }
        ));

        let ten: Vec<AssetId> = (0..10).map(|i| asset(&format!("T{}", i))).collect();
        fx.routes
            .add_route(&fx.gov, &owner(), asset("T0"), asset("T9"), ten, ExchangeId::new("dex-a"), 1)
            .unwrap();
    }

    #[test]
    fn test_circular_path_rejected() {
        let mut fx = make_fixture();
        let err = fx
            .routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("B"), path(&["A", "C", "A", "B"]), ExchangeId::new("dex-a"), 1)
            .unwrap_err();
        assert!(matches!(err, RouteError::CircularRouteDetected { .. }));
    }

    #[test]
    fn test_invalid_paths() {
        let mut fx = make_fixture();
        let dex = ExchangeId::new("dex-a");
        for bad in [path(&["A"]), path(&["A", "C"]), path(&["C", "B"])] {
            let err = fx
                .routes
                .add_route(&fx.gov, &owner(), asset("A"), asset("B"), bad, dex.clone(), 1)
                .unwrap_err();
            assert!(matches!(err, RouteError::InvalidPath { .. }));
        }
    }

    #[test]
    fn test_same_key_twice_in_one_batch() {
        let mut fx = make_fixture();
        let dex = ExchangeId::new("dex-a");
        fx.routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("B"), path(&["A", "B"]), dex.clone(), 7)
            .unwrap();
        let err = fx
            .routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("B"), path(&["A", "C", "B"]), dex.clone(), 7)
            .unwrap_err();
        assert!(matches!(err, RouteError::ConcurrentRouteUpdate { height: 7, .. }));
        assert_eq!(
            fx.routes.get_routes(&asset("A"), &asset("B")).unwrap().path,
            path(&["A", "B"])
        );

        // Next batch supersedes
        fx.routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("B"), path(&["A", "C", "B"]), dex, 8)
            .unwrap();
        assert_eq!(
            fx.routes.get_routes(&asset("A"), &asset("B")).unwrap().path,
            path(&["A", "C", "B"])
        );
    }

    #[test]
    fn test_candidate_paths_chain_segments() {
        let fx = make_split_venues();
        let candidates = fx.routes.candidate_paths(&asset("A"), &asset("B"));
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].len(), 1);
        assert_eq!(candidates[1].len(), 2);
        assert_eq!(candidates[1][0].exchange, ExchangeId::new("dex-b"));
        assert!(fx.routes.candidate_paths(&asset("B"), &asset("A")).is_empty());
    }

    #[test]
    fn test_small_amount_prefers_direct() {
        let fx = make_split_venues();
        let quote = best(&fx, 100_000).unwrap();
        assert_eq!(quote.path, path(&["A", "B"]));
        assert_eq!(quote.fee, 300);
        assert_eq!(quote.hop_cost, 1_000);
    }

    #[test]
    fn test_large_amount_prefers_deep_multi_hop() {
        let fx = make_split_venues();
        let quote = best(&fx, 100_000_000_000).unwrap();
        assert_eq!(quote.path, path(&["A", "C", "B"]));
        assert_eq!(quote.hop_count(), 2);
        assert_eq!(
            quote.exchanges(),
            vec![ExchangeId::new("dex-b"), ExchangeId::new("dex-b")]
        );
    }

    #[test]
    fn test_insufficient_liquidity_discards_path() {
        let mut fx = make_split_venues();
        fx.liquidity
            .update_liquidity(&fx.gov, &owner(), ExchangeId::new("dex-b"), asset("C"), asset("B"), 10, 2)
            .unwrap();

        let evaluation = fx.routes.evaluate_routes(
            100_000_000_000,
            &asset("A"),
            &asset("B"),
            &fx.fees,
            &fx.oracle,
            &fx.liquidity,
        );
        assert_eq!(evaluation.candidates, 2);
        assert_eq!(evaluation.insufficient_liquidity, 1);
        assert_eq!(evaluation.quotes.len(), 1);
        assert_eq!(evaluation.quotes[0].path, path(&["A", "B"]));
    }

    #[test]
    fn test_missing_price_is_unquotable() {
        let mut fx = make_fixture();
        fx.routes
            .add_route(&fx.gov, &owner(), asset("A"), asset("Z"), path(&["A", "Z"]), ExchangeId::new("dex-a"), 1)
            .unwrap();
        fx.liquidity
            .update_liquidity(&fx.gov, &owner(), ExchangeId::new("dex-a"), asset("A"), asset("Z"), 1_000_000, 1)
            .unwrap();

        let evaluation = fx.routes.evaluate_routes(
            1_000,
            &asset("A"),
            &asset("Z"),
            &fx.fees,
            &fx.oracle,
            &fx.liquidity,
        );
        assert!(evaluation.quotes.is_empty());
        assert_eq!(evaluation.missing_price, Some(asset("Z")));
    }

    #[test]
    fn test_quotes_ranked() {
        let fx = make_split_venues();
        let quotes = fx.routes.get_route_quotes(
            100_000,
            &asset("A"),
            &asset("B"),
            &fx.fees,
            &fx.oracle,
            &fx.liquidity,
        );
        assert_eq!(quotes.len(), 2);
        assert!(quotes[0].net_output >= quotes[1].net_output);
    }
}
