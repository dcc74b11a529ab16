//! Swap Calculator
//!
//! Fixed-point conversion, depth impact, fee and deviation math.

use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use swapgate_core::constants::{BPS_DENOMINATOR, PRICE_SCALE};
use swapgate_core::{Amount, Price};

fn narrow(value: BigInt) -> u64 {
    value.to_u64().unwrap_or(u64::MAX)
}

/// Protocol fee on an amount
///
/// Formula: fee = floor(amount * rate_bps / 10000)
pub fn calculate_fee(amount: Amount, rate_bps: u64) -> Amount {
    let fee = BigInt::from(amount) * BigInt::from(rate_bps) / BigInt::from(BPS_DENOMINATOR);
    narrow(fee)
}

/// Apply depth impact to an order
///
/// Formula: filled = amount * depth / (depth + amount)
///
/// The filled share shrinks as `amount` grows relative to `depth`, so the
/// per-unit fill is strictly decreasing in order size.
pub fn apply_depth_impact(amount: Amount, depth: Amount) -> Amount {
    if amount == 0 || depth == 0 {
        return 0;
    }
    let numerator = BigInt::from(amount) * BigInt::from(depth);
    let denominator = BigInt::from(depth) + BigInt::from(amount);
    narrow(numerator / denominator)
}

/// Convert an amount of one asset into another at oracle prices
///
/// Formula: out = amount * price_in / price_out
pub fn convert_at_prices(amount: Amount, price_in: Price, price_out: Price) -> Amount {
    if price_out == 0 {
        return 0;
    }
    let out = BigInt::from(amount) * BigInt::from(price_in) / BigInt::from(price_out);
    narrow(out)
}

/// Quote a single hop: oracle conversion followed by depth impact
///
/// Formula: out = (amount * price_in / price_out) * depth / (depth + amount)
///
/// Impact is measured on the input side, where `depth` is tracked.
pub fn quote_hop(amount: Amount, price_in: Price, price_out: Price, depth: Amount) -> Amount {
    if amount == 0 || depth == 0 || price_out == 0 {
        return 0;
    }
    let numerator = BigInt::from(amount)
        * BigInt::from(price_in)
        * BigInt::from(depth);
    let denominator =
        BigInt::from(price_out) * (BigInt::from(depth) + BigInt::from(amount));
    if denominator.is_zero() {
        return 0;
    }
    narrow(numerator / denominator)
}

/// Effective per-unit price after impact
///
/// Formula: price * depth / (depth + amount)
pub fn price_with_impact(price: Price, amount: Amount, depth: Amount) -> Price {
    if depth == 0 {
        return 0;
    }
    let numerator = BigInt::from(price) * BigInt::from(depth);
    let denominator = BigInt::from(depth) + BigInt::from(amount);
    narrow(numerator / denominator)
}

/// Effective rate of a fill, in fixed-point price units
pub fn effective_price(input: Amount, output: Amount) -> Price {
    if input == 0 {
        return 0;
    }
    narrow(BigInt::from(output) * BigInt::from(PRICE_SCALE) / BigInt::from(input))
}

/// Absolute move from `reference` to `current`, in basis points
pub fn deviation_bps(reference: Price, current: Price) -> u64 {
    if reference == 0 {
        return 0;
    }
    let diff = reference.abs_diff(current);
    narrow(BigInt::from(diff) * BigInt::from(BPS_DENOMINATOR) / BigInt::from(reference))
}

/// Slippage a caller accepts by asking for `min_output` when `expected` is quoted
pub fn slippage_tolerance_bps(expected: Amount, min_output: Amount) -> u64 {
    if expected == 0 || min_output >= expected {
        return 0;
    }
    let gap = expected - min_output;
    narrow(BigInt::from(gap) * BigInt::from(BPS_DENOMINATOR) / BigInt::from(expected))
}

/// Constant-product swap output with a pool fee
///
/// Formula: output = (reserves_out * input * fee_num) / (reserves_in * fee_denom + input * fee_num)
pub fn calculate_output(
    reserves_in: Amount,
    reserves_out: Amount,
    input_amount: Amount,
    fee_num: u32,
    fee_denom: u32,
) -> Amount {
    if reserves_in == 0 || reserves_out == 0 || input_amount == 0 {
        return 0;
    }

    let numerator =
        BigInt::from(reserves_out) * BigInt::from(input_amount) * BigInt::from(fee_num);
    let denominator = BigInt::from(reserves_in) * BigInt::from(fee_denom)
        + BigInt::from(input_amount) * BigInt::from(fee_num);

    if denominator.is_zero() {
        return 0;
    }

    narrow(numerator / denominator)
}
