//! AMM Calculator
//!
//! Swap math using constant product formula (x * y = k) with a basis-point fee.
//! All values are raw integer units held as exact rationals; nothing is rounded
//! here except the deliberate `+1` on the reverse calculation.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use vex_core::constants::BPS_DENOM;
use vex_core::FeeBps;

use crate::constants::LOW_AMOUNT_THRESHOLD;

fn int(v: u64) -> BigRational {
    BigRational::from_integer(BigInt::from(v))
}

fn warn_if_unscaled(label: &str, amount: &BigRational) {
    if amount.is_positive() && *amount < int(LOW_AMOUNT_THRESHOLD) {
        tracing::debug!(
            "{} is only {}. Was it scaled by 10^decimals?",
            label,
            amount.trunc()
        );
    }
}

/// Calculate swap output for a given input
///
/// Formula: output = input * reserve_out * (10000 - fee) / (reserve_in * 10000 + input * (10000 - fee))
///
/// Returns `None` when the fee is out of range or the market has no liquidity.
pub fn output_given_input(
    input: &BigRational,
    reserve_in: &BigRational,
    reserve_out: &BigRational,
    fee_bps: FeeBps,
) -> Option<BigRational> {
    if fee_bps >= BPS_DENOM || reserve_in.is_zero() || reserve_out.is_zero() {
        return None;
    }
    warn_if_unscaled("input amount", input);

    let fee_factor = int((BPS_DENOM - fee_bps) as u64);
    let numerator = input * reserve_out * &fee_factor;
    let denominator = reserve_in * int(BPS_DENOM as u64) + input * &fee_factor;

    if denominator.is_zero() {
        return None;
    }
    Some(numerator / denominator)
}

/// Calculate required input for a desired output (reverse calculation)
///
/// Formula: input = output * reserve_in * 10000 / ((reserve_out - output) * (10000 - fee)) + 1
///
/// The `+1` rounds up so the payer never under-pays the flooring contract.
/// Returns `None` when the market has no liquidity or `output >= reserve_out`
/// (the output is not obtainable).
pub fn input_given_output(
    output: &BigRational,
    reserve_in: &BigRational,
    reserve_out: &BigRational,
    fee_bps: FeeBps,
) -> Option<BigRational> {
    if fee_bps >= BPS_DENOM || reserve_in.is_zero() || reserve_out.is_zero() {
        return None;
    }
    if output >= reserve_out {
        return None;
    }
    warn_if_unscaled("output amount", output);

    let numerator = output * reserve_in * int(BPS_DENOM as u64);
    let denominator = (reserve_out - output) * int((BPS_DENOM - fee_bps) as u64);

    if denominator.is_zero() {
        return None;
    }
    Some(numerator / denominator + BigRational::one())
}

/// Scale `amount` by `bps / 10000`
pub fn apply_bps(amount: &BigRational, bps: u32) -> BigRational {
    amount * BigRational::new(BigInt::from(bps), BigInt::from(BPS_DENOM))
}

/// Lower bound after a slippage tolerance: amount * (1 - tolerance)
pub fn min_after_slippage(amount: &BigRational, tolerance_bps: u32) -> BigRational {
    apply_bps(amount, BPS_DENOM.saturating_sub(tolerance_bps))
}

/// Upper bound after a slippage tolerance: amount * (1 + tolerance)
pub fn max_after_slippage(amount: &BigRational, tolerance_bps: u32) -> BigRational {
    apply_bps(amount, BPS_DENOM + tolerance_bps)
}
