//! Quote Orchestrator
//!
//! Turns a snapshot of the swap form into a complete [`Quote`]: picks the
//! topology, fetches the markets involved and chains the pricing functions
//! forward (amount sent is authoritative) or backward (amount received is
//! authoritative).

use num_bigint::BigInt;
use num_rational::BigRational;
use vex_core::SwapConfig;

use crate::amount::{ratio, DecimalAmount, FieldValue};
use crate::calculator::{input_given_output, output_given_input};
use crate::fetch::fetch_route;
use crate::provider::ReserveProvider;
use crate::state::{AmmError, EditDirection, Hop, Quote, QuoteRequest, QuoteStatus, Route};

fn reserves(hop: &Hop) -> (BigRational, BigRational) {
    (
        BigRational::from_integer(hop.reserve_in.clone()),
        BigRational::from_integer(hop.reserve_out.clone()),
    )
}

/// Compute the quote for `request`, fetching reserves through `provider`.
///
/// Never fails: unpriceable requests come back with an empty derived field
/// and a [`QuoteStatus`] saying why.
pub async fn compute_quote<P>(provider: &P, request: &QuoteRequest, config: &SwapConfig) -> Quote
where
    P: ReserveProvider + ?Sized,
{
    let (Some(kind), Some(input), Some(output)) = (
        request.kind(),
        request.input_asset.as_ref(),
        request.output_asset.as_ref(),
    ) else {
        return Quote::unpriced(request, QuoteStatus::Empty);
    };
    if request.amount.is_blank() {
        return Quote::unpriced(request, QuoteStatus::Empty);
    }

    match fetch_route(provider, kind, input, output).await {
        Ok(route) => price_route(request, &route, config.display_decimals),
        Err(AmmError::MarketNotFound(asset)) => {
            tracing::debug!("No exchange registered for {}", asset);
            Quote::unpriced(request, QuoteStatus::NoMarket)
        }
        Err(e) => {
            tracing::warn!("Failed to fetch markets for {} -> {}: {}", input, output, e);
            Quote::unpriced(request, QuoteStatus::Unavailable)
        }
    }
}

/// Price `request` against already-fetched markets.
///
/// Each hop is priced with its own fee. Derived amounts are rounded to
/// `display_decimals`; the exchange rate is computed from the rounded values.
/// A route through an empty market is never priced.
pub fn price_route(request: &QuoteRequest, route: &Route, display_decimals: u32) -> Quote {
    let Some(amount) = request.amount.amount().filter(|a| !a.is_zero()) else {
        return Quote::unpriced(request, QuoteStatus::Empty);
    };
    if let Err(e) = route.check_liquidity() {
        tracing::debug!("Not pricing {:?} swap: {}", route.kind, e);
        return Quote::unpriced(request, QuoteStatus::NoLiquidity);
    }

    let mut quote = Quote::unpriced(request, QuoteStatus::Priced);
    quote.display_fee_bps = Some(route.display_fee_bps());
    quote.input_decimals = Some(route.input_decimals);
    quote.output_decimals = Some(route.output_decimals);

    match request.direction {
        EditDirection::Input => {
            let Some((raw_out, intermediate)) = forward(route, amount) else {
                tracing::warn!("Market parameters out of range for {:?} swap", route.kind);
                return Quote::unpriced(request, QuoteStatus::Unavailable);
            };
            let output = DecimalAmount::from_base_units(&raw_out, route.output_decimals)
                .map(|a| a.round_dp(display_decimals))
                .unwrap_or_else(DecimalAmount::zero);

            quote.exchange_rate = ratio(&output, amount);
            quote.output_amount = FieldValue::Amount(output);
            quote.intermediate_amount = intermediate;
        }
        EditDirection::Output => match backward(route, amount) {
            Some((raw_in, intermediate)) => {
                let input = DecimalAmount::from_base_units(&raw_in, route.input_decimals)
                    .map(|a| a.round_dp(display_decimals))
                    .unwrap_or_else(DecimalAmount::zero);

                quote.exchange_rate = ratio(amount, &input);
                quote.input_amount = FieldValue::Amount(input);
                quote.intermediate_amount = intermediate;
            }
            None => {
                tracing::debug!("Requested output {} is not obtainable", amount);
                quote.input_amount = FieldValue::NotObtainable;
            }
        },
    }

    quote
}

/// Raw output of selling `amount` through every hop in order, plus the
/// amount crossing between hops on two-hop routes
fn forward(route: &Route, amount: &DecimalAmount) -> Option<(BigRational, Option<BigRational>)> {
    let mut current = amount.to_base_units(route.input_decimals);
    let mut intermediate = None;

    for (i, hop) in route.hops.iter().enumerate() {
        let (reserve_in, reserve_out) = reserves(hop);
        current = output_given_input(&current, &reserve_in, &reserve_out, hop.fee_bps)?;
        if i + 1 < route.hops.len() {
            intermediate = Some(current.clone());
        }
    }

    Some((current, intermediate))
}

/// Raw input needed to receive `amount` after every hop, walking the hops in
/// reverse. `None` when any hop cannot deliver what the next one needs.
fn backward(route: &Route, amount: &DecimalAmount) -> Option<(BigRational, Option<BigRational>)> {
    let mut current = amount.to_base_units(route.output_decimals);
    let mut intermediate = None;

    for (i, hop) in route.hops.iter().enumerate().rev() {
        let (reserve_in, reserve_out) = reserves(hop);
        current = input_given_output(&current, &reserve_in, &reserve_out, hop.fee_bps)?;
        if i > 0 {
            intermediate = Some(current.clone());
        }
    }

    Some((current, intermediate))
}

/// Integer part of a raw amount, as the contract would see it
pub fn to_raw_units(value: &BigRational) -> BigInt {
    value.trunc().to_integer()
}

/// Rate lines for the display layer: `1 IN = r OUT` and its inverse.
/// `None` until the quote has a rate.
pub fn format_rates(
    quote: &Quote,
    input_label: &str,
    output_label: &str,
    places: u32,
) -> Option<(String, String)> {
    let fixed = |rate: BigRational| DecimalAmount::from_ratio(rate).map(|r| r.to_fixed(places));
    let rate = fixed(quote.exchange_rate.clone()?)?;
    let inverted = fixed(quote.inverted_rate()?)?;
    Some((
        format!("1 {} = {} {}", input_label, rate, output_label),
        format!("1 {} = {} {}", output_label, inverted, input_label),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockReserveProvider;
    use num_traits::Zero;
    use vex_core::{Address, AssetId};

    const TOKEN_A: &str = "0x00000000000000000000000000000000000000a1";
    const TOKEN_B: &str = "0x00000000000000000000000000000000000000b1";

    fn hop(reserve_in: u64, reserve_out: u64, fee_bps: u32) -> Hop {
        Hop {
            exchange: Address::new("0x00000000000000000000000000000000000000e1"),
            reserve_in: BigInt::from(reserve_in),
            reserve_out: BigInt::from(reserve_out),
            fee_bps,
        }
    }

    fn request(direction: EditDirection, amount: &str, input: &str, output: &str) -> QuoteRequest {
        QuoteRequest {
            revision: 1,
            input_asset: Some(AssetId::new(input)),
            output_asset: Some(AssetId::new(output)),
            direction,
            amount: FieldValue::parse(amount).unwrap(),
        }
    }

    fn r(v: u64) -> BigRational {
        BigRational::from_integer(BigInt::from(v))
    }

    #[test]
    fn test_two_hop_matches_manual_composition() {
        let route = Route {
            kind: crate::state::SwapKind::TokenToToken,
            hops: vec![hop(1_000_000, 500_000, 30), hop(500_000, 2_000_000, 30)],
            input_decimals: 0,
            output_decimals: 0,
        };
        let req = request(EditDirection::Input, "1000", TOKEN_A, TOKEN_B);

        let first = output_given_input(&r(1000), &r(1_000_000), &r(500_000), 30).unwrap();
        let second = output_given_input(&first, &r(500_000), &r(2_000_000), 30).unwrap();

        let (raw, intermediate) = forward(&route, req.amount.amount().unwrap()).unwrap();
        assert_eq!(raw, second);
        assert_eq!(intermediate, Some(first));

        let quote = price_route(&req, &route, 7);
        let expected = DecimalAmount::from_ratio(second).unwrap().round_dp(7);
        assert_eq!(quote.output_amount, FieldValue::Amount(expected));
        assert_eq!(quote.status, QuoteStatus::Priced);
    }

    #[test]
    fn test_each_hop_uses_its_own_fee() {
        let route = Route {
            kind: crate::state::SwapKind::TokenToToken,
            hops: vec![hop(1_000_000, 500_000, 10), hop(500_000, 2_000_000, 90)],
            input_decimals: 0,
            output_decimals: 0,
        };
        let req = request(EditDirection::Input, "1000", TOKEN_A, TOKEN_B);
        let first = output_given_input(&r(1000), &r(1_000_000), &r(500_000), 10).unwrap();
        let second = output_given_input(&first, &r(500_000), &r(2_000_000), 90).unwrap();

        let (raw, _) = forward(&route, req.amount.amount().unwrap()).unwrap();
        assert_eq!(raw, second);
        assert_eq!(price_route(&req, &route, 7).display_fee_bps, Some(50));
    }

    #[test]
    fn test_backward_chains_in_reverse() {
        let route = Route {
            kind: crate::state::SwapKind::TokenToToken,
            hops: vec![hop(1_000_000, 500_000, 30), hop(500_000, 2_000_000, 30)],
            input_decimals: 0,
            output_decimals: 0,
        };
        let req = request(EditDirection::Output, "1000", TOKEN_A, TOKEN_B);

        let needed_b = input_given_output(&r(1000), &r(500_000), &r(2_000_000), 30).unwrap();
        let needed_a = input_given_output(&needed_b, &r(1_000_000), &r(500_000), 30).unwrap();

        let quote = price_route(&req, &route, 7);
        assert_eq!(quote.intermediate_amount, Some(needed_b));
        let expected = DecimalAmount::from_ratio(needed_a).unwrap().round_dp(7);
        assert_eq!(quote.input_amount, FieldValue::Amount(expected.clone()));
        assert_eq!(
            quote.exchange_rate,
            ratio(&DecimalAmount::parse("1000").unwrap(), &expected)
        );
    }

    #[test]
    fn test_unobtainable_output_is_flagged() {
        let route = Route {
            kind: crate::state::SwapKind::BaseToToken,
            hops: vec![hop(1_000, 1_000, 30)],
            input_decimals: 0,
            output_decimals: 0,
        };
        let req = request(EditDirection::Output, "5000", "VET", TOKEN_A);
        let quote = price_route(&req, &route, 7);
        assert_eq!(quote.input_amount, FieldValue::NotObtainable);
        assert!(quote.exchange_rate.is_none());
        assert_eq!(quote.status, QuoteStatus::Priced);
    }

    #[test]
    fn test_empty_pool_is_not_priced() {
        let route = Route {
            kind: crate::state::SwapKind::BaseToToken,
            hops: vec![hop(0, 0, 30)],
            input_decimals: 0,
            output_decimals: 0,
        };

        let req = request(EditDirection::Output, "5", "VET", TOKEN_A);
        let quote = price_route(&req, &route, 7);
        assert_eq!(quote.status, QuoteStatus::NoLiquidity);
        assert_eq!(quote.input_amount, FieldValue::Empty);
        assert_eq!(quote.output_amount, FieldValue::parse("5").unwrap());
        assert!(quote.exchange_rate.is_none());

        let req = request(EditDirection::Input, "5", "VET", TOKEN_A);
        let quote = price_route(&req, &route, 7);
        assert_eq!(quote.status, QuoteStatus::NoLiquidity);
        assert_eq!(quote.output_amount, FieldValue::Empty);
        assert!(quote.exchange_rate.is_none());
    }

    #[test]
    fn test_two_hop_with_one_empty_market_is_not_priced() {
        let route = Route {
            kind: crate::state::SwapKind::TokenToToken,
            hops: vec![hop(1_000_000, 500_000, 30), hop(0, 2_000_000, 30)],
            input_decimals: 0,
            output_decimals: 0,
        };
        for direction in [EditDirection::Input, EditDirection::Output] {
            let quote = price_route(&request(direction, "1000", TOKEN_A, TOKEN_B), &route, 7);
            assert_eq!(quote.status, QuoteStatus::NoLiquidity);
            assert!(quote.derived().is_blank());
            assert!(quote.intermediate_amount.is_none());
        }
    }

    #[test]
    fn test_rate_is_output_over_input() {
        let route = Route {
            kind: crate::state::SwapKind::BaseToToken,
            hops: vec![hop(1_000_000_000_000, 2_000_000_000_000, 0)],
            input_decimals: 6,
            output_decimals: 6,
        };
        let req = request(EditDirection::Input, "2", "VET", TOKEN_A);
        let quote = price_route(&req, &route, 7);
        let (input, output) = quote.amounts().unwrap();
        assert_eq!(quote.exchange_rate, ratio(output, input));
    }

    #[test]
    fn test_format_rates() {
        let mut quote = Quote::unpriced(
            &request(EditDirection::Input, "2", "VET", TOKEN_A),
            QuoteStatus::Priced,
        );
        assert!(format_rates(&quote, "VET", "TKA", 7).is_none());

        quote.exchange_rate = Some(BigRational::new(BigInt::from(3), BigInt::from(1)));
        let (rate, inverted) = format_rates(&quote, "VET", "TKA", 7).unwrap();
        assert_eq!(rate, "1 VET = 3.0000000 TKA");
        assert_eq!(inverted, "1 TKA = 0.3333333 VET");
    }

    #[tokio::test]
    async fn test_identical_assets_clear_quote() {
        let provider = MockReserveProvider::new();
        let req = request(EditDirection::Input, "10", TOKEN_A, TOKEN_A);
        let quote = compute_quote(&provider, &req, &SwapConfig::default()).await;
        assert_eq!(quote.status, QuoteStatus::Empty);
        assert_eq!(quote.output_amount, FieldValue::Empty);
        assert!(quote.exchange_rate.is_none());
    }

    #[tokio::test]
    async fn test_zero_amount_clears_quote() {
        let provider = MockReserveProvider::new().with_market(
            AssetId::new(TOKEN_A),
            Address::new("0x00000000000000000000000000000000000000e1"),
            1_000_000u64,
            18,
            1_000_000u64,
            30,
        );
        let req = request(EditDirection::Input, "0.00", "VET", TOKEN_A);
        let quote = compute_quote(&provider, &req, &SwapConfig::default()).await;
        assert_eq!(quote.status, QuoteStatus::Empty);
        assert_eq!(quote.output_amount, FieldValue::Empty);
        assert!(quote.exchange_rate.is_none());
    }

    #[tokio::test]
    async fn test_unknown_market_is_silent() {
        let provider = MockReserveProvider::new();
        let req = request(EditDirection::Input, "1", "VET", TOKEN_A);
        let quote = compute_quote(&provider, &req, &SwapConfig::default()).await;
        assert_eq!(quote.status, QuoteStatus::NoMarket);
        assert_eq!(quote.output_amount, FieldValue::Empty);
    }

    #[tokio::test]
    async fn test_provider_outage_degrades() {
        let provider = MockReserveProvider::new().with_market(
            AssetId::new(TOKEN_A),
            Address::new("0x00000000000000000000000000000000000000e1"),
            1_000_000u64,
            18,
            1_000_000u64,
            30,
        );
        provider.set_failing(true);
        let req = request(EditDirection::Input, "1", "VET", TOKEN_A);
        let quote = compute_quote(&provider, &req, &SwapConfig::default()).await;
        assert_eq!(quote.status, QuoteStatus::Unavailable);
        assert_eq!(quote.input_amount, FieldValue::parse("1").unwrap());
    }

    #[tokio::test]
    async fn test_drained_market_through_provider() {
        let provider = MockReserveProvider::new().with_market(
            AssetId::new(TOKEN_A),
            Address::new("0x00000000000000000000000000000000000000e1"),
            0u64,
            18,
            0u64,
            30,
        );
        let req = request(EditDirection::Output, "5", "VET", TOKEN_A);
        let quote = compute_quote(&provider, &req, &SwapConfig::default()).await;
        assert_eq!(quote.status, QuoteStatus::NoLiquidity);
        assert_eq!(quote.input_amount, FieldValue::Empty);
    }

    #[tokio::test]
    async fn test_direct_quote_through_provider() {
        let provider = MockReserveProvider::new().with_market(
            AssetId::new(TOKEN_A),
            Address::new("0x00000000000000000000000000000000000000e1"),
            5_000_000_000_000_000_000_000u128,
            18,
            1_000_000_000_000_000_000_000u128,
            30,
        );
        let req = request(EditDirection::Input, "1", "VET", TOKEN_A);
        let quote = compute_quote(&provider, &req, &SwapConfig::default()).await;
        assert_eq!(quote.status, QuoteStatus::Priced);

        let raw = output_given_input(
            &BigRational::from_integer(BigInt::from(10u64.pow(18))),
            &BigRational::from_integer(BigInt::from(1_000_000_000_000_000_000_000u128)),
            &BigRational::from_integer(BigInt::from(5_000_000_000_000_000_000_000u128)),
            30,
        )
        .unwrap();
        let expected = DecimalAmount::from_base_units(&raw, 18).unwrap().round_dp(7);
        assert_eq!(quote.output_amount, FieldValue::Amount(expected));
        assert!(quote.intermediate_amount.is_none());
        assert!(!quote.exchange_rate.unwrap().is_zero());
    }
}
