//! Swap Transaction Builder
//!
//! Builds the signing request for a priced quote: one clause calling the
//! exchange method that matches the swap's kind and edit direction, with
//! slippage bounds derived from the quoted amounts.
//!
//! # Call shapes
//!
//! | Kind         | Input direction                                    | Output direction                                        |
//! |--------------|----------------------------------------------------|---------------------------------------------------------|
//! | BaseToToken  | `ethToTokenSwapInput(min_tokens, deadline)`        | `ethToTokenSwapOutput(tokens_bought, deadline)`         |
//! | TokenToBase  | `tokenToEthSwapInput(sold, min_eth, deadline)`     | `tokenToEthSwapOutput(eth_bought, max_tokens, deadline)`|
//! | TokenToToken | `tokenToTokenSwapInput(sold, min_bought, 1, deadline, token)` | `tokenToTokenSwapOutput(bought, max_sold, max_eth, deadline, token)` |
//!
//! Base-to-token clauses target the output token's exchange and attach the
//! base asset; every other clause targets the input token's exchange.

use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};
use thor_tx::{Clause, ClauseCall, SigningRequest};
use vex_core::{Address, AssetId, Deadline, FeeBps, SwapConfig};

use crate::amount::{DecimalAmount, FieldValue};
use crate::calculator::{apply_bps, max_after_slippage, min_after_slippage};
use crate::constants::{methods, MIN_INTERMEDIATE_BOUGHT};
use crate::provider::ReserveProvider;
use crate::quote::to_raw_units;
use crate::state::{AmmError, EditDirection, Quote, SwapKind, SwapTopology};

/// Slippage limits written into the exchange call, in raw units
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapBounds {
    /// Least output accepted (input direction)
    pub min_output: Option<BigInt>,
    /// Most input spent (output direction)
    pub max_input: Option<BigInt>,
    /// Cap on the base asset crossing between markets (token-to-token)
    pub intermediate_bound: Option<BigInt>,
}

/// Summary of the swap for the confirmation panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTxSummary {
    pub kind: SwapKind,
    pub direction: EditDirection,
    pub input_asset: AssetId,
    pub output_asset: AssetId,
    pub input_amount: String,
    pub output_amount: String,
    /// Least received (input direction) or most spent (output direction)
    pub limit_amount: String,
    pub fee_bps: Option<FeeBps>,
    /// Token-to-token swaps pay both pool fees
    pub extra_fee: bool,
}

impl SwapTxSummary {
    /// Confirmation text, one sentence per line
    pub fn lines(&self) -> [String; 2] {
        match self.direction {
            EditDirection::Input => [
                format!(
                    "You are selling {} {} or the transaction will fail.",
                    self.input_amount, self.input_asset
                ),
                format!(
                    "You will receive at least {} {} or the transaction will fail.",
                    self.limit_amount, self.output_asset
                ),
            ],
            EditDirection::Output => [
                format!("You are buying {} {}.", self.output_amount, self.output_asset),
                format!(
                    "It will cost at most {} {} or the transaction will fail.",
                    self.limit_amount, self.input_asset
                ),
            ],
        }
    }
}

/// Build result containing the signing request and a summary
#[derive(Debug, Clone)]
pub struct SwapBuildResult {
    pub request: SigningRequest,
    pub bounds: SwapBounds,
    pub summary: SwapTxSummary,
}

fn field_amount<'a>(field: &'a FieldValue, which: &str) -> Result<&'a DecimalAmount, AmmError> {
    field
        .amount()
        .filter(|a| !a.is_zero())
        .ok_or_else(|| AmmError::InvalidAmount(format!("{} amount missing", which)))
}

fn exchange_of<P>(provider: &P, token: &AssetId) -> Result<Address, AmmError>
where
    P: ReserveProvider + ?Sized,
{
    let exchange = provider
        .exchange_for(token)
        .ok_or_else(|| AmmError::MarketNotFound(token.clone()))?;
    Ok(Address::parse(exchange.as_str())?)
}

/// Build the exchange call for a priced quote
///
/// Exchange addresses are resolved through `provider`; nothing is fetched.
/// Amounts are the quote's display values scaled to raw units; every bound
/// is truncated toward zero.
pub fn build_swap_clauses<P>(
    quote: &Quote,
    config: &SwapConfig,
    provider: &P,
    deadline: Deadline,
) -> Result<SwapBuildResult, AmmError>
where
    P: ReserveProvider + ?Sized,
{
    let (Some(kind), Some(input_asset), Some(output_asset)) = (
        quote.kind(),
        quote.input_asset.as_ref(),
        quote.output_asset.as_ref(),
    ) else {
        return Err(AmmError::UnsupportedPair {
            input: format!("{:?}", quote.input_asset),
            output: format!("{:?}", quote.output_asset),
        });
    };
    let (Some(input_decimals), Some(output_decimals)) = (quote.input_decimals, quote.output_decimals)
    else {
        return Err(AmmError::TxBuildError("Quote has not been priced".to_string()));
    };

    let input = field_amount(&quote.input_amount, "input")?;
    let output = field_amount(&quote.output_amount, "output")?;
    let raw_in = input.to_base_units(input_decimals);
    let raw_out = output.to_base_units(output_decimals);

    let tolerance = match kind.topology() {
        SwapTopology::TwoHop => config.slippage.two_hop_bps,
        _ => config.slippage.direct_bps,
    };
    let intermediate_bound = quote
        .intermediate_amount
        .as_ref()
        .map(|i| to_raw_units(&apply_bps(i, config.slippage.intermediate_headroom_bps)));
    if kind == SwapKind::TokenToToken && intermediate_bound.is_none() {
        return Err(AmmError::TxBuildError(
            "Token-to-token quote is missing its intermediate amount".to_string(),
        ));
    }

    let target = match kind {
        SwapKind::BaseToToken => exchange_of(provider, output_asset)?,
        SwapKind::TokenToBase | SwapKind::TokenToToken => exchange_of(provider, input_asset)?,
    };
    let deadline = deadline.to_string();

    let (bounds, limit, value, call) = match quote.direction {
        EditDirection::Input => {
            let min_output = min_after_slippage(&raw_out, tolerance);
            let min_display = min_after_slippage(output.as_ratio(), tolerance);
            let min_output = to_raw_units(&min_output);
            let sold = to_raw_units(&raw_in);

            let (value, call) = match kind {
                SwapKind::BaseToToken => (
                    sold.clone(),
                    ClauseCall::new(
                        methods::ETH_TO_TOKEN_SWAP_INPUT,
                        vec![min_output.to_string(), deadline],
                    ),
                ),
                SwapKind::TokenToBase => (
                    BigInt::from(0),
                    ClauseCall::new(
                        methods::TOKEN_TO_ETH_SWAP_INPUT,
                        vec![sold.to_string(), min_output.to_string(), deadline],
                    ),
                ),
                SwapKind::TokenToToken => (
                    BigInt::from(0),
                    ClauseCall::new(
                        methods::TOKEN_TO_TOKEN_SWAP_INPUT,
                        vec![
                            sold.to_string(),
                            min_output.to_string(),
                            MIN_INTERMEDIATE_BOUGHT.to_string(),
                            deadline,
                            output_asset.to_string(),
                        ],
                    ),
                ),
            };
            let bounds = SwapBounds {
                min_output: Some(min_output),
                max_input: None,
                intermediate_bound,
            };
            (bounds, min_display, value, call)
        }
        EditDirection::Output => {
            let max_input = to_raw_units(&max_after_slippage(&raw_in, tolerance));
            let max_display = max_after_slippage(input.as_ratio(), tolerance);
            let bought = to_raw_units(&raw_out);

            let (value, call) = match kind {
                SwapKind::BaseToToken => (
                    max_input.clone(),
                    ClauseCall::new(
                        methods::ETH_TO_TOKEN_SWAP_OUTPUT,
                        vec![bought.to_string(), deadline],
                    ),
                ),
                SwapKind::TokenToBase => (
                    BigInt::from(0),
                    ClauseCall::new(
                        methods::TOKEN_TO_ETH_SWAP_OUTPUT,
                        vec![bought.to_string(), max_input.to_string(), deadline],
                    ),
                ),
                SwapKind::TokenToToken => {
                    let max_eth_sold = intermediate_bound.clone().unwrap_or_default();
                    (
                        BigInt::from(0),
                        ClauseCall::new(
                            methods::TOKEN_TO_TOKEN_SWAP_OUTPUT,
                            vec![
                                bought.to_string(),
                                max_input.to_string(),
                                max_eth_sold.to_string(),
                                deadline,
                                output_asset.to_string(),
                            ],
                        ),
                    )
                }
            };
            let bounds = SwapBounds {
                min_output: None,
                max_input: Some(max_input),
                intermediate_bound,
            };
            (bounds, max_display, value, call)
        }
    };

    let summary = summarize(quote, kind, input_asset, output_asset, &limit, config);
    let method = call.method.clone();
    let clause = Clause::new(target, value, call).with_comment(method);
    let request = SigningRequest::new(vec![clause]);
    request
        .validate()
        .map_err(|e| AmmError::TxBuildError(e.to_string()))?;

    tracing::info!(
        "Built {:?} swap {} -> {}: {:?}",
        kind,
        input_asset,
        output_asset,
        bounds
    );

    Ok(SwapBuildResult {
        request,
        bounds,
        summary,
    })
}

fn summarize(
    quote: &Quote,
    kind: SwapKind,
    input_asset: &AssetId,
    output_asset: &AssetId,
    limit: &BigRational,
    config: &SwapConfig,
) -> SwapTxSummary {
    let places = config.display_decimals;
    let fixed = |field: &FieldValue| {
        field
            .amount()
            .map(|a| a.to_fixed(places))
            .unwrap_or_default()
    };
    let limit_amount = DecimalAmount::from_ratio(limit.clone())
        .map(|a| a.to_fixed(places))
        .unwrap_or_default();

    SwapTxSummary {
        kind,
        direction: quote.direction,
        input_asset: input_asset.clone(),
        output_asset: output_asset.clone(),
        input_amount: fixed(&quote.input_amount),
        output_amount: fixed(&quote.output_amount),
        limit_amount,
        fee_bps: quote.display_fee_bps,
        extra_fee: kind == SwapKind::TokenToToken,
    }
}
