//! Swap Form Validation
//!
//! Inline checks for the swap form and the stricter gate applied right
//! before a swap is handed to the signer.

use num_bigint::BigInt;
use num_rational::BigRational;
use thiserror::Error;
use vex_core::SlippageConfig;

use crate::amount::{DecimalAmount, FieldValue};
use crate::calculator::max_after_slippage;
use crate::quote::to_raw_units;
use crate::state::{Balance, EditDirection, Quote, QuoteStatus, SwapKind};

/// Balance and allowance of the input asset for the submitting account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitContext {
    pub balance: Balance,
    /// Exchange allowance; `None` for the base asset, which needs none
    pub allowance: Option<Balance>,
}

/// Reasons a swap may not be submitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter an amount")]
    MissingAmount,

    #[error("Select both assets")]
    MissingAsset,

    #[error("Input and output assets are the same")]
    IdenticalAssets,

    #[error("Quote is out of date")]
    StaleQuote,

    #[error("Quote is not priced ({0:?})")]
    NotPriced(QuoteStatus),

    #[error("Input not valid")]
    InputNotObtainable,

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: BigInt, available: BigInt },

    #[error("Token not unlocked: allowance {available}, need {required}")]
    InsufficientAllowance { required: BigInt, available: BigInt },
}

/// Contextual line shown under the form, most specific wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormHint {
    None,
    SelectToken,
    EnterValue,
    Error(ValidationError),
    NoLiquidity,
    UnlockToken,
}

/// Result of checking the form as it is displayed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValidation {
    pub input_error: Option<ValidationError>,
    pub is_valid: bool,
    /// The exchange must be approved to move the input token first
    pub needs_approval: bool,
    /// Token-to-token swaps pay two pool fees
    pub extra_fee: bool,
    pub hint: FormHint,
}

/// Exact raw input the quote asks the account to spend
fn raw_input(quote: &Quote, decimals: u8) -> Option<BigRational> {
    quote
        .input_amount
        .amount()
        .map(|amount| amount.to_base_units(decimals))
}

/// Raw amount of the input asset the built transaction may take from the
/// account. A base-to-token swap priced from its output attaches the
/// slippage ceiling as value, so the whole ceiling must be held.
fn required_spend(quote: &Quote, decimals: u8, slippage: &SlippageConfig) -> Option<BigRational> {
    let raw = raw_input(quote, decimals)?;
    if quote.kind() == Some(SwapKind::BaseToToken) && quote.direction == EditDirection::Output {
        let attached = to_raw_units(&max_after_slippage(&raw, slippage.direct_bps));
        return Some(BigRational::from_integer(attached));
    }
    Some(raw)
}

fn covers(reading: &Balance, required: &BigRational) -> bool {
    BigRational::from_integer(reading.value.clone()) >= *required
}

fn ceil_units(value: &BigRational) -> BigInt {
    value.ceil().to_integer()
}

/// Whether the exchange lacks the allowance to pull the quoted input
pub fn needs_approval(quote: &Quote, ctx: &SubmitContext) -> bool {
    let Some(allowance) = ctx.allowance.as_ref() else {
        return false;
    };
    if quote.input_asset.as_ref().map_or(true, |a| a.is_native()) {
        return false;
    }
    match raw_input(quote, allowance.decimals) {
        Some(required) => !covers(allowance, &required),
        None => false,
    }
}

/// Check the form as displayed. Never fails; problems are reported inline.
pub fn validate_form(
    quote: &Quote,
    ctx: &SubmitContext,
    slippage: &SlippageConfig,
) -> FormValidation {
    let needs_approval = needs_approval(quote, ctx);
    let extra_fee = quote.kind() == Some(SwapKind::TokenToToken);
    let assets_set = quote.input_asset.is_some() && quote.output_asset.is_some();

    let mut input_error = None;
    if quote.input_amount == FieldValue::NotObtainable {
        input_error = Some(ValidationError::InputNotObtainable);
    } else if let Some(required) = required_spend(quote, ctx.balance.decimals, slippage) {
        if !covers(&ctx.balance, &required) {
            input_error = Some(ValidationError::InsufficientBalance {
                required: ceil_units(&required),
                available: ctx.balance.value.clone(),
            });
        }
    }

    let amounts_present = !quote.input_amount.is_blank() && !quote.output_amount.is_blank();
    let is_valid = amounts_present
        && assets_set
        && !needs_approval
        && input_error.is_none()
        && quote.status == QuoteStatus::Priced;

    let zero = |field: &FieldValue| field.amount().is_some_and(DecimalAmount::is_zero);
    let hint = if needs_approval {
        FormHint::UnlockToken
    } else if quote.status == QuoteStatus::NoLiquidity
        || zero(&quote.input_amount)
        || zero(&quote.output_amount)
    {
        FormHint::NoLiquidity
    } else if let Some(error) = input_error.clone() {
        FormHint::Error(error)
    } else if quote.input_amount == FieldValue::Empty || quote.output_amount == FieldValue::Empty {
        FormHint::EnterValue
    } else if !assets_set {
        FormHint::SelectToken
    } else {
        FormHint::None
    };

    FormValidation {
        input_error,
        is_valid,
        needs_approval,
        extra_fee,
        hint,
    }
}

/// Gate applied before a swap is built and signed.
///
/// `current_revision` is the controller's revision; a quote computed for an
/// older form is refused.
pub fn validate_submission(
    quote: &Quote,
    current_revision: u64,
    ctx: &SubmitContext,
    slippage: &SlippageConfig,
) -> Result<(), ValidationError> {
    let (Some(input), Some(output)) = (quote.input_asset.as_ref(), quote.output_asset.as_ref())
    else {
        return Err(ValidationError::MissingAsset);
    };
    if input == output {
        return Err(ValidationError::IdenticalAssets);
    }
    if quote.authoritative().is_blank() {
        return Err(ValidationError::MissingAmount);
    }
    if quote.revision != current_revision {
        return Err(ValidationError::StaleQuote);
    }
    if quote.derived() == &FieldValue::NotObtainable {
        return Err(ValidationError::InputNotObtainable);
    }
    if quote.status != QuoteStatus::Priced || quote.derived().is_blank() {
        return Err(ValidationError::NotPriced(quote.status));
    }

    let required = required_spend(quote, ctx.balance.decimals, slippage)
        .ok_or(ValidationError::MissingAmount)?;
    if !covers(&ctx.balance, &required) {
        return Err(ValidationError::InsufficientBalance {
            required: ceil_units(&required),
            available: ctx.balance.value.clone(),
        });
    }

    if !input.is_native() {
        let Some(allowance) = ctx.allowance.as_ref() else {
            return Err(ValidationError::InsufficientAllowance {
                required: ceil_units(&required),
                available: BigInt::from(0),
            });
        };
        let required = raw_input(quote, allowance.decimals).ok_or(ValidationError::MissingAmount)?;
        if !covers(allowance, &required) {
            return Err(ValidationError::InsufficientAllowance {
                required: ceil_units(&required),
                available: allowance.value.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EditDirection, QuoteRequest};
    use vex_core::AssetId;

    const TOKEN: &str = "0x00000000000000000000000000000000000000a1";
    const OTHER: &str = "0x00000000000000000000000000000000000000b1";

    fn priced(input: &str, output: &str, input_amount: &str, output_amount: &str) -> Quote {
        let request = QuoteRequest {
            revision: 4,
            input_asset: Some(AssetId::new(input)),
            output_asset: Some(AssetId::new(output)),
            direction: EditDirection::Input,
            amount: FieldValue::parse(input_amount).unwrap(),
        };
        let mut quote = Quote::unpriced(&request, QuoteStatus::Priced);
        quote.output_amount = FieldValue::parse(output_amount).unwrap();
        quote
    }

    fn reading(value: u64, decimals: u8) -> Balance {
        Balance {
            value: BigInt::from(value),
            decimals,
            label: "T".to_string(),
        }
    }

    fn slippage() -> SlippageConfig {
        SlippageConfig::default()
    }

    fn ctx(balance: u64, allowance: Option<u64>) -> SubmitContext {
        SubmitContext {
            balance: reading(balance, 6),
            allowance: allowance.map(|v| reading(v, 6)),
        }
    }

    #[test]
    fn test_valid_base_swap() {
        let quote = priced("VET", TOKEN, "1.5", "3");
        let ctx = ctx(1_500_000, None);
        let form = validate_form(&quote, &ctx, &slippage());
        assert!(form.is_valid);
        assert!(!form.needs_approval);
        assert!(!form.extra_fee);
        assert_eq!(form.hint, FormHint::None);
        assert_eq!(validate_submission(&quote, 4, &ctx, &slippage()), Ok(()));
    }

    #[test]
    fn test_insufficient_balance() {
        let quote = priced("VET", TOKEN, "1.5", "3");
        let ctx = ctx(1_499_999, None);
        let form = validate_form(&quote, &ctx, &slippage());
        assert!(!form.is_valid);
        assert!(matches!(
            form.input_error,
            Some(ValidationError::InsufficientBalance { .. })
        ));
        assert!(matches!(form.hint, FormHint::Error(_)));
        assert_eq!(
            validate_submission(&quote, 4, &ctx, &slippage()),
            Err(ValidationError::InsufficientBalance {
                required: BigInt::from(1_500_000),
                available: BigInt::from(1_499_999),
            })
        );
    }

    #[test]
    fn test_token_input_needs_approval() {
        let quote = priced(TOKEN, OTHER, "2", "1");
        let ctx = ctx(5_000_000, Some(1_000_000));
        let form = validate_form(&quote, &ctx, &slippage());
        assert!(form.needs_approval);
        assert!(form.extra_fee);
        assert!(!form.is_valid);
        assert_eq!(form.hint, FormHint::UnlockToken);
        assert!(matches!(
            validate_submission(&quote, 4, &ctx, &slippage()),
            Err(ValidationError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_not_obtainable_input() {
        let mut quote = priced("VET", TOKEN, "1", "3");
        quote.direction = EditDirection::Output;
        quote.input_amount = FieldValue::NotObtainable;
        let ctx = ctx(u64::MAX, None);
        let form = validate_form(&quote, &ctx, &slippage());
        assert_eq!(form.input_error, Some(ValidationError::InputNotObtainable));
        assert_eq!(
            validate_submission(&quote, 4, &ctx, &slippage()),
            Err(ValidationError::InputNotObtainable)
        );
    }

    #[test]
    fn test_stale_quote_refused() {
        let quote = priced("VET", TOKEN, "1", "3");
        assert_eq!(
            validate_submission(&quote, 5, &ctx(u64::MAX, None), &slippage()),
            Err(ValidationError::StaleQuote)
        );
    }

    #[test]
    fn test_zero_derived_amount_hints_no_liquidity() {
        let quote = priced("VET", TOKEN, "1", "0");
        let form = validate_form(&quote, &ctx(u64::MAX, None), &slippage());
        assert!(!form.is_valid);
        assert_eq!(form.hint, FormHint::NoLiquidity);
    }

    #[test]
    fn test_empty_market_hints_no_liquidity() {
        let mut quote = priced("VET", TOKEN, "5", "3");
        quote.direction = EditDirection::Output;
        quote.status = QuoteStatus::NoLiquidity;
        quote.input_amount = FieldValue::Empty;
        let ctx = ctx(u64::MAX, None);

        let form = validate_form(&quote, &ctx, &slippage());
        assert!(!form.is_valid);
        assert_eq!(form.hint, FormHint::NoLiquidity);
        assert_eq!(
            validate_submission(&quote, 4, &ctx, &slippage()),
            Err(ValidationError::NotPriced(QuoteStatus::NoLiquidity))
        );
    }

    #[test]
    fn test_output_priced_base_swap_must_cover_attached_value() {
        // 2 VET quoted; the clause attaches 2 * 1.025 = 2.05 VET
        let mut quote = priced("VET", TOKEN, "2", "3");
        quote.direction = EditDirection::Output;

        let short = ctx(2_049_999, None);
        let form = validate_form(&quote, &short, &slippage());
        assert!(!form.is_valid);
        assert_eq!(
            validate_submission(&quote, 4, &short, &slippage()),
            Err(ValidationError::InsufficientBalance {
                required: BigInt::from(2_050_000),
                available: BigInt::from(2_049_999),
            })
        );

        let enough = ctx(2_050_000, None);
        assert!(validate_form(&quote, &enough, &slippage()).is_valid);
        assert_eq!(validate_submission(&quote, 4, &enough, &slippage()), Ok(()));

        // Priced from the input, only the input itself is attached
        quote.direction = EditDirection::Input;
        assert_eq!(validate_submission(&quote, 4, &ctx(2_000_000, None), &slippage()), Ok(()));
    }

    #[test]
    fn test_missing_asset_and_amount() {
        let mut quote = priced("VET", TOKEN, "1", "3");
        quote.output_asset = None;
        assert_eq!(
            validate_submission(&quote, 4, &ctx(u64::MAX, None), &slippage()),
            Err(ValidationError::MissingAsset)
        );

        let quote = Quote::initial();
        let form = validate_form(&quote, &ctx(0, None), &slippage());
        assert!(!form.is_valid);
        assert_eq!(form.hint, FormHint::EnterValue);
    }

    #[test]
    fn test_unpriced_quote_refused() {
        let mut quote = priced("VET", TOKEN, "1", "3");
        quote.status = QuoteStatus::Unavailable;
        quote.output_amount = FieldValue::Empty;
        assert_eq!(
            validate_submission(&quote, 4, &ctx(u64::MAX, None), &slippage()),
            Err(ValidationError::NotPriced(QuoteStatus::Unavailable))
        );
    }
}
