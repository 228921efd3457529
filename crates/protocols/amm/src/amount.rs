//! Decimal Amounts
//!
//! Exact decimal values for the two amount fields of the swap form. Values
//! are held as big rationals so that scaling by `10^decimals`, pricing and
//! rounding never pass through binary floating point.

use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::state::AmmError;

/// Most fractional digits `Display` prints for a non-terminating value
const MAX_DISPLAY_PLACES: u32 = 18;

/// `10^exp` as a big integer
pub fn pow10(exp: u32) -> BigInt {
    num_traits::pow(BigInt::from(10u32), exp as usize)
}

/// Round to `places` fractional digits, half away from zero
pub fn round_dp(value: &BigRational, places: u32) -> BigRational {
    let scale = BigRational::from_integer(pow10(places));
    (value * &scale).round() / scale
}

/// A non-negative exact decimal amount in display units (e.g. `1.5` VET)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DecimalAmount(BigRational);

impl DecimalAmount {
    pub fn zero() -> Self {
        Self(BigRational::zero())
    }

    /// Parse user input such as `"12"`, `"0.5"`, `".5"` or `"3."`.
    ///
    /// Signs, exponents and separators are rejected.
    pub fn parse(text: &str) -> Result<Self, AmmError> {
        let text = text.trim();
        let invalid = || AmmError::InvalidAmount(text.to_string());

        let (whole, frac) = match text.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let digits = format!("{}{}", whole, frac);
        let numer: BigInt = digits.parse().map_err(|_| invalid())?;
        let places = u32::try_from(frac.len()).map_err(|_| invalid())?;
        Ok(Self(BigRational::new(numer, pow10(places))))
    }

    /// Wrap an exact value; negative values are not amounts
    pub fn from_ratio(value: BigRational) -> Option<Self> {
        if value.is_negative() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Convert raw integer units (wei) into display units
    pub fn from_base_units(raw: &BigRational, decimals: u8) -> Option<Self> {
        Self::from_ratio(raw / BigRational::from_integer(pow10(decimals as u32)))
    }

    /// Scale to raw units; the result may be fractional when the user typed
    /// more digits than the asset supports
    pub fn to_base_units(&self, decimals: u8) -> BigRational {
        &self.0 * BigRational::from_integer(pow10(decimals as u32))
    }

    /// Raw units truncated to an integer, as the on-chain contract sees them
    pub fn to_base_units_floor(&self, decimals: u8) -> BigInt {
        self.to_base_units(decimals).trunc().to_integer()
    }

    pub fn round_dp(&self, places: u32) -> Self {
        Self(round_dp(&self.0, places))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_ratio(&self) -> &BigRational {
        &self.0
    }

    /// Fixed-point rendering with exactly `places` fractional digits
    pub fn to_fixed(&self, places: u32) -> String {
        let scaled = round_dp(&self.0, places) * BigRational::from_integer(pow10(places));
        let units = scaled.to_integer();
        if places == 0 {
            return units.to_string();
        }

        let digits = units.to_string();
        let width = places as usize + 1;
        let padded = format!("{:0>width$}", digits, width = width);
        let (whole, frac) = padded.split_at(padded.len() - places as usize);
        format!("{}.{}", whole, frac)
    }

    /// Smallest number of fractional digits that represents the value exactly
    fn exact_places(&self) -> Option<u32> {
        let mut scaled = self.0.clone();
        let ten = BigRational::from_integer(BigInt::from(10u32));
        for places in 0..=MAX_DISPLAY_PLACES {
            if scaled.is_integer() {
                return Some(places);
            }
            scaled = scaled * &ten;
        }
        None
    }
}

impl fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let places = self.exact_places().unwrap_or(MAX_DISPLAY_PLACES);
        write!(f, "{}", self.to_fixed(places))
    }
}

/// Content of one amount field of the swap form
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldValue {
    #[default]
    Empty,
    Amount(DecimalAmount),
    /// The requested output cannot be obtained from current reserves
    NotObtainable,
}

impl FieldValue {
    /// Parse field text; blank text is an empty field
    pub fn parse(text: &str) -> Result<Self, AmmError> {
        if text.trim().is_empty() {
            return Ok(Self::Empty);
        }
        DecimalAmount::parse(text).map(Self::Amount)
    }

    pub fn amount(&self) -> Option<&DecimalAmount> {
        match self {
            Self::Amount(amount) => Some(amount),
            _ => None,
        }
    }

    /// True when there is nothing to price from this field
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Amount(amount) => amount.is_zero(),
            Self::NotObtainable => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Amount(amount) => write!(f, "{}", amount),
            Self::NotObtainable => write!(f, "N/A"),
        }
    }
}

/// `numer / denom` for display ratios such as exchange rates
pub fn ratio(numer: &DecimalAmount, denom: &DecimalAmount) -> Option<BigRational> {
    if denom.is_zero() {
        return None;
    }
    Some(numer.as_ratio() / denom.as_ratio())
}

/// Reciprocal of a rate, `None` for zero
pub fn invert(rate: &BigRational) -> Option<BigRational> {
    if rate.is_zero() {
        None
    } else {
        Some(BigRational::one() / rate)
    }
}
