//! AMM State Types
//!
//! Data structures for markets, quotes, and the swap form.

use num_bigint::BigInt;
use num_rational::BigRational;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use num_traits::Zero;
use vex_core::{Address, AssetId, FeeBps, ProviderError, TxError};

use crate::amount::{invert, DecimalAmount, FieldValue};

/// Which amount field the user edited last and is therefore authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditDirection {
    /// The amount sent is authoritative; the amount received is derived
    Input,
    /// The amount received is authoritative; the amount sent is derived
    Output,
}

impl EditDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// How a pair of assets is routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapTopology {
    /// One side is the base asset: a single market
    Direct,
    /// Neither side is the base asset: token -> base -> token
    TwoHop,
    /// Assets identical or unset
    Invalid,
}

/// Call shape of a swap, one per exchange method family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwapKind {
    BaseToToken,
    TokenToBase,
    TokenToToken,
}

impl SwapKind {
    /// Classify an asset pair; `None` when the pair cannot be swapped
    pub fn classify(input: Option<&AssetId>, output: Option<&AssetId>) -> Option<Self> {
        let (input, output) = (input?, output?);
        if input == output {
            return None;
        }
        match (input.is_native(), output.is_native()) {
            (true, false) => Some(Self::BaseToToken),
            (false, true) => Some(Self::TokenToBase),
            (false, false) => Some(Self::TokenToToken),
            (true, true) => None,
        }
    }

    pub fn topology(self) -> SwapTopology {
        match self {
            Self::BaseToToken | Self::TokenToBase => SwapTopology::Direct,
            Self::TokenToToken => SwapTopology::TwoHop,
        }
    }
}

impl SwapTopology {
    pub fn of(input: Option<&AssetId>, output: Option<&AssetId>) -> Self {
        SwapKind::classify(input, output)
            .map(SwapKind::topology)
            .unwrap_or(Self::Invalid)
    }
}

/// Balance or allowance reading for one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    /// Raw integer units
    pub value: BigInt,
    pub decimals: u8,
    /// Display symbol
    pub label: String,
}

impl Balance {
    /// Display units rounded to `places`, e.g. `Balance: 12.3457`
    pub fn to_display(&self, places: u32) -> String {
        let raw = BigRational::from_integer(self.value.clone());
        DecimalAmount::from_base_units(&raw, self.decimals)
            .map(|amount| amount.to_fixed(places))
            .unwrap_or_else(|| "0".to_string())
    }
}

/// Reserves of one token/base exchange at the time of the fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub exchange: Address,
    pub token: AssetId,
    pub token_reserve: BigInt,
    pub token_decimals: u8,
    pub base_reserve: BigInt,
    pub base_decimals: u8,
    pub fee_bps: FeeBps,
}

impl fmt::Display for MarketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Exchange {} | {}: {} | base: {} | fee: {}bps",
            self.exchange, self.token, self.token_reserve, self.base_reserve, self.fee_bps
        )
    }
}

/// One constant-product market oriented in the direction of the trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub exchange: Address,
    pub reserve_in: BigInt,
    pub reserve_out: BigInt,
    pub fee_bps: FeeBps,
}

impl Hop {
    /// Sell `market.token` for the base asset
    pub fn token_to_base(market: &MarketSnapshot) -> Self {
        Self {
            exchange: market.exchange.clone(),
            reserve_in: market.token_reserve.clone(),
            reserve_out: market.base_reserve.clone(),
            fee_bps: market.fee_bps,
        }
    }

    /// Buy `market.token` with the base asset
    pub fn base_to_token(market: &MarketSnapshot) -> Self {
        Self {
            exchange: market.exchange.clone(),
            reserve_in: market.base_reserve.clone(),
            reserve_out: market.token_reserve.clone(),
            fee_bps: market.fee_bps,
        }
    }
}

/// Priced path for an asset pair: one hop for direct swaps, two for
/// token-to-token swaps through the base asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub kind: SwapKind,
    pub hops: Vec<Hop>,
    pub input_decimals: u8,
    pub output_decimals: u8,
}

impl Route {
    /// Fee shown to the user; the mean of both markets on two-hop routes.
    /// Never used for pricing.
    pub fn display_fee_bps(&self) -> FeeBps {
        if self.hops.is_empty() {
            return 0;
        }
        let total: u64 = self.hops.iter().map(|h| h.fee_bps as u64).sum();
        (total / self.hops.len() as u64) as FeeBps
    }

    /// Every market on the route must hold both sides of its pair
    pub fn check_liquidity(&self) -> Result<(), AmmError> {
        match self
            .hops
            .iter()
            .find(|h| h.reserve_in.is_zero() || h.reserve_out.is_zero())
        {
            Some(hop) => {
                tracing::debug!("Exchange {} has an empty reserve", hop.exchange);
                Err(AmmError::InsufficientLiquidity)
            }
            None => Ok(()),
        }
    }
}

/// Why a quote has (or lacks) a derived amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    /// Nothing to price: unset or identical assets, or a blank amount
    Empty,
    Priced,
    /// No exchange is registered for one of the tokens
    NoMarket,
    /// A market on the route holds no reserves
    NoLiquidity,
    /// Reserve or fee fetch failed
    Unavailable,
}

/// Snapshot of the form a recalculation is computed from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub revision: u64,
    pub input_asset: Option<AssetId>,
    pub output_asset: Option<AssetId>,
    pub direction: EditDirection,
    /// The authoritative amount
    pub amount: FieldValue,
}

impl QuoteRequest {
    pub fn kind(&self) -> Option<SwapKind> {
        SwapKind::classify(self.input_asset.as_ref(), self.output_asset.as_ref())
    }
}

/// Result of one recalculation. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Revision of the form this quote was computed from
    pub revision: u64,
    pub input_asset: Option<AssetId>,
    pub output_asset: Option<AssetId>,
    pub direction: EditDirection,
    pub input_amount: FieldValue,
    pub output_amount: FieldValue,
    /// Output per unit of input
    pub exchange_rate: Option<BigRational>,
    /// Raw base-asset units crossing between the two markets (two-hop only)
    pub intermediate_amount: Option<BigRational>,
    pub display_fee_bps: Option<FeeBps>,
    pub input_decimals: Option<u8>,
    pub output_decimals: Option<u8>,
    pub status: QuoteStatus,
}

impl Quote {
    /// Quote with the authoritative amount in place and nothing derived
    pub fn unpriced(request: &QuoteRequest, status: QuoteStatus) -> Self {
        let (input_amount, output_amount) = match request.direction {
            EditDirection::Input => (request.amount.clone(), FieldValue::Empty),
            EditDirection::Output => (FieldValue::Empty, request.amount.clone()),
        };
        Self {
            revision: request.revision,
            input_asset: request.input_asset.clone(),
            output_asset: request.output_asset.clone(),
            direction: request.direction,
            input_amount,
            output_amount,
            exchange_rate: None,
            intermediate_amount: None,
            display_fee_bps: None,
            input_decimals: None,
            output_decimals: None,
            status,
        }
    }

    /// Empty form with the default pair (base asset in, nothing out)
    pub fn initial() -> Self {
        Self::unpriced(
            &QuoteRequest {
                revision: 0,
                input_asset: Some(AssetId::native()),
                output_asset: None,
                direction: EditDirection::Input,
                amount: FieldValue::Empty,
            },
            QuoteStatus::Empty,
        )
    }

    pub fn kind(&self) -> Option<SwapKind> {
        SwapKind::classify(self.input_asset.as_ref(), self.output_asset.as_ref())
    }

    pub fn topology(&self) -> SwapTopology {
        SwapTopology::of(self.input_asset.as_ref(), self.output_asset.as_ref())
    }

    /// The user-entered field
    pub fn authoritative(&self) -> &FieldValue {
        match self.direction {
            EditDirection::Input => &self.input_amount,
            EditDirection::Output => &self.output_amount,
        }
    }

    /// The computed field
    pub fn derived(&self) -> &FieldValue {
        match self.direction {
            EditDirection::Input => &self.output_amount,
            EditDirection::Output => &self.input_amount,
        }
    }

    /// Input per unit of output
    pub fn inverted_rate(&self) -> Option<BigRational> {
        self.exchange_rate.as_ref().and_then(invert)
    }

    /// Both amounts, when both are finite
    pub fn amounts(&self) -> Option<(&DecimalAmount, &DecimalAmount)> {
        Some((self.input_amount.amount()?, self.output_amount.amount()?))
    }

    /// Whether any field the display layer shows differs from `other`
    pub fn differs_from(&self, other: &Quote) -> bool {
        let mut a = self.clone();
        a.revision = other.revision;
        a != *other
    }
}

/// AMM engine errors
#[derive(Debug, Error)]
pub enum AmmError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("No exchange registered for {0}")]
    MarketNotFound(AssetId),

    #[error("Insufficient liquidity for swap")]
    InsufficientLiquidity,

    #[error("Cannot swap {input} for {output}")]
    UnsupportedPair { input: String, output: String },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Rejected address: {0}")]
    Address(#[from] TxError),

    #[error("Transaction build failed: {0}")]
    TxBuildError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: &str) -> AssetId {
        AssetId::new(id)
    }

    #[test]
    fn test_classify_pairs() {
        let vet = AssetId::native();
        let a = token("0x00000000000000000000000000000000000000a1");
        let b = token("0x00000000000000000000000000000000000000b1");

        assert_eq!(SwapKind::classify(Some(&vet), Some(&a)), Some(SwapKind::BaseToToken));
        assert_eq!(SwapKind::classify(Some(&a), Some(&vet)), Some(SwapKind::TokenToBase));
        assert_eq!(SwapKind::classify(Some(&a), Some(&b)), Some(SwapKind::TokenToToken));
        assert_eq!(SwapKind::classify(Some(&a), Some(&a)), None);
        assert_eq!(SwapKind::classify(Some(&vet), Some(&vet)), None);
        assert_eq!(SwapKind::classify(None, Some(&a)), None);
    }

    #[test]
    fn test_topology() {
        let vet = AssetId::native();
        let a = token("A");
        let b = token("B");
        assert_eq!(SwapTopology::of(Some(&vet), Some(&a)), SwapTopology::Direct);
        assert_eq!(SwapTopology::of(Some(&a), Some(&b)), SwapTopology::TwoHop);
        assert_eq!(SwapTopology::of(Some(&a), Some(&a)), SwapTopology::Invalid);
        assert_eq!(SwapTopology::of(Some(&a), None), SwapTopology::Invalid);
    }

    #[test]
    fn test_direction_flip() {
        assert_eq!(EditDirection::Input.flipped(), EditDirection::Output);
        assert_eq!(EditDirection::Input.flipped().flipped(), EditDirection::Input);
    }

    #[test]
    fn test_unpriced_places_authoritative_amount() {
        let amount = FieldValue::parse("5").unwrap();
        let request = QuoteRequest {
            revision: 3,
            input_asset: Some(AssetId::native()),
            output_asset: Some(token("A")),
            direction: EditDirection::Output,
            amount: amount.clone(),
        };
        let quote = Quote::unpriced(&request, QuoteStatus::Empty);
        assert_eq!(quote.output_amount, amount);
        assert_eq!(quote.input_amount, FieldValue::Empty);
        assert_eq!(quote.authoritative(), &amount);
        assert_eq!(quote.revision, 3);
    }

    #[test]
    fn test_display_fee_is_mean_of_hops() {
        let hop = |fee| Hop {
            exchange: Address::new("0x01"),
            reserve_in: BigInt::from(1),
            reserve_out: BigInt::from(1),
            fee_bps: fee,
        };
        let route = Route {
            kind: SwapKind::TokenToToken,
            hops: vec![hop(30), hop(50)],
            input_decimals: 18,
            output_decimals: 18,
        };
        assert_eq!(route.display_fee_bps(), 40);
    }

    #[test]
    fn test_route_with_empty_market_lacks_liquidity() {
        let hop = |reserve_in: u64, reserve_out: u64| Hop {
            exchange: Address::new("0x01"),
            reserve_in: BigInt::from(reserve_in),
            reserve_out: BigInt::from(reserve_out),
            fee_bps: 30,
        };
        let mut route = Route {
            kind: SwapKind::TokenToToken,
            hops: vec![hop(1_000, 500), hop(500, 2_000)],
            input_decimals: 18,
            output_decimals: 18,
        };
        assert!(route.check_liquidity().is_ok());

        route.hops[1] = hop(0, 2_000);
        assert!(matches!(route.check_liquidity(), Err(AmmError::InsufficientLiquidity)));
        route.hops[1] = hop(0, 0);
        assert!(matches!(route.check_liquidity(), Err(AmmError::InsufficientLiquidity)));
    }

    #[test]
    fn test_balance_display() {
        let balance = Balance {
            value: BigInt::from(12_345_678u64),
            decimals: 6,
            label: "TKA".to_string(),
        };
        assert_eq!(balance.to_display(4), "12.3457");
    }

    #[test]
    fn test_differs_ignores_revision() {
        let a = Quote::initial();
        let mut b = a.clone();
        b.revision = 9;
        assert!(!a.differs_from(&b));
        b.status = QuoteStatus::NoMarket;
        assert!(a.differs_from(&b));
    }
}
