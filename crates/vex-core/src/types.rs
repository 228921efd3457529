//! Core type definitions for Vexswap

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TxError;

/// Account or contract address (20 bytes, `0x`-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Parse and validate an address, normalizing it to lowercase.
    pub fn parse(addr: &str) -> Result<Self, TxError> {
        let body = addr
            .strip_prefix("0x")
            .or_else(|| addr.strip_prefix("0X"))
            .ok_or_else(|| TxError::InvalidAddress {
                address: addr.to_string(),
            })?;

        match hex::decode(body) {
            Ok(bytes) if bytes.len() == 20 => Ok(Self(format!("0x{}", body.to_lowercase()))),
            _ => Err(TxError::InvalidAddress {
                address: addr.to_string(),
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset identifier: the native symbol for the base asset, otherwise the
/// token's contract address or registry symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The base asset every exchange is paired against.
    pub fn native() -> Self {
        Self(constants::NATIVE_SYMBOL.to_string())
    }

    pub fn is_native(&self) -> bool {
        self.0 == constants::NATIVE_SYMBOL
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction ID returned by the signing wallet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp (seconds) after which an exchange call reverts
pub type Deadline = u64;

/// Fee rate in basis points (30 = 0.3%)
pub type FeeBps = u32;

/// Constants
pub mod constants {
    /// Reserved identifier of the base asset
    pub const NATIVE_SYMBOL: &str = "VET";

    /// Decimal precision of the base asset
    pub const NATIVE_DECIMALS: u8 = 18;

    /// Basis-point denominator used by exchange fees and slippage tolerances
    pub const BPS_DENOM: u32 = 10_000;
}
