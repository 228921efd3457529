//! Configuration types for Vexswap

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::BPS_DENOM;
use crate::errors::Error;

/// Slippage tolerances applied by the transaction builder, in basis points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlippageConfig {
    /// Tolerance for single-market swaps (250 = 2.5%)
    #[serde(default = "default_direct_bps")]
    pub direct_bps: u32,

    /// Tolerance for token-to-token swaps crossing two markets (400 = 4%)
    #[serde(default = "default_two_hop_bps")]
    pub two_hop_bps: u32,

    /// Cap on the intermediate base-asset amount, relative to the quoted
    /// amount (12000 = 120%)
    #[serde(default = "default_intermediate_headroom_bps")]
    pub intermediate_headroom_bps: u32,
}

fn default_direct_bps() -> u32 {
    250
}

fn default_two_hop_bps() -> u32 {
    400
}

fn default_intermediate_headroom_bps() -> u32 {
    12_000
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            direct_bps: default_direct_bps(),
            two_hop_bps: default_two_hop_bps(),
            intermediate_headroom_bps: default_intermediate_headroom_bps(),
        }
    }
}

/// Bounded retry policy with capped exponential backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,

    /// Upper bound for any single delay in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Delay to wait after the given (zero-based) failed attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.base_delay_ms.min(self.max_delay_ms));
        }

        let exponential = self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis((exponential as u64).min(self.max_delay_ms))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be greater than 0".to_string(),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(Error::Config(format!(
                "retry.max_delay_ms ({}) must be at least base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(Error::Config(format!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Swap engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Decimal places derived amounts are rounded to
    #[serde(default = "default_display_decimals")]
    pub display_decimals: u32,

    /// Seconds from the current block until a submitted swap expires
    #[serde(default = "default_deadline_timeout_secs")]
    pub deadline_timeout_secs: u64,

    #[serde(default)]
    pub slippage: SlippageConfig,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_display_decimals() -> u32 {
    7
}

fn default_deadline_timeout_secs() -> u64 {
    300
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            display_decimals: default_display_decimals(),
            deadline_timeout_secs: default_deadline_timeout_secs(),
            slippage: SlippageConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl SwapConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: SwapConfig =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.slippage.direct_bps >= BPS_DENOM || self.slippage.two_hop_bps >= BPS_DENOM {
            return Err(Error::Config(
                "slippage tolerances must be below 10000 bps".to_string(),
            ));
        }
        if self.slippage.intermediate_headroom_bps < BPS_DENOM {
            return Err(Error::Config(format!(
                "slippage.intermediate_headroom_bps must be at least {}",
                BPS_DENOM
            )));
        }
        if self.deadline_timeout_secs == 0 {
            return Err(Error::Config(
                "deadline_timeout_secs must be greater than 0".to_string(),
            ));
        }
        self.retry.validate()
    }
}
