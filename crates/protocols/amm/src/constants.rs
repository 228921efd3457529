//! AMM Constants
//!
//! Exchange contract method names and diagnostic thresholds.

/// Raw amounts below this were probably not scaled by `10^decimals`
pub const LOW_AMOUNT_THRESHOLD: u64 = 1_000_000_000;

/// Minimum base asset accepted from the first leg of a token-to-token sell.
/// The intermediate leg is protected by the final output bound instead.
pub const MIN_INTERMEDIATE_BOUGHT: u64 = 1;

/// Exchange contract ABI method names (Uniswap v1 layout)
pub mod methods {
    pub const ETH_TO_TOKEN_SWAP_INPUT: &str = "ethToTokenSwapInput";
    pub const ETH_TO_TOKEN_SWAP_OUTPUT: &str = "ethToTokenSwapOutput";
    pub const TOKEN_TO_ETH_SWAP_INPUT: &str = "tokenToEthSwapInput";
    pub const TOKEN_TO_ETH_SWAP_OUTPUT: &str = "tokenToEthSwapOutput";
    pub const TOKEN_TO_TOKEN_SWAP_INPUT: &str = "tokenToTokenSwapInput";
    pub const TOKEN_TO_TOKEN_SWAP_OUTPUT: &str = "tokenToTokenSwapOutput";
}
