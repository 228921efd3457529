//! Vexswap AMM Engine
//!
//! Quote engine and transaction builder for Uniswap-v1 style exchanges on
//! VeChain Thor: every token has one exchange pairing it with VET, and
//! token-to-token swaps route through VET across two exchanges.

pub mod amount;
pub mod calculator;
pub mod constants;
pub mod controller;
pub mod deadline;
pub mod fetch;
pub mod mock;
pub mod provider;
pub mod quote;
pub mod state;
pub mod tx_builder;
pub mod validate;

// Re-exports
pub use amount::{DecimalAmount, FieldValue};
pub use calculator::{input_given_output, output_given_input};
pub use controller::{QuoteUpdate, SubmitError, SubmitServices, SwapController, SwapForm};
pub use deadline::{resolve_deadline, DeadlineError};
pub use fetch::{fetch_market, fetch_route, fetch_submit_context};
pub use provider::{DeadlineSource, PendingTxTracker, ReserveProvider, TxSigner};
pub use quote::{compute_quote, format_rates, price_route};
pub use state::{
    AmmError, Balance, EditDirection, Hop, MarketSnapshot, Quote, QuoteRequest, QuoteStatus,
    Route, SwapKind, SwapTopology,
};
pub use tx_builder::{build_swap_clauses, SwapBounds, SwapBuildResult, SwapTxSummary};
pub use validate::{
    validate_form, validate_submission, FormHint, FormValidation, SubmitContext, ValidationError,
};
