//! Error types for Vexswap

use thiserror::Error;

/// Core errors that can occur in Vexswap
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors from the chain-facing collaborators (reserve snapshots, deadlines)
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provider unreachable at {endpoint}")]
    Unreachable { endpoint: String },

    #[error("Provider returned error: {message}")]
    ApiError { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unreachable { .. } | Self::Timeout { .. } | Self::ApiError { .. }
        )
    }
}

/// Transaction building and signing errors
#[derive(Debug, Clone, Error)]
pub enum TxError {
    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Failed to build transaction: {message}")]
    BuildFailed { message: String },

    #[error("Signing request rejected: {message}")]
    SigningRejected { message: String },

    #[error("Transaction submission failed: {message}")]
    SubmissionFailed { message: String },
}

impl TxError {
    /// Get a UI-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAddress { .. } => "invalid_address",
            Self::BuildFailed { .. } => "build_failed",
            Self::SigningRejected { .. } => "signing_rejected",
            Self::SubmissionFailed { .. } => "submission_failed",
        }
    }
}
