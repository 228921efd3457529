//! Clause Structures
//!
//! Defines the JSON structure handed to the wallet's signing service.
//! A Thor transaction is an ordered list of clauses; each clause targets one
//! contract, optionally attaches base-asset value, and carries one ABI method
//! call. Argument encoding is left to the wallet, so arguments travel as
//! decimal strings or addresses exactly as the ABI encoder expects them.

use serde::{Deserialize, Serialize};
use vex_core::{Address, TxError};

/// Contract method invocation carried by a clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClauseCall {
    /// ABI method name (e.g. `ethToTokenSwapInput`)
    pub method: String,
    /// Positional arguments in ABI order
    pub args: Vec<String>,
}

impl ClauseCall {
    pub fn new(method: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }
}

/// A single clause of a Thor transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    /// Target contract
    pub to: Address,
    /// Base-asset amount attached, in wei (decimal string)
    pub value: String,
    pub call: ClauseCall,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Clause {
    /// Create a clause calling `call` on `to` with `value` wei attached
    pub fn new(to: Address, value: impl ToString, call: ClauseCall) -> Self {
        Self {
            to,
            value: value.to_string(),
            call,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Whether the clause transfers base asset along with the call
    pub fn carries_value(&self) -> bool {
        self.value.chars().any(|c| c != '0')
    }
}

/// Complete signing request for the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigningRequest {
    pub clauses: Vec<Clause>,
    /// Account expected to sign, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl SigningRequest {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self {
            clauses,
            signer: None,
            comment: None,
        }
    }

    pub fn with_signer(mut self, signer: Address) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Reject requests the wallet would refuse anyway
    pub fn validate(&self) -> Result<(), TxError> {
        if self.clauses.is_empty() {
            return Err(TxError::BuildFailed {
                message: "Signing request has no clauses".to_string(),
            });
        }
        for clause in &self.clauses {
            if clause.value.is_empty() || !clause.value.chars().all(|c| c.is_ascii_digit()) {
                return Err(TxError::BuildFailed {
                    message: format!("Clause value is not a decimal integer: {}", clause.value),
                });
            }
        }
        Ok(())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
