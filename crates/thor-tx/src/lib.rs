//! thor-tx: Transaction structures for VeChain Thor wallets
//!
//! Provides the clause and signing-request shapes handed to the wallet's
//! signing service.

pub mod clause;

pub use clause::*;
