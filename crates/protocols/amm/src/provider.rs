//! External collaborators
//!
//! Narrow interfaces to the chain-facing services the engine consumes. The
//! engine never caches what these return; every recalculation reads afresh.

use async_trait::async_trait;
use thor_tx::SigningRequest;
use vex_core::{Address, AssetId, Deadline, FeeBps, ProviderError, TxError, TxId};

use crate::state::Balance;

/// Reserve snapshots, balances, allowances and fees
#[async_trait]
pub trait ReserveProvider: Send + Sync {
    /// Exchange contract paired with `token`, if one is registered
    fn exchange_for(&self, token: &AssetId) -> Option<Address>;

    /// Balance of `asset` held by `owner` (an account or an exchange)
    async fn balance(&self, owner: &Address, asset: &AssetId) -> Result<Balance, ProviderError>;

    /// Amount of `asset` that `spender` may move on behalf of `owner`
    async fn allowance(
        &self,
        asset: &AssetId,
        owner: &Address,
        spender: &Address,
    ) -> Result<Balance, ProviderError>;

    /// Fee charged by an exchange, in basis points
    async fn swap_fee(&self, exchange: &Address) -> Result<FeeBps, ProviderError>;
}

/// Block-relative transaction expiry
#[async_trait]
pub trait DeadlineSource: Send + Sync {
    /// Unix timestamp `timeout_secs` after the current best block
    async fn deadline(&self, timeout_secs: u64) -> Result<Deadline, ProviderError>;
}

/// Wallet signing service
#[async_trait]
pub trait TxSigner: Send + Sync {
    async fn sign(&self, request: SigningRequest) -> Result<TxId, TxError>;
}

/// Receives transactions that have been handed to the network
pub trait PendingTxTracker: Send + Sync {
    fn add_pending(&self, tx_id: TxId);
}
