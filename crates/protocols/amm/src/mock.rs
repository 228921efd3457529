//! In-memory collaborators
//!
//! Stand-ins for the chain-facing services, for tests and offline use.
//! State lives behind mutexes so fakes can be shared by reference with the
//! controller while a test adjusts them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use num_bigint::BigInt;
use thor_tx::SigningRequest;
use vex_core::constants::NATIVE_DECIMALS;
use vex_core::{Address, AssetId, Deadline, FeeBps, ProviderError, TxError, TxId};

use crate::provider::{DeadlineSource, PendingTxTracker, ReserveProvider, TxSigner};
use crate::state::Balance;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Reserve provider backed by hash maps
#[derive(Debug, Default)]
pub struct MockReserveProvider {
    exchanges: Mutex<HashMap<AssetId, Address>>,
    decimals: Mutex<HashMap<AssetId, u8>>,
    balances: Mutex<HashMap<(Address, AssetId), BigInt>>,
    allowances: Mutex<HashMap<(AssetId, Address, Address), BigInt>>,
    fees: Mutex<HashMap<Address, FeeBps>>,
    failing: AtomicBool,
}

impl MockReserveProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an exchange for `token` holding the given reserves
    pub fn with_market(
        self,
        token: AssetId,
        exchange: Address,
        token_reserve: impl Into<BigInt>,
        token_decimals: u8,
        base_reserve: impl Into<BigInt>,
        fee_bps: FeeBps,
    ) -> Self {
        lock(&self.exchanges).insert(token.clone(), exchange.clone());
        lock(&self.decimals).insert(token.clone(), token_decimals);
        lock(&self.fees).insert(exchange.clone(), fee_bps);
        self.set_reserves(&token, token_reserve, base_reserve);
        self
    }

    pub fn with_balance(self, owner: Address, asset: AssetId, value: impl Into<BigInt>) -> Self {
        lock(&self.balances).insert((owner, asset), value.into());
        self
    }

    pub fn with_allowance(
        self,
        asset: AssetId,
        owner: Address,
        spender: Address,
        value: impl Into<BigInt>,
    ) -> Self {
        lock(&self.allowances).insert((asset, owner, spender), value.into());
        self
    }

    /// Replace the reserves of `token`'s exchange. No-op for unknown tokens.
    pub fn set_reserves(
        &self,
        token: &AssetId,
        token_reserve: impl Into<BigInt>,
        base_reserve: impl Into<BigInt>,
    ) {
        let Some(exchange) = lock(&self.exchanges).get(token).cloned() else {
            return;
        };
        let mut balances = lock(&self.balances);
        balances.insert((exchange.clone(), token.clone()), token_reserve.into());
        balances.insert((exchange, AssetId::native()), base_reserve.into());
    }

    /// Make every async call fail with [`ProviderError::Unreachable`]
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn decimals_of(&self, asset: &AssetId) -> u8 {
        if asset.is_native() {
            return NATIVE_DECIMALS;
        }
        lock(&self.decimals)
            .get(asset)
            .copied()
            .unwrap_or(NATIVE_DECIMALS)
    }

    fn check_reachable(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Unreachable {
                endpoint: "mock".to_string(),
            });
        }
        Ok(())
    }

    fn reading(&self, asset: &AssetId, value: BigInt) -> Balance {
        Balance {
            value,
            decimals: self.decimals_of(asset),
            label: asset.to_string(),
        }
    }
}

#[async_trait]
impl ReserveProvider for MockReserveProvider {
    fn exchange_for(&self, token: &AssetId) -> Option<Address> {
        lock(&self.exchanges).get(token).cloned()
    }

    async fn balance(&self, owner: &Address, asset: &AssetId) -> Result<Balance, ProviderError> {
        self.check_reachable()?;
        let value = lock(&self.balances)
            .get(&(owner.clone(), asset.clone()))
            .cloned()
            .unwrap_or_default();
        Ok(self.reading(asset, value))
    }

    async fn allowance(
        &self,
        asset: &AssetId,
        owner: &Address,
        spender: &Address,
    ) -> Result<Balance, ProviderError> {
        self.check_reachable()?;
        let value = lock(&self.allowances)
            .get(&(asset.clone(), owner.clone(), spender.clone()))
            .cloned()
            .unwrap_or_default();
        Ok(self.reading(asset, value))
    }

    async fn swap_fee(&self, exchange: &Address) -> Result<FeeBps, ProviderError> {
        self.check_reachable()?;
        lock(&self.fees)
            .get(exchange)
            .copied()
            .ok_or_else(|| ProviderError::NotFound {
                what: format!("fee for {}", exchange),
            })
    }
}

/// Deadline source that times out a fixed number of times before answering
#[derive(Debug)]
pub struct MockDeadlineSource {
    now: Deadline,
    failures_left: AtomicU32,
    attempts: AtomicU32,
}

impl MockDeadlineSource {
    /// Answers `now + timeout` on the first call
    pub fn new(now: Deadline) -> Self {
        Self::failing_times(now, 0)
    }

    pub fn failing_times(now: Deadline, failures: u32) -> Self {
        Self {
            now,
            failures_left: AtomicU32::new(failures),
            attempts: AtomicU32::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeadlineSource for MockDeadlineSource {
    async fn deadline(&self, timeout_secs: u64) -> Result<Deadline, ProviderError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ProviderError::Timeout { secs: 5 });
        }
        Ok(self.now + timeout_secs)
    }
}

/// Signer that records every request and either approves or rejects it
#[derive(Debug, Default)]
pub struct MockSigner {
    reject: AtomicBool,
    requests: Mutex<Vec<SigningRequest>>,
}

impl MockSigner {
    pub fn approving() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        let signer = Self::default();
        signer.reject.store(true, Ordering::SeqCst);
        signer
    }

    pub fn requests(&self) -> Vec<SigningRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl TxSigner for MockSigner {
    async fn sign(&self, request: SigningRequest) -> Result<TxId, TxError> {
        let mut requests = lock(&self.requests);
        requests.push(request);
        if self.reject.load(Ordering::SeqCst) {
            return Err(TxError::SigningRejected {
                message: "user cancelled".to_string(),
            });
        }
        Ok(TxId::new(format!("0x{:064x}", requests.len())))
    }
}

/// Tracker that keeps the ids it was handed
#[derive(Debug, Default)]
pub struct RecordingTracker {
    pending: Mutex<Vec<TxId>>,
}

impl RecordingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<TxId> {
        lock(&self.pending).clone()
    }
}

impl PendingTxTracker for RecordingTracker {
    fn add_pending(&self, tx_id: TxId) {
        lock(&self.pending).push(tx_id);
    }
}
