//! Per-key nonce sequencing.
//!
//! # Responsibilities
//! - Own the authoritative "next nonce" for every signing key
//! - Serialize build→submit per key so no two transactions share a nonce
//! - Re-read the node's pending nonce after any failed submission
//!
//! # Design Decisions
//! - One `tokio::sync::Mutex` per key, held as an owned guard inside a [`NonceLease`]
//! - The counter advances only on [`NonceLease::commit`]; dropping a lease is a no-op

use alloy::primitives::Address;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::chain::{ChainResult, ChainRpc};
use crate::observability::metrics;

/// Local nonce state of one key. `None` means "ask the node".
#[derive(Debug, Default)]
struct KeyNonce {
    next: Option<u64>,
}

/// Registry of nonce counters, one per signing key.
#[derive(Debug, Default)]
pub struct NonceSequencer {
    keys: DashMap<Address, Arc<Mutex<KeyNonce>>>,
}

impl NonceSequencer {
    /// Create an empty sequencer.
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, address: Address) -> Arc<Mutex<KeyNonce>> {
        self.keys.entry(address).or_default().clone()
    }

    /// Reset the local counter for `address` to the node's pending nonce.
    pub async fn reconcile(&self, chain: &dyn ChainRpc, address: Address) -> ChainResult<u64> {
        let slot = self.slot(address);
        let mut state = slot.lock().await;

        let pending = chain.pending_nonce(address).await?;
        state.next = Some(pending);

        tracing::info!(address = %address, nonce = pending, "Nonce counter reconciled");
        Ok(pending)
    }

    /// Reserve the next nonce for `address`.
    ///
    /// Waits until no other lease for the same key is outstanding.
    pub async fn lease(&self, chain: &dyn ChainRpc, address: Address) -> ChainResult<NonceLease> {
        let mut guard = self.slot(address).lock_owned().await;

        let nonce = match guard.next {
            Some(next) => next,
            None => {
                let pending = chain.pending_nonce(address).await?;
                metrics::record_nonce_resync();
                tracing::debug!(address = %address, nonce = pending, "Nonce counter resynced");
                guard.next = Some(pending);
                pending
            }
        };

        Ok(NonceLease {
            address,
            nonce,
            guard,
        })
    }

    /// The nonce the next lease would hand out, if known locally.
    pub async fn peek(&self, address: Address) -> Option<u64> {
        let slot = self.keys.get(&address).map(|entry| entry.value().clone())?;
        let state = slot.lock().await;
        state.next
    }
}

/// Exclusive claim on one nonce of one key.
pub struct NonceLease {
    address: Address,
    nonce: u64,
    guard: OwnedMutexGuard<KeyNonce>,
}

impl NonceLease {
    /// The reserved nonce.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// The key the nonce belongs to.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The node accepted a transaction with this nonce.
    pub fn commit(mut self) {
        self.guard.next = Some(self.nonce.saturating_add(1));
    }

    /// Submission failed; the next lease re-reads the pending nonce.
    pub fn invalidate(mut self) {
        self.guard.next = None;
    }
}

impl std::fmt::Debug for NonceLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NonceLease")
            .field("address", &self.address)
            .field("nonce", &self.nonce)
            .finish()
    }
}
