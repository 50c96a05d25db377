//! Transaction status lookup by hash.
//!
//! Idempotent and side-effect free: every call reflects the node's current view.

use alloy::primitives::TxHash;
use std::sync::Arc;

use crate::chain::{ChainRpc, TransactionInfo};
use crate::deploy::error::StatusError;
use crate::deploy::types::{Cost, MinedTransaction, TransactionStatus};

pub struct StatusPoller {
    chain: Arc<dyn ChainRpc>,
    native_decimals: u8,
}

impl StatusPoller {
    pub fn new(chain: Arc<dyn ChainRpc>, native_decimals: u8) -> Self {
        Self {
            chain,
            native_decimals,
        }
    }

    /// Current state of `tx_hash`. A missing receipt is `Pending`, not an error.
    pub async fn status(&self, tx_hash: TxHash) -> Result<TransactionStatus, StatusError> {
        let Some(receipt) = self.chain.transaction_receipt(tx_hash).await? else {
            if self.transaction(tx_hash).await?.is_some() {
                tracing::debug!(tx_hash = %tx_hash, "No receipt yet");
            } else {
                tracing::warn!(tx_hash = %tx_hash, "Transaction unknown to the node; it may have been dropped");
            }
            return Ok(TransactionStatus::Pending);
        };

        let current_block = self.chain.block_number().await?;

        let mined = MinedTransaction {
            block_number: receipt.block_number,
            confirmations: current_block.saturating_sub(receipt.block_number),
            gas_used: receipt.gas_used,
            gas_price: receipt.effective_gas_price,
            cost: Cost::from_gas(
                receipt.gas_used,
                receipt.effective_gas_price,
                self.native_decimals,
            ),
            contract_address: receipt.contract_address,
        };

        Ok(if receipt.success {
            TransactionStatus::Success(mined)
        } else {
            TransactionStatus::Failed(mined)
        })
    }

    /// The transaction itself, mined or still in the mempool.
    pub async fn transaction(&self, tx_hash: TxHash) -> Result<Option<TransactionInfo>, StatusError> {
        Ok(self.chain.transaction_by_hash(tx_hash).await?)
    }

    /// [`StatusPoller::status`] for a hex hash string.
    pub async fn status_of(&self, tx_hash: &str) -> Result<TransactionStatus, StatusError> {
        let hash = parse_tx_hash(tx_hash)?;
        self.status(hash).await
    }
}

/// Parse a `0x`-prefixed 32-byte transaction hash.
pub fn parse_tx_hash(text: &str) -> Result<TxHash, StatusError> {
    text.trim()
        .parse::<TxHash>()
        .map_err(|_| StatusError::InvalidHash(text.to_string()))
}
