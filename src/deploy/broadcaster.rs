//! Transaction submission and confirmation tracking.
//!
//! # Responsibilities
//! - Submit signed transactions and settle the nonce lease
//! - Wait for the receipt under the long confirmation timeout
//! - Report a hash-only result when the wait ends first

use alloy::primitives::TxHash;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::chain::{ChainId, ChainRpc, ReceiptInfo};
use crate::deploy::error::SubmitError;
use crate::deploy::types::{Cost, DeploymentReceipt, DeploymentResult, PreparedDeployment};
use crate::observability::metrics;

/// Submits deployments and tracks them until mined.
pub struct Broadcaster {
    chain: Arc<dyn ChainRpc>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    native_decimals: u8,
}

impl Broadcaster {
    pub fn new(
        chain: Arc<dyn ChainRpc>,
        confirmation_timeout: Duration,
        poll_interval: Duration,
        native_decimals: u8,
    ) -> Self {
        Self {
            chain,
            confirmation_timeout,
            poll_interval,
            native_decimals,
        }
    }

    /// Submit `prepared` and wait for its receipt.
    ///
    /// A node rejection is an error. Running out of time is not: the result then
    /// carries only the hash.
    pub async fn deploy(&self, prepared: PreparedDeployment) -> Result<DeploymentResult, SubmitError> {
        self.deploy_with_cancel(prepared, std::future::pending::<()>())
            .await
    }

    /// Like [`Broadcaster::deploy`], but stops waiting as soon as `cancel` resolves.
    ///
    /// If `cancel` has already resolved nothing is broadcast and the nonce stays
    /// unused.
    pub async fn deploy_with_cancel<C>(
        &self,
        prepared: PreparedDeployment,
        cancel: C,
    ) -> Result<DeploymentResult, SubmitError>
    where
        C: Future<Output = ()> + Send,
    {
        let contract_name = prepared.contract_name.clone();
        let nonce = prepared.transaction.nonce;
        let chain_id = ChainId(prepared.transaction.chain_id);
        let gas_price = prepared.transaction.gas_price;

        tokio::pin!(cancel);
        let cancelled = tokio::select! {
            biased;
            _ = &mut cancel => true,
            _ = std::future::ready(()) => false,
        };
        if cancelled {
            metrics::record_deployment("cancelled");
            tracing::info!(
                tx_hash = %prepared.transaction.hash,
                nonce = nonce,
                "Cancelled before broadcast; transaction discarded"
            );
            return Err(SubmitError::Cancelled {
                tx_hash: prepared.transaction.hash,
            });
        }

        let tx_hash = self.submit(prepared).await?;

        let receipt = tokio::select! {
            receipt = self.wait_for_receipt(tx_hash) => receipt,
            _ = &mut cancel => {
                tracing::info!(tx_hash = %tx_hash, "Confirmation wait cancelled; transaction remains pending");
                None
            }
        };

        let receipt = receipt.map(|r| self.to_receipt(r));
        match &receipt {
            Some(r) if r.success => metrics::record_deployment("success"),
            Some(_) => metrics::record_deployment("reverted"),
            None => metrics::record_deployment("pending"),
        }

        Ok(DeploymentResult {
            tx_hash,
            contract_name,
            nonce,
            chain_id,
            gas_price,
            receipt,
        })
    }

    /// Send the raw transaction; commit the nonce on acceptance, invalidate otherwise.
    async fn submit(&self, prepared: PreparedDeployment) -> Result<TxHash, SubmitError> {
        let PreparedDeployment {
            transaction, lease, ..
        } = prepared;

        match self.chain.send_raw_transaction(transaction.raw.clone()).await {
            Ok(hash) => {
                if hash != transaction.hash {
                    tracing::warn!(
                        local = %transaction.hash,
                        node = %hash,
                        "Node returned a different transaction hash"
                    );
                }
                lease.commit();
                tracing::info!(tx_hash = %hash, nonce = transaction.nonce, "Transaction submitted");
                Ok(hash)
            }
            Err(e) => {
                lease.invalidate();
                metrics::record_deployment("submit_failed");
                tracing::warn!(
                    tx_hash = %transaction.hash,
                    nonce = transaction.nonce,
                    error = %e,
                    "Transaction submission failed"
                );
                Err(SubmitError::new(transaction.hash, e))
            }
        }
    }

    /// Poll for the receipt until it appears or the confirmation timeout elapses.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Option<ReceiptInfo> {
        let result = timeout(self.confirmation_timeout, async {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.chain.transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    }
                    // Already submitted; a failed poll is not a failed deployment.
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    }
                }
            }
        })
        .await;

        match result {
            Ok(receipt) => Some(receipt),
            Err(_) => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    timeout_secs = self.confirmation_timeout.as_secs(),
                    "Confirmation timeout; returning hash only"
                );
                None
            }
        }
    }

    fn to_receipt(&self, receipt: ReceiptInfo) -> DeploymentReceipt {
        if !receipt.success {
            tracing::warn!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "Deployment reverted");
        } else {
            tracing::info!(
                tx_hash = %receipt.tx_hash,
                block = receipt.block_number,
                contract_address = ?receipt.contract_address,
                "Deployment mined"
            );
        }

        DeploymentReceipt {
            contract_address: receipt.contract_address,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            gas_price: receipt.effective_gas_price,
            cost: Cost::from_gas(
                receipt.gas_used,
                receipt.effective_gas_price,
                self.native_decimals,
            ),
            success: receipt.success,
        }
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
