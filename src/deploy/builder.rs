//! Deployment transaction building and signing.
//!
//! # Responsibilities
//! - Encode constructor arguments onto the creation bytecode
//! - Resolve chain ID, sender, nonce and gas price
//! - Sign a legacy (EIP-155) contract-creation transaction

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, TransactionBuilder};
use alloy::primitives::{Bytes, U256};
use alloy::rpc::types::TransactionRequest;
use std::sync::Arc;

use crate::chain::{ChainId, ChainRpc};
use crate::compiler::CompiledArtifact;
use crate::deploy::encoding;
use crate::deploy::error::BuildError;
use crate::deploy::types::{PreparedDeployment, SignedTransaction};
use crate::signer::{NonceSequencer, Wallet};

/// Builds signed deployment transactions.
pub struct TxBuilder {
    chain: Arc<dyn ChainRpc>,
    sequencer: Arc<NonceSequencer>,
    network: ChainId,
}

impl TxBuilder {
    /// Create a new transaction builder for the connector's `network`.
    pub fn new(chain: Arc<dyn ChainRpc>, sequencer: Arc<NonceSequencer>, network: ChainId) -> Self {
        Self {
            chain,
            sequencer,
            network,
        }
    }

    /// Build and sign a contract-creation transaction for `artifact`.
    ///
    /// # Arguments
    /// * `constructor_args` - JSON array of constructor arguments, if any
    /// * `chain_id_hint` - Target chain; 0 selects the connector's network
    /// * `gas_limit` - Gas limit of the creation transaction
    ///
    /// The returned deployment holds the sender's nonce lock until it is broadcast
    /// or dropped.
    pub async fn build(
        &self,
        wallet: &Wallet,
        artifact: &CompiledArtifact,
        constructor_args: Option<&str>,
        chain_id_hint: u64,
        gas_limit: u64,
    ) -> Result<PreparedDeployment, BuildError> {
        if gas_limit == 0 {
            return Err(BuildError::InvalidGasLimit);
        }

        // 1. Payload
        let payload = encoding::deployment_payload(artifact, constructor_args)?;

        // 2. Chain ID
        let chain_id = if chain_id_hint != 0 {
            if chain_id_hint != self.network.0 {
                tracing::warn!(
                    requested = chain_id_hint,
                    network = %self.network,
                    "Signing for a chain ID other than the connected network"
                );
            }
            chain_id_hint
        } else {
            self.network.0
        };

        // 3. Sender
        let sender = wallet.address();

        // 4. Nonce (locked until broadcast or drop)
        let lease = self.sequencer.lease(self.chain.as_ref(), sender).await?;
        let nonce = lease.nonce();

        // 5. Gas price
        let gas_price = self.chain.gas_price().await?;

        // 6. Transaction
        let tx = TransactionRequest::default()
            .with_from(sender)
            .with_deploy_code(payload)
            .with_value(U256::ZERO)
            .with_nonce(nonce)
            .with_gas_price(gas_price)
            .with_chain_id(chain_id)
            .with_gas_limit(gas_limit);

        // 7. Signature
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(
            tx,
            &wallet.ethereum_wallet(),
        )
        .await
        .map_err(|e| BuildError::Signing(e.to_string()))?;

        let transaction = SignedTransaction {
            raw: Bytes::from(envelope.encoded_2718()),
            hash: *envelope.tx_hash(),
            nonce,
            chain_id,
            sender,
            gas_price,
            gas_limit,
        };

        tracing::info!(
            contract = %artifact.name,
            tx_hash = %transaction.hash,
            nonce = nonce,
            chain_id = chain_id,
            gas_price = gas_price,
            gas_limit = gas_limit,
            "Deployment transaction signed"
        );

        Ok(PreparedDeployment {
            contract_name: artifact.name.clone(),
            transaction,
            lease,
        })
    }

    /// The network this builder defaults to.
    pub fn network(&self) -> ChainId {
        self.network
    }
}

impl std::fmt::Debug for TxBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxBuilder")
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
