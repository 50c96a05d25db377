//! Chain RPC client with timeout and failover handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint (primary + failovers)
//! - Query chain state (chain ID, nonce, gas price, transactions, receipts, code)
//! - Submit raw signed transactions
//! - Bound every call by the short RPC timeout

use alloy::consensus::Transaction as ConsensusTransaction;
use alloy::network::{TransactionBuilder, TransactionResponse};
use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::chain::rpc::ChainRpc;
use crate::chain::types::{ChainError, ChainResult, ReceiptInfo, TransactionInfo};
use crate::config::ChainConfig;
use crate::observability::metrics;

/// Alloy-backed chain client with failover support.
#[derive(Clone)]
pub struct AlloyChainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Configuration.
    config: ChainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl AlloyChainClient {
    /// Create a new client. No network traffic happens here.
    ///
    /// An unparseable primary URL is an error; unparseable failovers are skipped.
    pub fn new(config: ChainConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e: url::ParseError| {
            ChainError::InvalidUrl {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            }
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::debug!(
            rpc_url = %config.rpc_url,
            failovers = providers.len() - 1,
            "Chain client created"
        );

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Run `f` against each provider in turn until one answers.
    ///
    /// JSON-RPC error responses are authoritative and returned immediately; only
    /// transport failures and timeouts move on to the next provider.
    async fn call_with_failover<T, F, Fut>(&self, op: &'static str, f: F) -> ChainResult<T>
    where
        F: Fn(Arc<dyn Provider + Send + Sync>) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let started = Instant::now();
        let mut last_error = None;

        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, f(provider.clone())).await {
                Ok(Ok(result)) => {
                    metrics::record_rpc(op, "ok", started);
                    return Ok(result);
                }
                Ok(Err(e)) => {
                    if let Some(payload) = e.as_error_resp() {
                        metrics::record_rpc(op, "rejected", started);
                        return Err(ChainError::Rejected {
                            op,
                            code: payload.code,
                            message: payload.message.to_string(),
                        });
                    }
                    tracing::warn!(provider_idx = i, operation = op, error = %e, "RPC error, trying next provider");
                    last_error = Some(ChainError::Transport {
                        op,
                        message: e.to_string(),
                    });
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, operation = op, "RPC timeout, trying next provider");
                    last_error = Some(ChainError::Timeout {
                        op,
                        secs: self.timeout_duration.as_secs(),
                    });
                }
            }
        }

        metrics::record_rpc(op, "failed", started);
        Err(last_error.unwrap_or(ChainError::Transport {
            op,
            message: "no RPC providers configured".to_string(),
        }))
    }
}

/// Failover for `eth_sendRawTransaction`.
///
/// A timeout or transport error leaves it unknown whether the node took the
/// transaction. After such an attempt, a later node answering that it already has
/// it counts as accepted under the locally computed hash.
async fn submit_with_failover<F, Fut>(
    attempts: usize,
    per_call: Duration,
    local_hash: TxHash,
    send: F,
) -> ChainResult<TxHash>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = TransportResult<TxHash>>,
{
    const OP: &str = "eth_sendRawTransaction";
    let started = Instant::now();
    let mut maybe_delivered = false;
    let mut last_error = None;

    for i in 0..attempts {
        match timeout(per_call, send(i)).await {
            Ok(Ok(hash)) => {
                metrics::record_rpc(OP, "ok", started);
                return Ok(hash);
            }
            Ok(Err(e)) => {
                if let Some(payload) = e.as_error_resp() {
                    if maybe_delivered && is_already_known(&payload.message) {
                        tracing::warn!(
                            provider_idx = i,
                            tx_hash = %local_hash,
                            message = %payload.message,
                            "Transaction already known after an unanswered submission"
                        );
                        metrics::record_rpc(OP, "ok", started);
                        return Ok(local_hash);
                    }
                    metrics::record_rpc(OP, "rejected", started);
                    return Err(ChainError::Rejected {
                        op: OP,
                        code: payload.code,
                        message: payload.message.to_string(),
                    });
                }
                tracing::warn!(provider_idx = i, operation = OP, error = %e, "RPC error, trying next provider");
                maybe_delivered = true;
                last_error = Some(ChainError::Transport {
                    op: OP,
                    message: e.to_string(),
                });
            }
            Err(_) => {
                tracing::warn!(provider_idx = i, operation = OP, "RPC timeout, trying next provider");
                maybe_delivered = true;
                last_error = Some(ChainError::Timeout {
                    op: OP,
                    secs: per_call.as_secs(),
                });
            }
        }
    }

    metrics::record_rpc(OP, "failed", started);
    Err(last_error.unwrap_or(ChainError::Transport {
        op: OP,
        message: "no RPC providers configured".to_string(),
    }))
}

/// Node messages meaning "this exact transaction is already in my pool or chain".
fn is_already_known(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    ["already known", "known transaction", "already imported", "nonce too low"]
        .iter()
        .any(|needle| message.contains(needle))
}

#[async_trait]
impl ChainRpc for AlloyChainClient {
    async fn chain_id(&self) -> ChainResult<u64> {
        self.call_with_failover("eth_chainId", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn pending_nonce(&self, address: Address) -> ChainResult<u64> {
        self.call_with_failover("eth_getTransactionCount", |p| async move {
            p.get_transaction_count(address).pending().await
        })
        .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.call_with_failover("eth_gasPrice", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn estimate_deploy_gas(&self, from: Address, payload: Bytes) -> ChainResult<u64> {
        let request = TransactionRequest::default()
            .with_from(from)
            .with_deploy_code(payload);

        self.call_with_failover("eth_estimateGas", |p| {
            let request = request.clone();
            async move { p.estimate_gas(request).await }
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash> {
        let local_hash = keccak256(&raw[..]);
        submit_with_failover(self.providers.len(), self.timeout_duration, local_hash, |i| {
            let provider = self.providers[i].clone();
            let raw = raw.clone();
            async move {
                let pending = provider.send_raw_transaction(&raw).await?;
                Ok(*pending.tx_hash())
            }
        })
        .await
    }

    async fn transaction_receipt(&self, hash: TxHash) -> ChainResult<Option<ReceiptInfo>> {
        let receipt = self
            .call_with_failover("eth_getTransactionReceipt", |p| async move {
                p.get_transaction_receipt(hash).await
            })
            .await?;

        Ok(receipt.and_then(|r| {
            // Some nodes hand out receipts for pending transactions without a block.
            let block_number = r.block_number?;
            Some(ReceiptInfo {
                tx_hash: r.transaction_hash,
                block_number,
                gas_used: r.gas_used,
                effective_gas_price: r.effective_gas_price,
                contract_address: r.contract_address,
                success: r.status(),
            })
        }))
    }

    async fn transaction_by_hash(&self, hash: TxHash) -> ChainResult<Option<TransactionInfo>> {
        let tx = self
            .call_with_failover("eth_getTransactionByHash", |p| async move {
                p.get_transaction_by_hash(hash).await
            })
            .await?;

        Ok(tx.map(|tx| TransactionInfo {
            hash: TransactionResponse::tx_hash(&tx),
            from: TransactionResponse::from(&tx),
            nonce: ConsensusTransaction::nonce(&tx),
            gas_price: tx
                .effective_gas_price
                .unwrap_or_else(|| ConsensusTransaction::max_fee_per_gas(&tx)),
            block_number: TransactionResponse::block_number(&tx),
        }))
    }

    async fn block_number(&self) -> ChainResult<u64> {
        self.call_with_failover("eth_blockNumber", |p| async move { p.get_block_number().await })
            .await
    }

    async fn code_at(&self, address: Address) -> ChainResult<Bytes> {
        self.call_with_failover("eth_getCode", |p| async move { p.get_code_at(address).await })
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes> {
        let request = TransactionRequest::default().with_to(to).with_input(data);

        self.call_with_failover("eth_call", |p| {
            let request = request.clone();
            async move { p.call(request).await }
        })
        .await
    }
}

impl std::fmt::Debug for AlloyChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlloyChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &self.config.failover_urls.len())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
