//! The chain node interface the deployer depends on.

use alloy::primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;

use crate::chain::types::{ChainResult, ReceiptInfo, TransactionInfo};

/// JSON-RPC surface of a chain node.
///
/// Implementations apply their own per-call timeout; none of these methods retry on
/// a node-side rejection.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `eth_chainId`.
    async fn chain_id(&self) -> ChainResult<u64>;

    /// `eth_getTransactionCount` at the `pending` block tag.
    async fn pending_nonce(&self, address: Address) -> ChainResult<u64>;

    /// `eth_gasPrice`, in wei.
    async fn gas_price(&self) -> ChainResult<u128>;

    /// `eth_estimateGas` for a contract creation with the given payload.
    async fn estimate_deploy_gas(&self, from: Address, payload: Bytes) -> ChainResult<u64>;

    /// `eth_sendRawTransaction`; returns the hash the node assigned.
    async fn send_raw_transaction(&self, raw: Bytes) -> ChainResult<TxHash>;

    /// `eth_getTransactionReceipt`; `None` while the transaction is not mined.
    async fn transaction_receipt(&self, hash: TxHash) -> ChainResult<Option<ReceiptInfo>>;

    /// `eth_getTransactionByHash`; `None` when the node does not know the hash.
    async fn transaction_by_hash(&self, hash: TxHash) -> ChainResult<Option<TransactionInfo>>;

    /// `eth_blockNumber`.
    async fn block_number(&self) -> ChainResult<u64>;

    /// `eth_getCode` at the latest block.
    async fn code_at(&self, address: Address) -> ChainResult<Bytes>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: Bytes) -> ChainResult<Bytes>;
}
