//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur talking to the chain node.
///
/// Every variant names the RPC operation so callers can decide on retries.
#[derive(Debug, Clone, Error)]
pub enum ChainError {
    /// Connection or transport failure.
    #[error("{op}: RPC transport error: {message}")]
    Transport { op: &'static str, message: String },

    /// The node answered with a JSON-RPC error (e.g. nonce too low, underpriced).
    #[error("{op}: node rejected request ({code}): {message}")]
    Rejected {
        op: &'static str,
        code: i64,
        message: String,
    },

    /// The call did not complete within the short RPC timeout.
    #[error("{op}: RPC timeout after {secs} seconds")]
    Timeout { op: &'static str, secs: u64 },

    /// RPC URL could not be parsed.
    #[error("Invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl ChainError {
    /// Whether the node itself refused the request, as opposed to being unreachable.
    pub fn is_rejection(&self) -> bool {
        matches!(self, ChainError::Rejected { .. })
    }

    /// The RPC operation that failed, if any.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ChainError::Transport { op, .. }
            | ChainError::Rejected { op, .. }
            | ChainError::Timeout { op, .. } => Some(op),
            _ => None,
        }
    }
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// The parts of a transaction receipt the deployer cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptInfo {
    /// Hash of the mined transaction.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// Gas consumed by execution.
    pub gas_used: u64,
    /// Price actually paid per unit of gas, in wei.
    pub effective_gas_price: u128,
    /// Address of the created contract, for contract-creation transactions.
    pub contract_address: Option<Address>,
    /// Receipt status flag (`true` = 1).
    pub success: bool,
}

/// A transaction as the node currently sees it, mined or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub hash: TxHash,
    pub from: Address,
    pub nonce: u64,
    /// Effective price once mined, otherwise the offered (max) price.
    pub gas_price: u128,
    /// `None` while the transaction sits in the mempool.
    pub block_number: Option<u64>,
}
