//! Error types of the deployment pipeline.

use alloy::primitives::TxHash;
use thiserror::Error;

use crate::chain::ChainError;
use crate::compiler::CompileError;
use crate::signer::KeyError;

/// Malformed constructor or call arguments.
#[derive(Debug, Clone, Error)]
pub enum EncodingError {
    #[error("Arguments must be a JSON array: {0}")]
    InvalidJson(String),

    #[error("Expected {expected} arguments, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("Contract has no constructor but {0} arguments were supplied")]
    NoConstructor(usize),

    #[error("Argument {index} ({ty}): {reason}")]
    InvalidArgument {
        index: usize,
        ty: String,
        reason: String,
    },

    #[error("Unsupported parameter type '{ty}': {reason}")]
    UnsupportedType { ty: String, reason: String },

    #[error("Function '{name}' taking {arity} arguments not found in ABI")]
    FunctionNotFound { name: String, arity: usize },

    #[error("Invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("ABI encoding failed: {0}")]
    Abi(String),
}

/// Failure turning an artifact into a signed transaction.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Signing key unavailable: {0}")]
    Key(#[from] KeyError),

    #[error("Failed to encode deployment payload: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Gas limit must be greater than zero")]
    InvalidGasLimit,

    #[error("Chain query failed during build: {0}")]
    Chain(#[from] ChainError),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// The node refused or never received a transaction.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Node rejected transaction {tx_hash}: {source}")]
    Rejected { tx_hash: TxHash, source: ChainError },

    #[error("Failed to submit transaction {tx_hash}: {source}")]
    Chain { tx_hash: TxHash, source: ChainError },

    /// Cancellation arrived before the broadcast; the node never saw the transaction.
    #[error("Deployment cancelled before transaction {tx_hash} was broadcast")]
    Cancelled { tx_hash: TxHash },
}

impl SubmitError {
    pub(crate) fn new(tx_hash: TxHash, source: ChainError) -> Self {
        if source.is_rejection() {
            SubmitError::Rejected { tx_hash, source }
        } else {
            SubmitError::Chain { tx_hash, source }
        }
    }
}

/// Failure looking up a transaction.
#[derive(Debug, Error)]
pub enum StatusError {
    #[error("Invalid transaction hash '{0}'")]
    InvalidHash(String),

    #[error("Status query failed: {0}")]
    Chain(#[from] ChainError),
}

/// Failure producing a cost estimate.
#[derive(Debug, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Signing key unavailable: {0}")]
    Key(#[from] KeyError),

    #[error("Failed to encode deployment payload: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Gas estimation failed: {0}")]
    Chain(#[from] ChainError),
}

/// Failure running a verification. A mismatch is not an error.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Invalid contract address '{0}'")]
    InvalidAddress(String),

    #[error("Failed to encode constructor arguments: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Failed to fetch deployed code: {0}")]
    Chain(#[from] ChainError),
}

/// Failure running a read-only contract call.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("Failed to encode call: {0}")]
    Encoding(#[from] EncodingError),

    #[error("Contract call failed: {0}")]
    Chain(#[from] ChainError),
}

/// Failure anywhere in compile → build → submit.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}

/// Failure bringing up the orchestrator.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Chain(#[from] ChainError),
}
