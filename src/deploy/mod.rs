//! Deployment pipeline.
//!
//! # Data Flow
//! ```text
//! CompiledArtifact + constructor args (JSON)
//!     → encoding.rs (ABI-encode, append to bytecode)
//!     → builder.rs (chain ID, sender, nonce lease, gas price, sign)
//!     → PreparedDeployment (signed tx + nonce lease)
//!     → broadcaster.rs (submit, commit/invalidate lease, bounded receipt wait)
//!     → DeploymentResult (full, or hash-only)
//!
//! Read-only paths:
//!     estimator.rs (eth_estimateGas × gas price)
//!     status.rs (receipt + head block → TransactionStatus)
//!     verifier.rs (eth_getCode vs compiled bytecode → VerificationReport)
//! ```
//!
//! # Design Decisions
//! - A timed-out or cancelled confirmation wait is a hash-only success, not an error
//! - The nonce lock spans build → submit only, never the receipt wait
//! - No automatic retries; callers re-poll with the status lookup

pub mod broadcaster;
pub mod builder;
pub mod encoding;
pub mod error;
pub mod estimator;
pub mod status;
pub mod types;
pub mod verifier;

pub use broadcaster::Broadcaster;
pub use builder::TxBuilder;
pub use error::{
    BuildError, CallError, DeployError, EncodingError, EstimateError, SetupError, StatusError, SubmitError,
    VerifyError,
};
pub use estimator::CostEstimator;
pub use status::{parse_tx_hash, StatusPoller};
pub use types::{
    Confidence, Cost, CostEstimate, DeploymentReceipt, DeploymentRequest, DeploymentResult,
    MinedTransaction, PreparedDeployment, SignedTransaction, TransactionStatus,
    VerificationReport,
};
pub use verifier::{parse_address, SourceVerifier};
