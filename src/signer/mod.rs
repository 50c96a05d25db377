//! Key manager subsystem.
//!
//! # Data Flow
//! ```text
//! Environment variable (private key)
//!     → wallet.rs (key loading, sender address, signing wallet)
//!     → sequencer.rs (per-key nonce lease: build → submit → commit/invalidate)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys

pub mod sequencer;
pub mod wallet;

pub use sequencer::{NonceLease, NonceSequencer};
pub use wallet::{KeyError, Wallet};

/// Environment variable holding the signing key unless configured otherwise.
pub const DEFAULT_PRIVATE_KEY_ENV: &str = "ETH_PRIVATE_KEY";
