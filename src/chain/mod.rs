//! Chain connector subsystem.
//!
//! # Data Flow
//! ```text
//! ChainConfig (RPC URL + failovers, short timeout)
//!     → client.rs (alloy providers, per-call timeout, failover)
//!     → rpc.rs (ChainRpc: the only surface the deployer uses)
//!     → types.rs (ChainError with operation names, ReceiptInfo)
//! ```
//!
//! # Design Decisions
//! - Every call is bounded by the short RPC timeout; the long receipt wait lives in
//!   the broadcaster, not here
//! - JSON-RPC error responses are final and never failed over
//! - No retries beyond failover; retry policy belongs to callers

pub mod client;
pub mod rpc;
pub mod types;

pub use client::AlloyChainClient;
pub use rpc::ChainRpc;
pub use types::{ChainError, ChainId, ChainResult, ReceiptInfo, TransactionInfo};
