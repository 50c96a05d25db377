//! Smart-contract deployment and transaction-lifecycle orchestrator.
//!
//! # Architecture Overview
//!
//! ```text
//!   Solidity source
//!        │
//!        ▼
//!   ┌──────────┐   artifact   ┌──────────┐  signed tx   ┌─────────────┐
//!   │ compiler │─────────────▶│  deploy  │─────────────▶│   deploy    │──▶ DeploymentResult
//!   │  (solc)  │              │ builder  │  + nonce     │ broadcaster │    (full or hash-only)
//!   └──────────┘              └────┬─────┘    lease     └──────┬──────┘
//!        ▲                         │                           │
//!        │                    ┌────▼─────┐                ┌────▼─────┐
//!        │                    │  signer  │                │  chain   │◀── status / estimate /
//!        │                    │ wallet + │                │ ChainRpc │    verify / call
//!        │                    │ sequencer│                └──────────┘
//!        │                    └──────────┘
//!   ┌────┴─────────────────────────────────────────────┐
//!   │ orchestrator (facade) ◀── contracts (records,    │
//!   │                            store, service)       │
//!   └──────────────────────────────────────────────────┘
//!   Cross-cutting: config, observability, lifecycle
//! ```

// Core subsystems
pub mod chain;
pub mod compiler;
pub mod deploy;
pub mod orchestrator;
pub mod signer;

// Persistence collaborator
pub mod contracts;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::DeployerConfig;
pub use lifecycle::Shutdown;
pub use orchestrator::{DeploymentSettings, Orchestrator};
