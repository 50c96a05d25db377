//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields: tx_hash, nonce, operation)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr), installed by the binary
//!     → whatever metrics recorder the embedding process installs
//! ```

pub mod logging;
pub mod metrics;
