//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every `notified()` future resolves
//!     → in-flight confirmation waits return hash-only results
//! ```
//!
//! # Design Decisions
//! - Cancelling a deployment never aborts a submitted transaction; it only stops
//!   waiting for the receipt

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
