//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (ETH_RPC_URL / ETH_CHAIN_ID / SOLC_PATH overrides)
//!     → validation.rs (semantic checks)
//!     → DeployerConfig (validated, immutable)
//!     → handed to Orchestrator::connect and ContractService
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::ChainConfig;
pub use schema::CompilerConfig;
pub use schema::DeployerConfig;
pub use schema::DeploymentConfig;
pub use schema::ObservabilityConfig;
pub use schema::SignerConfig;
pub use schema::StoreConfig;
