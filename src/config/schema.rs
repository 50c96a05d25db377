//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the deployer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the contract deployer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DeployerConfig {
    /// Chain RPC connection settings.
    pub chain: ChainConfig,

    /// Solidity toolchain settings.
    pub compiler: CompilerConfig,

    /// Signing key source.
    pub signer: SignerConfig,

    /// Broadcast and confirmation settings.
    pub deployment: DeploymentConfig,

    /// Contract record store settings.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Chain RPC connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs, tried in order after the primary.
    pub failover_urls: Vec<String>,

    /// Chain ID the node must report. `None` accepts whatever the node says.
    pub expected_chain_id: Option<u64>,

    /// Timeout for every short chain query, in seconds.
    pub rpc_timeout_secs: u64,

    /// Decimals of the native unit (10^18 wei per ether).
    pub native_decimals: u8,

    /// Symbol of the native unit, used for display only.
    pub native_symbol: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            failover_urls: Vec::new(),
            expected_chain_id: None,
            rpc_timeout_secs: 10,
            native_decimals: 18,
            native_symbol: "ETH".to_string(),
        }
    }
}

/// Solidity compiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Path or name of the `solc` executable.
    pub solc_path: String,

    /// Extra arguments passed before the source file (e.g. `--optimize`).
    pub extra_args: Vec<String>,

    /// Maximum wall time for one compiler run, in seconds.
    pub timeout_secs: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            solc_path: "solc".to_string(),
            extra_args: Vec::new(),
            timeout_secs: 60,
        }
    }
}

/// Signing key configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SignerConfig {
    /// Environment variable holding the hex-encoded private key.
    pub private_key_env: String,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            private_key_env: crate::signer::DEFAULT_PRIVATE_KEY_ENV.to_string(),
        }
    }
}

/// Deployment broadcast configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// How long to wait for a receipt before returning a hash-only result, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_interval_ms: u64,

    /// Gas limit used by the contract service when the caller omits one.
    pub default_gas_limit: u64,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_secs: 120,
            receipt_poll_interval_ms: 1000,
            default_gas_limit: 4_000_000,
        }
    }
}

/// Contract record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file the in-memory store is mirrored to. `None` keeps records in memory only.
    pub persistence_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
