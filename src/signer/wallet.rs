//! Signing key management.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use thiserror::Error;

/// Errors resolving the signing key.
#[derive(Debug, Clone, Error)]
pub enum KeyError {
    /// The configured environment variable is unset or empty.
    #[error("Environment variable {var} not set")]
    Missing { var: String },

    /// The value could not be parsed as a secp256k1 private key.
    #[error("Invalid private key: {0}")]
    Invalid(String),
}

/// The process-wide signing key.
#[derive(Clone)]
pub struct Wallet {
    signer: PrivateKeySigner,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, KeyError> {
        let key_hex = private_key_hex.trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| KeyError::Invalid(format!("{}", e)))?;

        tracing::info!(address = %signer.address(), "Signing key loaded");

        Ok(Self { signer })
    }

    /// Load the key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, KeyError> {
        Self::from_lookup(var, |name| std::env::var(name).ok())
    }

    /// Load the key through an arbitrary variable lookup.
    pub fn from_lookup<F>(var: &str, lookup: F) -> Result<Self, KeyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(var) {
            Some(value) if !value.trim().is_empty() => Self::from_private_key(&value),
            _ => Err(KeyError::Missing {
                var: var.to_string(),
            }),
        }
    }

    /// Get the sender address derived from the key.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Network wallet used to sign transaction requests.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
