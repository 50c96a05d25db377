//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, decimals in range)
//! - Check that every RPC URL parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DeployerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::DeployerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &DeployerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.chain.rpc_url) {
        errors.push(ValidationError::new(
            "chain.rpc_url",
            format!("invalid URL '{}': {}", config.chain.rpc_url, e),
        ));
    }
    for (i, failover) in config.chain.failover_urls.iter().enumerate() {
        if let Err(e) = url::Url::parse(failover) {
            errors.push(ValidationError::new(
                format!("chain.failover_urls[{}]", i),
                format!("invalid URL '{}': {}", failover, e),
            ));
        }
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.chain.native_decimals > 36 {
        errors.push(ValidationError::new("chain.native_decimals", "must be at most 36"));
    }

    if config.compiler.solc_path.trim().is_empty() {
        errors.push(ValidationError::new("compiler.solc_path", "must not be empty"));
    }
    if config.compiler.timeout_secs == 0 {
        errors.push(ValidationError::new("compiler.timeout_secs", "must be greater than 0"));
    }

    if config.signer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("signer.private_key_env", "must not be empty"));
    }

    let deployment = &config.deployment;
    if deployment.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "deployment.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if deployment.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "deployment.receipt_poll_interval_ms",
            "must be greater than 0",
        ));
    } else if deployment.receipt_poll_interval_ms
        >= deployment.confirmation_timeout_secs.saturating_mul(1000)
    {
        errors.push(ValidationError::new(
            "deployment.receipt_poll_interval_ms",
            "must be shorter than the confirmation timeout",
        ));
    }
    if deployment.default_gas_limit == 0 {
        errors.push(ValidationError::new("deployment.default_gas_limit", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
