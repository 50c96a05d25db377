//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::DeployerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `chain.rpc_url`.
pub const RPC_URL_ENV: &str = "ETH_RPC_URL";
/// Overrides `chain.expected_chain_id`.
pub const CHAIN_ID_ENV: &str = "ETH_CHAIN_ID";
/// Overrides `compiler.solc_path`.
pub const SOLC_PATH_ENV: &str = "SOLC_PATH";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value '{}' in environment variable {}", value, var)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply environment overrides, and validate.
pub fn load_config(path: &Path) -> Result<DeployerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: DeployerConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config)
}

/// Build a configuration from defaults plus environment overrides only.
pub fn load_from_env() -> Result<DeployerConfig, ConfigError> {
    finish(DeployerConfig::default())
}

fn finish(mut config: DeployerConfig) -> Result<DeployerConfig, ConfigError> {
    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut DeployerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(RPC_URL_ENV).filter(|v| !v.is_empty()) {
        config.chain.rpc_url = url;
    }
    if let Some(raw) = lookup(CHAIN_ID_ENV).filter(|v| !v.is_empty()) {
        let chain_id = raw.trim().parse::<u64>().map_err(|_| ConfigError::Env {
            var: CHAIN_ID_ENV,
            value: raw.clone(),
        })?;
        config.chain.expected_chain_id = Some(chain_id);
    }
    if let Some(solc) = lookup(SOLC_PATH_ENV).filter(|v| !v.is_empty()) {
        config.compiler.solc_path = solc;
    }
    Ok(())
}
