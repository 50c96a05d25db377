//! Compilation results and contract selection.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors produced while compiling source or picking a contract from the output.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler executable could not be started.
    #[error("Solidity compiler not found at '{path}'")]
    ToolchainUnavailable { path: String },

    /// Temp file or process I/O failed.
    #[error("Compiler I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The compiler did not finish in time.
    #[error("Compilation timed out after {secs} seconds")]
    Timeout { secs: u64 },

    /// The compiler rejected the source.
    #[error("Compilation failed:\n{0}")]
    Diagnostics(String),

    /// The compiler's output could not be understood.
    #[error("Invalid compiler output: {0}")]
    InvalidOutput(String),

    /// Compilation succeeded but produced nothing deployable.
    #[error("Source produced no deployable contracts")]
    NoContracts,

    /// Several contracts were produced and no name was given.
    #[error("Source defines several contracts ({}); specify a contract name", .candidates.join(", "))]
    AmbiguousContract { candidates: Vec<String> },

    /// No contract name contains the given hint.
    #[error("No contract name contains '{hint}' (available: {})", .candidates.join(", "))]
    NoMatchingContract {
        hint: String,
        candidates: Vec<String>,
    },
}

/// One deployable contract produced by the compiler.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledArtifact {
    /// Contract name without the source path.
    pub name: String,
    /// Contract ABI.
    pub abi: JsonAbi,
    /// Creation bytecode (what a deployment transaction carries).
    pub bytecode: Bytes,
    /// Runtime bytecode (what ends up stored at the contract address).
    pub runtime_bytecode: Bytes,
}

/// All deployable contracts of one compile call, keyed by name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompilationOutput {
    pub artifacts: BTreeMap<String, CompiledArtifact>,
    pub compiler_version: Option<String>,
}

impl CompilationOutput {
    /// Contract names in selection order.
    pub fn names(&self) -> Vec<String> {
        self.artifacts.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&CompiledArtifact> {
        self.artifacts.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledArtifact> {
        self.artifacts.values()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Pick the contract to deploy.
    ///
    /// With a hint, the first contract (by name) whose name contains it, case-sensitive.
    /// Without one, the only contract; several contracts without a hint is an error
    /// rather than a guess.
    pub fn select(&self, hint: Option<&str>) -> Result<&CompiledArtifact, CompileError> {
        if self.artifacts.is_empty() {
            return Err(CompileError::NoContracts);
        }

        match hint.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hint) => self
                .artifacts
                .values()
                .find(|artifact| artifact.name.contains(hint))
                .ok_or_else(|| CompileError::NoMatchingContract {
                    hint: hint.to_string(),
                    candidates: self.names(),
                }),
            None => {
                let mut iter = self.artifacts.values();
                match (iter.next(), iter.next()) {
                    (Some(only), None) => Ok(only),
                    _ => Err(CompileError::AmbiguousContract {
                        candidates: self.names(),
                    }),
                }
            }
        }
    }
}
