//! Compiler adapter subsystem.
//!
//! # Data Flow
//! ```text
//! Source text
//!     → solc.rs (scoped temp file, external solc process, timeout)
//!     → artifact.rs (CompilationOutput: name → {ABI, creation + runtime bytecode})
//!     → CompilationOutput::select(hint) → one CompiledArtifact
//! ```
//!
//! # Design Decisions
//! - Artifacts are keyed by name in a `BTreeMap` so selection is deterministic
//! - No hint + several contracts is an error, never a guess

pub mod artifact;
pub mod solc;

use async_trait::async_trait;

pub use artifact::{CompilationOutput, CompileError, CompiledArtifact};
pub use solc::SolcCompiler;

/// A Solidity toolchain.
#[async_trait]
pub trait SolidityCompiler: Send + Sync {
    /// Compile `source` into its deployable contracts.
    async fn compile(&self, source: &str) -> Result<CompilationOutput, CompileError>;
}
