//! `solc` command-line adapter.
//!
//! # Responsibilities
//! - Write the source to a scoped temp file (removed on drop, including unwinding)
//! - Run `solc --combined-json abi,bin,bin-runtime` under the compile timeout
//! - Parse the combined JSON into named artifacts

use alloy::json_abi::JsonAbi;
use alloy::primitives::{hex, Bytes};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::compiler::artifact::{CompilationOutput, CompileError, CompiledArtifact};
use crate::compiler::SolidityCompiler;
use crate::config::CompilerConfig;
use crate::observability::metrics;

/// Compiler adapter backed by the `solc` executable.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    config: CompilerConfig,
}

impl SolcCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    async fn run(&self, source: &str) -> Result<CompilationOutput, CompileError> {
        if source.trim().is_empty() {
            return Err(CompileError::NoContracts);
        }

        let mut input = tempfile::Builder::new()
            .prefix("contract-")
            .suffix(".sol")
            .tempfile()?;
        input.write_all(source.as_bytes())?;
        input.flush()?;

        let mut command = Command::new(&self.config.solc_path);
        command
            .arg("--combined-json")
            .arg("abi,bin,bin-runtime")
            .args(&self.config.extra_args)
            .arg(input.path())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(solc = %self.config.solc_path, input = %input.path().display(), "Invoking compiler");

        let output = match timeout(
            Duration::from_secs(self.config.timeout_secs),
            command.output(),
        )
        .await
        {
            Err(_) => {
                return Err(CompileError::Timeout {
                    secs: self.config.timeout_secs,
                })
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CompileError::ToolchainUnavailable {
                    path: self.config.solc_path.clone(),
                })
            }
            Ok(Err(e)) => return Err(CompileError::Io(e)),
            Ok(Ok(output)) => output,
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(CompileError::Diagnostics(stderr.trim().to_string()));
        }
        if !stderr.trim().is_empty() {
            tracing::debug!(warnings = %stderr.trim(), "Compiler emitted warnings");
        }

        parse_combined_json(&output.stdout)
    }
}

#[async_trait]
impl SolidityCompiler for SolcCompiler {
    async fn compile(&self, source: &str) -> Result<CompilationOutput, CompileError> {
        let result = self.run(source).await;

        match &result {
            Ok(output) => {
                metrics::record_compile("ok");
                tracing::info!(contracts = ?output.names(), "Compilation succeeded");
            }
            Err(CompileError::Diagnostics(_)) => metrics::record_compile("rejected"),
            Err(e) => {
                metrics::record_compile("error");
                tracing::warn!(error = %e, "Compilation failed");
            }
        }

        result
    }
}

#[derive(Debug, Deserialize)]
struct CombinedJson {
    #[serde(default)]
    contracts: BTreeMap<String, CombinedContract>,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CombinedContract {
    #[serde(default)]
    abi: serde_json::Value,
    #[serde(default)]
    bin: String,
    #[serde(default, rename = "bin-runtime")]
    bin_runtime: String,
}

/// Parse `solc --combined-json` output.
///
/// Keys of the form `path:Name` are reduced to `Name`. Contracts without creation
/// bytecode (interfaces, abstract contracts) are skipped.
pub fn parse_combined_json(raw: &[u8]) -> Result<CompilationOutput, CompileError> {
    let parsed: CombinedJson = serde_json::from_slice(raw)
        .map_err(|e| CompileError::InvalidOutput(e.to_string()))?;

    let mut artifacts = BTreeMap::new();
    for (key, contract) in parsed.contracts {
        let name = key.rsplit_once(':').map_or(key.as_str(), |(_, n)| n).to_string();

        if contract.bin.trim().is_empty() {
            tracing::debug!(contract = %name, "Skipping contract without bytecode");
            continue;
        }

        let abi = parse_abi(&name, contract.abi)?;
        let bytecode = decode_bytecode(&name, &contract.bin)?;
        let runtime_bytecode = decode_bytecode(&name, &contract.bin_runtime)?;

        artifacts.insert(
            name.clone(),
            CompiledArtifact {
                name,
                abi,
                bytecode,
                runtime_bytecode,
            },
        );
    }

    if artifacts.is_empty() {
        return Err(CompileError::NoContracts);
    }

    Ok(CompilationOutput {
        artifacts,
        compiler_version: parsed.version,
    })
}

fn parse_abi(name: &str, value: serde_json::Value) -> Result<JsonAbi, CompileError> {
    let result = match value {
        serde_json::Value::Null => return Ok(JsonAbi::default()),
        // Older solc releases embed the ABI as a JSON string.
        serde_json::Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    };
    result.map_err(|e| CompileError::InvalidOutput(format!("ABI of {}: {}", name, e)))
}

fn decode_bytecode(name: &str, text: &str) -> Result<Bytes, CompileError> {
    if text.contains("__$") {
        return Err(CompileError::InvalidOutput(format!(
            "{} has unlinked library references",
            name
        )));
    }
    hex::decode(text.trim())
        .map(Bytes::from)
        .map_err(|e| CompileError::InvalidOutput(format!("bytecode of {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMBINED: &str = r#"{
        "contracts": {
            "/tmp/contract-abc.sol:IGreeter": {
                "abi": [{"type":"function","name":"greet","inputs":[],"outputs":[{"name":"","type":"string"}],"stateMutability":"view"}],
                "bin": "",
                "bin-runtime": ""
            },
            "/tmp/contract-abc.sol:Greeter": {
                "abi": "[{\"type\":\"constructor\",\"inputs\":[{\"name\":\"g\",\"type\":\"string\"}],\"stateMutability\":\"nonpayable\"}]",
                "bin": "6080604052",
                "bin-runtime": "60806040"
            }
        },
        "version": "0.8.26+commit.8a97fa7a.Linux.g++"
    }"#;

    #[test]
    fn test_parse_combined_json() {
        let output = parse_combined_json(COMBINED.as_bytes()).unwrap();

        assert_eq!(output.names(), vec!["Greeter"]);
        assert_eq!(
            output.compiler_version.as_deref(),
            Some("0.8.26+commit.8a97fa7a.Linux.g++")
        );

        let greeter = output.get("Greeter").unwrap();
        assert_eq!(&greeter.bytecode[..], &[0x60, 0x80, 0x60, 0x40, 0x52]);
        assert_eq!(&greeter.runtime_bytecode[..], &[0x60, 0x80, 0x60, 0x40]);
        assert_eq!(greeter.abi.constructor().unwrap().inputs.len(), 1);
    }

    #[test]
    fn test_interfaces_only_is_no_contracts() {
        let raw = r#"{"contracts":{"a.sol:I":{"abi":[],"bin":"","bin-runtime":""}}}"#;
        assert!(matches!(
            parse_combined_json(raw.as_bytes()),
            Err(CompileError::NoContracts)
        ));
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(
            parse_combined_json(b"not json"),
            Err(CompileError::InvalidOutput(_))
        ));
        let raw = r#"{"contracts":{"a.sol:A":{"abi":[],"bin":"zz","bin-runtime":""}}}"#;
        assert!(matches!(
            parse_combined_json(raw.as_bytes()),
            Err(CompileError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_unlinked_library_rejected() {
        let raw = r#"{"contracts":{"a.sol:A":{"abi":[],"bin":"6080__$abcdef$__","bin-runtime":""}}}"#;
        let err = parse_combined_json(raw.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unlinked"));
    }

    #[tokio::test]
    async fn test_missing_toolchain() {
        let compiler = SolcCompiler::new(CompilerConfig {
            solc_path: "solc-that-does-not-exist-7f3a".into(),
            ..CompilerConfig::default()
        });
        let err = compiler.compile("contract A {}").await.unwrap_err();
        assert!(matches!(err, CompileError::ToolchainUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_empty_source_skips_toolchain() {
        let compiler = SolcCompiler::new(CompilerConfig {
            solc_path: "solc-that-does-not-exist-7f3a".into(),
            ..CompilerConfig::default()
        });
        assert!(matches!(
            compiler.compile("   ").await,
            Err(CompileError::NoContracts)
        ));
    }

    #[tokio::test]
    #[ignore = "requires solc on PATH"]
    async fn test_real_solc_round() {
        let compiler = SolcCompiler::new(CompilerConfig::default());

        let output = compiler
            .compile("pragma solidity ^0.8.0; contract Counter { uint256 public n; function inc() external { n += 1; } }")
            .await
            .unwrap();
        assert_eq!(output.select(None).unwrap().name, "Counter");

        let err = compiler
            .compile("pragma solidity ^0.8.0; contract Broken { uint256 n }")
            .await
            .unwrap_err();
        assert!(matches!(err, CompileError::Diagnostics(_)));
    }
}
