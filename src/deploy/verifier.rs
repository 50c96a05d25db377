//! Best-effort comparison of compiled bytecode against on-chain code.
//!
//! Not a proof: immutable references, library links and constructor side effects
//! are not modelled. The [`Confidence`] in the report says which rule matched.

use alloy::primitives::Address;
use std::sync::Arc;

use crate::chain::ChainRpc;
use crate::compiler::{CompilationOutput, CompiledArtifact};
use crate::deploy::encoding;
use crate::deploy::error::VerifyError;
use crate::deploy::types::{Confidence, VerificationReport};

pub struct SourceVerifier {
    chain: Arc<dyn ChainRpc>,
}

impl SourceVerifier {
    pub fn new(chain: Arc<dyn ChainRpc>) -> Self {
        Self { chain }
    }

    /// Check whether any contract in `output` matches the code at `address`.
    pub async fn verify(
        &self,
        address: Address,
        output: &CompilationOutput,
        constructor_args: Option<&str>,
    ) -> Result<VerificationReport, VerifyError> {
        let deployed = self.chain.code_at(address).await?;
        if deployed.is_empty() {
            tracing::info!(address = %address, "No code at address");
            return Ok(VerificationReport::unverified());
        }

        for artifact in output.iter() {
            let Some(confidence) = match_bytecode(&deployed, artifact) else {
                continue;
            };

            let args = encoding::parse_args(constructor_args)?;
            let encoded_constructor_args = if args.is_empty() {
                None
            } else {
                Some(encoding::encode_constructor(&artifact.abi, &args)?)
            };

            tracing::info!(
                address = %address,
                contract = %artifact.name,
                confidence = ?confidence,
                "Source verified"
            );

            return Ok(VerificationReport {
                verified: true,
                contract_name: Some(artifact.name.clone()),
                confidence,
                encoded_constructor_args,
            });
        }

        tracing::info!(address = %address, candidates = output.len(), "Source does not match deployed code");
        Ok(VerificationReport::unverified())
    }
}

/// Parse a `0x`-prefixed contract address.
pub fn parse_address(text: &str) -> Result<Address, VerifyError> {
    text.trim()
        .parse::<Address>()
        .map_err(|_| VerifyError::InvalidAddress(text.to_string()))
}

/// Match rule for one artifact, strongest first.
pub fn match_bytecode(deployed: &[u8], artifact: &CompiledArtifact) -> Option<Confidence> {
    let runtime: &[u8] = &artifact.runtime_bytecode;
    let creation: &[u8] = &artifact.bytecode;

    if deployed.is_empty() {
        return None;
    }

    if !runtime.is_empty() && deployed == runtime {
        return Some(Confidence::Exact);
    }

    if (!runtime.is_empty() && deployed.starts_with(runtime))
        || (!creation.is_empty() && deployed.starts_with(creation))
    {
        return Some(Confidence::Prefix);
    }

    match (strip_metadata(deployed), strip_metadata(runtime)) {
        (Some(a), Some(b)) if !a.is_empty() && a == b => Some(Confidence::MetadataStripped),
        _ => None,
    }
}

/// Bytecode without the trailing CBOR metadata section.
///
/// solc appends `<cbor map><u16 big-endian length>`; `None` when no plausible
/// section is present.
pub fn strip_metadata(code: &[u8]) -> Option<&[u8]> {
    let n = code.len();
    if n < 2 {
        return None;
    }

    let len = usize::from(u16::from_be_bytes([code[n - 2], code[n - 1]]));
    let total = len + 2;
    if len == 0 || total > n {
        return None;
    }

    let body = &code[..n - total];
    // CBOR map major type
    match code[n - total] {
        0xa0..=0xbf => Some(body),
        _ => None,
    }
}
