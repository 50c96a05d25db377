//! Advisory deployment cost estimation. Never signs, never broadcasts.

use alloy::primitives::Address;
use std::sync::Arc;

use crate::chain::ChainRpc;
use crate::compiler::CompiledArtifact;
use crate::deploy::encoding;
use crate::deploy::error::EstimateError;
use crate::deploy::types::{Cost, CostEstimate};

pub struct CostEstimator {
    chain: Arc<dyn ChainRpc>,
    native_decimals: u8,
}

impl CostEstimator {
    pub fn new(chain: Arc<dyn ChainRpc>, native_decimals: u8) -> Self {
        Self {
            chain,
            native_decimals,
        }
    }

    /// Estimated gas × current gas price for deploying `artifact` from `from`.
    pub async fn estimate(
        &self,
        from: Address,
        artifact: &CompiledArtifact,
        constructor_args: Option<&str>,
    ) -> Result<CostEstimate, EstimateError> {
        let payload = encoding::deployment_payload(artifact, constructor_args)?;

        let gas_estimate = self.chain.estimate_deploy_gas(from, payload).await?;
        let gas_price = self.chain.gas_price().await?;
        let cost = Cost::from_gas(gas_estimate, gas_price, self.native_decimals);

        tracing::debug!(
            contract = %artifact.name,
            gas = gas_estimate,
            gas_price = gas_price,
            wei = %cost.wei,
            "Deployment cost estimated"
        );

        Ok(CostEstimate {
            contract_name: artifact.name.clone(),
            gas_estimate,
            gas_price,
            cost,
        })
    }
}
