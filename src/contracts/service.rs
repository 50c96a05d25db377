//! Contract management operations on top of the orchestrator.
//!
//! # Responsibilities
//! - Create, fetch and list contract records
//! - Deploy a stored contract on behalf of its owner and record the outcome
//! - Settle pending deployments by re-polling their transaction
//! - Verify a deployed contract against its stored source

use std::sync::Arc;
use thiserror::Error;

use crate::contracts::record::{
    ContractPage, ContractQuery, ContractRecord, DeploymentInfo, DeploymentState, NewContract,
};
use crate::contracts::store::{ContractStore, StoreError};
use crate::deploy::{
    DeployError, DeploymentRequest, DeploymentResult, StatusError, TransactionStatus,
    VerificationReport, VerifyError,
};
use crate::orchestrator::Orchestrator;

/// Errors of the contract service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Contract {0} not found")]
    NotFound(String),

    #[error("User '{user}' may not deploy contract {contract_id}")]
    Forbidden { contract_id: String, user: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Store(StoreError),

    /// The transaction went out but the record still lacks it.
    #[error("Contract deployed (tx {}) but the record could not be updated: {source}", .info.tx_hash)]
    DeployedButNotRecorded {
        info: Box<DeploymentInfo>,
        source: StoreError,
    },
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

/// Request to deploy a stored contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeployContractRequest {
    pub contract_id: String,
    pub deployer_id: String,
    /// 0 selects the connected network.
    #[serde(default)]
    pub chain_id: u64,
    /// 0 selects the configured default.
    #[serde(default)]
    pub gas_limit: u64,
    #[serde(default)]
    pub constructor_args: Option<String>,
}

/// Contract management service.
pub struct ContractService {
    store: Arc<dyn ContractStore>,
    orchestrator: Arc<Orchestrator>,
    default_gas_limit: u64,
}

impl ContractService {
    pub fn new(
        store: Arc<dyn ContractStore>,
        orchestrator: Arc<Orchestrator>,
        default_gas_limit: u64,
    ) -> Self {
        Self {
            store,
            orchestrator,
            default_gas_limit,
        }
    }

    /// Store a new contract and return it with its generated ID.
    pub async fn create_contract(&self, draft: NewContract) -> Result<ContractRecord, ServiceError> {
        draft
            .validate()
            .map_err(|reason| ServiceError::InvalidInput(reason.into()))?;

        let record = ContractRecord::new(draft);
        self.store.insert(record.clone()).await?;

        tracing::info!(contract_id = %record.id, owner = %record.owner_id, "Contract created");
        Ok(record)
    }

    pub async fn get_contract(&self, id: &str) -> Result<ContractRecord, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    pub async fn list_contracts(&self, query: &ContractQuery) -> Result<ContractPage, ServiceError> {
        Ok(self.store.list(query).await?)
    }

    /// Deploy a stored contract and write the outcome back to its record.
    ///
    /// Only the owner may deploy. A hash-only result is recorded as pending.
    pub async fn deploy_contract(
        &self,
        request: &DeployContractRequest,
    ) -> Result<DeploymentResult, ServiceError> {
        let record = self.store.get(&request.contract_id).await?;

        if record.owner_id != request.deployer_id {
            tracing::warn!(
                contract_id = %record.id,
                deployer = %request.deployer_id,
                "Deployment refused: not the owner"
            );
            return Err(ServiceError::Forbidden {
                contract_id: record.id,
                user: request.deployer_id.clone(),
            });
        }

        let gas_limit = if request.gas_limit == 0 {
            self.default_gas_limit
        } else {
            request.gas_limit
        };

        let deployment = DeploymentRequest {
            source_code: record.source_code.clone(),
            constructor_args: request.constructor_args.clone(),
            chain_id: request.chain_id,
            gas_limit,
            contract_name: record.contract_name_hint().map(str::to_string),
        };

        let result = self.orchestrator.deploy_source(&deployment).await?;
        let info = DeploymentInfo::from_result(&result, &request.deployer_id);

        if let Err(source) = self
            .store
            .update_deployment(&record.id, result.contract_address(), info.clone())
            .await
        {
            tracing::error!(
                contract_id = %record.id,
                tx_hash = %result.tx_hash,
                error = %source,
                "Deployment succeeded but the record update failed"
            );
            return Err(ServiceError::DeployedButNotRecorded {
                info: Box::new(info),
                source,
            });
        }

        tracing::info!(
            contract_id = %record.id,
            tx_hash = %result.tx_hash,
            state = ?info.state,
            "Deployment recorded"
        );
        Ok(result)
    }

    /// Status of a deployment transaction by hash.
    pub async fn deployment_status(&self, tx_hash: &str) -> Result<TransactionStatus, ServiceError> {
        Ok(self.orchestrator.status_of(tx_hash).await?)
    }

    /// Re-poll a pending deployment and record its outcome once mined.
    pub async fn refresh_deployment(&self, contract_id: &str) -> Result<ContractRecord, ServiceError> {
        let record = self.store.get(contract_id).await?;
        let Some(mut info) = record.deployment_info.clone() else {
            return Err(ServiceError::InvalidInput(format!(
                "contract {} has not been deployed",
                contract_id
            )));
        };

        if info.state != DeploymentState::Pending {
            return Ok(record);
        }

        let status = self.orchestrator.status(info.tx_hash).await?;
        if !info.apply_status(&status) {
            tracing::debug!(contract_id = %contract_id, tx_hash = %info.tx_hash, "Deployment still pending");
            return Ok(record);
        }

        tracing::info!(
            contract_id = %contract_id,
            tx_hash = %info.tx_hash,
            status = status.label(),
            "Pending deployment settled"
        );

        let address = info.contract_address;
        Ok(self
            .store
            .update_deployment(contract_id, address, info)
            .await?)
    }

    /// Compare a deployed contract's on-chain code with its stored source.
    pub async fn verify_contract(
        &self,
        contract_id: &str,
        constructor_args: Option<&str>,
    ) -> Result<VerificationReport, ServiceError> {
        let record = self.store.get(contract_id).await?;
        let Some(address) = record.deployed_address else {
            return Err(ServiceError::InvalidInput(format!(
                "contract {} has no deployed address",
                contract_id
            )));
        };

        Ok(self
            .orchestrator
            .verify(address, &record.source_code, constructor_args)
            .await?)
    }
}
