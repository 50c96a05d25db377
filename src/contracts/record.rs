//! Contract records and their deployment information.

use alloy::primitives::{Address, TxHash};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::deploy::{Cost, DeploymentResult, TransactionStatus};

/// Metadata key naming the contract to deploy from multi-contract source.
pub const CONTRACT_NAME_KEY: &str = "contractName";

/// Default page size of [`ContractQuery`].
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// A stored contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRecord {
    pub id: String,
    pub owner_id: String,
    pub source_code: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_info: Option<DeploymentInfo>,
}

impl ContractRecord {
    /// Fresh record with a new v4 UUID.
    pub fn new(draft: NewContract) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: draft.owner_id,
            source_code: draft.source_code,
            metadata: draft.metadata,
            created_at: now,
            updated_at: now,
            is_public: draft.is_public,
            deployed_address: None,
            deployment_info: None,
        }
    }

    /// Contract-name hint stored in the metadata, if any.
    pub fn contract_name_hint(&self) -> Option<&str> {
        self.metadata
            .get(CONTRACT_NAME_KEY)
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
    }
}

/// Caller-supplied fields of a new contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewContract {
    pub owner_id: String,
    pub source_code: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub is_public: bool,
}

impl NewContract {
    /// Reject drafts without an owner or source.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.owner_id.trim().is_empty() {
            return Err("owner_id is required");
        }
        if self.source_code.trim().is_empty() {
            return Err("source_code is required");
        }
        Ok(())
    }
}

/// Lifecycle state of a recorded deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentState {
    Pending,
    Success,
    Failed,
}

/// What is known about a contract's deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub tx_hash: TxHash,
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub chain_id: u64,
    pub deployer_id: String,
    pub deployed_at: DateTime<Utc>,
    pub gas_used: Option<u64>,
    pub gas_price: u128,
    pub cost: Option<Cost>,
    pub state: DeploymentState,
}

impl DeploymentInfo {
    /// Snapshot of a broadcast. Hash-only results are recorded as pending.
    pub fn from_result(result: &DeploymentResult, deployer_id: &str) -> Self {
        let receipt = result.receipt.as_ref();
        let state = match receipt {
            None => DeploymentState::Pending,
            Some(r) if r.success => DeploymentState::Success,
            Some(_) => DeploymentState::Failed,
        };

        Self {
            tx_hash: result.tx_hash,
            contract_address: receipt.and_then(|r| r.contract_address),
            block_number: receipt.map(|r| r.block_number),
            chain_id: result.chain_id.0,
            deployer_id: deployer_id.to_string(),
            deployed_at: Utc::now(),
            gas_used: receipt.map(|r| r.gas_used),
            gas_price: receipt.map_or(result.gas_price, |r| r.gas_price),
            cost: receipt.map(|r| r.cost),
            state,
        }
    }

    /// Fold a later status lookup in. Returns whether anything changed.
    pub fn apply_status(&mut self, status: &TransactionStatus) -> bool {
        let (state, mined) = match status {
            TransactionStatus::Pending => return false,
            TransactionStatus::Success(m) => (DeploymentState::Success, m),
            TransactionStatus::Failed(m) => (DeploymentState::Failed, m),
        };

        let before = self.clone();
        self.state = state;
        self.contract_address = mined.contract_address.or(self.contract_address);
        self.block_number = Some(mined.block_number);
        self.gas_used = Some(mined.gas_used);
        self.gas_price = mined.gas_price;
        self.cost = Some(mined.cost);
        *self != before
    }
}

/// Filter and page of a contract listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractQuery {
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub skip: usize,
    /// 0 selects [`DEFAULT_LIST_LIMIT`].
    #[serde(default)]
    pub limit: usize,
}

impl ContractQuery {
    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            DEFAULT_LIST_LIMIT
        } else {
            self.limit
        }
    }

    pub fn matches(&self, record: &ContractRecord) -> bool {
        self.owner_id
            .as_deref()
            .map_or(true, |owner| record.owner_id == owner)
            && self.is_public.map_or(true, |public| record.is_public == public)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractPage {
    pub contracts: Vec<ContractRecord>,
    /// Matching records before paging.
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}
