//! Contract records, ownership and deployment bookkeeping.

use serde_json::{json, Map, Value};
use std::sync::Arc;

use contract_deployer::compiler::CompileError;
use contract_deployer::contracts::record::CONTRACT_NAME_KEY;
use contract_deployer::contracts::{
    ContractQuery, ContractService, ContractStore, DeployContractRequest, DeploymentState,
    MemoryContractStore, NewContract, ServiceError,
};
use contract_deployer::deploy::{Confidence, DeployError};

mod common;
use common::*;

const DEFAULT_GAS: u64 = 4_000_000;

async fn service_with(store: Arc<MemoryContractStore>) -> (ContractService, Arc<MockChain>) {
    let (orchestrator, chain, _) = setup().await;
    (ContractService::new(store, orchestrator, DEFAULT_GAS), chain)
}

fn draft(owner: &str, source: &str) -> NewContract {
    NewContract {
        owner_id: owner.to_string(),
        source_code: source.to_string(),
        metadata: Map::new(),
        is_public: false,
    }
}

fn deploy_as(contract_id: &str, deployer: &str) -> DeployContractRequest {
    DeployContractRequest {
        contract_id: contract_id.to_string(),
        deployer_id: deployer.to_string(),
        ..DeployContractRequest::default()
    }
}

#[tokio::test]
async fn test_create_and_fetch() {
    let store = Arc::new(MemoryContractStore::new(None));
    let (service, _) = service_with(store.clone()).await;

    let created = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(created.deployed_address, None);
    assert_eq!(created.deployment_info, None);

    let fetched = service.get_contract(&created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(store.len(), 1);

    assert!(matches!(
        service.get_contract("nope").await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.create_contract(draft(" ", COUNTER_SOURCE)).await,
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        service.create_contract(draft("alice", "")).await,
        Err(ServiceError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_list_by_owner() {
    let (service, _) = service_with(Arc::new(MemoryContractStore::new(None))).await;
    for owner in ["alice", "alice", "bob"] {
        service
            .create_contract(draft(owner, COUNTER_SOURCE))
            .await
            .unwrap();
    }

    let page = service
        .list_contracts(&ContractQuery {
            owner_id: Some("alice".into()),
            ..ContractQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert!(page.contracts.iter().all(|c| c.owner_id == "alice"));
}

#[tokio::test]
async fn test_only_owner_may_deploy() {
    let (service, chain) = service_with(Arc::new(MemoryContractStore::new(None))).await;
    let record = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();

    let err = service
        .deploy_contract(&deploy_as(&record.id, "mallory"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden { ref user, .. } if user == "mallory"));
    assert_eq!(chain.sends(), 0);

    assert!(matches!(
        service.deploy_contract(&deploy_as("missing", "alice")).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_deploy_records_outcome_with_default_gas() {
    let (service, _) = service_with(Arc::new(MemoryContractStore::new(None))).await;
    let record = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();

    let result = service
        .deploy_contract(&deploy_as(&record.id, "alice"))
        .await
        .unwrap();
    assert!(result.is_confirmed());

    let stored = service.get_contract(&record.id).await.unwrap();
    assert_eq!(stored.deployed_address, result.contract_address());
    let info = stored.deployment_info.unwrap();
    assert_eq!(info.state, DeploymentState::Success);
    assert_eq!(info.tx_hash, result.tx_hash);
    assert_eq!(info.deployer_id, "alice");
    assert_eq!(info.chain_id, CHAIN_ID);
    assert_eq!(info.gas_used, Some(GAS_USED));
    assert!(stored.updated_at >= stored.created_at);
}

#[tokio::test]
async fn test_pending_deployment_is_settled_by_refresh() {
    let (service, chain) = service_with(Arc::new(MemoryContractStore::new(None))).await;
    chain.set_auto_mine(false);
    let record = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();

    let result = service
        .deploy_contract(&deploy_as(&record.id, "alice"))
        .await
        .unwrap();
    assert!(result.is_pending());

    let stored = service.get_contract(&record.id).await.unwrap();
    assert_eq!(stored.deployed_address, None);
    assert_eq!(
        stored.deployment_info.as_ref().map(|i| i.state),
        Some(DeploymentState::Pending)
    );

    let still_pending = service.refresh_deployment(&record.id).await.unwrap();
    assert_eq!(still_pending.deployed_address, None);

    chain.mine();
    let settled = service.refresh_deployment(&record.id).await.unwrap();
    let info = settled.deployment_info.clone().unwrap();
    assert_eq!(info.state, DeploymentState::Success);
    assert_eq!(settled.deployed_address, Some(dev_wallet().address().create(0)));
    assert!(info.block_number.is_some());

    let status = service
        .deployment_status(&result.tx_hash.to_string())
        .await
        .unwrap();
    assert_eq!(status.label(), "success");
}

#[tokio::test]
async fn test_refresh_requires_a_deployment() {
    let (service, _) = service_with(Arc::new(MemoryContractStore::new(None))).await;
    let record = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();

    assert!(matches!(
        service.refresh_deployment(&record.id).await,
        Err(ServiceError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_contract_name_hint_selects_from_multi_contract_source() {
    let (service, _) = service_with(Arc::new(MemoryContractStore::new(None))).await;

    let ambiguous = service
        .create_contract(draft("alice", TOKEN_SOURCE))
        .await
        .unwrap();
    let err = service
        .deploy_contract(&deploy_as(&ambiguous.id, "alice"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Deploy(DeployError::Compile(CompileError::AmbiguousContract { .. }))
    ));

    let mut named = draft("alice", TOKEN_SOURCE);
    named
        .metadata
        .insert(CONTRACT_NAME_KEY.to_string(), Value::String("Token".into()));
    let named = service.create_contract(named).await.unwrap();

    let mut request = deploy_as(&named.id, "alice");
    request.constructor_args = Some(json!([21_000_000]).to_string());
    let result = service.deploy_contract(&request).await.unwrap();
    assert_eq!(result.contract_name, "Token");
}

#[tokio::test]
async fn test_verify_stored_contract() {
    let (service, _) = service_with(Arc::new(MemoryContractStore::new(None))).await;
    let record = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();

    assert!(matches!(
        service.verify_contract(&record.id, None).await,
        Err(ServiceError::InvalidInput(_))
    ));

    service
        .deploy_contract(&deploy_as(&record.id, "alice"))
        .await
        .unwrap();
    let report = service.verify_contract(&record.id, None).await.unwrap();
    assert!(report.verified);
    assert_eq!(report.confidence, Confidence::Exact);
}

#[tokio::test]
async fn test_deployment_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contracts.json");

    let store = Arc::new(MemoryContractStore::load_from_file(&path).unwrap());
    let (service, _) = service_with(store).await;
    let record = service
        .create_contract(draft("alice", COUNTER_SOURCE))
        .await
        .unwrap();
    let result = service
        .deploy_contract(&deploy_as(&record.id, "alice"))
        .await
        .unwrap();

    let reloaded = MemoryContractStore::load_from_file(&path).unwrap();
    let stored = reloaded.get(&record.id).await.unwrap();
    assert_eq!(stored.deployed_address, result.contract_address());
    assert_eq!(
        stored.deployment_info.map(|i| i.tx_hash),
        Some(result.tx_hash)
    );
}
