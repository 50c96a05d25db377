//! Contract management subsystem.
//!
//! # Data Flow
//! ```text
//! NewContract → service.rs (validate) → store.rs (insert, optional JSON file)
//!
//! DeployContractRequest
//!     → service.rs (load record, ownership check, gas default, name hint)
//!     → Orchestrator::deploy_source
//!     → record.rs (DeploymentInfo: success / failed / pending)
//!     → store.rs (update_deployment)
//! ```
//!
//! # Design Decisions
//! - The orchestrator never persists; this service owns the records
//! - Hash-only deployments are stored as pending and settled by `refresh_deployment`

pub mod record;
pub mod service;
pub mod store;

pub use record::{
    ContractPage, ContractQuery, ContractRecord, DeploymentInfo, DeploymentState, NewContract,
};
pub use service::{ContractService, DeployContractRequest, ServiceError};
pub use store::{ContractStore, MemoryContractStore, StoreError};
