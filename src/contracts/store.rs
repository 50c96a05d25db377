//! Contract record storage and persistence.

use alloy::primitives::Address;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::contracts::record::{ContractPage, ContractQuery, ContractRecord, DeploymentInfo};

/// Errors of the contract store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Contract {0} not found")]
    NotFound(String),

    #[error("Contract {0} already exists")]
    Duplicate(String),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistence collaborator for contract records.
#[async_trait]
pub trait ContractStore: Send + Sync {
    async fn insert(&self, record: ContractRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<ContractRecord, StoreError>;

    /// Matching records, newest first, paged.
    async fn list(&self, query: &ContractQuery) -> Result<ContractPage, StoreError>;

    /// Attach deployment information (and the address, once known) to a record.
    async fn update_deployment(
        &self,
        id: &str,
        address: Option<Address>,
        info: DeploymentInfo,
    ) -> Result<ContractRecord, StoreError>;
}

/// In-memory store, optionally mirrored to a JSON file after every mutation.
#[derive(Debug, Clone, Default)]
pub struct MemoryContractStore {
    inner: Arc<DashMap<String, ContractRecord>>,
    persistence_path: Option<PathBuf>,
    /// Held across snapshot and write so files land in mutation order.
    write_lock: Arc<Mutex<()>>,
}

impl MemoryContractStore {
    /// Create an empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open a store backed by `path`, loading it if the file exists.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let records: HashMap<String, ContractRecord> = serde_json::from_reader(reader)?;
            for (id, record) in records {
                store.inner.insert(id, record);
            }
            tracing::info!(path = %path.display(), contracts = store.inner.len(), "Loaded contract store");
        }

        Ok(store)
    }

    /// Write all records to the backing file, replacing it atomically.
    pub async fn save_to_file(&self) -> Result<(), StoreError> {
        let Some(path) = self.persistence_path.clone() else {
            return Ok(());
        };

        let _guard = self.write_lock.lock().await;
        let records: HashMap<String, ContractRecord> = self
            .inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        let count = records.len();

        let written = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&written, &records))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

        tracing::debug!(path = %path.display(), contracts = count, "Saved contract store");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

fn write_atomically(
    path: &Path,
    records: &HashMap<String, ContractRecord>,
) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl ContractStore for MemoryContractStore {
    async fn insert(&self, record: ContractRecord) -> Result<(), StoreError> {
        match self.inner.entry(record.id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(StoreError::Duplicate(record.id));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        self.save_to_file().await
    }

    async fn get(&self, id: &str) -> Result<ContractRecord, StoreError> {
        self.inner
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    async fn list(&self, query: &ContractQuery) -> Result<ContractPage, StoreError> {
        let mut matching: Vec<ContractRecord> = self
            .inner
            .iter()
            .filter(|r| query.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();

        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matching.len();
        let limit = query.effective_limit();
        let contracts = matching.into_iter().skip(query.skip).take(limit).collect();

        Ok(ContractPage {
            contracts,
            total,
            skip: query.skip,
            limit,
        })
    }

    async fn update_deployment(
        &self,
        id: &str,
        address: Option<Address>,
        info: DeploymentInfo,
    ) -> Result<ContractRecord, StoreError> {
        let updated = {
            let mut record = self
                .inner
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if address.is_some() {
                record.deployed_address = address;
            }
            record.deployment_info = Some(info);
            record.updated_at = Utc::now();
            record.clone()
        };

        self.save_to_file().await?;
        Ok(updated)
    }
}
