//! In-memory configuration store.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use super::{ConfigReport, ConfigurationStore, Properties, StagedOperation};
use crate::error::{AdminError, AdminResult};

#[derive(Debug, Default)]
struct MemoryState {
    services: BTreeMap<String, (String, Properties)>,
    configs: BTreeMap<String, Properties>,
    features: BTreeSet<String>,
    files: BTreeMap<PathBuf, BTreeMap<String, String>>,
    batches: Vec<Vec<StagedOperation>>,
    fail_commits: bool,
}

/// Configuration store held in memory.
///
/// Every applied batch is recorded, including rejected ones.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later commit fail (or succeed again).
    pub fn fail_commits(&self, fail: bool) {
        self.state.lock().fail_commits = fail;
    }

    /// Sets a plain configuration.
    pub fn set_config(&self, pid: &str, properties: Properties) {
        self.state.lock().configs.insert(pid.to_string(), properties);
    }

    /// Adds a managed service record directly, returning its id.
    pub fn insert_managed_service(&self, factory_pid: &str, properties: Properties) -> String {
        let pid = new_pid(factory_pid);
        self.state
            .lock()
            .services
            .insert(pid.clone(), (factory_pid.to_string(), properties));
        pid
    }

    /// Returns every batch handed to [`ConfigurationStore::apply`].
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<StagedOperation>> {
        self.state.lock().batches.clone()
    }

    /// Returns the started features.
    #[must_use]
    pub fn features(&self) -> BTreeSet<String> {
        self.state.lock().features.clone()
    }

    /// Returns the written property files.
    #[must_use]
    pub fn property_files(&self) -> BTreeMap<PathBuf, BTreeMap<String, String>> {
        self.state.lock().files.clone()
    }

    /// Returns the number of managed service records.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.state.lock().services.len()
    }
}

fn new_pid(factory_pid: &str) -> String {
    format!("{factory_pid}.{}", Uuid::now_v7())
}

#[async_trait]
impl ConfigurationStore for MemoryStore {
    async fn managed_service_configs(&self, factory_pid: &str) -> AdminResult<BTreeMap<String, Properties>> {
        Ok(self
            .state
            .lock()
            .services
            .iter()
            .filter(|(_, (factory, _))| factory == factory_pid)
            .map(|(pid, (_, properties))| (pid.clone(), properties.clone()))
            .collect())
    }

    async fn config(&self, pid: &str) -> AdminResult<Properties> {
        Ok(self.state.lock().configs.get(pid).cloned().unwrap_or_default())
    }

    async fn apply(&self, operations: &[StagedOperation]) -> AdminResult<ConfigReport> {
        let mut state = self.state.lock();
        state.batches.push(operations.to_vec());

        if state.fail_commits {
            return Ok(ConfigReport {
                failed_results: operations
                    .iter()
                    .map(|op| format!("{}: commit rejected", op.describe()))
                    .collect(),
            });
        }

        let missing: Vec<String> = operations
            .iter()
            .filter_map(|op| match op {
                StagedOperation::DeleteManagedService { pid } if !state.services.contains_key(pid) => {
                    Some(format!("{}: {}", op.describe(), AdminError::not_found(pid.as_str())))
                }
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            return Ok(ConfigReport {
                failed_results: missing,
            });
        }

        for op in operations {
            match op {
                StagedOperation::StartFeature { name } => {
                    state.features.insert(name.clone());
                }
                StagedOperation::CreateManagedService {
                    factory_pid,
                    properties,
                } => {
                    state
                        .services
                        .insert(new_pid(factory_pid), (factory_pid.clone(), properties.clone()));
                }
                StagedOperation::DeleteManagedService { pid } => {
                    state.services.remove(pid);
                }
                StagedOperation::CreatePropertyFile { path, properties } => {
                    state.files.insert(path.clone(), properties.clone());
                }
            }
        }

        Ok(ConfigReport::success())
    }
}
