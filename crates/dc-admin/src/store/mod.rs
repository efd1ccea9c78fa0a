//! Host configuration store seam.
//!
//! The orchestrator stages operations and hands the whole batch to a
//! [`ConfigurationStore`]. A non-empty `failed_results` means the batch
//! failed; there is no partial success.

mod file;
mod memory;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdminResult;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Properties of one configuration record.
pub type Properties = BTreeMap<String, Value>;

/// One staged, uncommitted write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum StagedOperation {
    /// Start a platform feature.
    StartFeature {
        /// Feature name.
        name: String,
    },
    /// Create a managed service record.
    CreateManagedService {
        /// Factory the record belongs to.
        factory_pid: String,
        /// Record properties.
        properties: Properties,
    },
    /// Delete a managed service record.
    DeleteManagedService {
        /// Record identifier.
        pid: String,
    },
    /// Write a `key=value` property file.
    CreatePropertyFile {
        /// Target path.
        path: PathBuf,
        /// File contents.
        properties: BTreeMap<String, String>,
    },
}

impl StagedOperation {
    /// Short description used in failure lists and logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::StartFeature { name } => format!("start feature {name}"),
            Self::CreateManagedService { factory_pid, .. } => format!("create {factory_pid}"),
            Self::DeleteManagedService { pid } => format!("delete {pid}"),
            Self::CreatePropertyFile { path, .. } => format!("write {}", path.display()),
        }
    }
}

/// Outcome of applying a staged batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigReport {
    /// One entry per failed operation.
    pub failed_results: Vec<String>,
}

impl ConfigReport {
    /// A report with no failures.
    #[must_use]
    pub const fn success() -> Self {
        Self {
            failed_results: Vec::new(),
        }
    }

    /// A report with one failure.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            failed_results: vec![reason.into()],
        }
    }

    /// Whether every operation was applied.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed_results.is_empty()
    }
}

/// The host configuration platform.
///
/// Implementations must be thread-safe and support concurrent access.
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Lists the managed service records of a factory, by record id.
    async fn managed_service_configs(&self, factory_pid: &str) -> AdminResult<BTreeMap<String, Properties>>;

    /// Reads a plain configuration. Missing configurations are empty.
    async fn config(&self, pid: &str) -> AdminResult<Properties>;

    /// Applies a staged batch.
    async fn apply(&self, operations: &[StagedOperation]) -> AdminResult<ConfigReport>;
}
