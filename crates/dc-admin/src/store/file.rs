//! File-backed configuration store.
//!
//! Layout under the root directory:
//!
//! ```text
//! services/<pid>.json   managed service records
//! config/<pid>.json     plain configurations
//! features.json         started features
//! ```
//!
//! Property files are written at their staged paths. A batch either applies
//! completely or is rolled back.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ConfigReport, ConfigurationStore, Properties, StagedOperation};
use crate::error::{AdminError, AdminResult};

const SERVICES_DIR: &str = "services";
const CONFIG_DIR: &str = "config";
const FEATURES_FILE: &str = "features.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredService {
    factory_pid: String,
    properties: Properties,
}

/// Undo steps for a partially applied batch.
#[derive(Debug, Default)]
struct Rollback {
    created: Vec<PathBuf>,
    removed: Vec<(PathBuf, Vec<u8>)>,
    features: Option<Option<Vec<u8>>>,
}

/// Configuration store persisted as files under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `root`. Directories are created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a plain configuration.
    pub async fn put_config(&self, pid: &str, properties: &Properties) -> AdminResult<()> {
        let path = self.record_path(CONFIG_DIR, pid)?;
        write_json(&path, properties).await
    }

    /// Returns the started features.
    pub async fn features(&self) -> AdminResult<BTreeSet<String>> {
        match read_optional(&self.root.join(FEATURES_FILE)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(BTreeSet::new()),
        }
    }

    fn record_path(&self, dir: &str, pid: &str) -> AdminResult<PathBuf> {
        if pid.is_empty() || pid.contains(['/', '\\']) || pid.contains("..") {
            return Err(AdminError::store(format!("invalid record id '{pid}'")));
        }
        Ok(self.root.join(dir).join(format!("{pid}.json")))
    }

    async fn apply_one(&self, op: &StagedOperation, rollback: &mut Rollback) -> AdminResult<()> {
        match op {
            StagedOperation::StartFeature { name } => {
                let path = self.root.join(FEATURES_FILE);
                let previous = read_optional(&path).await?;
                let mut features: BTreeSet<String> = match &previous {
                    Some(bytes) => serde_json::from_slice(bytes)?,
                    None => BTreeSet::new(),
                };
                if rollback.features.is_none() {
                    rollback.features = Some(previous);
                }
                features.insert(name.clone());
                write_json(&path, &features).await
            }
            StagedOperation::CreateManagedService {
                factory_pid,
                properties,
            } => {
                let pid = format!("{factory_pid}.{}", Uuid::now_v7());
                let path = self.record_path(SERVICES_DIR, &pid)?;
                let record = StoredService {
                    factory_pid: factory_pid.clone(),
                    properties: properties.clone(),
                };
                write_json(&path, &record).await?;
                rollback.created.push(path);
                Ok(())
            }
            StagedOperation::DeleteManagedService { pid } => {
                let path = self.record_path(SERVICES_DIR, pid)?;
                let contents = read_optional(&path).await?.ok_or_else(|| AdminError::not_found(pid.as_str()))?;
                tokio::fs::remove_file(&path).await?;
                rollback.removed.push((path, contents));
                Ok(())
            }
            StagedOperation::CreatePropertyFile { path, properties } => {
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let contents: String = properties
                    .iter()
                    .map(|(key, value)| format!("{}={}\n", escape_property(key, true), escape_property(value, false)))
                    .collect();
                tokio::fs::write(path, contents).await?;
                rollback.created.push(path.clone());
                Ok(())
            }
        }
    }

    async fn roll_back(&self, rollback: Rollback) {
        for path in rollback.created.iter().rev() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "Rollback could not remove file");
            }
        }
        for (path, contents) in rollback.removed {
            if let Err(e) = tokio::fs::write(&path, contents).await {
                tracing::warn!(path = %path.display(), error = %e, "Rollback could not restore record");
            }
        }
        if let Some(previous) = rollback.features {
            let path = self.root.join(FEATURES_FILE);
            let result = match previous {
                Some(contents) => tokio::fs::write(&path, contents).await,
                None => tokio::fs::remove_file(&path).await,
            };
            if let Err(e) = result {
                tracing::warn!(path = %path.display(), error = %e, "Rollback could not restore features");
            }
        }
    }
}

#[async_trait]
impl ConfigurationStore for FileStore {
    async fn managed_service_configs(&self, factory_pid: &str) -> AdminResult<BTreeMap<String, Properties>> {
        let dir = self.root.join(SERVICES_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut services = BTreeMap::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(pid) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".json"))
                .map(str::to_string)
            else {
                continue;
            };
            let record: StoredService = serde_json::from_slice(&tokio::fs::read(&path).await?)?;
            if record.factory_pid == factory_pid {
                services.insert(pid, record.properties);
            }
        }
        Ok(services)
    }

    async fn config(&self, pid: &str) -> AdminResult<Properties> {
        let path = self.record_path(CONFIG_DIR, pid)?;
        match read_optional(&path).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Properties::new()),
        }
    }

    async fn apply(&self, operations: &[StagedOperation]) -> AdminResult<ConfigReport> {
        let mut failed_results = Vec::new();
        for op in operations {
            if let StagedOperation::DeleteManagedService { pid } = op {
                let exists = match self.record_path(SERVICES_DIR, pid) {
                    Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
                    Err(_) => false,
                };
                if !exists {
                    failed_results.push(format!("{}: {}", op.describe(), AdminError::not_found(pid.as_str())));
                }
            }
        }
        if !failed_results.is_empty() {
            return Ok(ConfigReport { failed_results });
        }

        let mut rollback = Rollback::default();
        for op in operations {
            if let Err(e) = self.apply_one(op, &mut rollback).await {
                tracing::warn!(operation = %op.describe(), error = %e, "Configuration batch failed, rolling back");
                self.roll_back(rollback).await;
                return Ok(ConfigReport::failed(format!("{}: {e}", op.describe())));
            }
        }

        tracing::debug!(operations = operations.len(), root = %self.root.display(), "Configuration batch applied");
        Ok(ConfigReport::success())
    }
}

/// Escapes text for a Java `.properties` file.
///
/// Separators, comment markers and line breaks are backslash-escaped, and
/// characters outside printable ASCII become `\uXXXX` escapes. Spaces are
/// escaped everywhere in a key and at the start of a value.
fn escape_property(text: &str, is_key: bool) -> String {
    let mut escaped = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => escaped.push_str("\\ "),
            '\\' => escaped.push_str("\\\\"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{c}' => escaped.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                escaped.push('\\');
                escaped.push(c);
            }
            ' '..='~' => escaped.push(c),
            _ => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    escaped.push_str(&format!("\\u{unit:04X}"));
                }
            }
        }
    }
    escaped
}

async fn read_optional(path: &Path) -> AdminResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize + Sync>(path: &Path, value: &T) -> AdminResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
