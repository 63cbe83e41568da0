//! Append-only audit log for relay-observed events.
//!
//! Records are written once and never read back by the relay. Two sinks:
//! - [`JsonlAuditLog`]: `<dir>/<collection>.jsonl`, one JSON record per line.
//! - [`MemoryAuditLog`]: in-process, for development and tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use rain_relay_core::error::{RelayError, Result};
use rain_relay_core::protocol::audit::AuditRecord;

use crate::config::AuditConfig;

#[async_trait]
pub trait AuditLog: Send + Sync {
    fn name(&self) -> &'static str;
    async fn append(&self, collection: &str, record: &AuditRecord) -> Result<()>;
}

/// Build the sink named by config.
pub async fn from_config(cfg: &AuditConfig) -> Result<Arc<dyn AuditLog>> {
    match cfg {
        AuditConfig::Memory => Ok(Arc::new(MemoryAuditLog::new())),
        AuditConfig::Jsonl { dir } => Ok(Arc::new(JsonlAuditLog::open(dir).await?)),
    }
}

/// In-process audit log.
#[derive(Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<(String, AuditRecord)>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every `(collection, record)` appended so far, in order.
    pub async fn snapshot(&self) -> Vec<(String, AuditRecord)> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn append(&self, collection: &str, record: &AuditRecord) -> Result<()> {
        self.entries
            .lock()
            .await
            .push((collection.to_string(), record.clone()));
        Ok(())
    }
}

/// File-backed audit log.
pub struct JsonlAuditLog {
    dir: PathBuf,
    // serializes writers so lines never interleave
    write_lock: Mutex<()>,
}

impl JsonlAuditLog {
    /// Create the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RelayError::Audit(format!("create {} failed: {e}", dir.display())))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn collection_path(&self, collection: &str) -> Result<PathBuf> {
        let ok = !collection.is_empty()
            && collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !ok {
            return Err(RelayError::Audit(format!("invalid collection name: {collection:?}")));
        }
        Ok(self.dir.join(format!("{collection}.jsonl")))
    }
}

#[async_trait]
impl AuditLog for JsonlAuditLog {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn append(&self, collection: &str, record: &AuditRecord) -> Result<()> {
        let path = self.collection_path(collection)?;
        let mut line = serde_json::to_string(record)
            .map_err(|e| RelayError::Audit(format!("encode record failed: {e}")))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| RelayError::Audit(format!("open {} failed: {e}", path.display())))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| RelayError::Audit(format!("write {} failed: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| RelayError::Audit(format!("flush {} failed: {e}", path.display())))?;
        Ok(())
    }
}
