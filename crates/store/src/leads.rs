use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use autostream_core::Lead;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::StoreError;

/// Confirmation returned to the dialogue layer after a durable append.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeadReceipt {
    pub status: String,
}

/// Durable append of captured leads.
///
/// At-least-once semantics: no dedup, and no transactionality with session
/// state mutation. A lead may be recorded even if a later step fails.
#[async_trait]
pub trait LeadSink: Send + Sync {
    async fn capture(&self, lead: Lead) -> Result<LeadReceipt, StoreError>;
}

#[async_trait]
impl<T: LeadSink + ?Sized> LeadSink for std::sync::Arc<T> {
    async fn capture(&self, lead: Lead) -> Result<LeadReceipt, StoreError> {
        (**self).capture(lead).await
    }
}

/// Append-only JSONL lead log, one record per line.
#[derive(Clone, Debug)]
pub struct FileLeadSink {
    path: PathBuf,
}

impl FileLeadSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the log back. Malformed content is recoverable: the list is
    /// treated as empty rather than erroring, and captures keep appending.
    pub async fn load(&self) -> Result<Vec<Lead>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::LeadAppend { path: self.path.clone(), source })
            }
        };

        let mut leads = Vec::new();
        for line in raw.lines().filter(|line| !line.trim().is_empty()) {
            match serde_json::from_str::<Lead>(line) {
                Ok(lead) => leads.push(lead),
                Err(error) => {
                    warn!(
                        path = %self.path.display(),
                        error = %error,
                        "lead log is corrupt; treating record list as empty"
                    );
                    return Ok(Vec::new());
                }
            }
        }

        Ok(leads)
    }
}

#[async_trait]
impl LeadSink for FileLeadSink {
    async fn capture(&self, lead: Lead) -> Result<LeadReceipt, StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::LeadAppend { path: self.path.clone(), source })?;
            }
        }

        let mut line = serde_json::to_string(&lead)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| StoreError::LeadAppend { path: self.path.clone(), source })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| StoreError::LeadAppend { path: self.path.clone(), source })?;
        file.flush()
            .await
            .map_err(|source| StoreError::LeadAppend { path: self.path.clone(), source })?;

        info!(
            name = %lead.name,
            platform = %lead.platform,
            path = %self.path.display(),
            "lead appended to log"
        );

        Ok(LeadReceipt { status: lead.status })
    }
}

/// In-process sink for tests and demo wiring.
#[derive(Debug, Default)]
pub struct MemoryLeadSink {
    leads: Mutex<Vec<Lead>>,
}

impl MemoryLeadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn captured(&self) -> Vec<Lead> {
        self.leads.lock().map(|leads| leads.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LeadSink for MemoryLeadSink {
    async fn capture(&self, lead: Lead) -> Result<LeadReceipt, StoreError> {
        let status = lead.status.clone();
        if let Ok(mut leads) = self.leads.lock() {
            leads.push(lead);
        }
        Ok(LeadReceipt { status })
    }
}
