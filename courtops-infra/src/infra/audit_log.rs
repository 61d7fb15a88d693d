use async_trait::async_trait;
use courtops_tools::{AuditEntry, AuditSink, CollaboratorError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const GENESIS: &str = "genesis";

#[derive(Error, Debug)]
pub enum AuditLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Chain integrity violation: {0}")]
    IntegrityViolation(String),
}

impl From<AuditLogError> for CollaboratorError {
    fn from(err: AuditLogError) -> Self {
        match err {
            AuditLogError::Io(e) => CollaboratorError::Io(e),
            other => CollaboratorError::Storage(other.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct ChainedEntry {
    entry_hash: String,
    prev_hash: String,
    #[serde(flatten)]
    entry: AuditEntry,
}

struct ChainState {
    file: File,
    last_hash: String,
}

/// Append-only JSONL audit log. Each line carries the hash of the previous
/// line so edits and deletions are detectable. Clones share one chain.
#[derive(Clone)]
pub struct AuditLog {
    log_path: PathBuf,
    state: Arc<Mutex<ChainState>>,
}

impl AuditLog {
    /// Open (or create) the log, verifying the existing chain.
    pub fn open<P: AsRef<Path>>(log_path: P) -> Result<Self, AuditLogError> {
        let log_path = log_path.as_ref().to_path_buf();

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let last_hash = Self::verify_and_get_last_hash(&log_path)?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        Ok(Self {
            log_path,
            state: Arc::new(Mutex::new(ChainState { file, last_hash })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn log(&self, entry: &AuditEntry) -> Result<(), AuditLogError> {
        let mut state = self.state.lock();

        let entry_hash = chain_hash(&state.last_hash, entry)?;
        let chained = ChainedEntry {
            entry_hash: entry_hash.clone(),
            prev_hash: state.last_hash.clone(),
            entry: entry.clone(),
        };

        let json = serde_json::to_string(&chained)?;
        writeln!(state.file, "{}", json)?;
        state.file.sync_all()?;

        state.last_hash = entry_hash;
        Ok(())
    }

    /// Number of verified entries.
    pub fn verify_integrity(&self) -> Result<usize, AuditLogError> {
        let _guard = self.state.lock();
        Ok(Self::read_chain(&self.log_path)?.len())
    }

    pub fn entries(&self) -> Result<Vec<AuditEntry>, AuditLogError> {
        let _guard = self.state.lock();
        Ok(Self::read_chain(&self.log_path)?
            .into_iter()
            .map(|c| c.entry)
            .collect())
    }

    /// Entries whose timestamp falls in `period` (`YYYY-MM`, UTC).
    pub fn entries_for_period(&self, period: &str) -> Result<Vec<AuditEntry>, AuditLogError> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.timestamp.format("%Y-%m").to_string() == period)
            .collect())
    }

    fn verify_and_get_last_hash(log_path: &Path) -> Result<String, AuditLogError> {
        Ok(Self::read_chain(log_path)?
            .pop()
            .map(|c| c.entry_hash)
            .unwrap_or_else(|| GENESIS.to_string()))
    }

    fn read_chain(log_path: &Path) -> Result<Vec<ChainedEntry>, AuditLogError> {
        if !log_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(log_path)?);
        let mut prev_hash = GENESIS.to_string();
        let mut chain = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_num = idx + 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let chained: ChainedEntry = serde_json::from_str(&line).map_err(|e| {
                AuditLogError::IntegrityViolation(format!("Line {}: Invalid JSON: {}", line_num, e))
            })?;

            if chained.prev_hash != prev_hash {
                return Err(AuditLogError::IntegrityViolation(format!(
                    "Line {}: Hash chain broken. Expected prev_hash '{}', got '{}'",
                    line_num, prev_hash, chained.prev_hash
                )));
            }

            let computed = chain_hash(&prev_hash, &chained.entry)?;
            if computed != chained.entry_hash {
                return Err(AuditLogError::IntegrityViolation(format!(
                    "Line {}: Hash mismatch. Expected '{}', got '{}'",
                    line_num, computed, chained.entry_hash
                )));
            }

            prev_hash = chained.entry_hash.clone();
            chain.push(chained);
        }

        Ok(chain)
    }
}

fn chain_hash(prev_hash: &str, entry: &AuditEntry) -> Result<String, AuditLogError> {
    let entry_json = serde_json::to_string(entry)?;
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update(entry_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[async_trait]
impl AuditSink for AuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), CollaboratorError> {
        // The write ends in an fsync; keep it off the async workers.
        let log = self.clone();
        let entry = entry.clone();
        tokio::task::spawn_blocking(move || log.log(&entry))
            .await
            .map_err(|e| CollaboratorError::Storage(e.to_string()))?
            .map_err(CollaboratorError::from)
    }
}
