//! File-based history — persistent JSON-lines storage.
//!
//! Each completed invoice appends one JSON-encoded [`HistoryRecord`] line.
//! Appends go straight to disk; nothing is cached in memory, so multiple
//! processes pointing at the same file interleave whole lines at worst.
//!
//! Storage location: `~/.tallybot/history/invoices.jsonl`

use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use tallybot_core::error::HistoryError;
use tallybot_core::history::{HistoryRecord, HistoryStore};
use tracing::{debug, warn};

/// A file-backed append-only history using JSONL (one JSON object per line).
pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default path: `~/.tallybot/history/invoices.jsonl`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home)
            .join(".tallybot")
            .join("history")
            .join("invoices.jsonl")
    }

    /// Read all records back (diagnostics and tests; the engine never reads).
    pub fn load(&self) -> Vec<HistoryRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // File doesn't exist yet
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<HistoryRecord>(line) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(error = %e, "Skipping corrupted history line");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl HistoryStore for FileHistory {
    fn name(&self) -> &str {
        "file"
    }

    async fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HistoryError::Storage(format!("Failed to create history directory: {e}"))
            })?;
        }

        let line = serde_json::to_string(&record)
            .map_err(|e| HistoryError::Serialization(e.to_string()))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| HistoryError::Storage(format!("Failed to open history file: {e}")))?;
        writeln!(file, "{line}")
            .map_err(|e| HistoryError::Storage(format!("Failed to write history file: {e}")))?;

        debug!(client = %record.client, total = record.total, "History record appended");
        Ok(())
    }
}
