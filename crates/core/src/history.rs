//! History store trait — append-only record of completed invoices.
//!
//! The engine appends one record per completed flow. The core requires no
//! read path; backends may expose one for diagnostics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;

/// A compact record of one completed invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub client: String,
    pub date: String,
    pub total: f64,
}

/// Append-only invoice history.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Backend name (e.g., "file", "in_memory").
    fn name(&self) -> &str;

    /// Append a record. Must be durable on return for persistent backends.
    async fn append(&self, record: HistoryRecord) -> std::result::Result<(), HistoryError>;
}
