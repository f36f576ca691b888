//! In-memory history — useful for testing and ephemeral runs.

use async_trait::async_trait;
use std::sync::Arc;
use tallybot_core::error::HistoryError;
use tallybot_core::history::{HistoryRecord, HistoryStore};
use tokio::sync::RwLock;

/// Stores records in a Vec. Nothing survives the process.
pub struct InMemoryHistory {
    records: Arc<RwLock<Vec<HistoryRecord>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn records(&self) -> Vec<HistoryRecord> {
        self.records.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(&self, record: HistoryRecord) -> Result<(), HistoryError> {
        self.records.write().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_and_read_back() {
        let store = InMemoryHistory::new();
        store
            .append(HistoryRecord {
                client: "Acme".into(),
                date: "2024-01-05".into(),
                total: 15.50,
            })
            .await
            .unwrap();

        assert_eq!(store.count().await, 1);
        assert_eq!(store.records().await[0].client, "Acme");
    }

    #[tokio::test]
    async fn preserves_append_order() {
        let store = InMemoryHistory::new();
        for (i, client) in ["A", "B", "C"].iter().enumerate() {
            store
                .append(HistoryRecord {
                    client: client.to_string(),
                    date: "2024-01-05".into(),
                    total: i as f64,
                })
                .await
                .unwrap();
        }
        let records = store.records().await;
        assert_eq!(records[0].client, "A");
        assert_eq!(records[2].client, "C");
    }
}
