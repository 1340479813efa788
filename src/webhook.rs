//! Inbound messages (e.g. WhatsApp) recorded for later processing.
//!
//! Messages are stored verbatim, truncated, in the audit trail. Nothing here
//! interprets their content.

use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::SyncLogRepository;
use crate::models::NewSyncLogEntry;

/// Body accepted by the webhook endpoint. A missing message is recorded as
/// an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct WebhookIngestor {
    sync_log: SyncLogRepository,
}

impl WebhookIngestor {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            sync_log: SyncLogRepository::new(pool),
        }
    }

    /// Appends the message to the audit trail and returns the entry id.
    pub async fn ingest(&self, payload: &WebhookPayload) -> Result<i64, sqlx::Error> {
        let id = self
            .sync_log
            .append(&NewSyncLogEntry::webhook(&payload.message))
            .await?;
        tracing::info!(
            "Received webhook message ({} chars) as log entry {}",
            payload.message.chars().count(),
            id
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::{SyncAction, SyncLogStatus, MAX_WEBHOOK_MESSAGE_CHARS};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ingest_records_received_entry() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let ingestor = WebhookIngestor::new(pool.clone());

        ingestor
            .ingest(&WebhookPayload {
                message: "Visited Joe's Diner, 98404, interested".to_string(),
            })
            .await
            .unwrap();

        let entries = SyncLogRepository::new(pool).list_recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, SyncAction::WhatsappWebhook);
        assert_eq!(entries[0].status, SyncLogStatus::Received);
        assert_eq!(entries[0].table_name, "incoming");
        assert_eq!(entries[0].message, "Visited Joe's Diner, 98404, interested");
    }

    #[tokio::test]
    async fn test_ingest_truncates_long_messages() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(&temp_dir.path().join("test.db")).await.unwrap();
        let ingestor = WebhookIngestor::new(pool.clone());

        let message = "ü".repeat(MAX_WEBHOOK_MESSAGE_CHARS + 50);
        ingestor.ingest(&WebhookPayload { message }).await.unwrap();

        let entries = SyncLogRepository::new(pool).list_recent(1).await.unwrap();
        assert_eq!(
            entries[0].message.chars().count(),
            MAX_WEBHOOK_MESSAGE_CHARS
        );
    }

    #[test]
    fn test_payload_message_defaults_to_empty() {
        let payload: WebhookPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.message, "");
    }
}
