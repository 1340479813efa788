use chrono::Utc;
use sqlx::SqlitePool;

use super::{format_timestamp, parse_timestamp};
use crate::models::{NewSyncLogEntry, SyncAction, SyncLogEntry, SyncLogStatus};

/// Append-only audit trail. The schema rejects updates and deletes.
#[derive(Debug, Clone)]
pub struct SyncLogRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SyncLogRow {
    id: i64,
    action: String,
    table_name: String,
    record_id: Option<i64>,
    ghl_contact_id: Option<String>,
    status: String,
    message: String,
    created_at: String,
}

impl TryFrom<SyncLogRow> for SyncLogEntry {
    type Error = sqlx::Error;

    fn try_from(row: SyncLogRow) -> Result<Self, Self::Error> {
        let action: SyncAction = row
            .action
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;
        let status: SyncLogStatus = row
            .status
            .parse()
            .map_err(|e: String| sqlx::Error::Decode(e.into()))?;

        Ok(SyncLogEntry {
            id: row.id,
            action,
            table_name: row.table_name,
            record_id: row.record_id,
            ghl_contact_id: row.ghl_contact_id,
            status,
            message: row.message,
            created_at: parse_timestamp(&row.created_at),
        })
    }
}

impl SyncLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, entry: &NewSyncLogEntry) -> Result<i64, sqlx::Error> {
        let created_at = format_timestamp(Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO sync_log (action, table_name, record_id, ghl_contact_id, status, message, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.action.as_str())
        .bind(&entry.table_name)
        .bind(entry.record_id)
        .bind(&entry.ghl_contact_id)
        .bind(entry.status.as_str())
        .bind(&entry.message)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent entries first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<SyncLogEntry>, sqlx::Error> {
        let rows: Vec<SyncLogRow> = sqlx::query_as("SELECT * FROM sync_log ORDER BY id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SyncLogEntry::try_from).collect()
    }

    /// Entries about one record, oldest first.
    pub async fn list_for_record(
        &self,
        table_name: &str,
        record_id: i64,
    ) -> Result<Vec<SyncLogEntry>, sqlx::Error> {
        let rows: Vec<SyncLogRow> = sqlx::query_as(
            "SELECT * FROM sync_log WHERE table_name = ? AND record_id = ? ORDER BY id",
        )
        .bind(table_name)
        .bind(record_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SyncLogEntry::try_from).collect()
    }
}
