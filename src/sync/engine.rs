//! Outbound synchronization of visits to the CRM.
//!
//! A visit without a remote contact id is created in the CRM; once linked,
//! every later attempt updates that contact. Each attempt records its outcome
//! on the visit, and (except for transport failures) in the audit trail.

use serde::Serialize;
use sqlx::SqlitePool;

use super::locks::VisitLocks;
use crate::config::CrmConfig;
use crate::crm::{ContactPayload, CrmError, GhlClient, RemoteResponse};
use crate::db::{SyncLogRepository, VisitRepository};
use crate::models::{
    non_empty, truncate_chars, NewSyncLogEntry, NewVisit, SyncAction, SyncLogStatus, Visit,
    MAX_ERROR_MESSAGE_CHARS,
};

/// Counts from one sync sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub success: usize,
    pub failed: usize,
}

impl SyncSummary {
    pub fn attempted(&self) -> usize {
        self.success + self.failed
    }
}

pub struct SyncEngine {
    visits: VisitRepository,
    sync_log: SyncLogRepository,
    client: GhlClient,
    config: CrmConfig,
    locks: VisitLocks,
}

impl SyncEngine {
    pub fn new(pool: SqlitePool, config: CrmConfig) -> Result<Self, CrmError> {
        let client = GhlClient::new(&config)?;
        Ok(Self {
            visits: VisitRepository::new(pool.clone()),
            sync_log: SyncLogRepository::new(pool),
            client,
            config,
            locks: VisitLocks::new(),
        })
    }

    pub fn visits(&self) -> &VisitRepository {
        &self.visits
    }

    pub fn sync_log(&self) -> &SyncLogRepository {
        &self.sync_log
    }

    pub fn config(&self) -> &CrmConfig {
        &self.config
    }

    /// Records a visit, then makes one best-effort attempt to sync it.
    ///
    /// The visit is kept whatever the remote outcome; a failed attempt only
    /// leaves it unsynced with `last_sync_error` set.
    pub async fn add_visit(&self, visit: &NewVisit) -> Result<i64, sqlx::Error> {
        let id = self.visits.insert(visit).await?;
        tracing::info!("Recorded visit {} ({})", id, visit.business_name);

        if !self.config.is_configured() {
            tracing::debug!("CRM location not configured, visit {} left unsynced", id);
            return Ok(id);
        }

        if let Err(e) = self.sync_to_remote(id).await {
            tracing::error!("Visit {} saved but sync bookkeeping failed: {}", id, e);
        }

        Ok(id)
    }

    /// Pushes one visit to the CRM. Returns true only when the CRM accepted
    /// the call and the outcome was recorded.
    ///
    /// Unknown ids return false without a remote call. Remote failures are
    /// recorded, not returned; only store failures surface as errors.
    pub async fn sync_to_remote(&self, id: i64) -> Result<bool, sqlx::Error> {
        let _guard = self.locks.acquire(id).await;

        let Some(visit) = self.visits.get(id).await? else {
            tracing::debug!("Visit {} not found, nothing to sync", id);
            return Ok(false);
        };

        let payload = ContactPayload::from_visit(&visit, &self.config);

        let (action, result) = match &visit.ghl_contact_id {
            Some(contact_id) => (
                SyncAction::Update,
                self.client.update_contact(contact_id, &payload).await,
            ),
            None => (
                SyncAction::Create,
                self.client
                    .create_contact(self.owning_location(&visit), &payload)
                    .await,
            ),
        };

        match result {
            Ok(RemoteResponse::Accepted { contact_id }) => {
                self.record_success(&visit, action, contact_id).await?;
                Ok(true)
            }
            Ok(RemoteResponse::Rejected { status, body }) => {
                let message = format!(
                    "HTTP {}: {}",
                    status,
                    truncate_chars(&body, MAX_ERROR_MESSAGE_CHARS)
                );
                self.record_rejection(&visit, action, message).await?;
                Ok(false)
            }
            Err(CrmError::Payload(e)) => {
                let message = truncate_chars(&e.to_string(), MAX_ERROR_MESSAGE_CHARS);
                self.record_rejection(&visit, action, message).await?;
                Ok(false)
            }
            Err(e) => {
                // The call never completed: the visit carries the error but no
                // audit entry is written for this attempt.
                let message = truncate_chars(&e.to_string(), MAX_ERROR_MESSAGE_CHARS);
                tracing::warn!("Sync of visit {} failed in transport: {}", visit.id, message);
                self.visits
                    .update_sync_result(visit.id, None, false, Some(&message))
                    .await?;
                Ok(false)
            }
        }
    }

    async fn record_success(
        &self,
        visit: &Visit,
        action: SyncAction,
        contact_id: Option<String>,
    ) -> Result<(), sqlx::Error> {
        if contact_id.is_none() && !visit.is_linked() {
            tracing::warn!(
                "CRM accepted visit {} without returning a contact id",
                visit.id
            );
        }

        self.visits
            .update_sync_result(visit.id, contact_id.as_deref(), true, None)
            .await?;

        let logged_id = contact_id.or_else(|| visit.ghl_contact_id.clone());
        self.sync_log
            .append(
                &NewSyncLogEntry::visit(action, visit.id, SyncLogStatus::Success)
                    .with_contact_id(logged_id.clone()),
            )
            .await?;

        tracing::info!(
            "Synced visit {} ({}) -> {}",
            visit.id,
            action,
            logged_id.as_deref().unwrap_or("<no id>")
        );
        Ok(())
    }

    async fn record_rejection(
        &self,
        visit: &Visit,
        action: SyncAction,
        message: String,
    ) -> Result<(), sqlx::Error> {
        tracing::warn!("Sync of visit {} rejected: {}", visit.id, message);

        self.visits
            .update_sync_result(visit.id, None, false, Some(&message))
            .await?;

        self.sync_log
            .append(
                &NewSyncLogEntry::visit(action, visit.id, SyncLogStatus::Error)
                    .with_contact_id(visit.ghl_contact_id.clone())
                    .with_message(message),
            )
            .await?;

        Ok(())
    }

    /// Attempts every unsynced visit once, in insertion order, without
    /// stopping at failures.
    pub async fn sync_all_pending(&self) -> Result<SyncSummary, sqlx::Error> {
        let pending = self.visits.list_unsynced().await?;
        tracing::info!("Syncing {} pending visit(s)", pending.len());

        let mut summary = SyncSummary::default();
        for visit in pending {
            if self.sync_to_remote(visit.id).await? {
                summary.success += 1;
            } else {
                summary.failed += 1;
            }
        }

        tracing::info!(
            "Sync sweep finished: {} success, {} failed",
            summary.success,
            summary.failed
        );
        Ok(summary)
    }

    /// Link to the visit's contact in the CRM web app, or an empty string when
    /// the visit is unknown or not linked.
    pub async fn deep_link(&self, id: i64) -> Result<String, sqlx::Error> {
        Ok(self
            .visits
            .get(id)
            .await?
            .map(|visit| self.deep_link_for(&visit))
            .unwrap_or_default())
    }

    /// Sub-account that owns the visit's contact: its own when set, else the
    /// configured one. Creates and deep links both go through here.
    fn owning_location<'a>(&'a self, visit: &'a Visit) -> &'a str {
        non_empty(&visit.ghl_location_id).unwrap_or(&self.config.location_id)
    }

    pub fn deep_link_for(&self, visit: &Visit) -> String {
        let Some(contact_id) = &visit.ghl_contact_id else {
            return String::new();
        };

        let location = self.owning_location(visit);

        format!(
            "{}/v2/location/{}/contacts/{}",
            self.config.app_url.trim_end_matches('/'),
            urlencoding::encode(location),
            urlencoding::encode(contact_id)
        )
    }
}
