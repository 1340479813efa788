use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest inbound webhook message kept in the audit trail.
pub const MAX_WEBHOOK_MESSAGE_CHARS: usize = 500;
/// Longest error text kept on a visit or in the audit trail.
pub const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// What an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Create,
    Update,
    WhatsappWebhook,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::Create => "create",
            SyncAction::Update => "update",
            SyncAction::WhatsappWebhook => "whatsapp_webhook",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(SyncAction::Create),
            "update" => Ok(SyncAction::Update),
            "whatsapp_webhook" => Ok(SyncAction::WhatsappWebhook),
            _ => Err(format!("Invalid sync action '{}'", s)),
        }
    }
}

/// Outcome of the audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    Success,
    Error,
    Received,
}

impl SyncLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncLogStatus::Success => "success",
            SyncLogStatus::Error => "error",
            SyncLogStatus::Received => "received",
        }
    }
}

impl fmt::Display for SyncLogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncLogStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(SyncLogStatus::Success),
            "error" => Ok(SyncLogStatus::Error),
            "received" => Ok(SyncLogStatus::Received),
            _ => Err(format!("Invalid sync log status '{}'", s)),
        }
    }
}

/// One row of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: i64,
    pub action: SyncAction,
    pub table_name: String,
    pub record_id: Option<i64>,
    pub ghl_contact_id: Option<String>,
    pub status: SyncLogStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// An audit entry about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSyncLogEntry {
    pub action: SyncAction,
    pub table_name: String,
    pub record_id: Option<i64>,
    pub ghl_contact_id: Option<String>,
    pub status: SyncLogStatus,
    pub message: String,
}

impl NewSyncLogEntry {
    /// Entry for a sync attempt against a visit row.
    pub fn visit(action: SyncAction, visit_id: i64, status: SyncLogStatus) -> Self {
        Self {
            action,
            table_name: "business_visits".to_string(),
            record_id: Some(visit_id),
            ghl_contact_id: None,
            status,
            message: String::new(),
        }
    }

    /// Entry for an inbound webhook message, truncated to
    /// [`MAX_WEBHOOK_MESSAGE_CHARS`].
    pub fn webhook(message: &str) -> Self {
        Self {
            action: SyncAction::WhatsappWebhook,
            table_name: "incoming".to_string(),
            record_id: None,
            ghl_contact_id: None,
            status: SyncLogStatus::Received,
            message: truncate_chars(message, MAX_WEBHOOK_MESSAGE_CHARS),
        }
    }

    pub fn with_contact_id(mut self, contact_id: Option<String>) -> Self {
        self.ghl_contact_id = contact_id;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Keeps at most `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
