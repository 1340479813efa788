//! HTTP client for the CRM contacts API.

use reqwest::StatusCode;
use serde::Deserialize;

use super::payload::{ContactPayload, CreateContactRequest, PayloadError};
use crate::config::CrmConfig;

/// Errors raised before or while talking to the CRM.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    /// The HTTP client could not be built.
    #[error("failed to build CRM client: {0}")]
    Client(#[source] reqwest::Error),
    /// The call did not complete (connection, timeout, body read).
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    /// An accepted response whose body could not be understood.
    #[error("unreadable CRM response: {0}")]
    InvalidResponse(String),
    /// The payload failed local validation and was never sent.
    #[error("invalid contact payload: {0}")]
    Payload(#[from] PayloadError),
}

/// What the CRM said about a call that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResponse {
    /// 200 or 201. Carries the contact id when the body included one.
    Accepted { contact_id: Option<String> },
    /// Any other status, with the raw body.
    Rejected { status: u16, body: String },
}

#[derive(Debug, Deserialize)]
struct ContactEnvelope {
    contact: Option<ContactRef>,
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContactRef {
    id: Option<String>,
}

/// Client for the contacts endpoints.
#[derive(Debug, Clone)]
pub struct GhlClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    api_version: String,
}

impl GhlClient {
    /// Builds a client whose calls are bounded by the configured timeout.
    pub fn new(config: &CrmConfig) -> Result<Self, CrmError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(CrmError::Client)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            api_version: config.api_version.clone(),
        })
    }

    /// Creates a contact owned by `location_id`.
    pub async fn create_contact(
        &self,
        location_id: &str,
        contact: &ContactPayload,
    ) -> Result<RemoteResponse, CrmError> {
        let request = CreateContactRequest::new(contact, location_id)?;
        let url = format!("{}/contacts/", self.base_url);

        tracing::debug!("POST {} for {}", url, contact.email);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .json(&request)
            .send()
            .await
            .map_err(CrmError::Transport)?;

        Self::read_response(response).await
    }

    /// Updates the contact with id `contact_id`.
    pub async fn update_contact(
        &self,
        contact_id: &str,
        contact: &ContactPayload,
    ) -> Result<RemoteResponse, CrmError> {
        contact.validate()?;
        let url = format!(
            "{}/contacts/{}",
            self.base_url,
            urlencoding::encode(contact_id)
        );

        tracing::debug!("PUT {}", url);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.api_key)
            .header("Version", &self.api_version)
            .json(contact)
            .send()
            .await
            .map_err(CrmError::Transport)?;

        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<RemoteResponse, CrmError> {
        let status = response.status();
        let body = response.text().await.map_err(CrmError::Transport)?;

        if !is_accepted(status) {
            return Ok(RemoteResponse::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(RemoteResponse::Accepted { contact_id: None });
        }

        let envelope: ContactEnvelope = serde_json::from_str(&body)
            .map_err(|e| CrmError::InvalidResponse(e.to_string()))?;
        let contact_id = envelope.contact.and_then(|c| c.id).or(envelope.id);

        Ok(RemoteResponse::Accepted { contact_id })
    }
}

fn is_accepted(status: StatusCode) -> bool {
    matches!(status, StatusCode::OK | StatusCode::CREATED)
}
