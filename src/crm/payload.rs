//! Typed contact bodies sent to the CRM.

use serde::Serialize;

use crate::config::CrmConfig;
use crate::models::{non_empty, Visit};

/// Characters of the business name used as a first name when no contact
/// person was recorded.
const BUSINESS_NAME_AS_FIRST_NAME_CHARS: usize = 20;

/// Contact fields shared by create and update calls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub custom_fields: Vec<CustomField>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomField {
    pub key: String,
    pub value: String,
}

impl CustomField {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Body of a create call: the contact scoped to a location.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactRequest<'a> {
    #[serde(flatten)]
    pub contact: &'a ContactPayload,
    pub location_id: &'a str,
}

impl<'a> CreateContactRequest<'a> {
    pub fn new(contact: &'a ContactPayload, location_id: &'a str) -> Result<Self, PayloadError> {
        if location_id.trim().is_empty() {
            return Err(PayloadError::MissingLocation);
        }
        contact.validate()?;
        Ok(Self {
            contact,
            location_id,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("contact payload has no email")]
    MissingEmail,
    #[error("no CRM location configured for contact creation")]
    MissingLocation,
    #[error("contact payload has an empty tag")]
    EmptyTag,
}

impl ContactPayload {
    /// Builds the CRM view of a visit.
    ///
    /// The contact name is split on whitespace: the first token is the first
    /// name, the rest the last name. Without a contact name the business name
    /// stands in as the first name.
    pub fn from_visit(visit: &Visit, config: &CrmConfig) -> Self {
        let (first_name, last_name) = match non_empty(&visit.contact_name) {
            Some(name) => split_name(name),
            None => (
                visit
                    .business_name
                    .chars()
                    .take(BUSINESS_NAME_AS_FIRST_NAME_CHARS)
                    .collect(),
                String::new(),
            ),
        };

        let email = non_empty(&visit.email)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}@placeholder.com", visit.id));

        let city = non_empty(&visit.city)
            .map(str::to_string)
            .unwrap_or_else(|| config.default_city.clone());

        let coordinate = |c: Option<f64>| c.map(|v| v.to_string()).unwrap_or_default();

        let status = visit.visit_status.to_string();

        Self {
            first_name,
            last_name,
            email,
            phone: visit.phone.clone(),
            address1: visit.address.clone(),
            city,
            state: config.state.clone(),
            postal_code: visit.zip_code.clone(),
            custom_fields: vec![
                CustomField::new("business_name", visit.business_name.as_str()),
                CustomField::new("zip_code", visit.zip_code.as_str()),
                CustomField::new("visit_status", status.as_str()),
                CustomField::new("latitude", coordinate(visit.lat)),
                CustomField::new("longitude", coordinate(visit.lng)),
            ],
            tags: vec![
                config.prospect_tag.clone(),
                format!("zip-{}", visit.zip_code),
                status,
            ],
        }
    }

    /// Checks the payload before it leaves the process.
    pub fn validate(&self) -> Result<(), PayloadError> {
        if self.email.trim().is_empty() {
            return Err(PayloadError::MissingEmail);
        }
        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(PayloadError::EmptyTag);
        }
        Ok(())
    }
}

fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}
