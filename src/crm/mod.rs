//! Remote CRM contacts: payload construction and the HTTP client.

mod client;
mod payload;
#[cfg(test)]
pub(crate) mod stub;

pub use client::{CrmError, GhlClient, RemoteResponse};
pub use payload::{ContactPayload, CreateContactRequest, CustomField, PayloadError};
