//! HTTP API over the visit store, sync engine and webhook ingestor.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{router, AppState, CreateVisitRequest};
