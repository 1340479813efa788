use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use crate::db::TerritoryStats;
use crate::models::{NewVisit, SyncLogEntry, Visit, VisitStatus};
use crate::sync::{SyncEngine, SyncSummary};
use crate::webhook::{WebhookIngestor, WebhookPayload};

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 500;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub webhooks: WebhookIngestor,
}

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/visits", get(list_visits).post(create_visit))
        .route("/api/visits/by-zip", get(visits_by_zip))
        .route("/api/visits/{id}", get(get_visit))
        .route("/api/visits/{id}/sync", post(sync_visit))
        .route("/api/sync", post(sync_all))
        .route("/api/stats", get(stats))
        .route("/api/sync-log", get(sync_log))
        .route("/api/whatsapp", post(whatsapp_webhook))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// A visit with its CRM link, when it has one.
#[derive(Serialize)]
struct VisitView {
    #[serde(flatten)]
    visit: Visit,
    #[serde(skip_serializing_if = "Option::is_none")]
    ghl_url: Option<String>,
}

impl VisitView {
    fn new(engine: &SyncEngine, visit: Visit) -> Self {
        let link = engine.deep_link_for(&visit);
        Self {
            visit,
            ghl_url: (!link.is_empty()).then_some(link),
        }
    }
}

#[derive(Serialize)]
struct VisitList {
    visits: Vec<VisitView>,
    count: usize,
}

#[derive(Serialize)]
struct ZipVisitList {
    zip: String,
    visits: Vec<VisitView>,
    count: usize,
}

#[derive(Serialize)]
struct CreatedResponse {
    id: i64,
    status: &'static str,
}

#[derive(Serialize)]
struct SyncVisitResponse {
    id: i64,
    synced: bool,
}

#[derive(Serialize)]
struct ReceivedResponse {
    status: &'static str,
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /api/visits`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateVisitRequest {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub zip_code: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub source: Option<String>,
    pub ghl_location_id: Option<String>,
}

impl From<CreateVisitRequest> for NewVisit {
    fn from(req: CreateVisitRequest) -> Self {
        NewVisit {
            business_name: req.business_name,
            zip_code: req.zip_code,
            contact_name: req.contact_name,
            phone: req.phone,
            email: req.email,
            address: req.address,
            city: req.city,
            notes: req.notes,
            visit_status: req.status.map(VisitStatus::from).unwrap_or_default(),
            lat: req.lat,
            lng: req.lng,
            source: req
                .source
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "api".to_string()),
            ghl_location_id: req.ghl_location_id,
        }
    }
}

#[derive(Deserialize)]
struct ZipQuery {
    zip: Option<String>,
}

#[derive(Deserialize)]
struct LogQuery {
    limit: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Visits with coordinates, for the map.
async fn list_visits(State(state): State<AppState>) -> Result<Json<VisitList>, ApiError> {
    let visits: Vec<VisitView> = state
        .engine
        .visits()
        .list_with_coordinates()
        .await?
        .into_iter()
        .map(|v| VisitView::new(&state.engine, v))
        .collect();

    Ok(Json(VisitList {
        count: visits.len(),
        visits,
    }))
}

async fn visits_by_zip(
    State(state): State<AppState>,
    Query(query): Query<ZipQuery>,
) -> Result<Json<ZipVisitList>, ApiError> {
    let zip = query
        .zip
        .map(|z| z.trim().to_string())
        .filter(|z| !z.is_empty())
        .ok_or(ApiError::BadRequest("zip required"))?;

    let visits: Vec<VisitView> = state
        .engine
        .visits()
        .list_by_zip(&zip)
        .await?
        .into_iter()
        .map(|v| VisitView::new(&state.engine, v))
        .collect();

    Ok(Json(ZipVisitList {
        zip,
        count: visits.len(),
        visits,
    }))
}

async fn get_visit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<VisitView>, ApiError> {
    let visit = state
        .engine
        .visits()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("visit {} not found", id)))?;

    Ok(Json(VisitView::new(&state.engine, visit)))
}

async fn create_visit(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let request: CreateVisitRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("Invalid JSON"))?;

    let id = state.engine.add_visit(&request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id,
            status: "created",
        }),
    ))
}

async fn sync_visit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SyncVisitResponse>, ApiError> {
    if state.engine.visits().get(id).await?.is_none() {
        return Err(ApiError::NotFound(format!("visit {} not found", id)));
    }

    let synced = state.engine.sync_to_remote(id).await?;
    Ok(Json(SyncVisitResponse { id, synced }))
}

async fn sync_all(State(state): State<AppState>) -> Result<Json<SyncSummary>, ApiError> {
    Ok(Json(state.engine.sync_all_pending().await?))
}

async fn stats(State(state): State<AppState>) -> Result<Json<TerritoryStats>, ApiError> {
    Ok(Json(state.engine.visits().stats().await?))
}

async fn sync_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<SyncLogEntry>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    Ok(Json(state.engine.sync_log().list_recent(limit).await?))
}

/// Records an inbound message without interpreting it.
async fn whatsapp_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ReceivedResponse>, ApiError> {
    let payload: WebhookPayload =
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("Invalid JSON"))?;

    state.webhooks.ingest(&payload).await?;
    Ok(Json(ReceivedResponse { status: "received" }))
}
