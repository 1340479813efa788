//! Canvass API server
//!
//! Serves the visit tracker's HTTP API: recording visits, map and territory
//! queries, manual sync triggers and the inbound message webhook.
//!
//! # Configuration
//!
//! Settings come from the config file (`~/.config/canvass/config.yaml`),
//! overridden by environment variables:
//! - `CANVASS_DATABASE_PATH`: SQLite database file
//! - `CANVASS_GHL_TOKEN`: CRM bearer credential
//! - `CANVASS_GHL_LOCATION_ID`: CRM sub-account id (sync is off while unset)
//! - `CANVASS_HOST` / `CANVASS_PORT`: listen address (default 127.0.0.1:8081)

use std::sync::Arc;

use canvass::config::Config;
use canvass::db::init_db;
use canvass::server::{router, AppState};
use canvass::sync::SyncEngine;
use canvass::webhook::WebhookIngestor;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvass=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(None)?;

    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }
    tracing::info!("Database: {}", config.database_path.value.display());

    if config.crm.is_configured() {
        tracing::info!("CRM sync enabled for location {}", config.crm.location_id);
    } else {
        tracing::warn!("No CRM location configured - visits will be stored but not synced");
    }
    if config.crm.api_key.is_none() {
        tracing::warn!("No CRM token configured - remote calls will be rejected");
    }

    let pool = init_db(&config.database_path.value).await?;
    let engine = Arc::new(SyncEngine::new(pool.clone(), config.crm.clone())?);
    let state = AppState {
        engine,
        webhooks: WebhookIngestor::new(pool),
    };

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
