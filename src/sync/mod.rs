//! Synchronization of local visits to the remote CRM.
//!
//! # Usage
//!
//! ```no_run
//! # async fn demo(pool: sqlx::SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
//! use canvass::config::CrmConfig;
//! use canvass::models::NewVisit;
//! use canvass::sync::SyncEngine;
//!
//! let engine = SyncEngine::new(pool, CrmConfig::default())?;
//! let id = engine.add_visit(&NewVisit::new("Joe's Diner", "98404")).await?;
//! let summary = engine.sync_all_pending().await?;
//! println!("{} -> {} synced", id, summary.success);
//! # Ok(())
//! # }
//! ```

mod engine;
mod locks;

pub use engine::{SyncEngine, SyncSummary};
pub use locks::{VisitLockGuard, VisitLocks};
