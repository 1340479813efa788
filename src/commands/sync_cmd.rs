//! Sweep of every visit not yet mirrored in the CRM.

use clap::Args;

use canvass::sync::SyncEngine;

/// Sync all pending visits to the CRM
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// List pending visits without contacting the CRM
    #[arg(long)]
    dry_run: bool,
}

impl SyncCommand {
    pub async fn run(&self, engine: &SyncEngine) -> Result<(), Box<dyn std::error::Error>> {
        if !engine.config().is_configured() {
            println!("Status: Not configured");
            println!();
            println!("To enable sync, add to your config file:");
            println!();
            println!("  crm:");
            println!("    api_key: \"your-token\"");
            println!("    location_id: \"your-location-id\"");
            println!();
            println!("Or set environment variables:");
            println!("  CANVASS_GHL_TOKEN");
            println!("  CANVASS_GHL_LOCATION_ID");
            return Ok(());
        }

        if self.dry_run {
            let pending = engine.visits().list_unsynced().await?;
            if pending.is_empty() {
                println!("Nothing to sync.");
            }
            for visit in &pending {
                let action = if visit.is_linked() { "update" } else { "create" };
                println!("  {} {} ({})", action, visit.id, visit.business_name);
            }
            return Ok(());
        }

        println!("Syncing pending visits...");
        let summary = engine.sync_all_pending().await?;
        println!(
            "Sync complete: {} success, {} failed",
            summary.success, summary.failed
        );

        Ok(())
    }
}
