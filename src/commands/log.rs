use clap::Args;

use super::{clip, OutputFormat};
use canvass::db::SyncLogRepository;

/// Show the most recent audit trail entries
#[derive(Args)]
pub struct LogCommand {
    /// Number of entries to show
    #[arg(long, short = 'n', default_value_t = 20)]
    limit: i64,

    /// Only entries about this visit, oldest first
    #[arg(long)]
    visit: Option<i64>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl LogCommand {
    pub async fn run(&self, repo: &SyncLogRepository) -> Result<(), Box<dyn std::error::Error>> {
        let entries = match self.visit {
            Some(id) => repo.list_for_record("business_visits", id).await?,
            None => repo.list_recent(self.limit.max(1)).await?,
        };

        if entries.is_empty() {
            println!("No log entries");
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Text => {
                println!(
                    "{:<19}  {:<16}  {:<8}  {:<6}  MESSAGE",
                    "TIME", "ACTION", "STATUS", "VISIT"
                );
                println!("{}", "-".repeat(90));
                for entry in &entries {
                    let record = entry
                        .record_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    let message = match (&entry.ghl_contact_id, entry.message.is_empty()) {
                        (Some(contact), true) => contact.clone(),
                        _ => entry.message.clone(),
                    };
                    println!(
                        "{:<19}  {:<16}  {:<8}  {:<6}  {}",
                        entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                        entry.action,
                        entry.status,
                        record,
                        clip(&message, 40)
                    );
                }
            }
        }
        Ok(())
    }
}
