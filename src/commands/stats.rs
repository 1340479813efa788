use clap::Args;

use super::OutputFormat;
use canvass::db::VisitRepository;

/// Territory coverage totals
#[derive(Args)]
pub struct StatsCommand {
    /// Output format
    #[arg(long, short, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl StatsCommand {
    pub async fn run(&self, repo: &VisitRepository) -> Result<(), Box<dyn std::error::Error>> {
        let stats = repo.stats().await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            OutputFormat::Text => {
                println!("Territory");
                println!("=========\n");
                println!("Total visits: {}", stats.total_visits);

                if !stats.by_status.is_empty() {
                    println!("\nBy status:");
                    for (status, count) in &stats.by_status {
                        println!("  {:<14} {}", status, count);
                    }
                }
                if !stats.by_zip.is_empty() {
                    println!("\nBy zip:");
                    for (zip, count) in &stats.by_zip {
                        println!("  {:<14} {}", zip, count);
                    }
                }
            }
        }
        Ok(())
    }
}
