use clap::{Args, Subcommand};

use super::OutputFormat;
use canvass::config::Config;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        let mut shown = config.clone();
                        shown.crm.api_key = config.crm.masked_api_key();
                        println!("{}", serde_json::to_string_pretty(&shown)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");

                        if let Some(path) = &config.config_file {
                            println!("Config file: {}", path.display());
                        } else {
                            println!(
                                "Config file: {} (not found)",
                                Config::default_config_path().display()
                            );
                        }
                        println!();

                        println!(
                            "database_path: {}",
                            config.database_path.value.display()
                        );
                        println!("  source: {}", config.database_path.source);
                        println!();

                        let crm = &config.crm;
                        println!("crm:");
                        println!(
                            "  api_key:     {}",
                            crm.masked_api_key().as_deref().unwrap_or("(not set)")
                        );
                        if crm.is_configured() {
                            println!("  location_id: {}", crm.location_id);
                        } else {
                            println!("  location_id: (not set, sync disabled)");
                        }
                        println!("  base_url:    {}", crm.base_url);
                        println!("  app_url:     {}", crm.app_url);
                        println!("  timeout:     {}s", crm.timeout_secs);
                        println!("  tag:         {}", crm.prospect_tag);
                        println!();

                        println!("server: {}:{}", config.server.host, config.server.port);
                    }
                }
                Ok(())
            }
        }
    }
}
