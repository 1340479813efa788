use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use canvass::config::Config;
use canvass::db::{init_db, SyncLogRepository, VisitRepository};
use canvass::sync::SyncEngine;
use commands::{ConfigCommand, LogCommand, StatsCommand, SyncCommand, VisitCommand};

#[derive(Parser)]
#[command(name = "canvass")]
#[command(version)]
#[command(about = "Track door-to-door visits and sync them to the CRM", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record and inspect visits
    Visit(VisitCommand),

    /// Sync all pending visits to the CRM
    Sync(SyncCommand),

    /// Territory coverage totals
    Stats(StatsCommand),

    /// Show the sync audit trail
    Log(LogCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canvass=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Visit(cmd)) => {
            let engine = open_engine(&config).await?;
            cmd.run(&engine).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let engine = open_engine(&config).await?;
            cmd.run(&engine).await?;
        }
        Some(Commands::Stats(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            cmd.run(&VisitRepository::new(pool)).await?;
        }
        Some(Commands::Log(cmd)) => {
            let pool = init_db(&config.database_path.value).await?;
            cmd.run(&SyncLogRepository::new(pool)).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

async fn open_engine(config: &Config) -> Result<SyncEngine, Box<dyn std::error::Error>> {
    let pool = init_db(&config.database_path.value).await?;
    Ok(SyncEngine::new(pool, config.crm.clone())?)
}
