mod config_cmd;
mod log;
mod stats;
mod sync_cmd;
mod visit;

pub use config_cmd::ConfigCommand;
pub use log::LogCommand;
pub use stats::StatsCommand;
pub use sync_cmd::SyncCommand;
pub use visit::VisitCommand;

use clap::ValueEnum;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Shortens `s` to `width` characters for table columns.
pub(crate) fn clip(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let kept: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}
