//! CLI command-name contract for logs.

use crate::cli::parse::Commands;

/// Command name used as the span name of a CLI run (e.g. "set_model").
pub fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Tree { .. } => "tree",
        Commands::Models { .. } => "models",
        Commands::SetModel { .. } => "set_model",
        Commands::CommitDate { .. } => "commit_date",
        Commands::Sync { .. } => "sync",
    }
}
