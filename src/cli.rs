//! CLI domain: parse, route, help, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod help;
mod output;
mod parse;
mod presentation;
mod route;

pub use help::command_name;
pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{
    format_commit_report, format_models, format_section_heading, format_sync_outcome,
    format_sync_preview, format_tree_json, format_tree_text, TreeRow,
};
pub use route::{ConfigOverrides, RunContext};
