//! CLI presentation: text and json formatters per command.

mod sync;
mod tree;

pub use sync::{format_commit_report, format_sync_outcome, format_sync_preview};
pub use tree::{format_models, format_tree_json, format_tree_text, TreeRow};

use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}
