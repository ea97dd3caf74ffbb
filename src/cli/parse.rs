//! CLI parse: clap types for structsync. No behavior; definitions only.

use crate::types::{Level, NodeId, ProjectId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// structsync CLI - staged schedule edits for a project structure
#[derive(Parser)]
#[command(name = "structsync")]
#[command(about = "Stage process-model and start-date edits and sync a project's schedule")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (for config/config.toml)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project to edit (overrides backend.project_id)
    #[arg(long)]
    pub project: Option<ProjectId>,

    /// Backend base URL (overrides backend.base_url)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the structure with effective values and where they come from
    Tree {
        /// Edit script staged before rendering (nothing is written)
        #[arg(long)]
        edits: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the process-model catalog
    Models {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Assign a process model to a node and its subtree, written immediately
    SetModel {
        /// component, riser, floor or unit
        level: Level,
        id: NodeId,
        /// Process model id; omit or pass "none" to clear
        model: Option<String>,
    },
    /// Set a start date on a node and its subtree, written immediately
    CommitDate {
        /// component, riser, floor or unit
        level: Level,
        id: NodeId,
        /// YYYY-MM-DD; omit or pass "none" to clear
        date: Option<String>,
    },
    /// Regenerate the schedule of the given units from their effective start dates
    Sync {
        /// Edit script staged before the sync
        #[arg(long)]
        edits: Option<PathBuf>,
        /// Comma-separated unit ids in scope (default: every unit)
        #[arg(long, value_delimiter = ',')]
        units: Vec<NodeId>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Show what would be sent without contacting the sync endpoint
        #[arg(long)]
        dry_run: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
