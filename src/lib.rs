//! structsync: Staged Attribute Resolution and Schedule Sync
//!
//! Loads a project's four-level structure (component, riser, floor, unit), stages
//! process-model and start-date edits with downward cascade, resolves the effective value
//! of every node, and commits edits to the planning backend either node by node or as one
//! confirmed bulk Sync.

pub mod backend;
pub mod cli;
pub mod config;
pub mod derived;
pub mod error;
pub mod logging;
pub mod overrides;
pub mod propagate;
pub mod resolve;
pub mod session;
pub mod sync;
pub mod tree;
pub mod types;
