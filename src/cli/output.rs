//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::{ApiError, SyncError};

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Sync(SyncError::Reload(inner)) => format!(
            "Sync was applied but the project could not be reloaded: {}\nRun `structsync tree` to refresh.",
            inner
        ),
        ApiError::Transport(inner) => format!("Backend request failed: {}", inner),
        other => other.to_string(),
    }
}
