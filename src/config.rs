//! Configuration System
//!
//! Layered configuration for the backend connection and logging. Sources are merged in
//! order: built-in defaults, the user-level config file, the workspace config files, then
//! `STRUCTSYNC__SECTION__KEY` environment variables.

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::types::ProjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructsyncConfig {
    /// Planning backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Planning backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the REST API, without trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Project edited when the CLI is not given one
    #[serde(default)]
    pub project_id: Option<ProjectId>,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: None,
            api_token: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err("base_url cannot be empty".to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("base_url '{}' must start with http:// or https://", url));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        if self.project_id == Some(0) {
            return Err("project_id must be positive".to_string());
        }
        Ok(())
    }
}

/// A single configuration problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    Backend(String),
    Logging(String),
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::Backend(msg) => write!(f, "Backend: {}", msg),
            ConfigIssue::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ConfigIssue {}

impl StructsyncConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ConfigIssue>> {
        let mut issues = Vec::new();
        if let Err(e) = self.backend.validate() {
            issues.push(ConfigIssue::Backend(e));
        }
        if let Err(e) = self.logging.validate() {
            issues.push(ConfigIssue::Logging(e));
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Validate and fold all issues into one error.
    pub fn ensure_valid(&self) -> Result<(), ApiError> {
        self.validate().map_err(|issues| {
            let msgs: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })
    }
}
