//! Error types for the structure synchronization engine.

use crate::types::{Attribute, NodeKey, ProcessModelId};
use thiserror::Error;

/// A staged value or structure snapshot was rejected before it reached any store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeKey),

    #[error("Process model id must be positive, got {0}")]
    InvalidProcessModelId(ProcessModelId),

    #[error("Process model {0} is not in the catalog")]
    UnknownProcessModel(ProcessModelId),

    #[error("Malformed date '{0}': expected YYYY-MM-DD")]
    MalformedDate(String),

    #[error("Malformed process model id '{0}'")]
    MalformedProcessModel(String),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// The persisted value of a node changed server-side while this session held a staged edit.
///
/// There is no optimistic-lock token, so this is only observable on reload and the last
/// write wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Conflict on {key} ({attribute}): persisted value changed on the server since last load")]
pub struct ConflictError {
    pub key: NodeKey,
    pub attribute: Attribute,
}

/// Network or backend failure during a node write, a reload or a sync.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Sync state machine errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("A sync is already committing; wait for it to finish")]
    InProgress,

    #[error("No sync is awaiting confirmation")]
    NotPrepared,

    #[error("Staged edits changed after the sync was prepared; prepare it again")]
    Stale,

    #[error("Sync failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Sync applied but reload failed: {0}")]
    Reload(TransportError),
}

/// Top-level error for sessions, configuration and the CLI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Sync(#[from] SyncError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
