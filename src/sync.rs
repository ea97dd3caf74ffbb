//! Sync
//!
//! Bulk schedule regeneration. [`SyncRequest`] computes what to send for the visible
//! units; [`SyncCoordinator`] runs the confirm-then-commit state machine around it.

pub mod coordinator;
pub mod payload;

pub use coordinator::{
    Confirmation, PendingSync, SyncCoordinator, SyncOutcome, SyncPhase, SyncSummary,
};
pub use payload::SyncRequest;
