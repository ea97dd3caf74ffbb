//! Sync state machine.
//!
//! `Idle -> BuildingPayload -> AwaitingConfirmation -> Committing -> Idle`, with
//! `Committing -> Failed -> Idle` when the backend rejects the commit. The phase lives
//! behind a shared lock so every clone of a coordinator sees the same Sync in flight.

use super::payload::SyncRequest;
use crate::backend::PlanningBackend;
use crate::error::{ConflictError, SyncError};
use crate::session::{EditSession, WritePlan};
use crate::types::{Attribute, NodeId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    BuildingPayload,
    AwaitingConfirmation,
    Committing,
    Failed,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::BuildingPayload => "building_payload",
            SyncPhase::AwaitingConfirmation => "awaiting_confirmation",
            SyncPhase::Committing => "committing",
            SyncPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A prepared Sync waiting for the user's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSync {
    pub request: SyncRequest,
    /// Process-model edits flushed before the sync call.
    pub process_model_writes: WritePlan,
    /// Staged-edit revision the payload was built from.
    pub revision: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub process_model_writes: usize,
    pub scheduled_units: usize,
    pub purged_units: usize,
    pub tasks_reported: usize,
    /// Conflicts observed by the reload that follows the sync.
    pub conflicts: Vec<ConflictError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied(SyncSummary),
    Cancelled,
}

#[derive(Debug)]
struct CoordinatorState {
    phase: SyncPhase,
    last_failure: Option<String>,
}

/// Shared Sync state. Clones observe and guard the same phase.
#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    state: Arc<Mutex<CoordinatorState>>,
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CoordinatorState {
                phase: SyncPhase::Idle,
                last_failure: None,
            })),
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.state.lock().phase
    }

    /// Message of the most recent failed Sync, kept until the next one succeeds.
    pub fn last_failure(&self) -> Option<String> {
        self.state.lock().last_failure.clone()
    }

    fn transition(state: &mut CoordinatorState, next: SyncPhase) {
        debug!(from = %state.phase, to = %next, "Sync phase");
        state.phase = next;
    }

    /// Build the payload for `visible` units and wait for confirmation.
    ///
    /// Rejected while another Sync is committing. A Sync already awaiting confirmation is
    /// replaced.
    pub fn prepare(
        &self,
        session: &EditSession,
        visible: &[NodeId],
    ) -> Result<PendingSync, SyncError> {
        let mut state = self.state.lock();
        if state.phase == SyncPhase::Committing {
            warn!("Sync requested while another is committing");
            return Err(SyncError::InProgress);
        }
        Self::transition(&mut state, SyncPhase::BuildingPayload);
        let request = SyncRequest::build(session, visible);
        let process_model_writes = session.plan_writes(None, Attribute::ProcessModel);
        Self::transition(&mut state, SyncPhase::AwaitingConfirmation);
        Ok(PendingSync {
            request,
            process_model_writes,
            revision: session.overrides().revision(),
        })
    }

    /// Answer a prepared Sync. A confirmed Sync runs to success or failure.
    ///
    /// A confirmed Sync whose session was edited after `prepare` is rejected with
    /// [`SyncError::Stale`] and nothing is sent; prepare it again.
    pub async fn commit(
        &self,
        session: &mut EditSession,
        backend: &dyn PlanningBackend,
        pending: PendingSync,
        confirmation: Confirmation,
    ) -> Result<SyncOutcome, SyncError> {
        {
            let mut state = self.state.lock();
            match state.phase {
                SyncPhase::AwaitingConfirmation => {}
                SyncPhase::Committing => return Err(SyncError::InProgress),
                _ => return Err(SyncError::NotPrepared),
            }
            if confirmation == Confirmation::Declined {
                Self::transition(&mut state, SyncPhase::Idle);
                info!("Sync declined");
                return Ok(SyncOutcome::Cancelled);
            }
            if session.overrides().revision() != pending.revision {
                warn!(
                    prepared = pending.revision,
                    current = session.overrides().revision(),
                    "Staged edits changed after the sync was prepared"
                );
                Self::transition(&mut state, SyncPhase::Idle);
                return Err(SyncError::Stale);
            }
            Self::transition(&mut state, SyncPhase::Committing);
        }

        let result = Self::run(session, backend, &pending).await;

        let mut state = self.state.lock();
        match result {
            Ok(summary) => {
                state.last_failure = None;
                Self::transition(&mut state, SyncPhase::Idle);
                info!(
                    scheduled = summary.scheduled_units,
                    purged = summary.purged_units,
                    process_model_writes = summary.process_model_writes,
                    "Sync applied"
                );
                Ok(SyncOutcome::Applied(summary))
            }
            Err(err) => {
                error!(error = %err, "Sync failed");
                state.last_failure = Some(err.to_string());
                if !matches!(err, SyncError::Reload(_)) {
                    Self::transition(&mut state, SyncPhase::Failed);
                }
                Self::transition(&mut state, SyncPhase::Idle);
                Err(err)
            }
        }
    }

    async fn run(
        session: &mut EditSession,
        backend: &dyn PlanningBackend,
        pending: &PendingSync,
    ) -> Result<SyncSummary, SyncError> {
        let process_model_writes = session
            .flush_writes(backend, &pending.process_model_writes)
            .await?;
        let receipt = backend
            .sync_tasks(session.project_id(), &pending.request.to_body())
            .await?;

        // The backend applied everything; staged edits are spent even if the reload fails.
        session.discard_all();
        let reload = session.reload(backend).await.map_err(SyncError::Reload)?;

        Ok(SyncSummary {
            process_model_writes,
            scheduled_units: pending.request.start_map.len(),
            purged_units: pending.request.purge_unit_ids.len(),
            tasks_reported: receipt.tasks_reported,
            conflicts: reload.conflicts,
        })
    }
}
