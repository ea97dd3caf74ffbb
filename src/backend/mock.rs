//! In-memory planning backend.
//!
//! Keeps a structure, a task list and a process-model catalog in memory, applies node
//! writes and syncs to them, and records every call. A sync can be held in flight on a
//! gate to observe the coordinator while it is committing.

use crate::backend::wire::{
    AttributeWrite, ComponentRecord, NodeResource, NodeWriteBody, ProcessModelRecord,
    SyncReceipt, SyncTasksBody, TimelineTask,
};
use crate::backend::PlanningBackend;
use crate::error::TransportError;
use crate::types::{NodeId, NodeKey, ProcessModelId, ProjectId};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchStructure,
    FetchTimeline,
    FetchProcessModels,
    GetNode(NodeKey),
    PutNode(NodeKey, NodeWriteBody),
    SyncTasks(SyncTasksBody),
}

#[derive(Debug, Default)]
struct MockState {
    structure: Vec<ComponentRecord>,
    tasks: Vec<TimelineTask>,
    process_models: Vec<ProcessModelRecord>,
    calls: Vec<BackendCall>,
    fail_reads: bool,
    fail_writes: bool,
    fail_syncs: bool,
}

struct RecordMut<'a> {
    name: &'a mut String,
    process_model_id: &'a mut Option<ProcessModelId>,
    start_soll: &'a mut Option<NaiveDate>,
}

fn locate(structure: &mut [ComponentRecord], key: NodeKey) -> Option<RecordMut<'_>> {
    for c in structure.iter_mut() {
        if key == NodeKey::component(c.id) {
            return Some(RecordMut {
                name: &mut c.name,
                process_model_id: &mut c.process_model_id,
                start_soll: &mut c.start_soll,
            });
        }
        for r in c.risers.iter_mut() {
            if key == NodeKey::riser(r.id) {
                return Some(RecordMut {
                    name: &mut r.name,
                    process_model_id: &mut r.process_model_id,
                    start_soll: &mut r.start_soll,
                });
            }
            for f in r.floors.iter_mut() {
                if key == NodeKey::floor(f.id) {
                    return Some(RecordMut {
                        name: &mut f.name,
                        process_model_id: &mut f.process_model_id,
                        start_soll: &mut f.start_soll,
                    });
                }
                for u in f.units.iter_mut() {
                    if key == NodeKey::unit(u.id) {
                        return Some(RecordMut {
                            name: &mut u.name,
                            process_model_id: &mut u.process_model_id,
                            start_soll: &mut u.start_soll,
                        });
                    }
                }
            }
        }
    }
    None
}

/// Process model a unit's tasks would be generated from: its own, else the nearest
/// persisted ancestor's.
fn inherited_process_model(structure: &[ComponentRecord], unit_id: NodeId) -> Option<ProcessModelId> {
    for c in structure {
        for r in &c.risers {
            for f in &r.floors {
                if let Some(u) = f.units.iter().find(|u| u.id == unit_id) {
                    return u
                        .process_model_id
                        .or(f.process_model_id)
                        .or(r.process_model_id)
                        .or(c.process_model_id);
                }
            }
        }
    }
    None
}

fn simulated_failure(what: &str) -> TransportError {
    TransportError::Status {
        status: 503,
        body: format!("simulated failure: {}", what),
    }
}

/// In-memory [`PlanningBackend`].
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    sync_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockBackend {
    pub fn new(
        structure: Vec<ComponentRecord>,
        tasks: Vec<TimelineTask>,
        process_models: Vec<ProcessModelRecord>,
    ) -> Self {
        Self {
            state: Mutex::new(MockState {
                structure,
                tasks,
                process_models,
                ..MockState::default()
            }),
            sync_gate: Mutex::new(None),
        }
    }

    /// Hold every following sync until the returned gate is notified.
    pub fn gate_syncs(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.sync_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn set_fail_syncs(&self, fail: bool) {
        self.state.lock().fail_syncs = fail;
    }

    /// Change a persisted value behind the session's back.
    pub fn set_persisted_process_model(&self, key: NodeKey, value: Option<ProcessModelId>) {
        let mut state = self.state.lock();
        if let Some(record) = locate(&mut state.structure, key) {
            *record.process_model_id = value;
        }
    }

    pub fn persisted(&self, key: NodeKey) -> Option<(Option<ProcessModelId>, Option<NaiveDate>)> {
        let mut state = self.state.lock();
        locate(&mut state.structure, key).map(|r| (*r.process_model_id, *r.start_soll))
    }

    pub fn structure(&self) -> Vec<ComponentRecord> {
        self.state.lock().structure.clone()
    }

    pub fn tasks(&self) -> Vec<TimelineTask> {
        self.state.lock().tasks.clone()
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Recorded node writes, in order.
    pub fn node_writes(&self) -> Vec<(NodeKey, NodeWriteBody)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::PutNode(key, body) => Some((*key, body.clone())),
                _ => None,
            })
            .collect()
    }

    /// Recorded sync bodies, in order.
    pub fn syncs(&self) -> Vec<SyncTasksBody> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::SyncTasks(body) => Some(body.clone()),
                _ => None,
            })
            .collect()
    }

    fn record_read(&self, call: BackendCall) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.fail_reads {
            return Err(simulated_failure("read"));
        }
        Ok(())
    }
}

#[async_trait]
impl PlanningBackend for MockBackend {
    async fn fetch_structure(
        &self,
        _project: ProjectId,
    ) -> Result<Vec<ComponentRecord>, TransportError> {
        self.record_read(BackendCall::FetchStructure)?;
        Ok(self.state.lock().structure.clone())
    }

    async fn fetch_tasks_timeline(
        &self,
        _project: ProjectId,
    ) -> Result<Vec<TimelineTask>, TransportError> {
        self.record_read(BackendCall::FetchTimeline)?;
        Ok(self.state.lock().tasks.clone())
    }

    async fn fetch_process_models(&self) -> Result<Vec<ProcessModelRecord>, TransportError> {
        self.record_read(BackendCall::FetchProcessModels)?;
        Ok(self.state.lock().process_models.clone())
    }

    async fn get_node(&self, key: NodeKey) -> Result<NodeResource, TransportError> {
        self.record_read(BackendCall::GetNode(key))?;
        let mut state = self.state.lock();
        locate(&mut state.structure, key)
            .map(|r| NodeResource {
                name: r.name.clone(),
                process_model_id: *r.process_model_id,
                start_soll: *r.start_soll,
            })
            .ok_or_else(|| TransportError::NotFound(key.to_string()))
    }

    async fn put_node(&self, key: NodeKey, body: &NodeWriteBody) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::PutNode(key, body.clone()));
        if state.fail_writes {
            return Err(simulated_failure("write"));
        }
        let record = locate(&mut state.structure, key)
            .ok_or_else(|| TransportError::NotFound(key.to_string()))?;
        *record.name = body.name.clone();
        match body.attribute {
            AttributeWrite::ProcessModel { process_model_id } => {
                *record.process_model_id = process_model_id
            }
            AttributeWrite::StartDate { start_soll } => *record.start_soll = start_soll,
        }
        Ok(())
    }

    async fn sync_tasks(
        &self,
        _project: ProjectId,
        body: &SyncTasksBody,
    ) -> Result<SyncReceipt, TransportError> {
        {
            let mut state = self.state.lock();
            state.calls.push(BackendCall::SyncTasks(body.clone()));
        }

        let gate = self.sync_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = self.state.lock();
        if state.fail_syncs {
            return Err(simulated_failure("sync"));
        }

        let scope: HashSet<NodeId> = body.filters.unit_ids.iter().copied().collect();
        let in_scope = |id: &NodeId| scope.is_empty() || scope.contains(id);

        let touched: HashSet<NodeId> = body
            .start_map
            .unit
            .keys()
            .chain(body.purge_unit_ids.iter())
            .copied()
            .filter(|id| in_scope(id))
            .collect();
        state.tasks.retain(|t| !touched.contains(&t.unit_id));

        let mut created = 0;
        for (unit_id, start) in body.start_map.unit.iter() {
            if !in_scope(unit_id) {
                continue;
            }
            let model_name = inherited_process_model(&state.structure, *unit_id).and_then(|pm| {
                state
                    .process_models
                    .iter()
                    .find(|m| m.id == pm)
                    .map(|m| m.name.clone())
            });
            if model_name.is_none() {
                // No process model, nothing to generate.
                continue;
            }
            state.tasks.push(TimelineTask {
                unit_id: *unit_id,
                start_soll: Some(*start),
                process_model: model_name,
            });
            created += 1;
        }

        Ok(SyncReceipt {
            tasks_reported: created,
        })
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
