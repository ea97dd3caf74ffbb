//! Edit Session
//!
//! One project-editing context: the loaded structure, the derived schedule, the process
//! model catalog and the staged edits of this session. Sessions are plain values; several
//! projects can be edited side by side without sharing state.
//!
//! Both commit paths go through [`EditSession::plan_writes`]: the immediate per-node commit
//! plans over a subtree, the Sync-time flush over the whole tree. An immediate start-date
//! commit is a Sync of the subtree's units, built by the same [`SyncRequest::build`].

use crate::backend::{AttributeWrite, NodeWriteBody, PlanningBackend, ProcessModelRecord};
use crate::derived::{DerivedAggregator, DerivedSchedule};
use crate::error::{ApiError, ConflictError, TransportError, ValidationError};
use crate::overrides::{OverrideStore, StagedValue};
use crate::resolve::EffectiveValueResolver;
use crate::sync::SyncRequest;
use crate::tree::TreeModel;
use crate::types::{Attribute, NodeId, NodeKey, ProcessModelId, ProjectId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, instrument, warn};

pub mod script;

pub use script::{EditScript, ScriptedEdit};

/// A single planned node write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWrite {
    pub key: NodeKey,
    pub attribute: AttributeWrite,
}

/// Node writes needed to persist the staged entries of one attribute within a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WritePlan {
    pub attribute: Attribute,
    /// Staged entries that differ from persisted, in pre-order.
    pub writes: Vec<PlannedWrite>,
    /// Staged entries already equal to persisted; dropped without a write.
    pub settled: Vec<NodeKey>,
}

impl WritePlan {
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.settled.is_empty()
    }

    fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.writes.iter().map(|w| w.key).chain(self.settled.iter().copied())
    }
}

/// Outcome of a reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Staged nodes whose persisted value changed server-side behind this session.
    pub conflicts: Vec<ConflictError>,
    /// Staged entries dropped because their node no longer exists.
    pub dropped_edits: Vec<(NodeKey, Attribute)>,
}

/// Outcome of an immediate per-node commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub written: usize,
    pub settled: usize,
    /// Units rescheduled by the subtree sync of a start-date commit.
    pub scheduled_units: usize,
    pub purged_units: usize,
    pub conflicts: Vec<ConflictError>,
}

fn persisted_value(tree: &TreeModel, key: NodeKey, attribute: Attribute) -> Option<StagedValue> {
    let persisted = tree.persisted(&key)?;
    Some(match attribute {
        Attribute::ProcessModel => StagedValue::ProcessModel(persisted.process_model_id),
        Attribute::StartDate => StagedValue::StartDate(persisted.start_date),
    })
}

fn attribute_write(value: StagedValue) -> AttributeWrite {
    match value {
        StagedValue::ProcessModel(process_model_id) => {
            AttributeWrite::ProcessModel { process_model_id }
        }
        StagedValue::StartDate(start_soll) => AttributeWrite::StartDate { start_soll },
    }
}

fn invalid_structure(err: ValidationError) -> TransportError {
    TransportError::Decode(err.to_string())
}

#[derive(Debug, Clone)]
pub struct EditSession {
    project_id: ProjectId,
    session_id: String,
    tree: TreeModel,
    derived: DerivedSchedule,
    catalog: BTreeMap<ProcessModelId, String>,
    overrides: OverrideStore,
    /// Node writes made by this session since the last reload.
    own_writes: HashSet<(NodeKey, Attribute)>,
}

impl EditSession {
    /// Load structure, timeline and catalog for a project.
    #[instrument(skip(backend), fields(backend = backend.backend_name()))]
    pub async fn open(
        backend: &dyn PlanningBackend,
        project_id: ProjectId,
    ) -> Result<Self, TransportError> {
        let (structure, tasks, models) = futures::try_join!(
            backend.fetch_structure(project_id),
            backend.fetch_tasks_timeline(project_id),
            backend.fetch_process_models(),
        )?;
        let tree = TreeModel::from_structure(&structure).map_err(invalid_structure)?;
        let derived = DerivedAggregator::aggregate(&tree, &tasks);
        let session = Self::from_parts(project_id, tree, derived, models);
        info!(
            project_id,
            session_id = %session.session_id,
            nodes = session.tree.len(),
            process_models = session.catalog.len(),
            "Opened edit session"
        );
        Ok(session)
    }

    /// Assemble a session from already-loaded parts.
    pub fn from_parts(
        project_id: ProjectId,
        tree: TreeModel,
        derived: DerivedSchedule,
        process_models: impl IntoIterator<Item = ProcessModelRecord>,
    ) -> Self {
        Self {
            project_id,
            session_id: format!("{}-{}", project_id, chrono::Utc::now().timestamp_millis()),
            tree,
            derived,
            catalog: process_models.into_iter().map(|m| (m.id, m.name)).collect(),
            overrides: OverrideStore::new(),
            own_writes: HashSet::new(),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    pub fn derived(&self) -> &DerivedSchedule {
        &self.derived
    }

    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    pub fn catalog(&self) -> &BTreeMap<ProcessModelId, String> {
        &self.catalog
    }

    pub fn process_model_name(&self, id: ProcessModelId) -> Option<&str> {
        self.catalog.get(&id).map(String::as_str)
    }

    pub fn resolver(&self) -> EffectiveValueResolver<'_> {
        EffectiveValueResolver::new(&self.tree, &self.overrides, &self.derived)
    }

    pub fn effective_process_model(&self, key: NodeKey) -> Option<ProcessModelId> {
        self.resolver().process_model(key)
    }

    pub fn effective_start_date(&self, key: NodeKey) -> Option<NaiveDate> {
        self.resolver().start_date(key)
    }

    /// Validate and stage an edit, cascading it to the subtree.
    ///
    /// Process model ids are checked against the catalog when one was loaded.
    pub fn stage(&mut self, key: NodeKey, value: StagedValue) -> Result<usize, ValidationError> {
        if let StagedValue::ProcessModel(Some(id)) = value {
            if id == 0 {
                return Err(ValidationError::InvalidProcessModelId(id));
            }
            if !self.catalog.is_empty() && !self.catalog.contains_key(&id) {
                return Err(ValidationError::UnknownProcessModel(id));
            }
        }
        let written = self.overrides.set(&self.tree, key, value)?;
        debug!(node = %key, attribute = %value.attribute(), written, "Staged edit");
        Ok(written)
    }

    /// Parse user text and stage it. Empty text, `none` and `null` stage an explicit clear.
    pub fn stage_raw(
        &mut self,
        key: NodeKey,
        attribute: Attribute,
        text: &str,
    ) -> Result<usize, ValidationError> {
        let value = StagedValue::parse(attribute, text)?;
        self.stage(key, value)
    }

    /// Withdraw the edit made at `key`, including what it cascaded.
    ///
    /// A node that only holds a cascaded entry loses just that entry.
    pub fn cancel(&mut self, key: NodeKey, attribute: Attribute) -> usize {
        let removed = self.overrides.clear_origin(key, attribute);
        if removed > 0 {
            return removed;
        }
        usize::from(self.overrides.clear(key, attribute))
    }

    pub fn discard_all(&mut self) {
        self.overrides.clear_all();
    }

    /// Plan node writes for the staged entries of `attribute` under `scope`, or the whole
    /// tree when `scope` is `None`.
    pub fn plan_writes(&self, scope: Option<NodeKey>, attribute: Attribute) -> WritePlan {
        let keys: Vec<NodeKey> = match scope {
            Some(root) => self.tree.subtree(root).collect(),
            None => self.tree.preorder().collect(),
        };
        let mut plan = WritePlan {
            attribute,
            writes: Vec::new(),
            settled: Vec::new(),
        };
        for key in keys {
            let Some(staged) = self.overrides.get(key, attribute) else {
                continue;
            };
            if persisted_value(&self.tree, key, attribute) == Some(staged) {
                plan.settled.push(key);
            } else {
                plan.writes.push(PlannedWrite {
                    key,
                    attribute: attribute_write(staged),
                });
            }
        }
        plan
    }

    /// Execute a plan as read-modify-write round trips, one node at a time.
    ///
    /// Stops at the first failure; staged entries are left in place either way.
    pub async fn flush_writes(
        &mut self,
        backend: &dyn PlanningBackend,
        plan: &WritePlan,
    ) -> Result<usize, TransportError> {
        for write in &plan.writes {
            let current = backend.get_node(write.key).await?;
            let body = NodeWriteBody {
                name: current.name,
                attribute: write.attribute,
            };
            if let Err(e) = backend.put_node(write.key, &body).await {
                warn!(node = %write.key, attribute = %plan.attribute, error = %e, "Node write failed");
                return Err(e);
            }
            self.own_writes.insert((write.key, plan.attribute));
            debug!(node = %write.key, attribute = %plan.attribute, "Node written");
        }
        Ok(plan.writes.len())
    }

    /// Refetch structure, timeline and catalog and rebuild the derived state.
    ///
    /// Staged entries survive unless their node disappeared. On failure the session is
    /// left exactly as it was.
    #[instrument(skip(self, backend), fields(project_id = self.project_id))]
    pub async fn reload(
        &mut self,
        backend: &dyn PlanningBackend,
    ) -> Result<ReloadReport, TransportError> {
        let (structure, tasks, models) = futures::try_join!(
            backend.fetch_structure(self.project_id),
            backend.fetch_tasks_timeline(self.project_id),
            backend.fetch_process_models(),
        )?;
        let tree = TreeModel::from_structure(&structure).map_err(invalid_structure)?;
        let derived = DerivedAggregator::aggregate(&tree, &tasks);

        let mut report = ReloadReport::default();
        let staged: Vec<(NodeKey, Attribute)> = [Attribute::ProcessModel, Attribute::StartDate]
            .into_iter()
            .flat_map(|attr| {
                self.overrides
                    .entries(attr)
                    .map(move |(key, _)| (key, attr))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (key, attribute) in staged {
            if !tree.contains(&key) {
                self.overrides.clear(key, attribute);
                report.dropped_edits.push((key, attribute));
                continue;
            }
            let before = persisted_value(&self.tree, key, attribute);
            let after = persisted_value(&tree, key, attribute);
            if before != after && !self.own_writes.contains(&(key, attribute)) {
                report.conflicts.push(ConflictError { key, attribute });
            }
        }
        report.conflicts.sort_by_key(|c| (c.key, c.attribute));
        report.dropped_edits.sort();
        for conflict in &report.conflicts {
            warn!(node = %conflict.key, attribute = %conflict.attribute, "{}", conflict);
        }

        self.tree = tree;
        self.derived = derived;
        self.catalog = models.into_iter().map(|m| (m.id, m.name)).collect();
        self.own_writes.clear();
        debug!(
            nodes = self.tree.len(),
            units_with_tasks = self.derived.unit_count(),
            staged = self.overrides.len(),
            "Reloaded session"
        );
        Ok(report)
    }

    /// Commit the staged `attribute` entries in `key`'s subtree right away, then reload.
    ///
    /// Start dates are followed by a sync of the subtree's units, so a committed clear
    /// purges generated tasks the same way a full Sync would. When an ancestor still holds a
    /// staged edit of the attribute, the committed entries stay staged (now settled) so the
    /// ancestor's value does not resurface until that edit is flushed or cancelled.
    pub async fn commit_node(
        &mut self,
        backend: &dyn PlanningBackend,
        key: NodeKey,
        attribute: Attribute,
    ) -> Result<CommitReport, ApiError> {
        if !self.tree.contains(&key) {
            return Err(ValidationError::UnknownNode(key).into());
        }
        let plan = self.plan_writes(Some(key), attribute);
        let request = match attribute {
            Attribute::StartDate => {
                let units: Vec<NodeId> = self
                    .tree
                    .subtree(key)
                    .filter(NodeKey::is_unit)
                    .map(|unit| unit.id)
                    .collect();
                Some(SyncRequest::build(self, &units)).filter(|r| !r.is_noop())
            }
            Attribute::ProcessModel => None,
        };

        let written = self.flush_writes(backend, &plan).await?;
        if let Some(request) = &request {
            backend
                .sync_tasks(self.project_id, &request.to_body())
                .await?;
        }
        let reload = self.reload(backend).await?;

        let covered = self
            .tree
            .ancestors(key)
            .any(|ancestor| self.overrides.get(ancestor, attribute).is_some());
        if !covered {
            for planned in plan.keys() {
                self.overrides.clear(planned, attribute);
            }
        }

        let scheduled_units = request.as_ref().map_or(0, |r| r.start_map.len());
        let purged_units = request.as_ref().map_or(0, |r| r.purge_unit_ids.len());
        info!(
            node = %key,
            %attribute,
            written,
            settled = plan.settled.len(),
            scheduled_units,
            purged_units,
            kept_under_ancestor = covered,
            "Committed node"
        );
        Ok(CommitReport {
            written,
            settled: plan.settled.len(),
            scheduled_units,
            purged_units,
            conflicts: reload.conflicts,
        })
    }

    /// Immediate process-model path: stage at `key`, write the subtree, reload.
    pub async fn set_process_model(
        &mut self,
        backend: &dyn PlanningBackend,
        key: NodeKey,
        process_model_id: Option<ProcessModelId>,
    ) -> Result<CommitReport, ApiError> {
        self.stage(key, StagedValue::ProcessModel(process_model_id))?;
        self.commit_node(backend, key, Attribute::ProcessModel).await
    }
}
