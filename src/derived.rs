//! Derived Schedule
//!
//! Reconstructs the schedule implied by already-generated task instances: per unit the
//! earliest planned start and the process model that produced its first task, then a
//! null-safe minimum rolled up through floors, risers and components.

use crate::backend::wire::TimelineTask;
use crate::tree::TreeModel;
use crate::types::{NodeId, NodeKey};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Schedule state implied by the generated tasks of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedUnitState {
    pub unit_id: NodeId,
    pub earliest_start: Option<NaiveDate>,
    /// Process model of the first task seen for this unit, in input order.
    pub first_process_model_name: Option<String>,
}

/// Null-safe minimum: absent values are ignored, all-absent yields `None`.
pub fn min_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Derived values for every node of a tree snapshot.
#[derive(Debug, Clone, Default)]
pub struct DerivedSchedule {
    units: HashMap<NodeId, DerivedUnitState>,
    rolled_up: HashMap<NodeKey, NaiveDate>,
}

impl DerivedSchedule {
    /// Earliest derived start for any node. Units without tasks, and ancestors whose whole
    /// subtree has none, yield `None`.
    pub fn earliest_start(&self, key: NodeKey) -> Option<NaiveDate> {
        self.rolled_up.get(&key).copied()
    }

    pub fn unit(&self, unit_id: NodeId) -> Option<&DerivedUnitState> {
        self.units.get(&unit_id)
    }

    /// Whether generated tasks with a start date exist for the unit.
    pub fn has_scheduled_tasks(&self, unit_id: NodeId) -> bool {
        self.units
            .get(&unit_id)
            .map(|u| u.earliest_start.is_some())
            .unwrap_or(false)
    }

    pub fn first_process_model_name(&self, unit_id: NodeId) -> Option<&str> {
        self.units
            .get(&unit_id)
            .and_then(|u| u.first_process_model_name.as_deref())
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

pub struct DerivedAggregator;

impl DerivedAggregator {
    /// Group tasks by unit, keeping units in order of first appearance.
    ///
    /// The process-model name is taken from the first task of the unit that carries one;
    /// input order is preserved, not sorted by date.
    pub fn unit_states(tasks: &[TimelineTask]) -> Vec<DerivedUnitState> {
        let mut order: Vec<NodeId> = Vec::new();
        let mut by_unit: HashMap<NodeId, DerivedUnitState> = HashMap::new();

        for task in tasks {
            let state = by_unit.entry(task.unit_id).or_insert_with(|| {
                order.push(task.unit_id);
                DerivedUnitState {
                    unit_id: task.unit_id,
                    earliest_start: None,
                    first_process_model_name: None,
                }
            });
            state.earliest_start = min_date(state.earliest_start, task.start_soll);
            if state.first_process_model_name.is_none() {
                state.first_process_model_name = task.process_model.clone();
            }
        }

        order
            .into_iter()
            .filter_map(|id| by_unit.remove(&id))
            .collect()
    }

    /// Build per-unit state and roll it up the hierarchy of `tree`.
    pub fn aggregate(tree: &TreeModel, tasks: &[TimelineTask]) -> DerivedSchedule {
        let units: HashMap<NodeId, DerivedUnitState> = Self::unit_states(tasks)
            .into_iter()
            .map(|s| (s.unit_id, s))
            .collect();

        let mut rolled_up = HashMap::new();
        for root in tree.roots() {
            roll_up(tree, *root, &units, &mut rolled_up);
        }

        let orphaned = units
            .keys()
            .filter(|id| !tree.contains(&NodeKey::unit(**id)))
            .count();
        debug!(
            tasks = tasks.len(),
            units = units.len(),
            orphaned_units = orphaned,
            "aggregated derived schedule"
        );

        DerivedSchedule { units, rolled_up }
    }
}

fn roll_up(
    tree: &TreeModel,
    key: NodeKey,
    units: &HashMap<NodeId, DerivedUnitState>,
    out: &mut HashMap<NodeKey, NaiveDate>,
) -> Option<NaiveDate> {
    let earliest = if key.is_unit() {
        units.get(&key.id).and_then(|u| u.earliest_start)
    } else {
        tree.children(&key)
            .iter()
            .fold(None, |acc, child| min_date(acc, roll_up(tree, *child, units, out)))
    };
    if let Some(date) = earliest {
        out.insert(key, date);
    }
    earliest
}
