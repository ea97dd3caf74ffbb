//! Sync payload construction.

use crate::backend::wire::{StartMapBody, SyncFilters, SyncTasksBody};
use crate::session::EditSession;
use crate::types::{Attribute, NodeId, NodeKey};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// What a Sync sends for one set of visible units. Built fresh per Sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRequest {
    /// Effective start date per visible unit; units without one are omitted.
    pub start_map: BTreeMap<NodeId, NaiveDate>,
    /// Units the backend may touch, in caller order without duplicates.
    pub visible_unit_ids: Vec<NodeId>,
    /// Visible units whose generated tasks must be deleted.
    pub purge_unit_ids: Vec<NodeId>,
}

impl SyncRequest {
    /// Build the request for `visible` units of `session`.
    ///
    /// A unit is purged when its generated tasks had a start, its effective start is now
    /// empty, and an explicit clear reached it during this session.
    pub fn build(session: &EditSession, visible: &[NodeId]) -> Self {
        let tree = session.tree();
        let resolver = session.resolver();
        let mut seen = HashSet::new();
        let mut request = SyncRequest::default();

        for &unit_id in visible {
            let key = NodeKey::unit(unit_id);
            if !tree.contains(&key) {
                debug!(unit_id, "Ignoring unknown visible unit");
                continue;
            }
            if !seen.insert(unit_id) {
                continue;
            }
            request.visible_unit_ids.push(unit_id);

            match resolver.start_date(key) {
                Some(start) => {
                    request.start_map.insert(unit_id, start);
                }
                None => {
                    let had_tasks = session.derived().has_scheduled_tasks(unit_id);
                    let cleared = session
                        .overrides()
                        .cleared_this_session(key, Attribute::StartDate);
                    if had_tasks && cleared {
                        request.purge_unit_ids.push(unit_id);
                    }
                }
            }
        }

        debug!(
            visible = request.visible_unit_ids.len(),
            scheduled = request.start_map.len(),
            purged = request.purge_unit_ids.len(),
            "Built sync request"
        );
        request
    }

    pub fn is_noop(&self) -> bool {
        self.start_map.is_empty() && self.purge_unit_ids.is_empty()
    }

    pub fn to_body(&self) -> SyncTasksBody {
        SyncTasksBody {
            start_map: StartMapBody {
                unit: self.start_map.clone(),
            },
            filters: SyncFilters {
                unit_ids: self.visible_unit_ids.clone(),
            },
            purge_unit_ids: self.purge_unit_ids.clone(),
        }
    }
}
