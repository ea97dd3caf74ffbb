//! Request and response bodies exchanged with the planning backend.

use crate::types::{NodeId, ProcessModelId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component entry of `GET /projects/{id}/structure`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub process_model_id: Option<ProcessModelId>,
    #[serde(default)]
    pub start_soll: Option<NaiveDate>,
    #[serde(default, alias = "stiegen")]
    pub risers: Vec<RiserRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiserRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub process_model_id: Option<ProcessModelId>,
    #[serde(default)]
    pub start_soll: Option<NaiveDate>,
    #[serde(default, alias = "ebenen")]
    pub floors: Vec<FloorRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub process_model_id: Option<ProcessModelId>,
    #[serde(default)]
    pub start_soll: Option<NaiveDate>,
    #[serde(default, alias = "tops")]
    pub units: Vec<UnitRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub process_model_id: Option<ProcessModelId>,
    #[serde(default)]
    pub start_soll: Option<NaiveDate>,
}

/// One generated task instance from `GET /projects/{id}/tasks-timeline`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineTask {
    #[serde(alias = "top_id")]
    pub unit_id: NodeId,
    #[serde(default)]
    pub start_soll: Option<NaiveDate>,
    #[serde(default)]
    pub process_model: Option<String>,
}

impl TimelineTask {
    pub fn new(unit_id: NodeId, start_soll: Option<NaiveDate>, process_model: Option<&str>) -> Self {
        Self {
            unit_id,
            start_soll,
            process_model: process_model.map(str::to_string),
        }
    }
}

/// Entry of `GET /process-models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessModelRecord {
    pub id: ProcessModelId,
    pub name: String,
}

/// Body of `GET /{collection}/{id}`. Only `name` is needed for the read-modify-write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResource {
    pub name: String,
    #[serde(default)]
    pub process_model_id: Option<ProcessModelId>,
    #[serde(default)]
    pub start_soll: Option<NaiveDate>,
}

/// The single attribute carried by a node PUT. `None` is sent as JSON `null` (clear).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeWrite {
    ProcessModel {
        process_model_id: Option<ProcessModelId>,
    },
    StartDate {
        start_soll: Option<NaiveDate>,
    },
}

/// Body of `PUT /{collection}/{id}`. The PUT replaces the object, so `name` is re-sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeWriteBody {
    pub name: String,
    #[serde(flatten)]
    pub attribute: AttributeWrite,
}

/// Body of `POST /projects/{id}/sync-tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncTasksBody {
    pub start_map: StartMapBody,
    pub filters: SyncFilters,
    pub purge_unit_ids: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StartMapBody {
    pub unit: BTreeMap<NodeId, NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncFilters {
    #[serde(rename = "unitIds")]
    pub unit_ids: Vec<NodeId>,
}

/// What the backend reported for an accepted sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncReceipt {
    /// Number of task instances the backend reported back, if it returned a list.
    pub tasks_reported: usize,
}
