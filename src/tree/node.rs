//! Structure node types

use crate::types::{Level, NodeKey, ProcessModelId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Attribute values as last loaded from the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persisted {
    pub process_model_id: Option<ProcessModelId>,
    pub start_date: Option<NaiveDate>,
}

impl Persisted {
    pub fn new(process_model_id: Option<ProcessModelId>, start_date: Option<NaiveDate>) -> Self {
        Self {
            process_model_id,
            start_date,
        }
    }
}

/// A node of the project structure.
///
/// Children are stored as keys into the owning [`TreeModel`](super::TreeModel) and keep the
/// order in which the backend returned them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub key: NodeKey,
    pub name: String,
    pub parent: Option<NodeKey>,
    pub children: Vec<NodeKey>,
    pub persisted: Persisted,
}

impl Node {
    pub fn level(&self) -> Level {
        self.key.level
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
