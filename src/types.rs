//! Core identifiers shared across the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database id of a structural node. Unique per level only.
pub type NodeId = u64;

/// Database id of a process model (workflow template).
pub type ProcessModelId = u64;

/// Database id of a project.
pub type ProjectId = u64;

/// The four levels of a building's physical structure, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Component,
    Riser,
    Floor,
    Unit,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Component, Level::Riser, Level::Floor, Level::Unit];

    /// The next finer level, `None` for units.
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Component => Some(Level::Riser),
            Level::Riser => Some(Level::Floor),
            Level::Floor => Some(Level::Unit),
            Level::Unit => None,
        }
    }

    /// The next coarser level, `None` for components.
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Component => None,
            Level::Riser => Some(Level::Component),
            Level::Floor => Some(Level::Riser),
            Level::Unit => Some(Level::Floor),
        }
    }

    /// REST collection name used by the backend for nodes of this level.
    pub fn collection(self) -> &'static str {
        match self {
            Level::Component => "components",
            Level::Riser => "risers",
            Level::Floor => "floors",
            Level::Unit => "units",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Component => "component",
            Level::Riser => "riser",
            Level::Floor => "floor",
            Level::Unit => "unit",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "component" | "components" | "bauteil" => Ok(Level::Component),
            "riser" | "risers" | "stiege" => Ok(Level::Riser),
            "floor" | "floors" | "ebene" => Ok(Level::Floor),
            "unit" | "units" | "top" => Ok(Level::Unit),
            other => Err(format!(
                "Unknown level '{}' (expected component, riser, floor or unit)",
                other
            )),
        }
    }
}

/// Identity of a node in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub level: Level,
    pub id: NodeId,
}

impl NodeKey {
    pub const fn new(level: Level, id: NodeId) -> Self {
        Self { level, id }
    }

    pub const fn component(id: NodeId) -> Self {
        Self::new(Level::Component, id)
    }

    pub const fn riser(id: NodeId) -> Self {
        Self::new(Level::Riser, id)
    }

    pub const fn floor(id: NodeId) -> Self {
        Self::new(Level::Floor, id)
    }

    pub const fn unit(id: NodeId) -> Self {
        Self::new(Level::Unit, id)
    }

    pub fn is_unit(&self) -> bool {
        self.level == Level::Unit
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.level, self.id)
    }
}

/// The two schedulable attributes a node may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    ProcessModel,
    StartDate,
}

impl Attribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::ProcessModel => "process_model",
            Attribute::StartDate => "start_date",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "process_model" | "process_model_id" | "pm" => Ok(Attribute::ProcessModel),
            "start_date" | "start" | "start_soll" => Ok(Attribute::StartDate),
            other => Err(format!(
                "Unknown attribute '{}' (expected process_model or start_date)",
                other
            )),
        }
    }
}
