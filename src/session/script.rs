//! Edit scripts: a TOML list of staged edits applied in order.
//!
//! ```toml
//! [[edit]]
//! level = "floor"
//! id = 100
//! attribute = "start_date"
//! value = "2025-04-01"
//!
//! [[edit]]
//! level = "unit"
//! id = 1001
//! attribute = "start_date"   # no value: explicit clear
//! ```

use super::EditSession;
use crate::error::{ApiError, ValidationError};
use crate::types::{Attribute, Level, NodeId, NodeKey};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedEdit {
    pub level: Level,
    pub id: NodeId,
    pub attribute: Attribute,
    /// Raw value; missing, empty or `none` stages an explicit clear.
    #[serde(default)]
    pub value: Option<String>,
}

impl ScriptedEdit {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.level, self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditScript {
    #[serde(default, rename = "edit")]
    pub edits: Vec<ScriptedEdit>,
}

impl EditScript {
    pub fn from_toml_str(text: &str) -> Result<Self, ApiError> {
        toml::from_str(text).map_err(|e| ApiError::InvalidInput(format!("Invalid edit script: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ApiError::InvalidInput(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Stage every edit in order. Stops at the first invalid edit; earlier edits stay staged.
    pub fn apply(&self, session: &mut EditSession) -> Result<usize, ValidationError> {
        let mut written = 0;
        for edit in &self.edits {
            written += session.stage_raw(
                edit.key(),
                edit.attribute,
                edit.value.as_deref().unwrap_or(""),
            )?;
        }
        Ok(written)
    }
}
