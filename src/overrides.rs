//! Staged Edits
//!
//! Session-scoped map of not-yet-persisted attribute edits, keyed by (node, attribute).
//! A key is in one of three states: a concrete staged value, an explicit clear (staged
//! `null`), or absent (untouched this session). Absent falls through to persisted and
//! derived sources; a clear suppresses them.

use crate::error::ValidationError;
use crate::propagate::Propagator;
use crate::tree::TreeModel;
use crate::types::{Attribute, NodeKey, ProcessModelId};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// A staged attribute value. The inner `None` is an explicit clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedValue {
    ProcessModel(Option<ProcessModelId>),
    StartDate(Option<NaiveDate>),
}

impl StagedValue {
    pub fn attribute(&self) -> Attribute {
        match self {
            StagedValue::ProcessModel(_) => Attribute::ProcessModel,
            StagedValue::StartDate(_) => Attribute::StartDate,
        }
    }

    pub fn is_cleared(&self) -> bool {
        matches!(
            self,
            StagedValue::ProcessModel(None) | StagedValue::StartDate(None)
        )
    }

    /// Explicit clear for the given attribute.
    pub fn cleared(attribute: Attribute) -> Self {
        match attribute {
            Attribute::ProcessModel => StagedValue::ProcessModel(None),
            Attribute::StartDate => StagedValue::StartDate(None),
        }
    }

    /// Parse user input. Empty text, `none` and `null` mean an explicit clear.
    pub fn parse(attribute: Attribute, raw: &str) -> Result<Self, ValidationError> {
        let text = raw.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("null")
        {
            return Ok(Self::cleared(attribute));
        }
        match attribute {
            Attribute::StartDate => NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| StagedValue::StartDate(Some(d)))
                .map_err(|_| ValidationError::MalformedDate(text.to_string())),
            Attribute::ProcessModel => {
                let id: ProcessModelId = text
                    .parse()
                    .map_err(|_| ValidationError::MalformedProcessModel(text.to_string()))?;
                if id == 0 {
                    return Err(ValidationError::InvalidProcessModelId(id));
                }
                Ok(StagedValue::ProcessModel(Some(id)))
            }
        }
    }
}

/// Typed three-way lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Nothing staged this session; other sources apply.
    Absent,
    /// Explicitly cleared; renders empty.
    Cleared,
    Value(T),
}

impl<T> Lookup<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Lookup::Absent)
    }

    /// `None` when absent, `Some(None)` when cleared.
    pub fn staged(self) -> Option<Option<T>> {
        match self {
            Lookup::Absent => None,
            Lookup::Cleared => Some(None),
            Lookup::Value(v) => Some(Some(v)),
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Value(v),
            None => Lookup::Cleared,
        }
    }
}

/// Staged entry with the node the user actually edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedEntry {
    pub value: StagedValue,
    /// Node where the edit was made; differs from the entry's node for cascaded writes.
    pub origin: NodeKey,
}

/// Staged edit map: (NodeKey, Attribute) -> StagedEntry
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    entries: HashMap<(NodeKey, Attribute), StagedEntry>,
    /// Keys that received an explicit clear this session and have not been re-set since.
    session_clears: HashSet<(NodeKey, Attribute)>,
    /// Bumped on every change to the map.
    revision: u64,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `value` at `key` and cascade it to every descendant.
    ///
    /// Returns the number of entries written, the edited node included.
    pub fn set(
        &mut self,
        tree: &TreeModel,
        key: NodeKey,
        value: StagedValue,
    ) -> Result<usize, ValidationError> {
        if !tree.contains(&key) {
            return Err(ValidationError::UnknownNode(key));
        }
        self.write(key, value, key);
        let cascaded = Propagator::cascade(tree, self, key, value);
        Ok(1 + cascaded)
    }

    /// Drop the staged entry at `key` only. Returns whether one existed.
    pub fn clear(&mut self, key: NodeKey, attribute: Attribute) -> bool {
        self.session_clears.remove(&(key, attribute));
        let removed = self.entries.remove(&(key, attribute)).is_some();
        if removed {
            self.revision += 1;
        }
        removed
    }

    /// Drop every entry written by the edit made at `origin`.
    ///
    /// Descendants that were re-edited afterwards carry their own origin and are kept.
    pub fn clear_origin(&mut self, origin: NodeKey, attribute: Attribute) -> usize {
        let doomed: Vec<NodeKey> = self
            .entries
            .iter()
            .filter(|((_, attr), entry)| *attr == attribute && entry.origin == origin)
            .map(|((key, _), _)| *key)
            .collect();
        for key in &doomed {
            self.clear(*key, attribute);
        }
        doomed.len()
    }

    /// Drop all staged state, including clear tracking.
    pub fn clear_all(&mut self) {
        if !self.entries.is_empty() {
            self.revision += 1;
        }
        self.entries.clear();
        self.session_clears.clear();
    }

    /// Change counter; two equal revisions mean nothing was staged or dropped in between.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, key: NodeKey, attribute: Attribute) -> Option<StagedValue> {
        self.entries.get(&(key, attribute)).map(|e| e.value)
    }

    pub fn entry(&self, key: NodeKey, attribute: Attribute) -> Option<&StagedEntry> {
        self.entries.get(&(key, attribute))
    }

    pub fn process_model(&self, key: NodeKey) -> Lookup<ProcessModelId> {
        match self.get(key, Attribute::ProcessModel) {
            Some(StagedValue::ProcessModel(v)) => v.into(),
            _ => Lookup::Absent,
        }
    }

    pub fn start_date(&self, key: NodeKey) -> Lookup<NaiveDate> {
        match self.get(key, Attribute::StartDate) {
            Some(StagedValue::StartDate(v)) => v.into(),
            _ => Lookup::Absent,
        }
    }

    /// Whether an explicit clear reached `key` this session, directly or by cascade.
    pub fn cleared_this_session(&self, key: NodeKey, attribute: Attribute) -> bool {
        self.session_clears.contains(&(key, attribute))
    }

    /// Staged entries for one attribute, in no particular order.
    pub fn entries(&self, attribute: Attribute) -> impl Iterator<Item = (NodeKey, &StagedEntry)> {
        self.entries
            .iter()
            .filter(move |((_, attr), _)| *attr == attribute)
            .map(|((key, _), entry)| (*key, entry))
    }

    pub fn has_pending(&self, attribute: Attribute) -> bool {
        self.entries.keys().any(|(_, attr)| *attr == attribute)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw write used by the edit itself and by the propagator; last write wins.
    pub(crate) fn write(&mut self, key: NodeKey, value: StagedValue, origin: NodeKey) {
        let attribute = value.attribute();
        self.revision += 1;
        if value.is_cleared() {
            self.session_clears.insert((key, attribute));
        } else {
            self.session_clears.remove(&(key, attribute));
        }
        trace!(node = %key, %attribute, origin = %origin, revision = self.revision, "staged write");
        self.entries
            .insert((key, attribute), StagedEntry { value, origin });
    }
}
