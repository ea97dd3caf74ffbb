//! Effective value resolution.
//!
//! Computes the value displayed for a node from three competing sources: staged edits,
//! persisted attributes and (for start dates) the derived schedule. Every resolution can
//! be explained by its [`ValueSource`].

use crate::derived::DerivedSchedule;
use crate::overrides::{Lookup, OverrideStore};
use crate::tree::TreeModel;
use crate::types::{NodeKey, ProcessModelId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where an effective value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// Staged at the node itself.
    Staged,
    /// Explicitly cleared at the node (directly or by cascade); renders empty.
    Cleared,
    /// Staged at the given ancestor.
    AncestorStaged(NodeKey),
    Persisted,
    Derived,
    /// No source has a value.
    Unset,
}

/// An effective value together with its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: Option<T>,
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    fn new(value: Option<T>, source: ValueSource) -> Self {
        Self { value, source }
    }

    fn unset() -> Self {
        Self::new(None, ValueSource::Unset)
    }
}

/// Read-only view over one session's sources.
#[derive(Clone, Copy)]
pub struct EffectiveValueResolver<'a> {
    tree: &'a TreeModel,
    store: &'a OverrideStore,
    derived: &'a DerivedSchedule,
}

impl<'a> EffectiveValueResolver<'a> {
    pub fn new(tree: &'a TreeModel, store: &'a OverrideStore, derived: &'a DerivedSchedule) -> Self {
        Self {
            tree,
            store,
            derived,
        }
    }

    pub fn process_model(&self, key: NodeKey) -> Option<ProcessModelId> {
        self.explain_process_model(key).value
    }

    /// Own staged value, else the nearest ancestor's staged value, else persisted.
    pub fn explain_process_model(&self, key: NodeKey) -> Resolved<ProcessModelId> {
        match self.store.process_model(key) {
            Lookup::Value(v) => return Resolved::new(Some(v), ValueSource::Staged),
            Lookup::Cleared => return Resolved::new(None, ValueSource::Cleared),
            Lookup::Absent => {}
        }
        for ancestor in self.tree.ancestors(key) {
            if let Some(staged) = self.store.process_model(ancestor).staged() {
                return Resolved::new(staged, ValueSource::AncestorStaged(ancestor));
            }
        }
        match self.tree.persisted(&key).and_then(|p| p.process_model_id) {
            Some(v) => Resolved::new(Some(v), ValueSource::Persisted),
            None => Resolved::unset(),
        }
    }

    pub fn start_date(&self, key: NodeKey) -> Option<NaiveDate> {
        self.explain_start_date(key).value
    }

    /// Own staged value (an explicit clear included), else persisted, else derived.
    ///
    /// There is no ancestor fallback: cascaded dates are already written into descendants.
    pub fn explain_start_date(&self, key: NodeKey) -> Resolved<NaiveDate> {
        match self.store.start_date(key) {
            Lookup::Value(v) => return Resolved::new(Some(v), ValueSource::Staged),
            Lookup::Cleared => return Resolved::new(None, ValueSource::Cleared),
            Lookup::Absent => {}
        }
        if let Some(v) = self.tree.persisted(&key).and_then(|p| p.start_date) {
            return Resolved::new(Some(v), ValueSource::Persisted);
        }
        match self.derived.earliest_start(key) {
            Some(v) => Resolved::new(Some(v), ValueSource::Derived),
            None => Resolved::unset(),
        }
    }
}
