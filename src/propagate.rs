//! Downward cascade of staged edits.
//!
//! A staged edit is written through to every descendant instead of being inherited lazily
//! at display time. Later edits at a descendant overwrite the cascaded entry, so the last
//! write at each node wins.

use crate::overrides::{OverrideStore, StagedValue};
use crate::tree::TreeModel;
use crate::types::NodeKey;
use tracing::debug;

pub struct Propagator;

impl Propagator {
    /// Write `value` to all descendants of `origin` in pre-order.
    ///
    /// Returns the number of descendants written.
    pub fn cascade(
        tree: &TreeModel,
        store: &mut OverrideStore,
        origin: NodeKey,
        value: StagedValue,
    ) -> usize {
        let mut written = 0;
        for descendant in tree.descendants(origin) {
            store.write(descendant, value, origin);
            written += 1;
        }
        debug!(
            origin = %origin,
            attribute = %value.attribute(),
            cleared = value.is_cleared(),
            descendants = written,
            "cascaded staged edit"
        );
        written
    }
}
