//! Structure walkers for traversing the hierarchy

use crate::tree::builder::TreeModel;
use crate::types::NodeKey;

/// Pre-order iterator over the descendants of a node (the node itself excluded).
pub struct Descendants<'a> {
    tree: &'a TreeModel,
    stack: Vec<NodeKey>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(tree: &'a TreeModel, root: NodeKey) -> Self {
        let mut stack: Vec<NodeKey> = tree.children(&root).to_vec();
        stack.reverse();
        Self { tree, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.stack.pop()?;
        // Reverse so the first child is popped next.
        self.stack
            .extend(self.tree.children(&key).iter().rev().copied());
        Some(key)
    }
}

/// Iterator from a node's parent up to its component.
pub struct Ancestors<'a> {
    tree: &'a TreeModel,
    current: Option<NodeKey>,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a TreeModel, key: NodeKey) -> Self {
        Self {
            tree,
            current: tree.parent(&key),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeKey;

    fn next(&mut self) -> Option<NodeKey> {
        let key = self.current?;
        self.current = self.tree.parent(&key);
        Some(key)
    }
}
