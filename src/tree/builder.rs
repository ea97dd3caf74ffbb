//! Tree builder for constructing project structure snapshots

use crate::backend::wire::ComponentRecord;
use crate::error::ValidationError;
use crate::tree::node::{Node, Persisted};
use crate::tree::walker::{Ancestors, Descendants};
use crate::types::{Level, NodeId, NodeKey};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Complete structure snapshot
#[derive(Debug, Clone, Default)]
pub struct TreeModel {
    /// Map of NodeKey to Node
    nodes: HashMap<NodeKey, Node>,
    /// Components in backend order
    roots: Vec<NodeKey>,
}

impl TreeModel {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from the `/projects/{id}/structure` payload.
    #[instrument(skip(components), fields(components = components.len()))]
    pub fn from_structure(components: &[ComponentRecord]) -> Result<Self, ValidationError> {
        let mut builder = TreeBuilder::new();
        for component in components {
            let c = builder.add_component(
                component.id,
                &component.name,
                Persisted::new(component.process_model_id, component.start_soll),
            )?;
            for riser in &component.risers {
                let r = builder.add_child(
                    c,
                    riser.id,
                    &riser.name,
                    Persisted::new(riser.process_model_id, riser.start_soll),
                )?;
                for floor in &riser.floors {
                    let f = builder.add_child(
                        r,
                        floor.id,
                        &floor.name,
                        Persisted::new(floor.process_model_id, floor.start_soll),
                    )?;
                    for unit in &floor.units {
                        builder.add_child(
                            f,
                            unit.id,
                            &unit.name,
                            Persisted::new(unit.process_model_id, unit.start_soll),
                        )?;
                    }
                }
            }
        }
        let tree = builder.build();
        debug!(node_count = tree.len(), "Built structure tree");
        Ok(tree)
    }

    pub fn get(&self, key: &NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level components in backend order.
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Find the parent of a node. Returns None for components and unknown keys.
    pub fn parent(&self, key: &NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    /// Children of a node in backend order; empty for units and unknown keys.
    pub fn children(&self, key: &NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn persisted(&self, key: &NodeKey) -> Option<Persisted> {
        self.nodes.get(key).map(|n| n.persisted)
    }

    /// All descendants of `key` in pre-order, excluding `key` itself.
    pub fn descendants(&self, key: NodeKey) -> Descendants<'_> {
        Descendants::new(self, key)
    }

    /// Ancestors of `key`, nearest first.
    pub fn ancestors(&self, key: NodeKey) -> Ancestors<'_> {
        Ancestors::new(self, key)
    }

    /// `key` followed by its descendants in pre-order. Empty if `key` is unknown.
    pub fn subtree(&self, key: NodeKey) -> impl Iterator<Item = NodeKey> + '_ {
        let start = self.contains(&key).then_some(key);
        start.into_iter().chain(self.descendants(key))
    }

    /// Every node in pre-order, components in backend order.
    pub fn preorder(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.roots.iter().flat_map(move |root| self.subtree(*root))
    }

    /// Every unit in pre-order.
    pub fn units(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.preorder().filter(|key| key.is_unit())
    }

    pub fn is_ancestor(&self, ancestor: NodeKey, key: NodeKey) -> bool {
        self.ancestors(key).any(|a| a == ancestor)
    }
}

/// Incremental builder enforcing the level invariants of the hierarchy.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: HashMap<NodeKey, Node>,
    roots: Vec<NodeKey>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(
        &mut self,
        id: NodeId,
        name: &str,
        persisted: Persisted,
    ) -> Result<NodeKey, ValidationError> {
        let key = NodeKey::component(id);
        self.insert(key, name, None, persisted)?;
        self.roots.push(key);
        Ok(key)
    }

    /// Add a node one level below `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeKey,
        id: NodeId,
        name: &str,
        persisted: Persisted,
    ) -> Result<NodeKey, ValidationError> {
        if !self.nodes.contains_key(&parent) {
            return Err(ValidationError::InvalidStructure(format!(
                "parent {} of {} is not in the tree",
                parent, id
            )));
        }
        let level: Level = parent.level.child().ok_or_else(|| {
            ValidationError::InvalidStructure(format!("{} cannot have children", parent))
        })?;
        let key = NodeKey::new(level, id);
        self.insert(key, name, Some(parent), persisted)?;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(key);
        }
        Ok(key)
    }

    fn insert(
        &mut self,
        key: NodeKey,
        name: &str,
        parent: Option<NodeKey>,
        persisted: Persisted,
    ) -> Result<(), ValidationError> {
        if self.nodes.contains_key(&key) {
            return Err(ValidationError::InvalidStructure(format!(
                "duplicate node {}",
                key
            )));
        }
        self.nodes.insert(
            key,
            Node {
                key,
                name: name.to_string(),
                parent,
                children: Vec::new(),
                persisted,
            },
        );
        Ok(())
    }

    pub fn build(self) -> TreeModel {
        TreeModel {
            nodes: self.nodes,
            roots: self.roots,
        }
    }
}
