//! Node construction from `{ id?, data?, children?, parent? }`.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::arena::TreeArena;
use crate::domain::entities::{NodeId, NodeKey, Payload};
use crate::domain::error::{StructureViolation, TreeError, TreeResult};

/// Collects the optional construction inputs of a node and creates it inside
/// an arena.
///
/// ```
/// use serde_json::json;
/// use twig::{NodeBuilder, TreeArena};
///
/// let mut arena = TreeArena::new();
/// let root = NodeBuilder::new().key("root").build(&mut arena).unwrap();
/// let child = NodeBuilder::new()
///     .data(json!({"name": "a"}))
///     .parent(root)
///     .build(&mut arena)
///     .unwrap();
/// assert_eq!(arena.children(root), vec![child]);
/// ```
#[derive(Debug, Default)]
pub struct NodeBuilder {
    key: Option<NodeKey>,
    payload: Payload,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit key; a UUID is generated otherwise.
    pub fn key(mut self, key: impl Into<NodeKey>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Copies the entries of a JSON object. Non-objects leave the payload empty.
    pub fn data(mut self, data: Value) -> Self {
        self.payload = Payload::from(data);
        self
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn child(mut self, child: NodeId) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = NodeId>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Creates the node. Children are appended in the given order and the new
    /// node becomes the last child of `parent`. Nothing is changed when the
    /// inputs would break the tree.
    #[instrument(level = "trace", skip(arena))]
    pub fn build(self, arena: &mut TreeArena) -> TreeResult<NodeId> {
        let key = self.key.unwrap_or_else(NodeKey::generate);
        Self::validate(arena, &key, &self.children, self.parent)?;

        let id = arena.insert_detached(key, self.payload);
        for &child in &self.children {
            arena.append(id, child)?;
        }
        if let Some(parent) = self.parent {
            arena.append(parent, id)?;
        }
        debug!(node = %id, children = self.children.len(), "built node");
        Ok(id)
    }

    fn validate(
        arena: &TreeArena,
        key: &NodeKey,
        children: &[NodeId],
        parent: Option<NodeId>,
    ) -> TreeResult<()> {
        if let Some(parent) = parent {
            arena.get(parent).ok_or(TreeError::NodeNotFound(parent))?;
            if arena.would_cycle(parent, key) {
                return Err(Self::cycle(arena, key.clone(), parent));
            }
        }

        let mut seen = HashSet::new();
        for &child in children {
            let child_key = arena.key(child).ok_or(TreeError::NodeNotFound(child))?;
            if !seen.insert(child) {
                return Err(StructureViolation::DuplicateChild(child_key.clone()).into());
            }
            if child_key == key {
                return Err(StructureViolation::Cycle {
                    node: child_key.clone(),
                    target: key.clone(),
                }
                .into());
            }
            if let Some(parent) = parent {
                if arena.would_cycle(parent, child_key) || arena.in_subtree(child, parent) {
                    return Err(Self::cycle(arena, child_key.clone(), parent));
                }
            }
        }
        Ok(())
    }

    fn cycle(arena: &TreeArena, node: NodeKey, parent: NodeId) -> TreeError {
        match arena.key(parent) {
            Some(target) => StructureViolation::Cycle {
                node,
                target: target.clone(),
            }
            .into(),
            None => TreeError::NodeNotFound(parent),
        }
    }
}
