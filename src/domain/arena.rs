use std::collections::HashSet;

use generational_arena::Arena;
use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::entities::{NodeId, NodeKey, Payload};
use crate::domain::error::{StructureViolation, TreeError, TreeResult};
use crate::domain::node_ref::NodeRef;

/// A single vertex stored in a [`TreeArena`].
///
/// Structure (`parent`, `children`) is only changed through the arena so the
/// parent/child links stay consistent.
#[derive(Debug)]
pub struct Node {
    key: NodeKey,
    data: Payload,
    /// Index of parent node in the arena, None for root nodes
    parent: Option<NodeId>,
    /// Ordered indices of child nodes in the arena
    children: Vec<NodeId>,
}

impl Node {
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn data(&self) -> &Payload {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Payload {
        &mut self.data
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.children.last().copied()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }
}

/// Owning container for every node of one or more trees.
///
/// Nodes are addressed by [`NodeId`] handles. A node is either a root (no
/// parent) or attached to exactly one parent, and the parent lists it exactly
/// once among its children. The parent link is a plain index and never keeps
/// a node alive; the arena alone owns storage.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<Node>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            arena: Arena::with_capacity(capacity),
        }
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self::with_capacity(settings.initial_capacity)
    }

    /// Number of nodes held by the arena, attached or not.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    // ------------------------------------------------------------------
    // construction and lookup
    // ------------------------------------------------------------------

    /// Creates a standalone root node with a generated key.
    #[instrument(level = "trace", skip(self))]
    pub fn new_node(&mut self, data: Payload) -> NodeId {
        self.insert_detached(NodeKey::generate(), data)
    }

    /// Creates a standalone root node with the given key.
    #[instrument(level = "trace", skip(self, key))]
    pub fn new_node_with_key(&mut self, key: impl Into<NodeKey>, data: Payload) -> NodeId {
        self.insert_detached(key.into(), data)
    }

    pub(crate) fn insert_detached(&mut self, key: NodeKey, data: Payload) -> NodeId {
        let node = Node {
            key,
            data,
            parent: None,
            children: Vec::new(),
        };
        NodeId(self.arena.insert(node))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id.index())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.index())
    }

    /// Read-only view used for iteration and chaining.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_>> {
        NodeRef::new(self, id)
    }

    pub fn key(&self, id: NodeId) -> Option<&NodeKey> {
        self.get(id).map(Node::key)
    }

    pub fn data(&self, id: NodeId) -> Option<&Payload> {
        self.get(id).map(Node::data)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut Payload> {
        self.get_mut(id).map(Node::data_mut)
    }

    /// First node carrying `key`, in arena order.
    pub fn find_by_key(&self, key: &str) -> Option<NodeId> {
        self.arena
            .iter()
            .find(|(_, node)| node.key == key)
            .map(|(idx, _)| NodeId(idx))
    }

    /// All nodes without a parent, in arena order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.arena
            .iter()
            .filter(|(_, node)| node.is_root())
            .map(|(idx, _)| NodeId(idx))
            .collect()
    }

    fn require(&self, id: NodeId) -> TreeResult<&Node> {
        self.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn require_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.get_mut(id).ok_or(TreeError::NodeNotFound(id))
    }

    // ------------------------------------------------------------------
    // structural mutation
    // ------------------------------------------------------------------

    /// Adds `node` as the last child of `parent`, detaching it from any
    /// previous parent first.
    #[instrument(level = "trace", skip(self))]
    pub fn append(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.ensure_can_adopt(parent, node)?;
        self.attach_at(parent, node, usize::MAX)?;
        debug!(%parent, %node, "appended");
        Ok(())
    }

    /// Adds `node` as the first child of `parent`, detaching it from any
    /// previous parent first.
    #[instrument(level = "trace", skip(self))]
    pub fn prepend(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        self.ensure_can_adopt(parent, node)?;
        self.attach_at(parent, node, 0)?;
        debug!(%parent, %node, "prepended");
        Ok(())
    }

    /// Inserts `node` at `index` among the children of `parent`.
    ///
    /// A negative index prepends, an index at or past the end appends.
    /// Fails if `node` is already a child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_by_index(&mut self, parent: NodeId, node: NodeId, index: isize) -> TreeResult<()> {
        self.ensure_can_adopt(parent, node)?;
        if self.is_child(parent, node) {
            return Err(StructureViolation::AlreadyChild {
                node: self.require(node)?.key.clone(),
                parent: self.require(parent)?.key.clone(),
            }
            .into());
        }

        if index < 0 {
            return self.prepend(parent, node);
        }
        let index = index as usize;
        if index >= self.require(parent)?.len() {
            return self.append(parent, node);
        }

        self.attach_at(parent, node, index)?;
        debug!(%parent, %node, index, "inserted");
        Ok(())
    }

    /// Inserts `new_node` right before `reference`, which must already be a
    /// child of `parent`. If `new_node` is already a child it is moved.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_before(&mut self, parent: NodeId, reference: NodeId, new_node: NodeId) -> TreeResult<()> {
        self.require(new_node)?;
        if !self.is_child(parent, reference) {
            return Err(StructureViolation::NotAChild {
                node: self.require(reference)?.key.clone(),
                parent: self.require(parent)?.key.clone(),
            }
            .into());
        }
        if reference == new_node {
            return Ok(());
        }
        self.ensure_can_adopt(parent, new_node)?;

        if self.is_child(parent, new_node) {
            self.remove_node(parent, new_node)?;
        }
        let index = self
            .get_index(parent, reference)
            .ok_or(TreeError::NodeNotFound(reference))?;
        self.insert_by_index(parent, new_node, index as isize)
    }

    /// Detaches `node` from `parent`. Removing a node that is not a child of
    /// `parent` does nothing.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_node(&mut self, parent: NodeId, node: NodeId) -> TreeResult<()> {
        let Some(index) = self.require(parent)?.children.iter().position(|&c| c == node) else {
            return Ok(());
        };

        self.require_mut(parent)?.children.remove(index);
        if let Some(child) = self.get_mut(node) {
            child.parent = None;
        }
        debug!(%parent, %node, index, "removed");
        Ok(())
    }

    /// Detaches `node` from its parent, if it has one.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, node: NodeId) -> TreeResult<()> {
        match self.require(node)?.parent {
            Some(parent) => self.remove_node(parent, node),
            None => Ok(()),
        }
    }

    /// Sets the parent link of `node` without touching any children list.
    ///
    /// Low-level primitive: on its own it leaves `parent` unaware of `node`.
    /// Prefer [`append`](Self::append) and friends.
    #[instrument(level = "trace", skip(self))]
    pub fn set_parent(&mut self, node: NodeId, parent: NodeId) -> TreeResult<()> {
        self.ensure_can_adopt(parent, node)?;
        self.require_mut(node)?.parent = Some(parent);
        Ok(())
    }

    /// Removes `node` and its whole subtree from the arena.
    ///
    /// Handles to discarded nodes become stale.
    #[instrument(level = "trace", skip(self))]
    pub fn discard(&mut self, node: NodeId) -> TreeResult<()> {
        self.detach(node)?;

        let mut stack = vec![node];
        let mut removed = 0usize;
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.arena.remove(current.index()) {
                stack.extend(entry.children);
                removed += 1;
            }
        }
        debug!(%node, removed, "discarded subtree");
        Ok(())
    }

    /// Fails unless `child` may be placed below `parent`: `child` must be
    /// neither `parent` itself nor one of its ancestors, compared by key, and
    /// `parent` must not be listed anywhere in the subtree of `child`.
    fn ensure_can_adopt(&self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let child_key = &self.require(child)?.key;
        self.require(parent)?;
        if self.would_cycle(parent, child_key) || self.in_subtree(child, parent) {
            return Err(StructureViolation::Cycle {
                node: child_key.clone(),
                target: self.require(parent)?.key.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// True if `key` names `target` or one of its ancestors.
    pub(crate) fn would_cycle(&self, target: NodeId, key: &NodeKey) -> bool {
        match self.get(target) {
            Some(node) if &node.key == key => true,
            Some(_) => self.is_parent_key(target, key),
            None => false,
        }
    }

    /// True if `target` is reachable from `root` through children lists.
    ///
    /// Parent links can disagree with children lists after `set_parent`, so
    /// the ancestor walk alone does not rule out a cycle.
    pub(crate) fn in_subtree(&self, root: NodeId, target: NodeId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(node) = self.get(current) {
                stack.extend(node.children.iter().copied());
            }
        }
        false
    }

    fn attach_at(&mut self, parent: NodeId, node: NodeId, position: usize) -> TreeResult<()> {
        self.detach(node)?;
        let siblings = &mut self.require_mut(parent)?.children;
        let position = position.min(siblings.len());
        siblings.insert(position, node);
        self.require_mut(node)?.parent = Some(parent);
        Ok(())
    }

    // ------------------------------------------------------------------
    // queries
    // ------------------------------------------------------------------

    pub fn get_by_index(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.get(parent)?.children.get(index).copied()
    }

    /// Position of `node` among the children of `parent`.
    pub fn get_index(&self, parent: NodeId, node: NodeId) -> Option<usize> {
        self.get(parent)?.children.iter().position(|&c| c == node)
    }

    pub fn is_child(&self, parent: NodeId, node: NodeId) -> bool {
        self.get_index(parent, node).is_some()
    }

    /// False for unknown handles.
    pub fn is_root(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(Node::is_root)
    }

    pub fn has_parent(&self, node: NodeId) -> bool {
        self.get(node).is_some_and(Node::has_parent)
    }

    /// Ancestors of `node`, immediate parent first and root last.
    pub fn parents(&self, node: NodeId) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut current = self.get(node).and_then(Node::parent);
        while let Some(id) = current {
            ancestors.push(id);
            current = self.get(id).and_then(Node::parent);
        }
        ancestors
    }

    /// True if `candidate` is an ancestor of `node`.
    pub fn is_parent(&self, node: NodeId, candidate: NodeId) -> bool {
        match self.get(candidate) {
            Some(c) => self.is_parent_key(node, &c.key),
            None => false,
        }
    }

    fn is_parent_key(&self, node: NodeId, key: &NodeKey) -> bool {
        self.parents(node)
            .into_iter()
            .filter_map(|id| self.get(id))
            .any(|ancestor| &ancestor.key == key)
    }

    /// Copy of the ordered children of `node`.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn len_children(&self, node: NodeId) -> usize {
        self.get(node).map_or(0, Node::len)
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.first_child()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.last_child()
    }

    /// Levels in the subtree rooted at `node` (a leaf counts as 1).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self, node: NodeId) -> usize {
        match self.get(node) {
            Some(n) => {
                1 + n
                    .children
                    .iter()
                    .map(|&child| self.depth(child))
                    .max()
                    .unwrap_or(0)
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing;
    use serde_json::json;

    fn named(arena: &mut TreeArena, name: &str) -> NodeId {
        arena.new_node_with_key(name, Payload::from_value(&json!({ "name": name })))
    }

    #[test]
    fn test_new_node_is_root() {
        testing::init_test_setup();
        let mut arena = TreeArena::new();
        let a = arena.new_node(Payload::new());
        assert!(arena.is_root(a));
        assert!(!arena.has_parent(a));
        assert_eq!(arena.len_children(a), 0);
        assert_eq!(arena.first_child(a), None);
        assert_eq!(arena.last_child(a), None);
    }

    #[test]
    fn test_attach_at_clamps_position() {
        let mut arena = TreeArena::new();
        let root = named(&mut arena, "root");
        let a = named(&mut arena, "a");
        arena.attach_at(root, a, 42).unwrap();
        assert_eq!(arena.children(root), vec![a]);
        assert_eq!(arena.get(a).unwrap().parent(), Some(root));
    }

    #[test]
    fn test_would_cycle_matches_self_and_ancestors() {
        let mut arena = TreeArena::new();
        let root = named(&mut arena, "root");
        let a = named(&mut arena, "a");
        let b = named(&mut arena, "b");
        arena.append(root, a).unwrap();
        arena.append(a, b).unwrap();

        assert!(arena.would_cycle(b, &NodeKey::from("b")));
        assert!(arena.would_cycle(b, &NodeKey::from("a")));
        assert!(arena.would_cycle(b, &NodeKey::from("root")));
        assert!(!arena.would_cycle(a, &NodeKey::from("b")));
    }

    #[test]
    fn test_parents_walks_to_root() {
        let mut arena = TreeArena::new();
        let ids: Vec<NodeId> = ["n0", "n1", "n2", "n3", "n4"]
            .iter()
            .map(|n| named(&mut arena, n))
            .collect();
        for pair in ids.windows(2) {
            arena.append(pair[0], pair[1]).unwrap();
        }

        let expected: Vec<NodeId> = ids[..4].iter().rev().copied().collect();
        assert_eq!(arena.parents(ids[4]), expected);
        assert!(arena.parents(ids[0]).is_empty());
    }

    #[test]
    fn test_in_subtree_follows_children_lists() {
        let mut arena = TreeArena::new();
        let root = named(&mut arena, "root");
        let a = named(&mut arena, "a");
        let b = named(&mut arena, "b");
        let x = named(&mut arena, "x");
        arena.append(root, a).unwrap();
        arena.append(a, b).unwrap();
        arena.set_parent(a, x).unwrap();

        assert!(arena.in_subtree(root, b));
        assert!(arena.in_subtree(a, a));
        assert!(!arena.in_subtree(a, root));
        assert!(!arena.in_subtree(x, a));
    }

    #[test]
    fn test_depth() {
        let mut arena = TreeArena::new();
        let root = named(&mut arena, "root");
        let a = named(&mut arena, "a");
        let b = named(&mut arena, "b");
        let c = named(&mut arena, "c");
        arena.append(root, a).unwrap();
        arena.append(root, b).unwrap();
        arena.append(a, c).unwrap();

        assert_eq!(arena.depth(root), 3);
        assert_eq!(arena.depth(b), 1);
    }

    #[test]
    fn test_discard_frees_subtree_and_staleness_is_detected() {
        let mut arena = TreeArena::new();
        let root = named(&mut arena, "root");
        let a = named(&mut arena, "a");
        let b = named(&mut arena, "b");
        arena.append(root, a).unwrap();
        arena.append(a, b).unwrap();

        arena.discard(a).unwrap();

        assert_eq!(arena.len(), 1);
        assert!(arena.children(root).is_empty());
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
        assert!(matches!(
            arena.append(root, b),
            Err(TreeError::NodeNotFound(id)) if id == b
        ));
    }
}
