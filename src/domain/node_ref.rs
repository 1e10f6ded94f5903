//! Borrowed views over arena nodes.
//!
//! Iterating a [`NodeRef`] yields its direct children in order. The view
//! borrows the arena, so the tree cannot change while a traversal is alive.

use std::fmt;
use std::slice;

use crate::domain::arena::{Node, TreeArena};
use crate::domain::entities::{NodeId, NodeKey, Payload};

#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a TreeArena,
    id: NodeId,
    node: &'a Node,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(arena: &'a TreeArena, id: NodeId) -> Option<Self> {
        arena.get(id).map(|node| Self { arena, id, node })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &'a NodeKey {
        self.node.key()
    }

    pub fn data(&self) -> &'a Payload {
        self.node.data()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent().and_then(|p| NodeRef::new(self.arena, p))
    }

    pub fn len(&self) -> usize {
        self.node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.node.is_root()
    }

    pub fn has_parent(&self) -> bool {
        self.node.has_parent()
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.node.first_child().and_then(|c| NodeRef::new(self.arena, c))
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.node.last_child().and_then(|c| NodeRef::new(self.arena, c))
    }

    pub fn get_by_index(&self, index: usize) -> Option<NodeRef<'a>> {
        self.node
            .children()
            .get(index)
            .and_then(|&c| NodeRef::new(self.arena, c))
    }

    /// Direct children, in order. Each call starts from the first child.
    pub fn iter(&self) -> Children<'a> {
        Children {
            arena: self.arena,
            ids: self.node.children().iter(),
        }
    }

    /// Calls `visitor` once per direct child and returns `self` for chaining.
    pub fn for_each<F>(self, visitor: F) -> Self
    where
        F: FnMut(NodeRef<'a>),
    {
        self.iter().for_each(visitor);
        self
    }

    /// Applies `transform` to each direct child, in order.
    pub fn map<T, F>(&self, transform: F) -> Vec<T>
    where
        F: FnMut(NodeRef<'a>) -> T,
    {
        self.iter().map(transform).collect()
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && std::ptr::eq(self.arena, other.arena)
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", self.node.key())
            .field("children", &self.node.len())
            .finish()
    }
}

pub struct Children<'a> {
    arena: &'a TreeArena,
    ids: slice::Iter<'a, NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.ids.by_ref().find_map(|&id| NodeRef::new(arena, id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.ids.size_hint().1)
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        self.ids.by_ref().rev().find_map(|&id| NodeRef::new(arena, id))
    }
}

impl<'a> IntoIterator for NodeRef<'a> {
    type Item = NodeRef<'a>;
    type IntoIter = Children<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &NodeRef<'a> {
    type Item = NodeRef<'a>;
    type IntoIter = Children<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
