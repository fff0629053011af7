//! Edges and per-node edge lists.

use crate::depset::DependencySet;
use crate::types::{NodeId, Role};

/// A role edge `from -role-> to`.
///
/// Every edge is stored in `from`'s outgoing list and `to`'s incoming list.
/// Edges are identified by `(role, from, to)`; the dependency set is payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// The role name.
    pub role: Role,
    /// The source individual.
    pub from: NodeId,
    /// The target node.
    pub to: NodeId,
    /// Why the edge exists.
    pub ds: DependencySet,
}

impl Edge {
    /// Create a new edge.
    #[must_use]
    pub fn new(role: Role, from: NodeId, to: NodeId, ds: DependencySet) -> Self {
        Self { role, from, to, ds }
    }

    /// The endpoint that is not `node`. For a self-loop, `node` itself.
    #[must_use]
    pub fn neighbor(&self, node: NodeId) -> NodeId {
        if self.from == node { self.to } else { self.from }
    }

    /// Whether this edge has the given identity.
    #[must_use]
    pub fn is(&self, role: &Role, from: NodeId, to: NodeId) -> bool {
        self.from == from && self.to == to && self.role == *role
    }

    /// Whether both edges have the same identity.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        self.is(&other.role, other.from, other.to)
    }
}

/// An ordered list of edges.
#[derive(Debug, Clone, Default)]
pub struct EdgeList(Vec<Edge>);

/// Shared empty list handed out for literal nodes.
pub(crate) static EMPTY_EDGES: EdgeList = EdgeList(Vec::new());

impl EdgeList {
    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Edge> {
        self.0.iter()
    }

    /// Find the edge with this identity.
    #[must_use]
    pub fn find(&self, role: &Role, from: NodeId, to: NodeId) -> Option<&Edge> {
        self.0.iter().find(|e| e.is(role, from, to))
    }

    /// Whether an edge with the same identity is present.
    #[must_use]
    pub fn contains(&self, edge: &Edge) -> bool {
        self.0.iter().any(|e| e.same_as(edge))
    }

    /// Append `edge` unless an edge with its identity is present.
    pub fn insert(&mut self, edge: Edge) -> bool {
        if self.contains(&edge) {
            return false;
        }
        self.0.push(edge);
        true
    }

    /// Remove the edge with the identity of `edge`.
    pub fn remove(&mut self, edge: &Edge) -> bool {
        let before = self.0.len();
        self.0.retain(|e| !e.same_as(edge));
        self.0.len() != before
    }

    /// Keep only edges matching `keep`.
    pub fn retain(&mut self, keep: impl FnMut(&Edge) -> bool) {
        self.0.retain(keep);
    }

    /// Mutable access for re-stamping.
    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, Edge> {
        self.0.iter_mut()
    }

    /// Edges whose other endpoint is `node`.
    pub fn edges_to(&self, owner: NodeId, node: NodeId) -> impl Iterator<Item = &Edge> {
        self.0.iter().filter(move |e| e.neighbor(owner) == node)
    }
}

impl<'a> IntoIterator for &'a EdgeList {
    type Item = &'a Edge;
    type IntoIter = std::slice::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(role: &str, from: u32, to: u32) -> Edge {
        Edge::new(
            Role::new(role),
            NodeId(from),
            NodeId(to),
            DependencySet::independent(),
        )
    }

    #[test]
    fn duplicate_identity_is_not_inserted() {
        let mut list = EdgeList::default();
        assert!(list.insert(edge("r", 0, 1)));
        assert!(!list.insert(edge("r", 0, 1)));
        assert!(list.insert(edge("s", 0, 1)));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn remove_matches_identity_only() {
        let mut list = EdgeList::default();
        list.insert(edge("r", 0, 1));
        let mut other_ds = edge("r", 0, 1);
        other_ds.ds = DependencySet::for_branch(3);
        assert!(list.remove(&other_ds));
        assert!(list.is_empty());
    }

    #[test]
    fn neighbor_of_self_loop_is_self() {
        let e = edge("r", 4, 4);
        assert_eq!(e.neighbor(NodeId(4)), NodeId(4));
        assert_eq!(edge("r", 1, 2).neighbor(NodeId(2)), NodeId(1));
    }
}
