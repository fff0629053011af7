//! Nodes of the completion graph and their concept labels.

use crate::concept::{Concept, Shape};
use crate::depset::DependencySet;
use crate::graph::edge::{EMPTY_EDGES, EdgeList};
use crate::primitives::BLOCKABLE;
use crate::types::{LiteralValue, NodeId, NodeName};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// LABEL
// =============================================================================

/// A concept label: concept → dependency set, partitioned by shape.
///
/// Each partition keeps insertion order so rule cursors can resume where
/// they stopped.
#[derive(Debug, Clone, Default)]
pub struct Label {
    types: BTreeMap<Concept, DependencySet>,
    partitions: [Vec<Concept>; Shape::COUNT],
}

impl Label {
    /// Number of concepts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the label is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Dependency set of `c`, if present.
    #[must_use]
    pub fn get(&self, c: &Concept) -> Option<&DependencySet> {
        self.types.get(c)
    }

    /// Whether `c` is present.
    #[must_use]
    pub fn contains(&self, c: &Concept) -> bool {
        self.types.contains_key(c)
    }

    /// Insert `c`. Returns `true` if it was not present.
    ///
    /// A present concept keeps the dependency set with the lower `max()`,
    /// and the earlier of the two stamps.
    pub fn insert(&mut self, c: Concept, ds: DependencySet) -> bool {
        if let Some(existing) = self.types.get_mut(&c) {
            if ds.max() < existing.max() {
                let stamp = existing.branch().min(ds.branch());
                *existing = ds.with_branch(stamp);
            }
            return false;
        }
        self.partitions[c.shape().index()].push(c.clone());
        self.types.insert(c, ds);
        true
    }

    /// Mutable dependency set of `c`, if present.
    pub(crate) fn get_mut(&mut self, c: &Concept) -> Option<&mut DependencySet> {
        self.types.get_mut(c)
    }

    /// Concepts of one partition, in insertion order.
    #[must_use]
    pub fn partition(&self, shape: Shape) -> &[Concept] {
        &self.partitions[shape.index()]
    }

    /// All entries, ordered by concept.
    pub fn iter(&self) -> impl Iterator<Item = (&Concept, &DependencySet)> {
        self.types.iter()
    }

    /// All concepts, ordered.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.types.keys()
    }

    /// Whether every concept here is also in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.types.keys().all(|c| other.contains(c))
    }

    /// Whether both labels hold the same concepts.
    #[must_use]
    pub fn same_concepts(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset_of(other)
    }

    /// Keep entries matching `keep`; partitions keep their order.
    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Concept, &mut DependencySet) -> bool) {
        self.types.retain(|c, ds| keep(c, ds));
        let types = &self.types;
        for partition in &mut self.partitions {
            partition.retain(|c| types.contains_key(c));
        }
    }
}

// =============================================================================
// NODE
// =============================================================================

/// Data only individuals carry.
#[derive(Debug, Clone)]
pub struct IndividualData {
    pub(crate) out_edges: EdgeList,
    pub(crate) cursors: [usize; Shape::COUNT],
    pub(crate) nominal_level: u32,
    pub(crate) depth: u32,
    pub(crate) parent: Option<NodeId>,
}

/// Data only literals carry.
#[derive(Debug, Clone, Default)]
pub struct LiteralData {
    pub(crate) value: Option<(LiteralValue, DependencySet)>,
    pub(crate) asserted: bool,
}

/// Individual or literal.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// An abstract domain element.
    Individual(IndividualData),
    /// A data value.
    Literal(LiteralData),
}

/// A node of the completion graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) name: NodeName,
    pub(crate) label: Label,
    pub(crate) merged_to: NodeId,
    pub(crate) merge_ds: DependencySet,
    pub(crate) merged: BTreeSet<NodeId>,
    pub(crate) differents: BTreeMap<NodeId, DependencySet>,
    pub(crate) creation_ds: DependencySet,
    pub(crate) pruned: Option<DependencySet>,
    pub(crate) in_edges: EdgeList,
    pub(crate) kind: NodeKind,
    pub(crate) changed_at: u32,
}

impl Node {
    fn base(id: NodeId, name: NodeName, creation_ds: DependencySet, kind: NodeKind) -> Self {
        let changed_at = creation_ds.branch();
        Self {
            id,
            name,
            label: Label::default(),
            merged_to: id,
            merge_ds: DependencySet::independent(),
            merged: BTreeSet::new(),
            differents: BTreeMap::new(),
            creation_ds,
            pruned: None,
            in_edges: EdgeList::default(),
            kind,
            changed_at,
        }
    }

    /// A new individual.
    #[must_use]
    pub(crate) fn individual(
        id: NodeId,
        name: NodeName,
        nominal_level: u32,
        parent: Option<(NodeId, u32)>,
        creation_ds: DependencySet,
    ) -> Self {
        let data = IndividualData {
            out_edges: EdgeList::default(),
            cursors: [0; Shape::COUNT],
            nominal_level,
            depth: parent.map_or(0, |(_, depth)| depth.saturating_add(1)),
            parent: parent.map(|(p, _)| p),
        };
        Self::base(id, name, creation_ds, NodeKind::Individual(data))
    }

    /// A new literal.
    #[must_use]
    pub(crate) fn literal(
        id: NodeId,
        name: NodeName,
        value: Option<LiteralValue>,
        asserted: bool,
        creation_ds: DependencySet,
    ) -> Self {
        let data = LiteralData {
            value: value.map(|v| (v, creation_ds.clone())),
            asserted,
        };
        Self::base(id, name, creation_ds, NodeKind::Literal(data))
    }

    /// Arena identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Term name.
    #[must_use]
    pub fn name(&self) -> &NodeName {
        &self.name
    }

    /// Concept label.
    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Whether `c` is in the label.
    #[must_use]
    pub fn has_type(&self, c: &Concept) -> bool {
        self.label.contains(c)
    }

    /// Whether this is an individual.
    #[must_use]
    pub fn is_individual(&self) -> bool {
        matches!(self.kind, NodeKind::Individual(_))
    }

    /// Whether this is a literal.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Literal(_))
    }

    fn individual_data(&self) -> Option<&IndividualData> {
        match &self.kind {
            NodeKind::Individual(data) => Some(data),
            NodeKind::Literal(_) => None,
        }
    }

    pub(crate) fn individual_data_mut(&mut self) -> Option<&mut IndividualData> {
        match &mut self.kind {
            NodeKind::Individual(data) => Some(data),
            NodeKind::Literal(_) => None,
        }
    }

    /// Outgoing edges. Literals have none.
    #[must_use]
    pub fn out_edges(&self) -> &EdgeList {
        self.individual_data()
            .map_or(&EMPTY_EDGES, |data| &data.out_edges)
    }

    /// Incoming edges.
    #[must_use]
    pub fn in_edges(&self) -> &EdgeList {
        &self.in_edges
    }

    /// Nominal level: 0 for named individuals, `BLOCKABLE` for anonymous ones.
    #[must_use]
    pub fn nominal_level(&self) -> u32 {
        self.individual_data()
            .map_or(BLOCKABLE, |data| data.nominal_level)
    }

    /// Distance from the nearest root.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.individual_data().map_or(0, |data| data.depth)
    }

    /// The individual whose rule created this one.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.individual_data().and_then(|data| data.parent)
    }

    /// Roots are never blocked and never pruned as garbage.
    #[must_use]
    pub fn is_root(&self) -> bool {
        match &self.kind {
            NodeKind::Individual(data) => data.nominal_level != BLOCKABLE,
            NodeKind::Literal(data) => data.asserted,
        }
    }

    /// An individual that may be blocked.
    #[must_use]
    pub fn is_blockable(&self) -> bool {
        self.is_individual() && !self.is_root()
    }

    /// A named individual or a nominal created by the guess rule.
    #[must_use]
    pub fn is_nominal(&self) -> bool {
        self.is_individual() && self.is_root()
    }

    /// Whether this node was merged away or cut off as garbage.
    #[must_use]
    pub fn is_pruned(&self) -> bool {
        self.pruned.is_some()
    }

    /// Whether this node was merged into another.
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.merged_to != self.id
    }

    /// Union-find parent (self when unmerged).
    #[must_use]
    pub fn merged_to(&self) -> NodeId {
        self.merged_to
    }

    /// Nodes merged directly into this one.
    #[must_use]
    pub fn merged_nodes(&self) -> &BTreeSet<NodeId> {
        &self.merged
    }

    /// Explicit inequalities.
    #[must_use]
    pub fn differents(&self) -> &BTreeMap<NodeId, DependencySet> {
        &self.differents
    }

    /// Why the node exists; `branch()` is its creation branch.
    #[must_use]
    pub fn creation_ds(&self) -> &DependencySet {
        &self.creation_ds
    }

    /// The branch that was current when the node last changed.
    #[must_use]
    pub fn changed_at(&self) -> u32 {
        self.changed_at
    }

    /// The concrete value of a literal.
    #[must_use]
    pub fn literal_value(&self) -> Option<&(LiteralValue, DependencySet)> {
        match &self.kind {
            NodeKind::Literal(data) => data.value.as_ref(),
            NodeKind::Individual(_) => None,
        }
    }

    pub(crate) fn cursor(&self, shape: Shape) -> usize {
        self.individual_data()
            .map_or(0, |data| data.cursors[shape.index()])
    }

    pub(crate) fn set_cursor(&mut self, shape: Shape, position: usize) {
        if let Some(data) = self.individual_data_mut() {
            data.cursors[shape.index()] = position;
        }
    }

    pub(crate) fn reset_cursors(&mut self) {
        if let Some(data) = self.individual_data_mut() {
            data.cursors = [0; Shape::COUNT];
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Name;

    #[test]
    fn label_partitions_by_shape() {
        let mut label = Label::default();
        label.insert(Concept::atom("A"), DependencySet::independent());
        label.insert(
            Concept::or([Concept::atom("B"), Concept::atom("C")]).normalize(),
            DependencySet::independent(),
        );
        label.insert(
            Concept::exists("r", Concept::Top).normalize(),
            DependencySet::independent(),
        );

        assert_eq!(label.partition(Shape::Atomic).len(), 1);
        assert_eq!(label.partition(Shape::Disjunction).len(), 1);
        assert_eq!(label.partition(Shape::Existential).len(), 1);
        assert!(label.partition(Shape::Universal).is_empty());
    }

    #[test]
    fn reinsert_keeps_less_dependent_set() {
        let mut label = Label::default();
        let a = Concept::atom("A");
        assert!(label.insert(a.clone(), DependencySet::for_branch(3)));
        assert!(!label.insert(a.clone(), DependencySet::for_branch(1)));
        assert_eq!(label.get(&a).map(DependencySet::max), Some(1));
        assert!(!label.insert(a.clone(), DependencySet::for_branch(5)));
        assert_eq!(label.get(&a).map(DependencySet::max), Some(1));
    }

    #[test]
    fn retain_rebuilds_partitions() {
        let mut label = Label::default();
        label.insert(Concept::atom("A"), DependencySet::independent());
        label.insert(Concept::atom("B"), DependencySet::for_branch(2));
        label.retain(|_, ds| ds.max() < 2);

        assert_eq!(label.partition(Shape::Atomic), &[Concept::atom("A")]);
        assert_eq!(label.len(), 1);
    }

    #[test]
    fn named_individuals_are_roots() {
        let named = Node::individual(
            NodeId(0),
            NodeName::Named(Name::new("x")),
            0,
            None,
            DependencySet::independent(),
        );
        let anon = Node::individual(
            NodeId(1),
            NodeName::Anon(0),
            BLOCKABLE,
            Some((NodeId(0), 0)),
            DependencySet::independent(),
        );

        assert!(named.is_root() && named.is_nominal());
        assert!(anon.is_blockable());
        assert_eq!(anon.depth(), 1);
        assert_eq!(anon.parent(), Some(NodeId(0)));
        assert!(anon.out_edges().is_empty());
    }

    #[test]
    fn subset_and_equality_of_labels() {
        let mut small = Label::default();
        small.insert(Concept::atom("A"), DependencySet::independent());
        let mut big = small.clone();
        big.insert(Concept::atom("B"), DependencySet::independent());

        assert!(small.is_subset_of(&big));
        assert!(!big.is_subset_of(&small));
        assert!(!small.same_concepts(&big));
        assert!(small.same_concepts(&small.clone()));
    }
}
