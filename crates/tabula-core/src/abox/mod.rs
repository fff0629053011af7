//! # ABox
//!
//! The completion-graph container. It owns the node table, the branch
//! stack, the current clash, the satisfiability cache and the pending-merge
//! queue, and it is the only place where the graph is mutated.
//!
//! ## Copies
//!
//! Nodes are stored as `Arc<Node>` and written through `Arc::make_mut`.
//! Cloning an `Abox` therefore shares every node with its source until the
//! first write to it. `copy` forces a full deep copy instead. Queries run on
//! a `derive`d graph, which is one or the other depending on the
//! configuration and starts with an empty cache and fresh statistics.
//!
//! ## Stamps
//!
//! Every fact written here is stamped with the current branch number, which
//! is what `restore` uses to undo it.

mod merge;
mod restore;

use crate::axiom::Axiom;
use crate::branch::Branch;
use crate::cache::SatCache;
use crate::clash::Clash;
use crate::concept::{Concept, Shape};
use crate::depset::DependencySet;
use crate::graph::{Edge, Node, NodeKind};
use crate::ontology::Ontology;
use crate::primitives::{BLOCKABLE, MAX_MERGE_CHAIN};
use crate::types::{LiteralValue, Name, NodeId, NodeName, ReasonerError, Role};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-query counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Branches created.
    pub branches: u64,
    /// Clashes handled by backtracking.
    pub backtracks: u64,
    /// Branch levels skipped by backjumping.
    pub backjumps: u64,
    /// Calls to `restore`.
    pub restores: u64,
    /// Node merges performed.
    pub merges: u64,
    /// Nodes created.
    pub nodes_created: u64,
    /// Completion runs.
    pub tableau_runs: u64,
    /// Satisfiability cache hits.
    pub cache_hits: u64,
    /// Satisfiability cache misses.
    pub cache_misses: u64,
}

impl Stats {
    /// Add another set of counters to this one.
    pub fn absorb(&mut self, other: &Self) {
        self.branches = self.branches.saturating_add(other.branches);
        self.backtracks = self.backtracks.saturating_add(other.backtracks);
        self.backjumps = self.backjumps.saturating_add(other.backjumps);
        self.restores = self.restores.saturating_add(other.restores);
        self.merges = self.merges.saturating_add(other.merges);
        self.nodes_created = self.nodes_created.saturating_add(other.nodes_created);
        self.tableau_runs = self.tableau_runs.saturating_add(other.tableau_runs);
        self.cache_hits = self.cache_hits.saturating_add(other.cache_hits);
        self.cache_misses = self.cache_misses.saturating_add(other.cache_misses);
    }
}

#[derive(Debug, Clone)]
struct MergeRequest {
    from: NodeId,
    into: NodeId,
    ds: DependencySet,
}

/// The completion-graph container.
#[derive(Debug, Clone)]
pub struct Abox {
    ontology: Arc<Ontology>,
    nodes: BTreeMap<NodeId, Arc<Node>>,
    names: BTreeMap<Name, NodeId>,
    next_id: u32,
    anon_count: u32,
    literal_count: u32,
    pub(crate) branch: u32,
    pub(crate) branches: Vec<Branch>,
    clash: Option<Clash>,
    cache: SatCache,
    merge_queue: VecDeque<MergeRequest>,
    merging: bool,
    pub(crate) changed: bool,
    pub(crate) stats: Stats,
    pub(crate) disjunct_clashes: BTreeMap<Concept, u64>,
}

// =============================================================================
// CONSTRUCTION AND COPIES
// =============================================================================

impl Abox {
    /// An empty graph over a compiled ontology.
    #[must_use]
    pub fn new(ontology: Arc<Ontology>) -> Self {
        Self {
            ontology,
            nodes: BTreeMap::new(),
            names: BTreeMap::new(),
            next_id: 0,
            anon_count: 0,
            literal_count: 0,
            branch: 0,
            branches: Vec::new(),
            clash: None,
            cache: SatCache::new(),
            merge_queue: VecDeque::new(),
            merging: false,
            changed: false,
            stats: Stats::default(),
            disjunct_clashes: BTreeMap::new(),
        }
    }

    /// A graph holding the ontology's assertions, not yet completed.
    pub fn from_ontology(ontology: Arc<Ontology>) -> Result<Self, ReasonerError> {
        let mut abox = Self::new(Arc::clone(&ontology));
        for name in ontology.individuals() {
            abox.add_individual(name, DependencySet::independent())?;
        }
        for axiom in ontology.assertions() {
            abox.assert(axiom)?;
        }
        Ok(abox)
    }

    fn assert(&mut self, axiom: &Axiom) -> Result<(), ReasonerError> {
        let ds = self.because(&DependencySet::independent(), axiom);
        match axiom {
            Axiom::Individual { name } => {
                self.add_individual(name, ds)?;
            }
            Axiom::ClassAssertion { individual, class } => {
                let x = self.add_individual(individual, DependencySet::independent())?;
                self.add_type(x, class, ds)?;
            }
            Axiom::RoleAssertion {
                subject,
                role,
                object,
            } => {
                let x = self.add_individual(subject, DependencySet::independent())?;
                let y = self.add_individual(object, DependencySet::independent())?;
                self.add_edge(x, role, y, ds)?;
            }
            Axiom::DataAssertion {
                subject,
                role,
                value,
            } => {
                let x = self.add_individual(subject, DependencySet::independent())?;
                let literal = self.add_literal(Some(value.clone()), true, ds.clone())?;
                self.add_edge(x, role, literal, ds)?;
            }
            Axiom::DifferentIndividuals { first, second } => {
                let x = self.add_individual(first, DependencySet::independent())?;
                let y = self.add_individual(second, DependencySet::independent())?;
                self.set_different(x, y, ds)?;
            }
            Axiom::SameIndividual { first, second } => {
                let x = self.add_individual(first, DependencySet::independent())?;
                let y = self.add_individual(second, DependencySet::independent())?;
                self.merge_to(x, y, ds)?;
            }
            other => {
                return Err(ReasonerError::Internal(format!(
                    "not an assertion: {other}"
                )));
            }
        }
        Ok(())
    }

    /// A full deep copy: no node is shared with `self`.
    #[must_use]
    pub fn copy(&self) -> Self {
        let mut copy = self.clone();
        copy.nodes = self
            .nodes
            .iter()
            .map(|(id, node)| (*id, Arc::new(Node::clone(node))))
            .collect();
        copy
    }

    /// The graph a query runs on: shares or copies nodes per configuration,
    /// with an empty cache and fresh statistics.
    #[must_use]
    pub fn derive(&self) -> Self {
        let nodes = if self.ontology.config().copy_on_write {
            self.nodes.clone()
        } else {
            self.nodes
                .iter()
                .map(|(id, node)| (*id, Arc::new(Node::clone(node))))
                .collect()
        };
        Self {
            ontology: Arc::clone(&self.ontology),
            nodes,
            names: self.names.clone(),
            next_id: self.next_id,
            anon_count: self.anon_count,
            literal_count: self.literal_count,
            branch: self.branch,
            branches: self.branches.clone(),
            clash: self.clash.clone(),
            cache: SatCache::new(),
            merge_queue: VecDeque::new(),
            merging: false,
            changed: true,
            stats: Stats::default(),
            disjunct_clashes: self.disjunct_clashes.clone(),
        }
    }

    /// Whether `self` and `other` share the storage of node `id`.
    #[must_use]
    pub fn shares_node(&self, other: &Self, id: NodeId) -> bool {
        match (self.nodes.get(&id), other.nodes.get(&id)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl Abox {
    /// The compiled ontology.
    #[must_use]
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    pub(crate) fn shared_ontology(&self) -> Arc<Ontology> {
        Arc::clone(&self.ontology)
    }

    /// A node by id, merged or not.
    pub fn node(&self, id: NodeId) -> Result<&Node, ReasonerError> {
        self.nodes
            .get(&id)
            .map(AsRef::as_ref)
            .ok_or_else(|| ReasonerError::Internal(format!("no node {id}")))
    }

    /// A node by id, if present.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(AsRef::as_ref)
    }

    /// A node for writing, stamped as changed at the current branch.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ReasonerError> {
        let branch = self.branch;
        let node = self
            .nodes
            .get_mut(&id)
            .map(Arc::make_mut)
            .ok_or_else(|| ReasonerError::Internal(format!("no node {id}")))?;
        node.changed_at = node.changed_at.max(branch);
        Ok(node)
    }

    /// Whether the node exists and was neither merged away nor pruned.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(|node| !node.is_pruned() && !node.is_merged())
    }

    /// Every node, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(AsRef::as_ref)
    }

    /// Number of nodes, including pruned ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Live individuals, in creation order.
    #[must_use]
    pub fn individuals(&self) -> Vec<NodeId> {
        self.live_where(Node::is_individual)
    }

    /// Live literals, in creation order.
    #[must_use]
    pub fn literals(&self) -> Vec<NodeId> {
        self.live_where(Node::is_literal)
    }

    fn live_where(&self, keep: impl Fn(&Node) -> bool) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| !node.is_pruned() && !node.is_merged() && keep(node))
            .map(|node| node.id())
            .collect()
    }

    /// The node created for a named individual, not following merges.
    #[must_use]
    pub fn individual(&self, name: &Name) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// The representative of a named individual.
    pub fn representative(&self, name: &Name) -> Result<NodeId, ReasonerError> {
        let id = self
            .individual(name)
            .ok_or_else(|| ReasonerError::UnknownIndividual(name.clone()))?;
        self.find(id)
    }

    /// The current branch number.
    #[must_use]
    pub fn branch(&self) -> u32 {
        self.branch
    }

    pub(crate) fn anon_count(&self) -> u32 {
        self.anon_count
    }

    /// The branch stack, oldest first.
    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    /// The live clash, if any.
    #[must_use]
    pub fn clash(&self) -> Option<&Clash> {
        self.clash.as_ref()
    }

    /// Counters of the current query.
    #[must_use]
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// The satisfiability cache.
    #[must_use]
    pub fn cache(&self) -> &SatCache {
        &self.cache
    }

    /// The satisfiability cache, for writing results back.
    pub fn cache_mut(&mut self) -> &mut SatCache {
        &mut self.cache
    }

    /// Failures recorded per disjunct, used to order disjunction branches.
    #[must_use]
    pub fn disjunct_clashes(&self) -> &BTreeMap<Concept, u64> {
        &self.disjunct_clashes
    }

    pub(crate) fn set_disjunct_clashes(&mut self, counts: BTreeMap<Concept, u64>) {
        self.disjunct_clashes = counts;
    }

    /// `ds` plus `axiom`, when explanations are on.
    pub(crate) fn because(&self, ds: &DependencySet, axiom: &Axiom) -> DependencySet {
        if self.ontology.config().explain {
            ds.with_axiom(axiom.clone())
        } else {
            ds.clone()
        }
    }

    /// `ds` plus the axioms of `reason`, when explanations are on.
    pub(crate) fn justified(&self, ds: &DependencySet, reason: &DependencySet) -> DependencySet {
        if self.ontology.config().explain {
            ds.union(reason)
        } else {
            ds.clone()
        }
    }
}

// =============================================================================
// NODE CREATION
// =============================================================================

impl Abox {
    fn insert_node(&mut self, build: impl FnOnce(NodeId) -> Node) -> Result<NodeId, ReasonerError> {
        let id = NodeId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| ReasonerError::Internal("node identifiers exhausted".to_string()))?;
        self.nodes.insert(id, Arc::new(build(id)));
        self.stats.nodes_created = self.stats.nodes_created.saturating_add(1);
        self.changed = true;
        Ok(id)
    }

    fn next_anon(&mut self) -> NodeName {
        let name = NodeName::Anon(self.anon_count);
        self.anon_count = self.anon_count.saturating_add(1);
        name
    }

    /// The node of a named individual, created on first use.
    pub fn add_individual(&mut self, name: &Name, ds: DependencySet) -> Result<NodeId, ReasonerError> {
        if let Some(id) = self.names.get(name) {
            return Ok(*id);
        }
        let ds = ds.with_branch(self.branch);
        let node_name = NodeName::Named(name.clone());
        let creation = ds.clone();
        let id = self.insert_node(|id| Node::individual(id, node_name, 0, None, creation))?;
        self.names.insert(name.clone(), id);
        self.add_type(id, &Concept::Top, ds.clone())?;
        self.add_type(id, &Concept::Value(name.clone()), ds)?;
        Ok(id)
    }

    /// An unnamed root individual, used as the subject of satisfiability
    /// checks.
    pub fn add_root(&mut self, ds: DependencySet) -> Result<NodeId, ReasonerError> {
        let ds = ds.with_branch(self.branch);
        let name = self.next_anon();
        let creation = ds.clone();
        let id = self.insert_node(|id| Node::individual(id, name, 0, None, creation))?;
        self.add_type(id, &Concept::Top, ds)?;
        Ok(id)
    }

    /// A fresh blockable successor of `parent`.
    pub fn add_fresh_individual(
        &mut self,
        parent: NodeId,
        ds: DependencySet,
    ) -> Result<NodeId, ReasonerError> {
        self.add_successor(parent, BLOCKABLE, ds)
    }

    /// A fresh nominal successor of `parent`, one nominal level below it.
    pub fn add_nominal_successor(
        &mut self,
        parent: NodeId,
        ds: DependencySet,
    ) -> Result<NodeId, ReasonerError> {
        let parent_level = self.node(self.find(parent)?)?.nominal_level();
        let level = parent_level.saturating_add(1).min(BLOCKABLE - 1);
        self.add_successor(parent, level, ds)
    }

    fn add_successor(
        &mut self,
        parent: NodeId,
        level: u32,
        ds: DependencySet,
    ) -> Result<NodeId, ReasonerError> {
        let parent = self.find(parent)?;
        let parent_node = self.node(parent)?;
        let depth = parent_node.depth();
        let ds = ds.union(parent_node.creation_ds()).with_branch(self.branch);
        let name = self.next_anon();
        let creation = ds.clone();
        let id = self.insert_node(|id| {
            Node::individual(id, name, level, Some((parent, depth)), creation)
        })?;
        self.add_type(id, &Concept::Top, ds)?;
        Ok(id)
    }

    /// A literal node. Asserted literals are roots.
    pub fn add_literal(
        &mut self,
        value: Option<LiteralValue>,
        asserted: bool,
        ds: DependencySet,
    ) -> Result<NodeId, ReasonerError> {
        let ds = ds.with_branch(self.branch);
        let name = NodeName::Literal(self.literal_count);
        self.literal_count = self.literal_count.saturating_add(1);
        let creation = ds.clone();
        let stored = value.clone();
        let id = self.insert_node(|id| Node::literal(id, name, stored, asserted, creation))?;
        if let Some(value) = value {
            self.add_type(id, &Concept::Datatype(value.datatype.clone()), ds)?;
        }
        Ok(id)
    }
}

// =============================================================================
// TYPES
// =============================================================================

impl Abox {
    /// Add `c` to the label of `node`'s representative.
    ///
    /// A complementary entry raises an atomic clash; conjunctions are split.
    pub fn add_type(&mut self, node: NodeId, c: &Concept, ds: DependencySet) -> Result<(), ReasonerError> {
        let (x, merge_ds) = self.find_with_ds(node)?;
        let ds = ds.union(&merge_ds).with_branch(self.branch);

        if *c == Concept::Bottom {
            let name = self.node(x)?.name().clone();
            self.set_clash(Clash::atomic(x, name, ds, Concept::Bottom));
            return Ok(());
        }
        if *c == Concept::Top && self.node(x)?.is_literal() {
            return Ok(());
        }

        if !self.node_mut(x)?.label.insert(c.clone(), ds.clone()) {
            return Ok(());
        }
        self.changed = true;
        trace!(node = %x, concept = %c, ds = %ds, "type added");

        let negation = c.negate();
        let node = self.node(x)?;
        if let Some(other) = node.label().get(&negation) {
            let term = if matches!(c, Concept::Not(_)) { negation.clone() } else { c.clone() };
            let clash = Clash::atomic(x, node.name().clone(), ds.union(other), term);
            self.set_clash(clash);
        }

        if let Concept::And(parts) = c {
            for part in parts.iter() {
                self.add_type(x, part, ds.clone())?;
            }
        }
        Ok(())
    }

    /// Give a literal its concrete value.
    pub fn set_literal_value(
        &mut self,
        node: NodeId,
        value: LiteralValue,
        ds: DependencySet,
    ) -> Result<(), ReasonerError> {
        let (x, merge_ds) = self.find_with_ds(node)?;
        let ds = ds.union(&merge_ds).with_branch(self.branch);
        let literal = self.node(x)?;
        if let Some((current, current_ds)) = literal.literal_value() {
            if *current != value {
                let detail = format!("literal cannot be both {current} and {value}");
                let clash = Clash::datatype(x, literal.name().clone(), ds.union(current_ds), detail);
                self.set_clash(clash);
            }
            return Ok(());
        }
        let datatype = Concept::Datatype(value.datatype.clone());
        match &mut self.node_mut(x)?.kind {
            NodeKind::Literal(data) => data.value = Some((value, ds.clone())),
            NodeKind::Individual(_) => {
                return Err(ReasonerError::Internal(format!(
                    "cannot give individual {x} a literal value"
                )));
            }
        }
        self.changed = true;
        self.add_type(x, &datatype, ds)
    }
}

// =============================================================================
// EDGES
// =============================================================================

impl Abox {
    /// Add the edge `from -role-> to` between the representatives.
    ///
    /// Returns `None` without touching the graph if the edge exists.
    /// Domains and ranges of `role` are applied to the endpoints.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        role: &Role,
        to: NodeId,
        ds: DependencySet,
    ) -> Result<Option<Edge>, ReasonerError> {
        let (from, from_ds) = self.find_with_ds(from)?;
        let (to, to_ds) = self.find_with_ds(to)?;
        let ds = ds.union(&from_ds).union(&to_ds).with_branch(self.branch);

        let source = self.node(from)?;
        if source.is_pruned() || source.is_literal() {
            return Err(ReasonerError::Internal(format!(
                "cannot add {role} edge from {}",
                source.name()
            )));
        }
        if source.out_edges().find(role, from, to).is_some() {
            return Ok(None);
        }
        if self.node(to)?.is_pruned() {
            return Err(ReasonerError::Internal(format!(
                "cannot add {role} edge to pruned {to}"
            )));
        }

        let edge = Edge::new(role.clone(), from, to, ds.clone());
        {
            let source = self.node_mut(from)?;
            if let Some(data) = source.individual_data_mut() {
                data.out_edges.insert(edge.clone());
            }
            source.set_cursor(Shape::Universal, 0);
        }
        {
            let target = self.node_mut(to)?;
            target.in_edges.insert(edge.clone());
            target.set_cursor(Shape::Universal, 0);
        }
        self.changed = true;
        trace!(from = %from, role = %role, to = %to, "edge added");

        let ontology = self.shared_ontology();
        for (class, reason) in ontology.rbox().domains(role) {
            let ds = self.justified(&ds, &reason);
            self.add_type(from, class, ds)?;
        }
        for (class, reason) in ontology.rbox().ranges(role) {
            let ds = self.justified(&ds, &reason);
            self.add_type(to, class, ds)?;
        }
        Ok(Some(edge))
    }

    /// Remove an edge from both endpoints.
    pub fn remove_edge(&mut self, edge: &Edge) -> Result<bool, ReasonerError> {
        let mut removed = false;
        if let Some(data) = self.node_mut(edge.from)?.individual_data_mut() {
            removed |= data.out_edges.remove(edge);
        }
        removed |= self.node_mut(edge.to)?.in_edges.remove(edge);
        if removed {
            self.changed = true;
        }
        Ok(removed)
    }

    /// Live neighbors of `x` over `role` or a sub-role, in either direction,
    /// with the dependencies of the connecting edge.
    pub fn r_neighbors(
        &self,
        x: NodeId,
        role: &Role,
    ) -> Result<Vec<(NodeId, DependencySet)>, ReasonerError> {
        let node = self.node(x)?;
        let rbox = self.ontology.rbox();
        let mut found: BTreeMap<NodeId, DependencySet> = BTreeMap::new();
        let mut keep = |id: NodeId, ds: &DependencySet| {
            let better = found.get(&id).is_none_or(|old| ds.max() < old.max());
            if better {
                found.insert(id, ds.clone());
            }
        };
        for edge in node.out_edges() {
            if rbox.is_sub_role_of(&edge.role, role) && self.is_live(edge.to) {
                keep(edge.to, &edge.ds);
            }
        }
        for edge in node.in_edges() {
            let matches = rbox
                .inverse(&edge.role)
                .is_some_and(|inverse| rbox.is_sub_role_of(&inverse, role));
            if matches && self.is_live(edge.from) {
                keep(edge.from, &edge.ds);
            }
        }
        Ok(found.into_iter().collect())
    }

    /// Roles connecting `from` to `to`, counting reversed edges by their
    /// inverse.
    pub fn edge_roles(&self, from: NodeId, to: NodeId) -> Result<BTreeSet<Role>, ReasonerError> {
        let rbox = self.ontology.rbox();
        let node = self.node(from)?;
        let mut roles: BTreeSet<Role> = node
            .out_edges()
            .iter()
            .filter(|e| e.to == to)
            .map(|e| e.role.clone())
            .collect();
        roles.extend(
            node.in_edges()
                .iter()
                .filter(|e| e.from == to)
                .filter_map(|e| rbox.inverse(&e.role)),
        );
        Ok(roles)
    }

    /// Whether `x` has an outgoing edge to `y`.
    pub fn has_successor(&self, x: NodeId, y: NodeId) -> Result<bool, ReasonerError> {
        Ok(self.node(x)?.out_edges().iter().any(|e| e.to == y))
    }
}

// =============================================================================
// DIFFERENCES
// =============================================================================

impl Abox {
    /// Record `a ≠ b` on both representatives.
    pub fn set_different(&mut self, a: NodeId, b: NodeId, ds: DependencySet) -> Result<(), ReasonerError> {
        let (a, a_ds) = self.find_with_ds(a)?;
        let (b, b_ds) = self.find_with_ds(b)?;
        let ds = ds.union(&a_ds).union(&b_ds).with_branch(self.branch);
        if a == b {
            let name = self.node(a)?.name().clone();
            let other = name.clone();
            self.set_clash(Clash::nominal_merge(a, name, ds, &other));
            return Ok(());
        }
        for (x, y) in [(a, b), (b, a)] {
            let node = self.node_mut(x)?;
            let better = node.differents.get(&y).is_none_or(|old| ds.max() < old.max());
            if better {
                node.differents.insert(y, ds.clone());
                self.changed = true;
            }
        }
        Ok(())
    }

    /// Why `a` and `b` must be different, if they must.
    ///
    /// Explicit inequalities, the unique-name assumption for named
    /// individuals and distinct literal values all count.
    pub fn is_different(&self, a: NodeId, b: NodeId) -> Result<Option<DependencySet>, ReasonerError> {
        let (a, a_ds) = self.find_with_ds(a)?;
        let (b, b_ds) = self.find_with_ds(b)?;
        if a == b {
            return Ok(None);
        }
        let merge_ds = a_ds.union(&b_ds);
        let first = self.node(a)?;
        let second = self.node(b)?;
        if let Some(ds) = first.differents().get(&b) {
            return Ok(Some(ds.union(&merge_ds)));
        }
        let named = |n: &Node| n.is_individual() && n.name().as_named().is_some();
        if self.ontology.config().unique_name_assumption && named(first) && named(second) {
            return Ok(Some(merge_ds));
        }
        if let (Some((x, x_ds)), Some((y, y_ds))) = (first.literal_value(), second.literal_value()) {
            if x != y {
                return Ok(Some(x_ds.union(y_ds).union(&merge_ds)));
            }
        }
        Ok(None)
    }
}

// =============================================================================
// CLASH
// =============================================================================

impl Abox {
    /// Record a clash.
    ///
    /// A stored clash is only replaced by one that backjumps at least as
    /// far, i.e. whose `max()` is not higher.
    pub fn set_clash(&mut self, clash: Clash) {
        match &self.clash {
            Some(existing) if clash.ds.max() > existing.ds.max() => {
                trace!(kept = %existing, ignored = %clash, "clash not replaced");
            }
            _ => {
                debug!(clash = %clash, "clash");
                self.clash = Some(clash);
            }
        }
    }

    /// Replace the clash unconditionally.
    pub(crate) fn replace_clash(&mut self, clash: Clash) {
        debug!(clash = %clash, "clash");
        self.clash = Some(clash);
    }

    pub(crate) fn clear_clash(&mut self) {
        self.clash = None;
    }
}

// =============================================================================
// UNION-FIND
// =============================================================================

impl Abox {
    /// The representative of `id`.
    pub fn find(&self, id: NodeId) -> Result<NodeId, ReasonerError> {
        self.find_with_ds(id).map(|(rep, _)| rep)
    }

    /// The representative of `id` and the dependencies of the merges that
    /// lead to it.
    pub fn find_with_ds(&self, id: NodeId) -> Result<(NodeId, DependencySet), ReasonerError> {
        let mut current = id;
        let mut ds = DependencySet::independent();
        for _ in 0..MAX_MERGE_CHAIN {
            let node = self.node(current)?;
            if !node.is_merged() {
                return Ok((current, ds));
            }
            ds = ds.union(&node.merge_ds);
            current = node.merged_to();
        }
        Err(ReasonerError::Internal(format!(
            "merge chain from {id} does not terminate"
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================
