//! # Satisfiability Cache
//!
//! Memoized results of concept satisfiability checks. A satisfiable concept
//! maps to a detached copy of the root of its completed model; an
//! unsatisfiable one maps to `Bottom`, and its negation to `Top`.
//!
//! `mergable` compares two cached models and answers whether the
//! conjunction of their concepts is satisfiable. It only answers `True` or
//! `False` when the structure of both models settles the question; every
//! inconclusive case is `Unknown`, which callers resolve with a real
//! tableau run.

use crate::abox::Abox;
use crate::concept::{Concept, Shape};
use crate::depset::DependencySet;
use crate::rbox::RoleBox;
use crate::types::{Name, NodeId, ReasonerError, Role};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// THREE-VALUED ANSWERS
// =============================================================================

/// A three-valued answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bool3 {
    /// Definitely yes.
    True,
    /// Definitely no.
    False,
    /// Not decided without further work.
    Unknown,
}

impl Bool3 {
    /// Lift a boolean.
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    /// The boolean, if known.
    #[must_use]
    pub fn known(self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Unknown => None,
        }
    }

    /// Three-valued negation.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }
}

impl fmt::Display for Bool3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::True => "true",
            Self::False => "false",
            Self::Unknown => "unknown",
        })
    }
}

// =============================================================================
// CACHED MODELS
// =============================================================================

/// An edge of a cached model, seen from the cached root.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEdge {
    /// The role from the root towards the neighbor.
    pub role: Role,
    /// Name of the neighbor if it is a named individual.
    pub nominal: Option<Name>,
    /// Whether the neighbor is a literal.
    pub literal: bool,
    /// Why the edge exists.
    pub ds: DependencySet,
}

/// A detached copy of the root of a completed model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CachedIndividual {
    /// The root's label.
    pub types: BTreeMap<Concept, DependencySet>,
    /// The root's edges, with no reference back into the graph.
    pub edges: Vec<CachedEdge>,
    /// Whether the root is a named individual.
    pub nominal: bool,
    /// Whether the model was completed.
    pub complete: bool,
}

impl CachedIndividual {
    /// Copy the neighborhood of `id` out of a completed graph.
    pub fn from_abox(abox: &Abox, id: NodeId, complete: bool) -> Result<Self, ReasonerError> {
        let root = abox.find(id)?;
        let node = abox.node(root)?;
        let rbox = abox.ontology().rbox();

        let types = node
            .label()
            .iter()
            .map(|(c, ds)| (c.clone(), ds.clone()))
            .collect();

        let mut edges = Vec::new();
        for edge in node.out_edges() {
            let neighbor = abox.node(edge.to)?;
            edges.push(CachedEdge {
                role: edge.role.clone(),
                nominal: neighbor.name().as_named().cloned(),
                literal: neighbor.is_literal(),
                ds: edge.ds.clone(),
            });
        }
        for edge in node.in_edges() {
            let Some(role) = rbox.inverse(&edge.role) else {
                continue;
            };
            let neighbor = abox.node(edge.from)?;
            edges.push(CachedEdge {
                role,
                nominal: neighbor.name().as_named().cloned(),
                literal: false,
                ds: edge.ds.clone(),
            });
        }

        Ok(Self {
            types,
            edges,
            nominal: node.name().as_named().is_some(),
            complete,
        })
    }

    fn edges_on<'a>(&'a self, rbox: &'a RoleBox, role: &'a Role) -> impl Iterator<Item = &'a CachedEdge> {
        self.edges
            .iter()
            .filter(move |e| rbox.is_sub_role_of(&e.role, role))
    }

    fn of_shape(&self, shape: Shape) -> impl Iterator<Item = &Concept> {
        self.types.keys().filter(move |c| c.shape() == shape)
    }

    /// Whether anything about this model can force or forbid a merge.
    fn has_nominal_interaction(&self) -> bool {
        self.nominal
            || self.edges.iter().any(|e| e.nominal.is_some())
            || self.types.keys().any(|c| {
                let mut found = false;
                c.visit(&mut |sub| found |= matches!(sub, Concept::Value(_)));
                found
            })
    }
}

/// What a cache entry represents.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedRepr {
    /// The concept is equivalent to `⊤`: its negation is unsatisfiable.
    Top,
    /// The concept is unsatisfiable.
    Bottom,
    /// Satisfiable, but no model was kept.
    Dummy,
    /// Satisfiable, with the root of a model.
    Model(CachedIndividual),
}

/// A cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedNode {
    /// What the entry represents.
    pub repr: CachedRepr,
    /// Dependencies of the result.
    pub ds: DependencySet,
}

impl CachedNode {
    /// Entry for a concept whose negation is unsatisfiable.
    #[must_use]
    pub fn top(ds: DependencySet) -> Self {
        Self {
            repr: CachedRepr::Top,
            ds,
        }
    }

    /// Entry for an unsatisfiable concept.
    #[must_use]
    pub fn bottom(ds: DependencySet) -> Self {
        Self {
            repr: CachedRepr::Bottom,
            ds,
        }
    }

    /// Entry for a satisfiable concept without a model.
    #[must_use]
    pub fn dummy() -> Self {
        Self {
            repr: CachedRepr::Dummy,
            ds: DependencySet::independent(),
        }
    }

    /// Entry for a satisfiable concept with a model root.
    #[must_use]
    pub fn model(root: CachedIndividual, ds: DependencySet) -> Self {
        Self {
            repr: CachedRepr::Model(root),
            ds,
        }
    }

    /// Whether the cached concept is unsatisfiable.
    #[must_use]
    pub fn is_bottom(&self) -> bool {
        matches!(self.repr, CachedRepr::Bottom)
    }

    /// Whether the cached concept's negation is unsatisfiable.
    #[must_use]
    pub fn is_top(&self) -> bool {
        matches!(self.repr, CachedRepr::Top)
    }
}

// =============================================================================
// CACHE TABLE
// =============================================================================

/// The satisfiability cache.
#[derive(Debug, Clone, Default)]
pub struct SatCache {
    entries: BTreeMap<Concept, CachedNode>,
    hits: u64,
    misses: u64,
}

impl SatCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up `c`, counting a hit or a miss.
    pub fn get(&mut self, c: &Concept) -> Option<&CachedNode> {
        if self.entries.contains_key(c) {
            self.hits = self.hits.saturating_add(1);
        } else {
            self.misses = self.misses.saturating_add(1);
        }
        self.entries.get(c)
    }

    /// Look up `c` without touching the counters.
    #[must_use]
    pub fn peek(&self, c: &Concept) -> Option<&CachedNode> {
        self.entries.get(c)
    }

    /// Store the result for a satisfiable concept.
    ///
    /// A stored `Bottom` is never replaced by a satisfiable entry: that
    /// would mean two checks of one concept disagreed.
    pub fn put_sat(&mut self, c: Concept, node: CachedNode) -> Result<(), ReasonerError> {
        if self.entries.get(&c).is_some_and(CachedNode::is_bottom) {
            return Err(ReasonerError::Internal(format!(
                "cache holds {c} as unsatisfiable but a check found a model"
            )));
        }
        self.entries.insert(c, node);
        Ok(())
    }

    /// Store `c → Bottom` and `¬c → Top`.
    pub fn put_unsat(&mut self, c: Concept, ds: DependencySet) -> Result<(), ReasonerError> {
        if matches!(
            self.entries.get(&c).map(|n| &n.repr),
            Some(CachedRepr::Model(_) | CachedRepr::Dummy | CachedRepr::Top)
        ) {
            return Err(ReasonerError::Internal(format!(
                "cache holds {c} as satisfiable but a check found it unsatisfiable"
            )));
        }
        self.entries.insert(c.negate(), CachedNode::top(ds.clone()));
        self.entries.insert(c, CachedNode::bottom(ds));
        Ok(())
    }

    /// The cached satisfiability of `c`.
    #[must_use]
    pub fn is_satisfiable(&self, c: &Concept) -> Bool3 {
        match self.entries.get(c) {
            None => Bool3::Unknown,
            Some(node) => Bool3::from_bool(!node.is_bottom()),
        }
    }

    /// Number of lookups that found an entry.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookups that found nothing.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

// =============================================================================
// MERGABILITY
// =============================================================================

/// Whether the concepts behind two cached entries can hold together.
///
/// With `independent`, a `False` answer additionally requires that the
/// conflicting facts depend on no branch of either model.
#[must_use]
pub fn mergable(rbox: &RoleBox, a: &CachedNode, b: &CachedNode, independent: bool) -> Bool3 {
    match (&a.repr, &b.repr) {
        (CachedRepr::Bottom, _) | (_, CachedRepr::Bottom) => Bool3::False,
        (CachedRepr::Top, _) | (_, CachedRepr::Top) => Bool3::True,
        (CachedRepr::Dummy, _) | (_, CachedRepr::Dummy) => Bool3::Unknown,
        (CachedRepr::Model(x), CachedRepr::Model(y)) => merge_models(rbox, x, y, independent),
    }
}

fn merge_models(
    rbox: &RoleBox,
    x: &CachedIndividual,
    y: &CachedIndividual,
    independent: bool,
) -> Bool3 {
    if !x.complete || !y.complete {
        return Bool3::Unknown;
    }

    // Complementary labels.
    for (c, ds) in &x.types {
        if let Some(other) = y.types.get(&c.negate()) {
            if independent && ds.is_independent() && other.is_independent() && c.is_primitive() {
                return Bool3::False;
            }
            return Bool3::Unknown;
        }
    }

    if x.has_nominal_interaction() || y.has_nominal_interaction() {
        return Bool3::Unknown;
    }

    let one_sided = |x: &CachedIndividual, y: &CachedIndividual| {
        // Universal restrictions of one side reach the other side's edges.
        for c in x.of_shape(Shape::Universal) {
            if let Some((role, _)) = c.as_all() {
                if y.edges_on(rbox, role).next().is_some() {
                    return true;
                }
            }
        }
        // Number restrictions count edges of both sides.
        for c in x.of_shape(Shape::MaxCard) {
            if let Some((role, n, _)) = c.as_max() {
                let total = x.edges_on(rbox, role).count() + y.edges_on(rbox, role).count();
                let demanded = y
                    .of_shape(Shape::MinCard)
                    .chain(y.of_shape(Shape::Existential))
                    .any(|d| {
                        let sub = d.as_min().map(|(r, _, _)| r).or_else(|| d.as_exists().map(|(r, _)| r));
                        sub.is_some_and(|r| rbox.is_sub_role_of(r, role))
                    });
                if total > n as usize || demanded {
                    return true;
                }
            }
        }
        // Functional roles with neighbors on both sides.
        for edge in &x.edges {
            for f in rbox.functional_supers(&edge.role) {
                if y.edges_on(rbox, &f).next().is_some() {
                    return true;
                }
            }
        }
        false
    };

    if one_sided(x, y) || one_sided(y, x) {
        Bool3::Unknown
    } else {
        Bool3::True
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn model(types: &[(Concept, DependencySet)], edges: Vec<CachedEdge>) -> CachedNode {
        CachedNode::model(
            CachedIndividual {
                types: types.iter().cloned().collect(),
                edges,
                nominal: false,
                complete: true,
            },
            DependencySet::independent(),
        )
    }

    fn edge(role: &str) -> CachedEdge {
        CachedEdge {
            role: Role::new(role),
            nominal: None,
            literal: false,
            ds: DependencySet::independent(),
        }
    }

    fn rbox() -> RoleBox {
        let mut rbox = RoleBox::new();
        rbox.declare(&Role::new("r"));
        rbox.set_functional(&Role::new("f"));
        rbox.prepare();
        rbox
    }

    #[test]
    fn unsat_stores_bottom_and_negated_top() {
        let mut cache = SatCache::new();
        let a = Concept::atom("A");
        cache
            .put_unsat(a.clone(), DependencySet::independent())
            .expect("fresh entry");

        assert_eq!(cache.is_satisfiable(&a), Bool3::False);
        assert!(cache.peek(&a.negate()).is_some_and(CachedNode::is_top));
        assert_eq!(cache.is_satisfiable(&Concept::atom("B")), Bool3::Unknown);
    }

    #[test]
    fn contradicting_entry_is_internal_error() {
        let mut cache = SatCache::new();
        let a = Concept::atom("A");
        cache
            .put_unsat(a.clone(), DependencySet::independent())
            .expect("fresh entry");
        assert!(matches!(
            cache.put_sat(a, CachedNode::dummy()),
            Err(ReasonerError::Internal(_))
        ));
    }

    #[test]
    fn lookups_are_counted() {
        let mut cache = SatCache::new();
        cache
            .put_sat(Concept::atom("A"), CachedNode::dummy())
            .expect("fresh entry");
        assert!(cache.get(&Concept::atom("A")).is_some());
        assert!(cache.get(&Concept::atom("B")).is_none());
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn independent_complements_are_not_mergable() {
        let a = Concept::atom("A");
        let left = model(&[(a.clone(), DependencySet::independent())], vec![]);
        let right = model(&[(a.negate(), DependencySet::independent())], vec![]);
        assert_eq!(mergable(&rbox(), &left, &right, true), Bool3::False);
    }

    #[test]
    fn dependent_complements_are_unknown() {
        let a = Concept::atom("A");
        let left = model(&[(a.clone(), DependencySet::for_branch(1))], vec![]);
        let right = model(&[(a.negate(), DependencySet::independent())], vec![]);
        assert_eq!(mergable(&rbox(), &left, &right, true), Bool3::Unknown);
    }

    #[test]
    fn disjoint_labels_without_edges_merge() {
        let left = model(&[(Concept::atom("A"), DependencySet::independent())], vec![edge("r")]);
        let right = model(&[(Concept::atom("B"), DependencySet::independent())], vec![]);
        assert_eq!(mergable(&rbox(), &left, &right, true), Bool3::True);
    }

    #[test]
    fn universal_against_edge_is_unknown() {
        let all = Concept::all("r", Concept::atom("A")).normalize();
        let left = model(&[(all, DependencySet::independent())], vec![]);
        let right = model(&[], vec![edge("r")]);
        assert_eq!(mergable(&rbox(), &left, &right, true), Bool3::Unknown);
    }

    #[test]
    fn functional_neighbors_on_both_sides_are_unknown() {
        let left = model(&[], vec![edge("f")]);
        let right = model(&[], vec![edge("f")]);
        assert_eq!(mergable(&rbox(), &left, &right, true), Bool3::Unknown);
    }

    #[test]
    fn sentinels_decide_directly() {
        let bottom = CachedNode::bottom(DependencySet::independent());
        let top = CachedNode::top(DependencySet::independent());
        let dummy = CachedNode::dummy();
        assert_eq!(mergable(&rbox(), &bottom, &top, true), Bool3::False);
        assert_eq!(mergable(&rbox(), &top, &dummy, true), Bool3::True);
        assert_eq!(mergable(&rbox(), &dummy, &dummy, false), Bool3::Unknown);
    }
}
