//! # Branches
//!
//! Choice points of the tableau. A branch records its alternatives, which
//! one to try next, and the dependencies accumulated from alternatives that
//! already failed.
//!
//! ## Dependency bookkeeping
//!
//! Alternative `i` of branch `b` is applied with the trigger's dependencies
//! plus `{b}`, so a clash caused by the choice names `b` as its backjump
//! target. The last alternative is not a choice any more: it is applied with
//! the trigger's dependencies plus everything the earlier failures depended
//! on, without `b`. If it fails too, the clash points below `b`.
//!
//! Applying an alternative needs the whole graph, so the strategy does it;
//! this module only holds the state.

use crate::clash::ClashKind;
use crate::concept::Concept;
use crate::depset::DependencySet;
use crate::types::{LiteralValue, NodeId, Role};
use std::fmt;

/// A candidate merge of two role neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct MergePair {
    /// Node to merge away.
    pub from: NodeId,
    /// Node that survives.
    pub into: NodeId,
    /// Dependencies of the two edges.
    pub ds: DependencySet,
}

/// The alternatives of a branch, by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum BranchKind {
    /// One alternative per disjunct.
    Disjunction {
        /// The label entry `¬(¬d1 ⊓ … ⊓ ¬dn)`.
        disjunction: Concept,
        /// `d1 … dn`, in trial order.
        disjuncts: Vec<Concept>,
    },
    /// One alternative per mergeable neighbor pair.
    Max {
        /// The `≤n r.C` restriction.
        max: Concept,
        /// Candidate merges, in trial order.
        pairs: Vec<MergePair>,
    },
    /// Guesses of the exact number of nominal neighbors, largest first.
    Guess {
        /// The `≤n r.C` restriction on the nominal.
        max: Concept,
        /// Role of the restriction.
        role: Role,
        /// Qualification of the restriction.
        filler: Concept,
        /// Guesses, descending.
        guesses: Vec<u32>,
    },
    /// Candidate concrete values for a literal.
    LiteralValue {
        /// Values, in trial order.
        values: Vec<LiteralValue>,
    },
    /// Alternatives of a ground rule: a negated body atom, or the whole head.
    Rule {
        /// Position of the rule in the ontology.
        rule: usize,
        /// Each alternative is a set of `(node, concept)` facts.
        alternatives: Vec<Vec<(NodeId, Concept)>>,
    },
}

impl BranchKind {
    /// Number of alternatives.
    #[must_use]
    pub fn alternative_count(&self) -> usize {
        match self {
            Self::Disjunction { disjuncts, .. } => disjuncts.len(),
            Self::Max { pairs, .. } => pairs.len(),
            Self::Guess { guesses, .. } => guesses.len(),
            Self::LiteralValue { values } => values.len(),
            Self::Rule { alternatives, .. } => alternatives.len(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Disjunction { .. } => "disjunction",
            Self::Max { .. } => "max",
            Self::Guess { .. } => "guess",
            Self::LiteralValue { .. } => "literal-value",
            Self::Rule { .. } => "rule",
        }
    }
}

/// A choice point on the branch stack.
#[derive(Debug, Clone)]
pub struct Branch {
    pub(crate) index: u32,
    pub(crate) node: NodeId,
    pub(crate) kind: BranchKind,
    pub(crate) try_next: usize,
    pub(crate) term_ds: DependencySet,
    pub(crate) prev_ds: DependencySet,
    pub(crate) failures: Vec<DependencySet>,
    pub(crate) last_clash: Option<ClashKind>,
    pub(crate) anon_count: u32,
    pub(crate) node_count: usize,
}

impl Branch {
    /// A fresh branch with no alternative tried.
    #[must_use]
    pub fn new(
        index: u32,
        node: NodeId,
        kind: BranchKind,
        term_ds: DependencySet,
        anon_count: u32,
        node_count: usize,
    ) -> Self {
        Self {
            index,
            node,
            kind,
            try_next: 0,
            term_ds,
            prev_ds: DependencySet::independent(),
            failures: Vec::new(),
            last_clash: None,
            anon_count,
            node_count,
        }
    }

    /// Branch number; equals its position on the stack plus one.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The node the branch was created for.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The alternatives.
    #[must_use]
    pub fn kind(&self) -> &BranchKind {
        &self.kind
    }

    /// Index of the next alternative to try.
    #[must_use]
    pub fn next_alternative(&self) -> usize {
        self.try_next
    }

    /// Number of alternatives.
    #[must_use]
    pub fn alternative_count(&self) -> usize {
        self.kind.alternative_count()
    }

    /// Whether every alternative was tried.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.try_next >= self.alternative_count()
    }

    /// Dependencies of alternatives that already failed, without this branch.
    #[must_use]
    pub fn prev_ds(&self) -> &DependencySet {
        &self.prev_ds
    }

    /// Anonymous-name counter when the branch was created.
    #[must_use]
    pub fn anon_count(&self) -> u32 {
        self.anon_count
    }

    /// Dependency set for alternative `alt`.
    #[must_use]
    pub fn alternative_ds(&self, alt: usize) -> DependencySet {
        let ds = if alt + 1 >= self.alternative_count() {
            self.term_ds.union(&self.prev_ds)
        } else {
            self.term_ds.union(&DependencySet::for_branch(self.index))
        };
        ds.with_branch(self.index)
    }

    /// Record the clash that ended the current alternative.
    pub fn record_failure(&mut self, clash_ds: &DependencySet, kind: ClashKind) {
        let without = clash_ds.without(self.index);
        self.prev_ds = self.prev_ds.union(&without);
        self.failures.push(without);
        self.last_clash = Some(kind);
    }

    /// Dependencies of failed alternative `alt`, without this branch.
    #[must_use]
    pub fn failure_ds(&self, alt: usize) -> Option<&DependencySet> {
        self.failures.get(alt)
    }

    /// Dependencies of the clash raised when the branch is exhausted.
    #[must_use]
    pub fn exhausted_ds(&self) -> DependencySet {
        self.prev_ds.union(&self.term_ds)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} branch {} on {} ({}/{})",
            self.kind.name(),
            self.index,
            self.node,
            self.try_next,
            self.alternative_count()
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn disjunction_branch(index: u32, term_ds: DependencySet) -> Branch {
        let disjuncts = vec![Concept::atom("A"), Concept::atom("B"), Concept::atom("C")];
        let disjunction = Concept::or(disjuncts.clone()).normalize();
        Branch::new(
            index,
            NodeId(0),
            BranchKind::Disjunction {
                disjunction,
                disjuncts,
            },
            term_ds,
            0,
            1,
        )
    }

    #[test]
    fn early_alternatives_depend_on_the_branch() {
        let branch = disjunction_branch(2, DependencySet::for_branch(1));
        let ds = branch.alternative_ds(0);
        assert!(ds.contains(2));
        assert!(ds.contains(1));
        assert_eq!(ds.branch(), 2);
    }

    #[test]
    fn last_alternative_depends_on_earlier_failures_only() {
        let mut branch = disjunction_branch(3, DependencySet::independent());
        branch.try_next = 1;
        branch.record_failure(
            &DependencySet::for_branch(3).union(&DependencySet::for_branch(1)),
            ClashKind::Atomic,
        );
        branch.try_next = 2;
        branch.record_failure(&DependencySet::for_branch(3), ClashKind::Atomic);

        let ds = branch.alternative_ds(2);
        assert!(!ds.contains(3));
        assert_eq!(ds.max(), 1);
        assert_eq!(branch.failure_ds(0).map(DependencySet::max), Some(1));
    }

    #[test]
    fn exhaustion_tracks_cursor() {
        let mut branch = disjunction_branch(1, DependencySet::independent());
        assert!(!branch.is_exhausted());
        branch.try_next = 3;
        assert!(branch.is_exhausted());
        assert_eq!(branch.to_string(), "disjunction branch 1 on #0 (3/3)");
    }
}
