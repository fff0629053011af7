//! # Dependency Sets
//!
//! Every fact in a completion graph carries the set of branch indices it
//! depends on. When a clash is found, the highest index in the clash's
//! dependency set names the most recent choice that contributed to it: that
//! is the backjump target.
//!
//! A dependency set also records `branch`, the branch number that was current
//! when the fact was stored. Restoring to an earlier branch uses this stamp
//! (or, with smart restore, the dependency bits themselves).
//!
//! In explanation mode a set additionally accumulates the axioms that
//! produced the fact.

use crate::axiom::Axiom;
use crate::primitives::NO_BRANCH;
use roaring::RoaringBitmap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Branch indices (and optionally axioms) a fact depends on.
///
/// Sets are immutable values: `union` returns a fresh set.
#[derive(Clone, Default)]
pub struct DependencySet {
    depends: RoaringBitmap,
    branch: u32,
    explain: Option<Arc<BTreeSet<Axiom>>>,
}

impl DependencySet {
    /// The dependency set of unconditional facts: empty, branch 0.
    #[must_use]
    pub fn independent() -> Self {
        Self::default()
    }

    /// A set depending on exactly branch `b`, stamped with `b`.
    #[must_use]
    pub fn for_branch(b: u32) -> Self {
        let mut depends = RoaringBitmap::new();
        depends.insert(b);
        Self {
            depends,
            branch: b,
            explain: None,
        }
    }

    /// An unconditional set justified by a single axiom.
    #[must_use]
    pub fn from_axiom(axiom: Axiom) -> Self {
        Self::independent().with_axiom(axiom)
    }

    /// Highest branch index in the set, or 0 when empty.
    #[must_use]
    pub fn max(&self) -> u32 {
        self.depends.max().unwrap_or(NO_BRANCH)
    }

    /// True when the fact depends on no choice.
    #[must_use]
    pub fn is_independent(&self) -> bool {
        self.max() <= NO_BRANCH
    }

    /// Whether branch `b` is in the set.
    #[must_use]
    pub fn contains(&self, b: u32) -> bool {
        self.depends.contains(b)
    }

    /// The branch that was current when the fact was recorded.
    #[must_use]
    pub fn branch(&self) -> u32 {
        self.branch
    }

    /// Number of branch indices in the set.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.depends.len()
    }

    /// The branch indices, ascending.
    pub fn branches(&self) -> impl Iterator<Item = u32> + '_ {
        self.depends.iter()
    }

    /// Union of two sets. The stamp is the later of the two.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let explain = match (&self.explain, &other.explain) {
            (None, None) => None,
            (Some(a), None) => Some(Arc::clone(a)),
            (None, Some(b)) => Some(Arc::clone(b)),
            (Some(a), Some(b)) if Arc::ptr_eq(a, b) => Some(Arc::clone(a)),
            (Some(a), Some(b)) => Some(Arc::new(a.union(b).cloned().collect())),
        };
        Self {
            depends: &self.depends | &other.depends,
            branch: self.branch.max(other.branch),
            explain,
        }
    }

    /// Copy of this set stamped with branch `b`.
    #[must_use]
    pub fn with_branch(&self, b: u32) -> Self {
        let mut copy = self.clone();
        copy.branch = b;
        copy
    }

    /// Copy of this set without branch `b`.
    #[must_use]
    pub fn without(&self, b: u32) -> Self {
        let mut copy = self.clone();
        copy.depends.remove(b);
        copy
    }

    /// Copy of this set that also records `axiom`.
    #[must_use]
    pub fn with_axiom(&self, axiom: Axiom) -> Self {
        let mut axioms = self.explain.as_deref().cloned().unwrap_or_default();
        axioms.insert(axiom);
        let mut copy = self.clone();
        copy.explain = Some(Arc::new(axioms));
        copy
    }

    /// Axioms recorded in explanation mode.
    pub fn axioms(&self) -> impl Iterator<Item = &Axiom> {
        self.explain.iter().flat_map(|set| set.iter())
    }

    /// Lower the stamp to `b` if it is above.
    pub(crate) fn cap_branch(&mut self, b: u32) {
        if self.branch > b {
            self.branch = b;
        }
    }
}

impl PartialEq for DependencySet {
    fn eq(&self, other: &Self) -> bool {
        self.depends == other.depends
            && self.branch == other.branch
            && self.axioms().eq(other.axioms())
    }
}

impl fmt::Debug for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DS{self}@{}", self.branch)
    }
}

impl fmt::Display for DependencySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, b) in self.depends.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{b}")?;
        }
        f.write_str("}")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::Concept;
    use crate::types::Name;

    #[test]
    fn independent_set_is_empty() {
        let ds = DependencySet::independent();
        assert_eq!(ds.max(), 0);
        assert!(ds.is_independent());
        assert_eq!(ds.size(), 0);
    }

    #[test]
    fn union_collects_branches_and_keeps_operands() {
        let a = DependencySet::for_branch(2);
        let b = DependencySet::for_branch(5);
        let u = a.union(&b);

        assert_eq!(u.branches().collect::<Vec<_>>(), vec![2, 5]);
        assert_eq!(u.max(), 5);
        assert_eq!(u.branch(), 5);
        assert_eq!(a.branches().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn without_drops_one_branch() {
        let ds = DependencySet::for_branch(1).union(&DependencySet::for_branch(3));
        let trimmed = ds.without(3);
        assert_eq!(trimmed.max(), 1);
        assert!(ds.contains(3));
    }

    #[test]
    fn axioms_accumulate_through_union() {
        let first = Axiom::ClassAssertion {
            individual: Name::new("x"),
            class: Concept::atom("A"),
        };
        let second = Axiom::ClassAssertion {
            individual: Name::new("x"),
            class: Concept::atom("B"),
        };
        let u = DependencySet::from_axiom(first.clone()).union(&DependencySet::from_axiom(second));
        assert_eq!(u.axioms().count(), 2);
        assert!(u.axioms().any(|a| a == &first));
        assert!(u.is_independent());
    }

    #[test]
    fn cap_branch_only_lowers() {
        let mut ds = DependencySet::for_branch(4);
        ds.cap_branch(6);
        assert_eq!(ds.branch(), 4);
        ds.cap_branch(2);
        assert_eq!(ds.branch(), 2);
    }
}
