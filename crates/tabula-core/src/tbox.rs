//! # Unfolding Map
//!
//! Lazy unfolding of class axioms. A label entry `A` pulls in every `C` with
//! `A ⊑ C`; `¬A` pulls in `¬C` for every `A ≡ C`. Inclusions whose left side
//! is not a named class are internalized as `⊤ ⊑ ¬C ⊔ D` and unfolded from
//! `⊤`, which every individual carries.

use crate::axiom::Axiom;
use crate::concept::Concept;
use crate::types::Name;
use std::collections::BTreeMap;

/// One unfolding step: the concept to add and the axiom behind it.
pub type Unfolding = (Concept, Axiom);

/// The unfolding map.
#[derive(Debug, Clone, Default)]
pub struct Tbox {
    positive: BTreeMap<Name, Vec<Unfolding>>,
    negative: BTreeMap<Name, Vec<Unfolding>>,
    universal: Vec<Unfolding>,
}

impl Tbox {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `sub ⊑ sup`. Both sides must be normalized.
    pub fn add_subclass(&mut self, sub: &Concept, sup: Concept, axiom: Axiom) {
        match sub {
            Concept::Top => self.universal.push((sup, axiom)),
            Concept::Atom(name) => {
                self.positive
                    .entry(name.clone())
                    .or_default()
                    .push((sup, axiom));
            }
            other => {
                let gci = Concept::and([other.clone(), sup.negate()]).normalize().negate();
                if gci != Concept::Top {
                    self.universal.push((gci, axiom));
                }
            }
        }
    }

    /// Register `class ≡ definition`. The definition must be normalized.
    pub fn add_equivalence(&mut self, class: &Name, definition: Concept, axiom: Axiom) {
        self.negative
            .entry(class.clone())
            .or_default()
            .push((definition.negate(), axiom.clone()));
        self.positive
            .entry(class.clone())
            .or_default()
            .push((definition, axiom));
    }

    /// Register `first ⊓ second ⊑ ⊥`.
    pub fn add_disjoint(&mut self, first: &Concept, second: &Concept, axiom: Axiom) {
        match (first, second) {
            (Concept::Atom(_), _) => self.add_subclass(first, second.negate(), axiom),
            (_, Concept::Atom(_)) => self.add_subclass(second, first.negate(), axiom),
            _ => self.add_subclass(first, second.negate(), axiom),
        }
    }

    /// What `c` unfolds to.
    #[must_use]
    pub fn unfold(&self, c: &Concept) -> &[Unfolding] {
        let found = match c {
            Concept::Top => Some(&self.universal),
            Concept::Atom(name) => self.positive.get(name),
            Concept::Not(inner) => match inner.as_ref() {
                Concept::Atom(name) => self.negative.get(name),
                _ => None,
            },
            _ => None,
        };
        found.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether any internalized inclusion exists.
    #[must_use]
    pub fn has_gcis(&self) -> bool {
        !self.universal.is_empty()
    }

    /// Every concept the map can produce.
    pub fn concepts(&self) -> impl Iterator<Item = &Concept> {
        self.positive
            .values()
            .chain(self.negative.values())
            .flatten()
            .chain(self.universal.iter())
            .map(|(c, _)| c)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sub_axiom(sub: &Concept, sup: &Concept) -> Axiom {
        Axiom::SubClassOf {
            sub: sub.clone(),
            sup: sup.clone(),
        }
    }

    #[test]
    fn atomic_inclusion_unfolds_positively() {
        let a = Concept::atom("A");
        let b = Concept::atom("B");
        let mut tbox = Tbox::new();
        tbox.add_subclass(&a, b.clone(), sub_axiom(&a, &b));

        assert_eq!(tbox.unfold(&a).len(), 1);
        assert_eq!(tbox.unfold(&a)[0].0, b);
        assert!(tbox.unfold(&a.negate()).is_empty());
        assert!(!tbox.has_gcis());
    }

    #[test]
    fn equivalence_unfolds_negation() {
        let c = Name::new("C");
        let definition = Concept::and([Concept::atom("A"), Concept::atom("B")]).normalize();
        let axiom = Axiom::EquivalentClasses {
            class: c.clone(),
            definition: definition.clone(),
        };
        let mut tbox = Tbox::new();
        tbox.add_equivalence(&c, definition.clone(), axiom);

        let negated = tbox.unfold(&Concept::atom("C").negate());
        assert_eq!(negated.len(), 1);
        assert_eq!(negated[0].0, definition.negate());
    }

    #[test]
    fn complex_inclusion_is_internalized() {
        let lhs = Concept::exists("r", Concept::atom("A")).normalize();
        let rhs = Concept::atom("B");
        let mut tbox = Tbox::new();
        tbox.add_subclass(&lhs, rhs.clone(), sub_axiom(&lhs, &rhs));

        assert!(tbox.has_gcis());
        let universal = tbox.unfold(&Concept::Top);
        assert_eq!(universal.len(), 1);
        let disjuncts = universal[0].0.disjuncts().expect("disjunction");
        assert!(disjuncts.contains(&rhs));
        assert!(disjuncts.contains(&lhs.negate()));
    }

    #[test]
    fn disjointness_prefers_named_side() {
        let a = Concept::atom("A");
        let b = Concept::atom("B");
        let axiom = Axiom::DisjointClasses {
            first: a.clone(),
            second: b.clone(),
        };
        let mut tbox = Tbox::new();
        tbox.add_disjoint(&a, &b, axiom);

        assert_eq!(tbox.unfold(&a)[0].0, b.negate());
    }
}
