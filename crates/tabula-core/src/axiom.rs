//! # Axioms
//!
//! The statements a knowledge base is made of. Axioms are the input format of
//! `KnowledgeBase` and, in explanation mode, the payload of dependency sets:
//! every derived fact remembers which axioms it came from.

use crate::concept::Concept;
use crate::types::{LiteralValue, Name, Role};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One class membership inside a ground rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleAtom {
    /// The bound individual.
    pub individual: Name,
    /// The class it must (body) or will (head) belong to.
    pub class: Concept,
}

impl RuleAtom {
    /// Create a new rule atom.
    #[must_use]
    pub fn new(individual: impl Into<Name>, class: Concept) -> Self {
        Self {
            individual: individual.into(),
            class,
        }
    }
}

impl fmt::Display for RuleAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.class, self.individual)
    }
}

/// A knowledge-base axiom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "axiom", rename_all = "snake_case")]
pub enum Axiom {
    /// `sub ⊑ sup`
    SubClassOf { sub: Concept, sup: Concept },
    /// `class ≡ definition`
    EquivalentClasses { class: Name, definition: Concept },
    /// `first ⊓ second ⊑ ⊥`
    DisjointClasses { first: Concept, second: Concept },
    /// `sub ⊑ sup` over roles.
    SubRoleOf { sub: Role, sup: Role },
    /// `inverse ≡ role⁻`
    InverseRoles { role: Role, inverse: Role },
    /// `⊤ ⊑ ≤1 role`
    FunctionalRole { role: Role },
    /// `⊤ ⊑ ≤1 role⁻`
    InverseFunctionalRole { role: Role },
    /// `role ∘ role ⊑ role`
    TransitiveRole { role: Role },
    /// Declares `role` as a data role.
    DataRole { role: Role },
    /// `∃role.⊤ ⊑ class`
    Domain { role: Role, class: Concept },
    /// `⊤ ⊑ ∀role.class`
    Range { role: Role, class: Concept },
    /// A datatype whose value space is exactly `values`.
    EnumeratedDatatype {
        datatype: Name,
        values: Vec<LiteralValue>,
    },
    /// Declares a named individual.
    Individual { name: Name },
    /// `individual : class`
    ClassAssertion { individual: Name, class: Concept },
    /// `(subject, object) : role`
    RoleAssertion {
        subject: Name,
        role: Role,
        object: Name,
    },
    /// `(subject, value) : role` for a data role.
    DataAssertion {
        subject: Name,
        role: Role,
        value: LiteralValue,
    },
    /// `first ≠ second`
    DifferentIndividuals { first: Name, second: Name },
    /// `first = second`
    SameIndividual { first: Name, second: Name },
    /// A rule binding: if every body atom holds, every head atom holds.
    Rule {
        body: Vec<RuleAtom>,
        head: Vec<RuleAtom>,
    },
}

impl Axiom {
    /// Whether this axiom states a fact about named individuals.
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        matches!(
            self,
            Self::Individual { .. }
                | Self::ClassAssertion { .. }
                | Self::RoleAssertion { .. }
                | Self::DataAssertion { .. }
                | Self::DifferentIndividuals { .. }
                | Self::SameIndividual { .. }
        )
    }
}

fn write_atoms(f: &mut fmt::Formatter<'_>, atoms: &[RuleAtom]) -> fmt::Result {
    for (i, atom) in atoms.iter().enumerate() {
        if i > 0 {
            f.write_str(" ∧ ")?;
        }
        write!(f, "{atom}")?;
    }
    Ok(())
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubClassOf { sub, sup } => write!(f, "{sub} ⊑ {sup}"),
            Self::EquivalentClasses { class, definition } => write!(f, "{class} ≡ {definition}"),
            Self::DisjointClasses { first, second } => write!(f, "disjoint({first}, {second})"),
            Self::SubRoleOf { sub, sup } => write!(f, "{sub} ⊑ {sup}"),
            Self::InverseRoles { role, inverse } => write!(f, "{inverse} ≡ {role}⁻"),
            Self::FunctionalRole { role } => write!(f, "functional({role})"),
            Self::InverseFunctionalRole { role } => write!(f, "inverseFunctional({role})"),
            Self::TransitiveRole { role } => write!(f, "transitive({role})"),
            Self::DataRole { role } => write!(f, "dataRole({role})"),
            Self::Domain { role, class } => write!(f, "domain({role}) = {class}"),
            Self::Range { role, class } => write!(f, "range({role}) = {class}"),
            Self::EnumeratedDatatype { datatype, values } => {
                write!(f, "{datatype} ≡ {{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{value}")?;
                }
                f.write_str("}")
            }
            Self::Individual { name } => write!(f, "individual({name})"),
            Self::ClassAssertion { individual, class } => write!(f, "{individual} : {class}"),
            Self::RoleAssertion {
                subject,
                role,
                object,
            } => write!(f, "({subject}, {object}) : {role}"),
            Self::DataAssertion {
                subject,
                role,
                value,
            } => write!(f, "({subject}, {value}) : {role}"),
            Self::DifferentIndividuals { first, second } => write!(f, "{first} ≠ {second}"),
            Self::SameIndividual { first, second } => write!(f, "{first} = {second}"),
            Self::Rule { body, head } => {
                write_atoms(f, body)?;
                f.write_str(" → ")?;
                write_atoms(f, head)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assertions_are_classified() {
        let assertion = Axiom::ClassAssertion {
            individual: Name::new("x"),
            class: Concept::atom("A"),
        };
        let tbox = Axiom::SubClassOf {
            sub: Concept::atom("A"),
            sup: Concept::atom("B"),
        };
        assert!(assertion.is_assertion());
        assert!(!tbox.is_assertion());
    }

    #[test]
    fn rule_display_lists_body_and_head() {
        let rule = Axiom::Rule {
            body: vec![RuleAtom::new("x", Concept::atom("A"))],
            head: vec![RuleAtom::new("y", Concept::atom("B"))],
        };
        assert_eq!(rule.to_string(), "A(x) → B(y)");
    }
}
