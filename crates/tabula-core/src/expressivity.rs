//! # Expressivity
//!
//! A summary of the constructors a knowledge base uses. The reasoner reads it
//! to pick a blocking strategy and to switch whole rule families on or off.

use crate::concept::Concept;
use crate::rbox::RoleBox;
use serde::{Deserialize, Serialize};

/// Which blocking condition to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingKind {
    /// `L(x) ⊆ L(y)`. Sound without inverse roles.
    Subset,
    /// `L(x) = L(y)`. Sound with inverses but without number restrictions.
    Equality,
    /// Equal labels for the node, its blocker and both parents, and equal
    /// parent edges. Needed with inverses and number restrictions.
    Pairwise,
}

/// Constructors used by a knowledge base.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expressivity {
    /// `¬C` on a non-atomic `C`, or a general inclusion.
    pub has_negation: bool,
    /// `C ⊔ D`
    pub has_disjunction: bool,
    /// `∃r.C`
    pub has_some_values: bool,
    /// `∀r.C`
    pub has_all_values: bool,
    /// `≥n r.C` / `≤n r.C`
    pub has_cardinality: bool,
    /// Functional or inverse-functional roles.
    pub has_functionality: bool,
    /// Inverse roles.
    pub has_inverse: bool,
    /// Transitive roles.
    pub has_transitivity: bool,
    /// Sub-role axioms.
    pub has_role_hierarchy: bool,
    /// `{a}`
    pub has_nominal: bool,
    /// Data roles or datatype restrictions.
    pub has_datatype: bool,
    /// Internalized general inclusions.
    pub has_gcis: bool,
    /// Ground rule bindings.
    pub has_rules: bool,
}

impl Expressivity {
    /// Record the constructors of one concept.
    pub fn add_concept(&mut self, c: &Concept) {
        c.visit(&mut |sub| match sub {
            Concept::Not(inner) => match inner.as_ref() {
                Concept::And(_) => self.has_disjunction = true,
                Concept::All(..) => self.has_some_values = true,
                Concept::Min(..) => self.has_cardinality = true,
                Concept::Atom(_) | Concept::Datatype(_) | Concept::Value(_) => {}
                _ => self.has_negation = true,
            },
            Concept::Or(_) => self.has_disjunction = true,
            Concept::Exists(role, _) | Concept::All(role, _) => {
                if role.is_synthetic_inverse() {
                    self.has_inverse = true;
                }
                if matches!(sub, Concept::All(..)) {
                    self.has_all_values = true;
                } else {
                    self.has_some_values = true;
                }
            }
            Concept::Min(role, ..) | Concept::Max(role, ..) => {
                self.has_cardinality = true;
                if role.is_synthetic_inverse() {
                    self.has_inverse = true;
                }
            }
            Concept::Value(_) | Concept::OneOf(_) => self.has_nominal = true,
            Concept::Datatype(_) => self.has_datatype = true,
            Concept::Top | Concept::Bottom | Concept::Atom(_) | Concept::And(_) => {}
        });
    }

    /// Record role-level constructors.
    pub fn add_roles(&mut self, rbox: &RoleBox) {
        self.has_inverse |= rbox.has_declared_inverses();
        self.has_functionality |= rbox.has_functional();
        self.has_transitivity |= rbox.has_transitive();
        self.has_role_hierarchy |= rbox.has_hierarchy();
        self.has_datatype |= rbox.has_datatype_roles();
    }

    /// The blocking condition that is sound for this expressivity.
    #[must_use]
    pub fn blocking(&self) -> BlockingKind {
        if self.has_inverse && (self.has_cardinality || self.has_functionality) {
            BlockingKind::Pairwise
        } else if self.has_inverse {
            BlockingKind::Equality
        } else {
            BlockingKind::Subset
        }
    }

    /// Whether the nominal guess rule can ever fire.
    #[must_use]
    pub fn needs_guess_rule(&self) -> bool {
        self.has_nominal && self.has_inverse && (self.has_cardinality || self.has_functionality)
    }

    /// A conventional DL name, e.g. `SHOIN(D)`.
    #[must_use]
    pub fn dl_name(&self) -> String {
        let complement = self.has_negation || self.has_disjunction || self.has_gcis;
        let mut name = String::from(match (complement, self.has_transitivity) {
            (_, true) => "S",
            (true, false) => "ALC",
            (false, false) => "AL",
        });
        if !complement && self.has_some_values {
            name.push('E');
        }
        if self.has_role_hierarchy {
            name.push('H');
        }
        if self.has_nominal {
            name.push('O');
        }
        if self.has_inverse {
            name.push('I');
        }
        if self.has_cardinality {
            name.push('Q');
        } else if self.has_functionality {
            name.push('F');
        }
        if self.has_datatype {
            name.push_str("(D)");
        }
        name
    }
}
