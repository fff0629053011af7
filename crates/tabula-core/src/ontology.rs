//! # Ontology
//!
//! The compiled, immutable view of a knowledge base that every completion
//! graph shares through an `Arc`: the unfolding map, the role box, the
//! datatype reasoner, ground rules, the expressivity summary and the
//! configuration.
//!
//! Compilation canonicalizes role names (so `inv(r)` becomes the declared
//! inverse of `r`, if there is one) and normalizes every concept.

use crate::axiom::{Axiom, RuleAtom};
use crate::concept::Concept;
use crate::config::ReasonerConfig;
use crate::datatype::{BuiltinDatatypes, DatatypeReasoner};
use crate::expressivity::Expressivity;
use crate::rbox::RoleBox;
use crate::tbox::Tbox;
use crate::types::{Name, ReasonerError, Role};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A ground rule: if every body atom holds, every head atom holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundRule {
    /// Conditions.
    pub body: Vec<RuleAtom>,
    /// Conclusions.
    pub head: Vec<RuleAtom>,
    /// The axiom the rule came from.
    pub axiom: Axiom,
}

/// The compiled knowledge base.
#[derive(Debug)]
pub struct Ontology {
    config: ReasonerConfig,
    tbox: Tbox,
    rbox: RoleBox,
    datatypes: Arc<dyn DatatypeReasoner>,
    expressivity: Expressivity,
    rules: Vec<GroundRule>,
    individuals: BTreeSet<Name>,
    assertions: Vec<Axiom>,
}

/// Roles used in a concept, with whether they are restricted to datatypes.
fn concept_roles(c: &Concept, out: &mut Vec<(Role, bool)>) {
    c.visit(&mut |sub| match sub {
        Concept::Exists(role, filler)
        | Concept::All(role, filler)
        | Concept::Min(role, _, filler)
        | Concept::Max(role, _, filler) => {
            out.push((role.clone(), matches!(filler.as_ref(), Concept::Datatype(_))));
        }
        _ => {}
    });
}

fn concept_nominals(c: &Concept, out: &mut BTreeSet<Name>) {
    c.visit(&mut |sub| match sub {
        Concept::Value(name) => {
            out.insert(name.clone());
        }
        Concept::OneOf(names) => out.extend(names.iter().cloned()),
        _ => {}
    });
}

/// Every concept mentioned by an axiom.
fn axiom_concepts(axiom: &Axiom) -> Vec<&Concept> {
    match axiom {
        Axiom::SubClassOf { sub, sup } => vec![sub, sup],
        Axiom::EquivalentClasses { definition, .. } => vec![definition],
        Axiom::DisjointClasses { first, second } => vec![first, second],
        Axiom::Domain { class, .. } | Axiom::Range { class, .. } => vec![class],
        Axiom::ClassAssertion { class, .. } => vec![class],
        Axiom::Rule { body, head } => body.iter().chain(head).map(|atom| &atom.class).collect(),
        _ => Vec::new(),
    }
}

impl Ontology {
    /// Compile axioms with the built-in datatype reasoner.
    pub fn compile(axioms: &[Axiom], config: ReasonerConfig) -> Result<Self, ReasonerError> {
        Self::compile_with(axioms, config, None)
    }

    /// Compile axioms, optionally with a custom datatype reasoner.
    ///
    /// Enumerated-datatype axioms only extend the built-in reasoner.
    pub fn compile_with(
        axioms: &[Axiom],
        config: ReasonerConfig,
        datatypes: Option<Arc<dyn DatatypeReasoner>>,
    ) -> Result<Self, ReasonerError> {
        config.validate()?;

        let mut expressivity = Expressivity::default();
        let mut rbox = RoleBox::new();
        let mut builtin = BuiltinDatatypes::new();
        let mut individuals = BTreeSet::new();
        let mut used_roles = Vec::new();

        for axiom in axioms {
            if let Axiom::InverseRoles { role, inverse } = axiom {
                rbox.add_inverse(role, inverse);
            }
        }

        for axiom in axioms {
            for c in axiom_concepts(axiom) {
                expressivity.add_concept(c);
                concept_roles(c, &mut used_roles);
                concept_nominals(c, &mut individuals);
            }
            match axiom {
                Axiom::SubRoleOf { sub, sup } => rbox.add_sub_role(sub, sup),
                Axiom::FunctionalRole { role } => rbox.set_functional(role),
                Axiom::InverseFunctionalRole { role } => rbox.set_inverse_functional(role),
                Axiom::TransitiveRole { role } => rbox.set_transitive(role),
                Axiom::DataRole { role } => rbox.set_datatype_role(role),
                Axiom::Domain { role, class } => rbox.add_domain(role, class.clone(), axiom.clone()),
                Axiom::Range { role, class } => {
                    if matches!(class, Concept::Datatype(_)) {
                        rbox.set_datatype_role(role);
                    }
                    rbox.add_range(role, class.clone(), axiom.clone());
                }
                Axiom::EnumeratedDatatype { datatype, values } => {
                    builtin.add_enumeration(datatype.clone(), values.iter().cloned());
                }
                Axiom::Individual { name } | Axiom::ClassAssertion { individual: name, .. } => {
                    individuals.insert(name.clone());
                }
                Axiom::RoleAssertion {
                    subject,
                    role,
                    object,
                } => {
                    rbox.declare(role);
                    individuals.insert(subject.clone());
                    individuals.insert(object.clone());
                }
                Axiom::DataAssertion { subject, role, .. } => {
                    rbox.set_datatype_role(role);
                    individuals.insert(subject.clone());
                }
                Axiom::DifferentIndividuals { first, second }
                | Axiom::SameIndividual { first, second } => {
                    individuals.insert(first.clone());
                    individuals.insert(second.clone());
                }
                Axiom::Rule { body, head } => {
                    expressivity.has_rules = true;
                    for atom in body.iter().chain(head) {
                        individuals.insert(atom.individual.clone());
                    }
                }
                Axiom::SubClassOf { .. }
                | Axiom::EquivalentClasses { .. }
                | Axiom::DisjointClasses { .. }
                | Axiom::InverseRoles { .. } => {}
            }
        }

        for (role, datatype) in &used_roles {
            if *datatype {
                rbox.set_datatype_role(role);
            } else {
                rbox.declare(role);
            }
        }
        rbox.prepare();
        rbox.normalize_classes();

        let canonical = {
            let rbox = &rbox;
            move |c: &Concept| c.map_roles(&|r| rbox.canonical(r)).normalize()
        };
        let mut tbox = Tbox::new();
        let mut assertions = Vec::new();
        let mut rules = Vec::new();

        for axiom in axioms {
            match axiom {
                Axiom::SubClassOf { sub, sup } => {
                    tbox.add_subclass(&canonical(sub), canonical(sup), axiom.clone());
                }
                Axiom::EquivalentClasses { class, definition } => {
                    tbox.add_equivalence(class, canonical(definition), axiom.clone());
                }
                Axiom::DisjointClasses { first, second } => {
                    tbox.add_disjoint(&canonical(first), &canonical(second), axiom.clone());
                }
                Axiom::ClassAssertion { individual, class } => {
                    assertions.push(Axiom::ClassAssertion {
                        individual: individual.clone(),
                        class: canonical(class),
                    });
                }
                Axiom::RoleAssertion {
                    subject,
                    role,
                    object,
                } => assertions.push(Axiom::RoleAssertion {
                    subject: subject.clone(),
                    role: rbox.canonical(role),
                    object: object.clone(),
                }),
                Axiom::Rule { body, head } => {
                    let canon_atoms = |atoms: &[RuleAtom]| -> Vec<RuleAtom> {
                        atoms
                            .iter()
                            .map(|a| RuleAtom::new(a.individual.clone(), canonical(&a.class)))
                            .collect()
                    };
                    rules.push(GroundRule {
                        body: canon_atoms(body),
                        head: canon_atoms(head),
                        axiom: axiom.clone(),
                    });
                }
                other if other.is_assertion() => assertions.push(other.clone()),
                _ => {}
            }
        }

        expressivity.add_roles(&rbox);
        expressivity.has_gcis = tbox.has_gcis();
        expressivity.has_negation |= tbox.has_gcis();

        let datatypes = datatypes.unwrap_or_else(|| Arc::new(builtin));

        Ok(Self {
            config,
            tbox,
            rbox,
            datatypes,
            expressivity,
            rules,
            individuals,
            assertions,
        })
    }

    /// Reasoner options.
    #[must_use]
    pub fn config(&self) -> &ReasonerConfig {
        &self.config
    }

    /// The unfolding map.
    #[must_use]
    pub fn tbox(&self) -> &Tbox {
        &self.tbox
    }

    /// The role box.
    #[must_use]
    pub fn rbox(&self) -> &RoleBox {
        &self.rbox
    }

    /// The datatype reasoner.
    #[must_use]
    pub fn datatypes(&self) -> &dyn DatatypeReasoner {
        self.datatypes.as_ref()
    }

    /// Constructors in use.
    #[must_use]
    pub fn expressivity(&self) -> &Expressivity {
        &self.expressivity
    }

    /// Ground rule bindings.
    #[must_use]
    pub fn rules(&self) -> &[GroundRule] {
        &self.rules
    }

    /// Every named individual, including nominals.
    #[must_use]
    pub fn individuals(&self) -> &BTreeSet<Name> {
        &self.individuals
    }

    /// Canonicalized assertions, in input order.
    #[must_use]
    pub fn assertions(&self) -> &[Axiom] {
        &self.assertions
    }

    /// Canonicalize roles and normalize a query concept.
    #[must_use]
    pub fn prepare_concept(&self, c: &Concept) -> Concept {
        c.map_roles(&|r| self.rbox.canonical(r)).normalize()
    }
}

// =============================================================================
// TESTS
// =============================================================================
