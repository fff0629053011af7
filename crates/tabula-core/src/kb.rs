//! # Knowledge Base
//!
//! The query surface. A `KnowledgeBase` owns the compiled ontology and the
//! base ABox built from its assertions. Every query runs a completion on a
//! graph derived from the base (or on a fresh graph for plain concept
//! satisfiability); only the satisfiability cache, the pseudo model, the
//! last clash and the statistics are written back.
//!
//! | Query | Reduction |
//! |---|---|
//! | `is_consistent` | complete the base ABox |
//! | `is_satisfiable(C)` | complete a fresh root typed `C` |
//! | `is_sub_class_of(C, D)` | `C ⊓ ¬D` unsatisfiable |
//! | `is_type(a, C)` | base plus `a : ¬C` inconsistent |
//! | `is_same_as(a, b)` | base plus `a ≠ b` inconsistent |
//! | `is_different_from(a, b)` | base plus `a = b` inconsistent |
//!
//! Cheap answers come first: syntactic shortcuts, cache lookups, `mergable`
//! on cached models, and labels of the pseudo model (the completed base).

use crate::abox::{Abox, Stats};
use crate::axiom::Axiom;
use crate::cache::{Bool3, CachedIndividual, CachedNode, mergable};
use crate::clash::Clash;
use crate::concept::Concept;
use crate::config::ReasonerConfig;
use crate::datatype::DatatypeReasoner;
use crate::depset::DependencySet;
use crate::expressivity::Expressivity;
use crate::graph::Node;
use crate::ontology::Ontology;
use crate::strategy::CompletionStrategy;
use crate::types::{Name, ReasonerError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// =============================================================================
// EXPLANATIONS
// =============================================================================

/// Why the last failing check failed: the clash and the axioms it rests on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Rendered clash.
    pub clash: String,
    /// Axioms in the clash's dependency set, in order.
    pub axioms: Vec<Axiom>,
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.clash)?;
        if self.axioms.is_empty() {
            return f.write_str("  (no axioms recorded)");
        }
        for (i, axiom) in self.axioms.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  {axiom}")?;
        }
        Ok(())
    }
}

/// Individuals split by how much work deciding them takes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstanceCandidates {
    /// Known instances from the pseudo model.
    pub obvious: Vec<Name>,
    /// Individuals that need a tableau run.
    pub candidates: Vec<Name>,
}

// =============================================================================
// KNOWLEDGE BASE
// =============================================================================

/// A reasoner over one compiled ontology.
#[derive(Debug)]
pub struct KnowledgeBase {
    ontology: Arc<Ontology>,
    base: Abox,
    disjunct_clashes: BTreeMap<Concept, u64>,
    consistent: Option<bool>,
    pseudo_model: Option<Abox>,
    last_completion: Option<Abox>,
    last_clash: Option<Clash>,
    stats: Stats,
}

impl KnowledgeBase {
    /// Compile `axioms` and build the base ABox.
    pub fn new(axioms: &[Axiom], config: ReasonerConfig) -> Result<Self, ReasonerError> {
        Self::from_ontology(Ontology::compile(axioms, config)?)
    }

    /// Like `new`, with a custom datatype reasoner.
    pub fn with_datatypes(
        axioms: &[Axiom],
        config: ReasonerConfig,
        datatypes: Arc<dyn DatatypeReasoner>,
    ) -> Result<Self, ReasonerError> {
        Self::from_ontology(Ontology::compile_with(axioms, config, Some(datatypes))?)
    }

    /// Build the base ABox of an already compiled ontology.
    pub fn from_ontology(ontology: Ontology) -> Result<Self, ReasonerError> {
        let ontology = Arc::new(ontology);
        let base = Abox::from_ontology(Arc::clone(&ontology))?;
        debug!(
            individuals = base.individuals().len(),
            dl = %ontology.expressivity().dl_name(),
            "knowledge base ready"
        );
        Ok(Self {
            ontology,
            base,
            disjunct_clashes: BTreeMap::new(),
            consistent: None,
            pseudo_model: None,
            last_completion: None,
            last_clash: None,
            stats: Stats::default(),
        })
    }

    /// The compiled ontology.
    #[must_use]
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// Constructors in use.
    #[must_use]
    pub fn expressivity(&self) -> &Expressivity {
        self.ontology.expressivity()
    }

    /// Counters of the last query.
    #[must_use]
    pub fn last_stats(&self) -> Stats {
        self.stats
    }

    /// The clash that ended the last failing completion, if the last
    /// completion failed.
    #[must_use]
    pub fn last_clash(&self) -> Option<&Clash> {
        self.last_clash.as_ref()
    }

    /// The graph of the last completion, complete or not.
    #[must_use]
    pub fn last_completion(&self) -> Option<&Abox> {
        self.last_completion.as_ref()
    }

    /// Node standing for `name` in the last completed graph.
    pub fn completion_representative(&self, name: &Name) -> Result<Option<&Node>, ReasonerError> {
        let Some(abox) = &self.last_completion else {
            return Ok(None);
        };
        if abox.individual(name).is_none() {
            return Ok(None);
        }
        let id = abox.representative(name)?;
        abox.node(id).map(Some)
    }

    /// The clash of the last failing check and the axioms behind it.
    ///
    /// `None` unless `explain` was enabled and the last completion failed.
    #[must_use]
    pub fn explanation(&self) -> Option<Explanation> {
        if !self.ontology.config().explain {
            return None;
        }
        let clash = self.last_clash.as_ref()?;
        Some(Explanation {
            clash: clash.to_string(),
            axioms: clash.ds.axioms().cloned().collect(),
        })
    }
}

// =============================================================================
// RUNNING COMPLETIONS
// =============================================================================

impl KnowledgeBase {
    fn begin_query(&mut self) {
        self.stats = Stats::default();
    }

    fn use_cache(&self) -> bool {
        let config = self.ontology.config();
        config.use_cache && !config.explain
    }

    /// Whether satisfiability depends on the assertions.
    fn needs_base(&self) -> bool {
        let expressivity = self.ontology.expressivity();
        expressivity.has_nominal || expressivity.has_rules
    }

    /// Complete `abox`, keep it as the last completion and fold its
    /// counters into the query's.
    fn complete(&mut self, mut abox: Abox, query: &str) -> Result<bool, ReasonerError> {
        abox.set_disjunct_clashes(std::mem::take(&mut self.disjunct_clashes));
        let result = CompletionStrategy::new(&mut abox).complete();
        self.disjunct_clashes = abox.disjunct_clashes().clone();
        self.stats.absorb(abox.stats());
        match result {
            Ok(consistent) => {
                self.last_clash = abox.clash().cloned();
                trace!(query, consistent, nodes = abox.len(), "completion done");
                self.last_completion = Some(abox);
                Ok(consistent)
            }
            Err(ReasonerError::Timeout(ms)) => {
                warn!(query, timeout_ms = ms, "query timed out");
                self.last_completion = Some(abox);
                Err(ReasonerError::Timeout(ms))
            }
            Err(e) => Err(e),
        }
    }

    fn consistent(&mut self) -> Result<bool, ReasonerError> {
        if let Some(consistent) = self.consistent {
            return Ok(consistent);
        }
        let abox = self.base.derive();
        let consistent = self.complete(abox, "consistency")?;
        self.consistent = Some(consistent);
        self.pseudo_model = if consistent {
            self.last_completion.clone()
        } else {
            None
        };
        debug!(consistent, "consistency checked");
        Ok(consistent)
    }

    fn ensure_consistent(&mut self) -> Result<(), ReasonerError> {
        if self.consistent()? {
            Ok(())
        } else {
            Err(ReasonerError::InconsistentOntology)
        }
    }

    /// Canonicalize and normalize a query concept.
    fn prepare(&self, c: &Concept) -> Result<Concept, ReasonerError> {
        if let Concept::Datatype(name) = c {
            return Err(ReasonerError::InvalidConcept(format!(
                "datatype {name} is not a class"
            )));
        }
        Ok(self.ontology.prepare_concept(c))
    }

    fn satisfiable(&mut self, c: &Concept) -> Result<bool, ReasonerError> {
        self.ensure_consistent()?;
        if *c == Concept::Bottom {
            return Ok(false);
        }
        let use_cache = self.use_cache();
        if use_cache {
            if let Some(cached) = self.base.cache_mut().get(c) {
                let satisfiable = !cached.is_bottom();
                self.stats.cache_hits = self.stats.cache_hits.saturating_add(1);
                trace!(concept = %c, satisfiable, "cache hit");
                return Ok(satisfiable);
            }
            self.stats.cache_misses = self.stats.cache_misses.saturating_add(1);
        }

        let mut abox = if self.needs_base() {
            self.base.derive()
        } else {
            Abox::new(Arc::clone(&self.ontology))
        };
        let root = abox.add_root(DependencySet::independent())?;
        abox.add_type(root, c, DependencySet::independent())?;
        let satisfiable = self.complete(abox, "satisfiability")?;

        if use_cache && self.base.cache().peek(c).is_none() {
            if satisfiable {
                let entry = match (&self.last_completion, self.needs_base()) {
                    (Some(done), false) => CachedNode::model(
                        CachedIndividual::from_abox(done, root, true)?,
                        DependencySet::independent(),
                    ),
                    _ => CachedNode::dummy(),
                };
                self.base.cache_mut().put_sat(c.clone(), entry)?;
            } else {
                let ds = self
                    .last_clash
                    .as_ref()
                    .map(|clash| clash.ds.clone())
                    .unwrap_or_default();
                self.base.cache_mut().put_unsat(c.clone(), ds)?;
            }
        }
        debug!(concept = %c, satisfiable, "satisfiability checked");
        Ok(satisfiable)
    }

    /// Three-valued `a : C` from the pseudo model alone.
    fn known(&mut self, individual: &Name, c: &Concept) -> Result<Bool3, ReasonerError> {
        self.ensure_consistent()?;
        if *c == Concept::Top {
            return Ok(Bool3::True);
        }
        let Some(model) = &self.pseudo_model else {
            return Ok(Bool3::Unknown);
        };
        let x = model.representative(individual)?;
        let label = model.node(x)?.label();
        if label.get(c).is_some_and(DependencySet::is_independent) {
            return Ok(Bool3::True);
        }
        // The pseudo model is a model: `¬C` there refutes entailment.
        if label.contains(&c.negate()) {
            return Ok(Bool3::False);
        }
        Ok(Bool3::Unknown)
    }

    fn has_type(&mut self, individual: &Name, c: &Concept) -> Result<bool, ReasonerError> {
        if let Some(known) = self.known(individual, c)?.known() {
            return Ok(known);
        }
        let mut abox = self.base.derive();
        let x = abox.representative(individual)?;
        abox.add_type(x, &c.negate(), DependencySet::independent())?;
        let is_type = !self.complete(abox, "type")?;
        debug!(individual = %individual, concept = %c, is_type, "type checked");
        Ok(is_type)
    }
}

// =============================================================================
// QUERIES
// =============================================================================

impl KnowledgeBase {
    /// Whether the ontology has a model.
    pub fn is_consistent(&mut self) -> Result<bool, ReasonerError> {
        self.begin_query();
        self.consistent()
    }

    /// Whether `c` has an instance in some model.
    pub fn is_satisfiable(&mut self, c: &Concept) -> Result<bool, ReasonerError> {
        self.begin_query();
        let c = self.prepare(c)?;
        self.satisfiable(&c)
    }

    /// Whether every instance of `sub` is an instance of `sup`.
    pub fn is_sub_class_of(&mut self, sub: &Concept, sup: &Concept) -> Result<bool, ReasonerError> {
        self.begin_query();
        let (sub, sup) = (self.prepare(sub)?, self.prepare(sup)?);
        self.subsumed(&sub, &sup)
    }

    fn subsumed(&mut self, sub: &Concept, sup: &Concept) -> Result<bool, ReasonerError> {
        self.ensure_consistent()?;
        if sub == sup || *sub == Concept::Bottom || *sup == Concept::Top {
            return Ok(true);
        }
        let not_sup = sup.negate();
        if self.use_cache() {
            if !self.satisfiable(sub)? || !self.satisfiable(&not_sup)? {
                return Ok(true);
            }
            let cache = self.base.cache();
            if let (Some(a), Some(b)) = (cache.peek(sub), cache.peek(&not_sup)) {
                match mergable(self.ontology.rbox(), a, b, true) {
                    Bool3::True => {
                        trace!(sub = %sub, sup = %sup, "cached models merge");
                        return Ok(false);
                    }
                    Bool3::False => {
                        trace!(sub = %sub, sup = %sup, "cached models clash");
                        return Ok(true);
                    }
                    Bool3::Unknown => {}
                }
            }
        }
        let test = Concept::and([sub.clone(), not_sup]).normalize();
        Ok(!self.satisfiable(&test)?)
    }

    /// Whether `a` and `b` have the same instances.
    pub fn is_equivalent_class(&mut self, a: &Concept, b: &Concept) -> Result<bool, ReasonerError> {
        self.begin_query();
        let (a, b) = (self.prepare(a)?, self.prepare(b)?);
        Ok(self.subsumed(&a, &b)? && self.subsumed(&b, &a)?)
    }

    /// Whether `individual` is an instance of `c` in every model.
    pub fn is_type(&mut self, individual: &Name, c: &Concept) -> Result<bool, ReasonerError> {
        self.begin_query();
        let c = self.prepare(c)?;
        self.has_type(individual, &c)
    }

    /// `a : C` without a tableau run: `Unknown` when the pseudo model does
    /// not settle it.
    pub fn known_type(&mut self, individual: &Name, c: &Concept) -> Result<Bool3, ReasonerError> {
        self.begin_query();
        let c = self.prepare(c)?;
        self.known(individual, &c)
    }

    /// Split the named individuals into known instances of `c` and
    /// candidates that need a tableau run. Known non-instances are dropped.
    pub fn instance_candidates(&mut self, c: &Concept) -> Result<InstanceCandidates, ReasonerError> {
        self.begin_query();
        let c = self.prepare(c)?;
        self.split_instances(&c)
    }

    fn split_instances(&mut self, c: &Concept) -> Result<InstanceCandidates, ReasonerError> {
        let names: Vec<Name> = self.ontology.individuals().iter().cloned().collect();
        let mut split = InstanceCandidates::default();
        for name in names {
            match self.known(&name, c)? {
                Bool3::True => split.obvious.push(name),
                Bool3::Unknown => split.candidates.push(name),
                Bool3::False => {}
            }
        }
        Ok(split)
    }

    /// Every named individual that is an instance of `c`, sorted.
    pub fn get_instances(&mut self, c: &Concept) -> Result<Vec<Name>, ReasonerError> {
        self.begin_query();
        let c = self.prepare(c)?;
        let InstanceCandidates {
            mut obvious,
            candidates,
        } = self.split_instances(&c)?;
        debug!(
            concept = %c,
            obvious = obvious.len(),
            candidates = candidates.len(),
            "instance retrieval"
        );
        for name in candidates {
            if self.has_type(&name, &c)? {
                obvious.push(name);
            }
        }
        obvious.sort();
        Ok(obvious)
    }

    /// Whether `a` and `b` denote the same element in every model.
    pub fn is_same_as(&mut self, a: &Name, b: &Name) -> Result<bool, ReasonerError> {
        self.begin_query();
        self.ensure_consistent()?;
        if let Some(model) = &self.pseudo_model {
            let node_of = |name: &Name| {
                model
                    .individual(name)
                    .ok_or_else(|| ReasonerError::UnknownIndividual(name.clone()))
            };
            let (x, x_ds) = model.find_with_ds(node_of(a)?)?;
            let (y, y_ds) = model.find_with_ds(node_of(b)?)?;
            if x == y && x_ds.is_independent() && y_ds.is_independent() {
                return Ok(true);
            }
        }
        let mut abox = self.base.derive();
        let (x, y) = (abox.representative(a)?, abox.representative(b)?);
        abox.set_different(x, y, DependencySet::independent())?;
        Ok(!self.complete(abox, "same-as")?)
    }

    /// Whether `a` and `b` denote different elements in every model.
    pub fn is_different_from(&mut self, a: &Name, b: &Name) -> Result<bool, ReasonerError> {
        self.begin_query();
        self.ensure_consistent()?;
        let mut abox = self.base.derive();
        let (x, y) = (abox.representative(a)?, abox.representative(b)?);
        if x == y {
            return Ok(false);
        }
        if abox.is_different(x, y)?.is_some_and(|ds| ds.is_independent()) {
            return Ok(true);
        }
        abox.merge_to(x, y, DependencySet::independent())?;
        Ok(!self.complete(abox, "different-from")?)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn kb(axioms: &[Axiom]) -> KnowledgeBase {
        KnowledgeBase::new(axioms, ReasonerConfig::default()).expect("kb")
    }

    fn sub(sub: Concept, sup: Concept) -> Axiom {
        Axiom::SubClassOf { sub, sup }
    }

    #[test]
    fn empty_ontology_is_consistent() {
        let mut kb = kb(&[]);
        assert!(kb.is_consistent().expect("consistency"));
        assert_eq!(kb.last_stats().tableau_runs, 1);
        assert!(kb.last_clash().is_none());
    }

    #[test]
    fn told_subsumption_is_found() {
        let mut kb = kb(&[sub(Concept::atom("A"), Concept::atom("B"))]);
        assert!(kb
            .is_sub_class_of(&Concept::atom("A"), &Concept::atom("B"))
            .expect("subsumption"));
        assert!(!kb
            .is_sub_class_of(&Concept::atom("B"), &Concept::atom("A"))
            .expect("subsumption"));
    }

    #[test]
    fn second_satisfiability_check_is_a_cache_hit() {
        let mut kb = kb(&[sub(Concept::atom("A"), Concept::exists("r", Concept::atom("B")))]);
        assert!(kb.is_satisfiable(&Concept::atom("A")).expect("sat"));
        assert_eq!(kb.last_stats().cache_misses, 1);
        assert!(kb.is_satisfiable(&Concept::atom("A")).expect("sat"));
        assert_eq!(kb.last_stats().cache_hits, 1);
        assert_eq!(kb.last_stats().tableau_runs, 0);
    }

    #[test]
    fn concept_queries_reject_an_inconsistent_abox() {
        let mut kb = kb(&[
            Axiom::ClassAssertion {
                individual: Name::new("a"),
                class: Concept::atom("A"),
            },
            Axiom::ClassAssertion {
                individual: Name::new("a"),
                class: Concept::not(Concept::atom("A")),
            },
        ]);
        let (c, d) = (Concept::atom("C"), Concept::atom("D"));
        assert!(matches!(kb.is_satisfiable(&c), Err(ReasonerError::InconsistentOntology)));
        assert!(matches!(kb.is_sub_class_of(&c, &d), Err(ReasonerError::InconsistentOntology)));
        assert!(matches!(kb.is_equivalent_class(&c, &c), Err(ReasonerError::InconsistentOntology)));
        assert!(!kb.is_consistent().expect("consistency"));
    }

    #[test]
    fn datatype_is_not_a_query_class() {
        let mut kb = kb(&[]);
        assert!(matches!(
            kb.is_satisfiable(&Concept::datatype("xsd:integer")),
            Err(ReasonerError::InvalidConcept(_))
        ));
    }

    #[test]
    fn type_of_unknown_individual_is_an_error() {
        let mut kb = kb(&[Axiom::Individual { name: Name::new("a") }]);
        assert!(matches!(
            kb.is_type(&Name::new("nobody"), &Concept::atom("A")),
            Err(ReasonerError::UnknownIndividual(_))
        ));
    }

    #[test]
    fn instance_queries_on_inconsistent_ontology_fail() {
        let mut kb = kb(&[
            Axiom::ClassAssertion {
                individual: Name::new("a"),
                class: Concept::atom("A"),
            },
            Axiom::ClassAssertion {
                individual: Name::new("a"),
                class: Concept::not(Concept::atom("A")),
            },
        ]);
        assert!(!kb.is_consistent().expect("consistency"));
        assert!(matches!(
            kb.get_instances(&Concept::atom("A")),
            Err(ReasonerError::InconsistentOntology)
        ));
    }

    #[test]
    fn asserted_types_are_obvious_instances() {
        let mut kb = kb(&[
            Axiom::ClassAssertion {
                individual: Name::new("a"),
                class: Concept::atom("A"),
            },
            Axiom::Individual { name: Name::new("b") },
        ]);
        let split = kb.instance_candidates(&Concept::atom("A")).expect("split");
        assert_eq!(split.obvious, vec![Name::new("a")]);
        assert_eq!(split.candidates, vec![Name::new("b")]);
        assert_eq!(kb.get_instances(&Concept::atom("A")).expect("instances"), vec![Name::new("a")]);
    }

    #[test]
    fn same_and_different_individuals() {
        let mut kb = kb(&[
            Axiom::FunctionalRole { role: Role::new("r") },
            Axiom::RoleAssertion {
                subject: Name::new("x"),
                role: Role::new("r"),
                object: Name::new("a"),
            },
            Axiom::RoleAssertion {
                subject: Name::new("x"),
                role: Role::new("r"),
                object: Name::new("b"),
            },
            Axiom::DifferentIndividuals {
                first: Name::new("c"),
                second: Name::new("d"),
            },
        ]);
        assert!(kb.is_same_as(&Name::new("a"), &Name::new("b")).expect("same"));
        assert!(!kb.is_different_from(&Name::new("a"), &Name::new("b")).expect("different"));
        assert!(kb.is_different_from(&Name::new("c"), &Name::new("d")).expect("different"));
        assert!(!kb.is_same_as(&Name::new("c"), &Name::new("x")).expect("same"));
    }

    #[test]
    fn explanation_needs_explain_mode() {
        let axioms = [
            Axiom::DisjointClasses {
                first: Concept::atom("A"),
                second: Concept::atom("B"),
            },
            Axiom::ClassAssertion {
                individual: Name::new("a"),
                class: Concept::and([Concept::atom("A"), Concept::atom("B")]),
            },
        ];
        let mut plain = kb(&axioms);
        assert!(!plain.is_consistent().expect("consistency"));
        assert!(plain.explanation().is_none());

        let config = ReasonerConfig {
            explain: true,
            ..ReasonerConfig::default()
        };
        let mut explained = KnowledgeBase::new(&axioms, config).expect("kb");
        assert!(!explained.is_consistent().expect("consistency"));
        let explanation = explained.explanation().expect("explanation");
        assert!(explanation.axioms.contains(&axioms[0]));
        assert!(explanation.axioms.contains(&axioms[1]));
    }
}
