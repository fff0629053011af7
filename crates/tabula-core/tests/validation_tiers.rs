//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the reasoner is UNSOUND or INCOMPLETE.
//!
//! ## Tiers
//! - T0: Consistency of asserted facts
//! - T1: Deterministic reasoning
//! - T2: Branching and backjumping
//! - T3: Nominals, literals and rules
//! - T4: Cache, explanations and statistics

use tabula_core::{
    Axiom, Bool3, ClashKind, Concept, KnowledgeBase, LiteralValue, Name, ReasonerConfig,
    ReasonerError, Role, RuleAtom,
};

fn kb(axioms: &[Axiom]) -> KnowledgeBase {
    KnowledgeBase::new(axioms, ReasonerConfig::default()).expect("kb")
}

fn kb_with(axioms: &[Axiom], config: ReasonerConfig) -> KnowledgeBase {
    KnowledgeBase::new(axioms, config).expect("kb")
}

fn atom(name: &str) -> Concept {
    Concept::atom(name)
}

fn name(s: &str) -> Name {
    Name::new(s)
}

fn is_a(individual: &str, class: Concept) -> Axiom {
    Axiom::ClassAssertion {
        individual: name(individual),
        class,
    }
}

fn related(subject: &str, role: &str, object: &str) -> Axiom {
    Axiom::RoleAssertion {
        subject: name(subject),
        role: Role::new(role),
        object: name(object),
    }
}

fn sub(sub: Concept, sup: Concept) -> Axiom {
    Axiom::SubClassOf { sub, sup }
}

// =============================================================================
// TIER T0: CONSISTENCY OF ASSERTED FACTS
// =============================================================================

mod t0_assertions {
    use super::*;

    /// T0.1: Disjoint classes on one individual clash atomically.
    #[test]
    fn disjoint_types_are_inconsistent() {
        let mut kb = kb(&[
            sub(atom("A"), Concept::not(atom("B"))),
            is_a("a", atom("A")),
            is_a("a", atom("B")),
        ]);
        assert!(!kb.is_consistent().expect("consistency"));
        assert_eq!(kb.last_clash().map(|c| c.kind), Some(ClashKind::Atomic));
    }

    /// T0.2: Two named values of a functional role clash under unique names.
    #[test]
    fn functional_role_with_two_named_values() {
        let axioms = [
            Axiom::FunctionalRole {
                role: Role::new("hasParent"),
            },
            related("john", "hasParent", "mary"),
            related("john", "hasParent", "ann"),
        ];
        let config = ReasonerConfig {
            unique_name_assumption: true,
            ..ReasonerConfig::default()
        };
        let mut kb = kb_with(&axioms, config);
        assert!(!kb.is_consistent().expect("consistency"));
        assert_eq!(
            kb.last_clash().map(|c| c.kind),
            Some(ClashKind::FunctionalCardinality)
        );
    }

    /// T0.3: Without unique names the two values are merged instead.
    #[test]
    fn functional_role_merges_without_unique_names() {
        let mut kb = kb(&[
            Axiom::FunctionalRole {
                role: Role::new("hasParent"),
            },
            related("john", "hasParent", "mary"),
            related("john", "hasParent", "ann"),
        ]);
        assert!(kb.is_consistent().expect("consistency"));
        assert!(kb.is_same_as(&name("mary"), &name("ann")).expect("same"));
    }

    /// T0.4: Asserted difference blocks a required merge.
    #[test]
    fn same_and_different_individuals_clash() {
        let mut kb = kb(&[
            Axiom::DifferentIndividuals {
                first: name("a"),
                second: name("b"),
            },
            Axiom::SameIndividual {
                first: name("a"),
                second: name("b"),
            },
        ]);
        assert!(!kb.is_consistent().expect("consistency"));
        assert_eq!(kb.last_clash().map(|c| c.kind), Some(ClashKind::NominalMerge));
    }

    /// T0.5: Queries on unknown individuals are errors, not answers.
    #[test]
    fn unknown_individual_is_reported() {
        let mut kb = kb(&[is_a("a", atom("A"))]);
        let result = kb.is_type(&name("b"), &atom("A"));
        assert_eq!(result, Err(ReasonerError::UnknownIndividual(name("b"))));
    }

    /// T0.6: Concept queries on an inconsistent ABox fail like instance
    /// queries do.
    #[test]
    fn inconsistent_abox_fails_concept_queries() {
        let mut kb = kb(&[is_a("a", atom("A")), is_a("a", Concept::not(atom("A")))]);
        assert_eq!(kb.is_consistent(), Ok(false));
        assert_eq!(kb.is_satisfiable(&atom("C")), Err(ReasonerError::InconsistentOntology));
        assert_eq!(
            kb.is_sub_class_of(&atom("C"), &atom("D")),
            Err(ReasonerError::InconsistentOntology)
        );
        assert_eq!(kb.is_type(&name("a"), &atom("C")), Err(ReasonerError::InconsistentOntology));
    }
}

// =============================================================================
// TIER T1: DETERMINISTIC REASONING
// =============================================================================

mod t1_deterministic {
    use super::*;

    /// T1.1: A defined class is recognized without branching.
    #[test]
    fn defined_class_instance_needs_no_branch() {
        let definition = Concept::and([atom("A"), Concept::exists("r", atom("D"))]);
        let mut kb = kb(&[
            Axiom::EquivalentClasses {
                class: name("C"),
                definition,
            },
            is_a("x", atom("A")),
            related("x", "r", "y"),
            is_a("y", atom("D")),
        ]);
        assert!(kb.is_type(&name("x"), &atom("C")).expect("type"));
        assert_eq!(kb.last_stats().branches, 0);
    }

    /// T1.2: `≤1 r` merges two neighbors not known to be different.
    #[test]
    fn at_most_one_merges_neighbors() {
        let mut kb = kb(&[
            is_a("x", Concept::max("r", 1, Concept::Top)),
            related("x", "r", "y1"),
            related("x", "r", "y2"),
        ]);
        assert!(kb.is_consistent().expect("consistency"));
        let y1 = kb
            .completion_representative(&name("y1"))
            .expect("lookup")
            .map(|n| n.id());
        let y2 = kb
            .completion_representative(&name("y2"))
            .expect("lookup")
            .map(|n| n.id());
        assert!(y1.is_some());
        assert_eq!(y1, y2);
        assert!(kb.last_stats().merges >= 1);
    }

    /// T1.3: ⊤ subsumes and ⊥ is subsumed by everything.
    #[test]
    fn top_and_bottom_subsumption() {
        let mut kb = kb(&[sub(atom("A"), Concept::exists("r", atom("B")))]);
        for c in [atom("A"), atom("B"), Concept::exists("r", atom("A"))] {
            assert!(kb.is_sub_class_of(&c, &Concept::Top).expect("subsumption"));
            assert!(kb.is_sub_class_of(&Concept::Bottom, &c).expect("subsumption"));
        }
    }

    /// T1.4: Subsumption follows existential restrictions and role ranges.
    #[test]
    fn subsumption_through_range() {
        let mut kb = kb(&[
            Axiom::Range {
                role: Role::new("hasChild"),
                class: atom("Person"),
            },
            Axiom::EquivalentClasses {
                class: name("Parent"),
                definition: Concept::exists("hasChild", Concept::Top),
            },
        ]);
        let parent_of_person = Concept::exists("hasChild", atom("Person"));
        assert!(kb.is_sub_class_of(&atom("Parent"), &parent_of_person).expect("sub"));
        assert!(kb.is_equivalent_class(&atom("Parent"), &parent_of_person).expect("eq"));
    }

    /// T1.5: `≥n` against a smaller `≤m` is unsatisfiable.
    #[test]
    fn min_above_max_is_unsatisfiable() {
        let mut kb = kb(&[]);
        let c = Concept::and([
            Concept::min("r", 3, atom("A")),
            Concept::max("r", 2, Concept::Top),
        ]);
        assert!(!kb.is_satisfiable(&c).expect("sat"));
    }

    /// T1.6: Transitive roles propagate universal restrictions.
    #[test]
    fn transitive_roles_propagate_universals() {
        let mut kb = kb(&[
            Axiom::TransitiveRole {
                role: Role::new("ancestor"),
            },
            is_a("a", Concept::all("ancestor", atom("Mortal"))),
            related("a", "ancestor", "b"),
            related("b", "ancestor", "c"),
        ]);
        assert!(kb.is_type(&name("c"), &atom("Mortal")).expect("type"));
    }

    /// T1.7: Inverse roles carry universals back to the predecessor.
    #[test]
    fn inverse_roles_reach_predecessors() {
        let mut kb = kb(&[
            Axiom::InverseRoles {
                role: Role::new("hasChild"),
                inverse: Role::new("hasParent"),
            },
            is_a("kid", Concept::all("hasParent", atom("Parent"))),
            related("mum", "hasChild", "kid"),
        ]);
        assert!(kb.is_type(&name("mum"), &atom("Parent")).expect("type"));
    }
}

// =============================================================================
// TIER T2: BRANCHING AND BACKJUMPING
// =============================================================================

mod t2_branching {
    use super::*;

    /// T2.1: A clash that depends on an early choice skips later branches.
    #[test]
    fn backjumping_skips_irrelevant_branches() {
        let mut kb = kb(&[sub(atom("A"), Concept::all("r", atom("E")))]);
        let c = Concept::and([
            Concept::or([atom("A"), atom("B")]),
            Concept::or([atom("C"), atom("D")]),
            Concept::exists("r", Concept::Top),
            Concept::all("r", Concept::not(atom("E"))),
        ]);
        assert!(kb.is_satisfiable(&c).expect("sat"));
        let stats = kb.last_stats();
        assert!(stats.backjumps >= 1);
        assert!(stats.branches >= 2);
    }

    /// T2.2: Every disjunct failing makes the concept unsatisfiable.
    #[test]
    fn exhausted_disjunction_is_unsatisfiable() {
        let mut kb = kb(&[
            sub(atom("A"), Concept::not(atom("C"))),
            sub(atom("B"), Concept::not(atom("C"))),
        ]);
        let c = Concept::and([Concept::or([atom("A"), atom("B")]), atom("C")]);
        assert!(!kb.is_satisfiable(&c).expect("sat"));
    }

    /// T2.3: Answers do not depend on the restore or branching strategy.
    #[test]
    fn strategies_agree() {
        let axioms = [
            sub(atom("A"), Concept::all("r", atom("E"))),
            sub(atom("B"), Concept::exists("r", atom("E"))),
        ];
        let queries = [
            Concept::and([
                Concept::or([atom("A"), atom("B")]),
                Concept::exists("r", Concept::not(atom("E"))),
            ]),
            Concept::and([
                Concept::or([atom("A"), atom("B")]),
                Concept::all("r", Concept::not(atom("E"))),
                Concept::exists("r", Concept::Top),
            ]),
        ];
        let expected = [true, false];
        for smart_restore in [true, false] {
            for semantic_branching in [true, false] {
                for copy_on_write in [true, false] {
                    let config = ReasonerConfig {
                        smart_restore,
                        semantic_branching,
                        copy_on_write,
                        use_cache: false,
                        ..ReasonerConfig::default()
                    };
                    let mut kb = kb_with(&axioms, config);
                    for (query, want) in queries.iter().zip(expected) {
                        assert_eq!(kb.is_satisfiable(query).expect("sat"), want, "{query}");
                    }
                }
            }
        }
    }

    /// T2.4: Three neighbors under `≤2` that cannot be merged clash.
    #[test]
    fn unmergeable_neighbors_are_unsatisfiable() {
        let mut kb = kb(&[
            Axiom::DisjointClasses {
                first: atom("A"),
                second: atom("B"),
            },
            Axiom::DisjointClasses {
                first: atom("A"),
                second: atom("C"),
            },
            Axiom::DisjointClasses {
                first: atom("B"),
                second: atom("C"),
            },
        ]);
        let c = Concept::and([
            Concept::exists("r", atom("A")),
            Concept::exists("r", atom("B")),
            Concept::exists("r", atom("C")),
            Concept::max("r", 2, Concept::Top),
        ]);
        assert!(!kb.is_satisfiable(&c).expect("sat"));
        let mergeable = Concept::and([
            Concept::exists("r", atom("A")),
            Concept::exists("r", atom("D")),
            Concept::max("r", 1, Concept::Top),
        ]);
        assert!(kb.is_satisfiable(&mergeable).expect("sat"));
    }

    /// T2.5: A qualified `≤1` splits neighbors with the choose rule.
    #[test]
    fn qualified_max_uses_choose() {
        let mut kb = kb(&[]);
        let c = Concept::and([
            Concept::exists("r", atom("A")),
            Concept::exists("r", atom("B")),
            Concept::max("r", 1, atom("A")),
        ]);
        assert!(kb.is_satisfiable(&c).expect("sat"));
    }
}

// =============================================================================
// TIER T3: NOMINALS, LITERALS AND RULES
// =============================================================================

mod t3_extensions {
    use super::*;
    use tabula_core::primitives::{XSD_BOOLEAN, XSD_INTEGER, XSD_STRING};

    /// T3.1: A nominal forces individuals together.
    #[test]
    fn nominal_merges_individuals() {
        let axioms = [
            sub(atom("A"), Concept::value("c")),
            is_a("a", atom("A")),
            is_a("b", atom("A")),
        ];
        let mut kb = kb(&axioms);
        assert!(kb.is_consistent().expect("consistency"));
        assert!(kb.is_same_as(&name("a"), &name("b")).expect("same"));

        let config = ReasonerConfig {
            unique_name_assumption: true,
            ..ReasonerConfig::default()
        };
        let mut una = kb_with(&axioms, config);
        assert!(!una.is_consistent().expect("consistency"));
        assert_eq!(una.last_clash().map(|c| c.kind), Some(ClashKind::NominalMerge));
    }

    /// T3.2: An enumeration limits the instances of a class.
    #[test]
    fn one_of_restricts_values() {
        let mut kb = kb(&[
            Axiom::Individual { name: name("red") },
            Axiom::Individual { name: name("green") },
            Axiom::EquivalentClasses {
                class: name("Light"),
                definition: Concept::one_of([name("red"), name("green")]),
            },
        ]);
        assert!(kb.is_satisfiable(&atom("Light")).expect("sat"));
        assert!(kb.is_type(&name("red"), &atom("Light")).expect("type"));
        assert_eq!(
            kb.get_instances(&atom("Light")).expect("instances"),
            vec![name("green"), name("red")]
        );
    }

    /// T3.3: The guess rule bounds nominal neighbors reached from the tree.
    #[test]
    fn guess_rule_handles_inverse_into_nominal() {
        let mut kb = kb(&[
            Axiom::InverseRoles {
                role: Role::new("q"),
                inverse: Role::new("p"),
            },
            is_a("o", Concept::max("p", 1, Concept::Top)),
        ]);
        let c = Concept::exists("s", Concept::exists("q", Concept::value("o")));
        assert!(kb.is_satisfiable(&c).expect("sat"));
        let two = Concept::exists("s", Concept::min("q", 2, Concept::value("o")));
        assert!(!kb.is_satisfiable(&two).expect("sat"));
    }

    /// T3.4: A literal outside a role's range is a datatype clash.
    #[test]
    fn literal_outside_range_clashes() {
        let mut kb = kb(&[
            Axiom::Range {
                role: Role::new("age"),
                class: Concept::datatype(XSD_INTEGER),
            },
            Axiom::DataAssertion {
                subject: name("john"),
                role: Role::new("age"),
                value: LiteralValue::new("five", XSD_STRING),
            },
        ]);
        assert!(!kb.is_consistent().expect("consistency"));
        assert_eq!(kb.last_clash().map(|c| c.kind), Some(ClashKind::Datatype));
    }

    /// T3.5: Malformed lexical forms clash.
    #[test]
    fn invalid_lexical_form_clashes() {
        let mut kb = kb(&[
            Axiom::DataRole { role: Role::new("age") },
            Axiom::DataAssertion {
                subject: name("john"),
                role: Role::new("age"),
                value: LiteralValue::new("forty", XSD_INTEGER),
            },
        ]);
        assert!(!kb.is_consistent().expect("consistency"));
    }

    /// T3.6: Finite value spaces bound the number of distinct literals.
    #[test]
    fn boolean_has_two_values() {
        let mut kb = kb(&[Axiom::DataRole {
            role: Role::new("flag"),
        }]);
        let two = Concept::min("flag", 2, Concept::datatype(XSD_BOOLEAN));
        let three = Concept::min("flag", 3, Concept::datatype(XSD_BOOLEAN));
        assert!(kb.is_satisfiable(&two).expect("sat"));
        assert!(!kb.is_satisfiable(&three).expect("sat"));
    }

    /// T3.7: Enumerated datatypes are finite value spaces too.
    #[test]
    fn enumerated_datatype_limits_literals() {
        let mut kb = kb(&[
            Axiom::DataRole {
                role: Role::new("size"),
            },
            Axiom::EnumeratedDatatype {
                datatype: name("Size"),
                values: vec![
                    LiteralValue::new("S", XSD_STRING),
                    LiteralValue::new("M", XSD_STRING),
                    LiteralValue::new("L", XSD_STRING),
                ],
            },
        ]);
        let three = Concept::min("size", 3, Concept::datatype("Size"));
        let four = Concept::min("size", 4, Concept::datatype("Size"));
        assert!(kb.is_satisfiable(&three).expect("sat"));
        assert!(!kb.is_satisfiable(&four).expect("sat"));
    }

    /// T3.8: A ground rule with a false head refutes its only open body atom.
    #[test]
    fn ground_rule_propagates() {
        let mut kb = kb(&[
            Axiom::Rule {
                body: vec![RuleAtom::new("a", atom("A"))],
                head: vec![RuleAtom::new("a", atom("B"))],
            },
            is_a("a", Concept::or([atom("A"), atom("C")])),
            is_a("a", Concept::not(atom("B"))),
        ]);
        assert!(kb.is_consistent().expect("consistency"));
        assert!(kb.is_type(&name("a"), &atom("C")).expect("type"));
        assert!(!kb.is_type(&name("a"), &atom("A")).expect("type"));
    }

    /// T3.9: A true body forces the head.
    #[test]
    fn ground_rule_fires() {
        let mut kb = kb(&[
            Axiom::Rule {
                body: vec![RuleAtom::new("a", atom("A"))],
                head: vec![RuleAtom::new("b", atom("B"))],
            },
            is_a("a", atom("A")),
            Axiom::Individual { name: name("b") },
        ]);
        assert!(kb.is_type(&name("b"), &atom("B")).expect("type"));
        assert_eq!(kb.known_type(&name("b"), &atom("B")).expect("known"), Bool3::True);
    }
}

// =============================================================================
// TIER T4: CACHE, EXPLANATIONS AND STATISTICS
// =============================================================================

mod t4_bookkeeping {
    use super::*;

    /// T4.1: The second satisfiability check of a concept is a cache hit.
    #[test]
    fn repeated_satisfiability_is_cached() {
        let mut kb = kb(&[sub(atom("A"), Concept::exists("r", atom("B")))]);
        let c = Concept::and([atom("A"), Concept::all("r", atom("C"))]);
        assert!(kb.is_consistent().expect("consistency"));
        let first = kb.is_satisfiable(&c).expect("sat");
        assert_eq!(kb.last_stats().tableau_runs, 1);
        let second = kb.is_satisfiable(&c).expect("sat");
        assert_eq!(first, second);
        assert_eq!(kb.last_stats().tableau_runs, 0);
        assert_eq!(kb.last_stats().cache_hits, 1);
    }

    /// T4.2: Unsatisfiable concepts are cached with their negation.
    #[test]
    fn unsatisfiable_concepts_are_cached() {
        let mut kb = kb(&[sub(atom("A"), Concept::not(atom("A")))]);
        assert!(!kb.is_satisfiable(&atom("A")).expect("sat"));
        assert!(kb.is_satisfiable(&Concept::not(atom("A"))).expect("sat"));
        assert_eq!(kb.last_stats().cache_hits, 1);
    }

    /// T4.3: Cached models answer non-subsumption without a new run.
    #[test]
    fn cached_models_decide_non_subsumption() {
        let mut kb = kb(&[
            sub(atom("A"), atom("P")),
            sub(atom("B"), atom("Q")),
        ]);
        assert!(!kb.is_sub_class_of(&atom("A"), &atom("B")).expect("sub"));
        assert!(kb.is_sub_class_of(&atom("A"), &atom("P")).expect("sub"));
    }

    /// T4.4: Explanations name the axioms behind the clash.
    #[test]
    fn explanation_lists_axioms() {
        let disjoint = sub(atom("A"), Concept::not(atom("B")));
        let first = is_a("a", atom("A"));
        let second = is_a("a", atom("B"));
        let unrelated = sub(atom("X"), atom("Y"));
        let config = ReasonerConfig {
            explain: true,
            ..ReasonerConfig::default()
        };
        let mut kb = kb_with(
            &[disjoint.clone(), first.clone(), second.clone(), unrelated.clone()],
            config,
        );
        assert!(!kb.is_consistent().expect("consistency"));
        let explanation = kb.explanation().expect("explanation");
        for axiom in [&disjoint, &first, &second] {
            assert!(explanation.axioms.contains(axiom), "missing {axiom}");
        }
        assert!(!explanation.axioms.contains(&unrelated));
        assert!(explanation.to_string().contains("atomic"));
    }

    /// T4.5: A zero timeout is a configuration error.
    #[test]
    fn invalid_timeout_is_rejected() {
        let config = ReasonerConfig {
            timeout_ms: Some(0),
            ..ReasonerConfig::default()
        };
        assert!(matches!(
            KnowledgeBase::new(&[], config),
            Err(ReasonerError::ConfigError(_))
        ));
    }

    /// T4.6: Expressivity reflects the constructors in use.
    #[test]
    fn expressivity_is_reported() {
        let kb = kb(&[
            Axiom::InverseRoles {
                role: Role::new("r"),
                inverse: Role::new("s"),
            },
            is_a("a", Concept::max("r", 1, Concept::Top)),
            sub(atom("A"), Concept::value("a")),
        ]);
        let expressivity = kb.expressivity();
        assert!(expressivity.has_inverse);
        assert!(expressivity.has_nominal);
        assert!(expressivity.has_cardinality);
        assert!(expressivity.needs_guess_rule());
    }
}
