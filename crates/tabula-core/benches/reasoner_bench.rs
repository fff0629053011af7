//! # Reasoner Benchmarks
//!
//! Performance benchmarks for tabula-core queries.
//!
//! Run with: `cargo bench -p tabula-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tabula_core::{Axiom, Concept, KnowledgeBase, Name, ReasonerConfig, Role};

/// `A0 ⊑ ∃r.A1 ⊓ ... ⊓ A(n-1) ⊑ ∃r.An`, a chain of existentials.
fn chain_axioms(size: usize) -> Vec<Axiom> {
    (0..size)
        .map(|i| Axiom::SubClassOf {
            sub: Concept::atom(format!("A{i}")),
            sup: Concept::exists("r", Concept::atom(format!("A{}", i + 1))),
        })
        .collect()
}

/// `n` disjunctions with a universal that rules out all but the last
/// disjunct of each: worst case for chronological backtracking.
fn branching_concept(size: usize) -> Concept {
    let mut parts = vec![Concept::exists("r", Concept::Top)];
    for i in 0..size {
        parts.push(Concept::or([
            Concept::atom(format!("P{i}")),
            Concept::atom(format!("Q{i}")),
        ]));
    }
    parts.push(Concept::all("r", Concept::not(Concept::atom("E"))));
    parts.push(Concept::or([Concept::atom("X"), Concept::atom("Y")]));
    Concept::and(parts)
}

fn branching_axioms() -> Vec<Axiom> {
    vec![
        Axiom::SubClassOf {
            sub: Concept::atom("X"),
            sup: Concept::all("r", Concept::atom("E")),
        },
        Axiom::SubClassOf {
            sub: Concept::atom("Y"),
            sup: Concept::all("r", Concept::atom("E")),
        },
    ]
}

/// A star of `size` individuals related to one hub over a functional role.
fn star_abox(size: usize) -> Vec<Axiom> {
    let mut axioms = vec![Axiom::FunctionalRole {
        role: Role::new("hasHub"),
    }];
    for i in 0..size {
        axioms.push(Axiom::RoleAssertion {
            subject: Name::new(format!("spoke{i}")),
            role: Role::new("hasHub"),
            object: Name::new("hub"),
        });
        axioms.push(Axiom::ClassAssertion {
            individual: Name::new(format!("spoke{i}")),
            class: Concept::or([Concept::atom("Left"), Concept::atom("Right")]),
        });
    }
    axioms
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_chain_satisfiability(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_satisfiability");

    for size in [10, 100, 500].iter() {
        let axioms = chain_axioms(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let config = ReasonerConfig {
                    use_cache: false,
                    ..ReasonerConfig::default()
                };
                let mut kb = KnowledgeBase::new(&axioms, config).expect("kb");
                black_box(kb.is_satisfiable(&Concept::atom("A0")).expect("sat"))
            });
        });
    }

    group.finish();
}

fn bench_backjumping(c: &mut Criterion) {
    let mut group = c.benchmark_group("backjumping");
    let axioms = branching_axioms();

    for size in [4, 8, 16].iter() {
        let concept = branching_concept(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let config = ReasonerConfig {
                    use_cache: false,
                    ..ReasonerConfig::default()
                };
                let mut kb = KnowledgeBase::new(&axioms, config).expect("kb");
                black_box(kb.is_satisfiable(&concept).expect("sat"))
            });
        });
    }

    group.finish();
}

fn bench_abox_consistency(c: &mut Criterion) {
    let mut group = c.benchmark_group("abox_consistency");

    for size in [10, 100, 1000].iter() {
        let axioms = star_abox(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut kb = KnowledgeBase::new(&axioms, ReasonerConfig::default()).expect("kb");
                black_box(kb.is_consistent().expect("consistency"))
            });
        });
    }

    group.finish();
}

fn bench_cached_subsumption(c: &mut Criterion) {
    let axioms = chain_axioms(50);
    let mut kb = KnowledgeBase::new(&axioms, ReasonerConfig::default()).expect("kb");
    let sub = Concept::atom("A0");
    let sup = Concept::exists("r", Concept::exists("r", Concept::atom("A2")));
    let _ = kb.is_sub_class_of(&sub, &sup);

    c.bench_function("cached_subsumption", |b| {
        b.iter(|| black_box(kb.is_sub_class_of(black_box(&sub), black_box(&sup)).expect("sub")))
    });
}

criterion_group!(
    benches,
    bench_chain_satisfiability,
    bench_backjumping,
    bench_abox_consistency,
    bench_cached_subsumption,
);
criterion_main!(benches);
