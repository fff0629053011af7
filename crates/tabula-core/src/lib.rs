//! # tabula-core
//!
//! A tableau reasoner for expressive description logics - THE REASONER.
//!
//! The crate decides concept satisfiability, subsumption, instance checks
//! and knowledge-base consistency by building a completion graph and
//! expanding it with completion rules until it is either complete and
//! clash-free (a model exists) or every choice has led to a clash.
//!
//! ## Pipeline
//!
//! ```text
//! Axioms ──compile──▶ Ontology ──assert──▶ Abox ──CompletionStrategy──▶ bool
//!                      (TBox, RBox,         (nodes, edges,     (rules, branches,
//!                       datatypes)           branch stack)      backjumping)
//! ```
//!
//! `KnowledgeBase` is the query surface on top of this pipeline.
//!
//! ## Architectural Constraints
//!
//! - Deterministic: `BTreeMap`/`BTreeSet` only, no floats, no randomness
//! - Synchronous: one query runs on one graph, on the caller's thread
//! - Clashes are data; `ReasonerError` is reserved for timeouts, bad input
//!   and broken invariants
//! - NO async, NO network, NO file I/O

// =============================================================================
// MODULES
// =============================================================================

pub mod abox;
pub mod axiom;
pub mod blocking;
pub mod branch;
pub mod cache;
pub mod clash;
pub mod concept;
pub mod config;
pub mod datatype;
pub mod depset;
pub mod expressivity;
pub mod graph;
pub mod kb;
pub mod ontology;
pub mod primitives;
pub mod rbox;
pub mod strategy;
pub mod tbox;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{LiteralValue, Name, NodeId, NodeName, ReasonerError, Role};

// =============================================================================
// RE-EXPORTS: Knowledge Representation
// =============================================================================

pub use axiom::{Axiom, RuleAtom};
pub use concept::{Concept, Shape};
pub use config::{DisjunctSorting, ReasonerConfig};
pub use datatype::{BuiltinDatatypes, DatatypeReasoner};
pub use expressivity::{BlockingKind, Expressivity};
pub use ontology::{GroundRule, Ontology};
pub use rbox::RoleBox;
pub use tbox::Tbox;

// =============================================================================
// RE-EXPORTS: Tableau
// =============================================================================

pub use abox::{Abox, Stats};
pub use blocking::{Blocking, EqualityBlocking, PairwiseBlocking, SubsetBlocking};
pub use branch::{Branch, BranchKind, MergePair};
pub use cache::{Bool3, CachedEdge, CachedIndividual, CachedNode, CachedRepr, SatCache, mergable};
pub use clash::{Clash, ClashKind};
pub use depset::DependencySet;
pub use graph::{Edge, EdgeList, Label, Node, NodeKind};
pub use strategy::CompletionStrategy;

// =============================================================================
// RE-EXPORTS: Queries
// =============================================================================

pub use kb::{Explanation, InstanceCandidates, KnowledgeBase};
