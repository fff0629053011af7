//! # Clash
//!
//! A typed record of a contradiction found in the completion graph. A clash
//! is an expected outcome: its dependency set drives backjumping, and when
//! it depends on no branch the graph is inconsistent.

use crate::concept::Concept;
use crate::depset::DependencySet;
use crate::types::{NodeId, NodeName, Role};
use serde::Serialize;
use std::fmt;

/// What kind of contradiction was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClashKind {
    /// `C` and `¬C` (or `⊥`) in one label.
    Atomic,
    /// More role neighbors than a `≤n` restriction allows, none mergeable.
    Cardinality,
    /// Two distinct neighbors over a functional role.
    FunctionalCardinality,
    /// Two nodes that must be merged are known to be different.
    NominalMerge,
    /// An impossible data value.
    Datatype,
    /// Every alternative of a branch failed.
    Unexplained,
}

impl fmt::Display for ClashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Atomic => "atomic",
            Self::Cardinality => "cardinality",
            Self::FunctionalCardinality => "functional-cardinality",
            Self::NominalMerge => "nominal-merge",
            Self::Datatype => "datatype",
            Self::Unexplained => "unexplained",
        };
        f.write_str(s)
    }
}

/// A contradiction and what it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct Clash {
    /// Where the contradiction was found.
    pub node: NodeId,
    /// Name of that node, for reporting.
    pub node_name: NodeName,
    /// Union of the dependencies of every fact involved.
    pub ds: DependencySet,
    /// Kind of contradiction.
    pub kind: ClashKind,
    /// Concepts involved, if any.
    pub terms: Vec<Concept>,
    /// Free-form detail.
    pub detail: Option<String>,
}

impl Clash {
    fn new(node: NodeId, node_name: NodeName, ds: DependencySet, kind: ClashKind) -> Self {
        Self {
            node,
            node_name,
            ds,
            kind,
            terms: Vec::new(),
            detail: None,
        }
    }

    /// `c` and its negation on one node.
    #[must_use]
    pub fn atomic(node: NodeId, name: NodeName, ds: DependencySet, c: Concept) -> Self {
        let mut clash = Self::new(node, name, ds, ClashKind::Atomic);
        clash.terms.push(c);
        clash
    }

    /// Too many neighbors for `max`.
    #[must_use]
    pub fn cardinality(node: NodeId, name: NodeName, ds: DependencySet, max: Concept) -> Self {
        let mut clash = Self::new(node, name, ds, ClashKind::Cardinality);
        clash.terms.push(max);
        clash
    }

    /// Two different neighbors over functional `role`.
    #[must_use]
    pub fn functional(node: NodeId, name: NodeName, ds: DependencySet, role: &Role) -> Self {
        let mut clash = Self::new(node, name, ds, ClashKind::FunctionalCardinality);
        clash.detail = Some(format!("functional role {role} has two different values"));
        clash
    }

    /// A required merge of two nodes known to be different.
    #[must_use]
    pub fn nominal_merge(node: NodeId, name: NodeName, ds: DependencySet, other: &NodeName) -> Self {
        let mut clash = Self::new(node, name, ds, ClashKind::NominalMerge);
        clash.detail = Some(format!("must equal {other} but is different from it"));
        clash
    }

    /// An impossible data value.
    #[must_use]
    pub fn datatype(node: NodeId, name: NodeName, ds: DependencySet, detail: String) -> Self {
        let mut clash = Self::new(node, name, ds, ClashKind::Datatype);
        clash.detail = Some(detail);
        clash
    }

    /// Every alternative of a branch failed.
    #[must_use]
    pub fn unexplained(node: NodeId, name: NodeName, ds: DependencySet) -> Self {
        Self::new(node, name, ds, ClashKind::Unexplained)
    }

    /// Same clash with a different kind and dependency set.
    #[must_use]
    pub fn rekind(&self, kind: ClashKind, ds: DependencySet) -> Self {
        let mut clash = self.clone();
        clash.kind = kind;
        clash.ds = ds;
        clash
    }
}

impl fmt::Display for Clash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} clash at {}", self.kind, self.node_name)?;
        if !self.terms.is_empty() {
            f.write_str(" on ")?;
            for (i, term) in self.terms.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{term}")?;
            }
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        write!(f, " depending on {}", self.ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Name;

    #[test]
    fn display_names_node_kind_and_dependencies() {
        let clash = Clash::atomic(
            NodeId(0),
            NodeName::Named(Name::new("x")),
            DependencySet::for_branch(2),
            Concept::atom("A"),
        );
        assert_eq!(clash.to_string(), "atomic clash at x on A depending on {2}");
    }

    #[test]
    fn functional_clash_mentions_role() {
        let clash = Clash::functional(
            NodeId(0),
            NodeName::Named(Name::new("john")),
            DependencySet::independent(),
            &Role::new("hasParent"),
        );
        assert_eq!(clash.kind, ClashKind::FunctionalCardinality);
        assert!(clash.to_string().contains("hasParent"));
    }
}
