//! # Core Type Definitions
//!
//! This module contains the identifier types shared by every part of the
//! reasoner:
//! - Graph identifiers (`NodeId`, `NodeName`)
//! - Vocabulary (`Name`, `Role`, `LiteralValue`)
//! - Error types (`ReasonerError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`
//! - Share string storage through `Arc<str>`, so clones are cheap

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Arena identifier for a node in a completion graph.
///
/// Identifiers are handed out in insertion order and never reused within one
/// graph, so ordering by `NodeId` is ordering by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The term name of a node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeName {
    /// A named individual from the knowledge base.
    Named(Name),
    /// An anonymous individual created by an existential or min rule.
    Anon(u32),
    /// A literal node. Asserted literals and fresh successors share this form.
    Literal(u32),
}

impl NodeName {
    /// The individual name, if this node is named.
    #[must_use]
    pub fn as_named(&self) -> Option<&Name> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Anon(n) => write!(f, "_anon{n}"),
            Self::Literal(n) => write!(f, "_lit{n}"),
        }
    }
}

// =============================================================================
// VOCABULARY
// =============================================================================

/// Name of a class, individual or datatype.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a new name.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(Arc::from(s.as_ref()))
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Prefix and suffix of a synthesized inverse role name.
const INVERSE_OPEN: &str = "inv(";
const INVERSE_CLOSE: &str = ")";

/// Name of an object or data role.
///
/// The inverse of a role without a declared inverse is written `inv(r)`;
/// `inv(inv(r))` collapses back to `r`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Arc<str>);

impl Role {
    /// Create a new role.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(Arc::from(s.as_ref()))
    }

    /// Get the role name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is a synthesized `inv(..)` name.
    #[must_use]
    pub fn is_synthetic_inverse(&self) -> bool {
        self.0.starts_with(INVERSE_OPEN) && self.0.ends_with(INVERSE_CLOSE)
    }

    /// The syntactic inverse of this role.
    ///
    /// This ignores declared inverse pairs; the role box canonicalizes
    /// the result.
    #[must_use]
    pub fn syntactic_inverse(&self) -> Self {
        if self.is_synthetic_inverse() {
            let inner = &self.0[INVERSE_OPEN.len()..self.0.len() - INVERSE_CLOSE.len()];
            Self::new(inner)
        } else {
            Self::new(format!("{INVERSE_OPEN}{}{INVERSE_CLOSE}", self.0))
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete data value: lexical form plus datatype name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LiteralValue {
    /// Lexical form, e.g. `"42"`.
    pub lexical: Arc<str>,
    /// Datatype name, e.g. `xsd:integer`.
    pub datatype: Name,
}

impl LiteralValue {
    /// Create a new literal value.
    #[must_use]
    pub fn new(lexical: impl AsRef<str>, datatype: impl Into<Name>) -> Self {
        Self {
            lexical: Arc::from(lexical.as_ref()),
            datatype: datatype.into(),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"^^{}", self.lexical, self.datatype)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the reasoner.
///
/// - A clash is not an error: it is reported as `Ok(false)` plus a `Clash`
/// - `Internal` signals a broken invariant and must never be swallowed
/// - `Timeout` means the answer is unknown, never satisfiable or not
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReasonerError {
    /// The query exceeded its deadline.
    #[error("Query timed out after {0} ms")]
    Timeout(u64),

    /// An internal invariant was violated. This is a reasoner defect.
    #[error("Internal reasoner error: {0}")]
    Internal(String),

    /// The knowledge base is inconsistent, so the query has no meaningful answer.
    #[error("Knowledge base is inconsistent")]
    InconsistentOntology,

    /// The named individual does not occur in the knowledge base.
    #[error("Unknown individual: {0}")]
    UnknownIndividual(Name),

    /// The concept cannot be used in this position.
    #[error("Invalid concept: {0}")]
    InvalidConcept(String),

    /// The reasoner configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_of_inverse_is_identity() {
        let role = Role::new("hasParent");
        let inverse = role.syntactic_inverse();
        assert_eq!(inverse.as_str(), "inv(hasParent)");
        assert!(inverse.is_synthetic_inverse());
        assert_eq!(inverse.syntactic_inverse(), role);
    }

    #[test]
    fn node_names_render_by_kind() {
        assert_eq!(NodeName::Named(Name::new("john")).to_string(), "john");
        assert_eq!(NodeName::Anon(3).to_string(), "_anon3");
        assert_eq!(NodeName::Literal(0).to_string(), "_lit0");
    }

    #[test]
    fn names_order_lexically() {
        let mut names = vec![Name::new("b"), Name::new("a"), Name::new("c")];
        names.sort();
        let rendered: Vec<_> = names.iter().map(Name::as_str).collect();
        assert_eq!(rendered, vec!["a", "b", "c"]);
    }

    #[test]
    fn literal_display_shows_datatype() {
        let value = LiteralValue::new("42", "xsd:integer");
        assert_eq!(value.to_string(), "\"42\"^^xsd:integer");
    }
}
