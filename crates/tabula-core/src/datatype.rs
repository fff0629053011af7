//! # Datatype Reasoner
//!
//! Answers questions about data values for literal nodes: membership,
//! lexical validity, and the size (and, when finite, the members) of the
//! intersection of some datatypes minus others.
//!
//! The built-in reasoner knows `rdfs:Literal`, `xsd:string`, `xsd:integer`
//! and `xsd:boolean`, plus any enumerated datatypes declared by axiom. The
//! value spaces of the three `xsd` types are pairwise disjoint. Unknown
//! datatype names are treated as infinite and compatible with everything.

use crate::primitives::{RDFS_LITERAL, XSD_BOOLEAN, XSD_INTEGER, XSD_STRING};
use crate::types::{LiteralValue, Name};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The datatype collaborator used by the literal rules.
pub trait DatatypeReasoner: fmt::Debug + Send + Sync {
    /// Whether `value` is in the value space of `datatype`.
    fn contains(&self, datatype: &Name, value: &LiteralValue) -> bool;

    /// Whether the lexical form is valid for the value's own datatype.
    fn is_valid(&self, value: &LiteralValue) -> bool;

    /// Size of `⋂ positive ∖ ⋃ negative`, or `None` when infinite.
    fn intersection_size(&self, positive: &[Name], negative: &[Name]) -> Option<usize>;

    /// Members of a finite intersection, in a deterministic order.
    fn enumerate(&self, positive: &[Name], negative: &[Name]) -> Option<Vec<LiteralValue>>;
}

/// The built-in datatype reasoner.
#[derive(Debug, Clone, Default)]
pub struct BuiltinDatatypes {
    enumerations: BTreeMap<Name, BTreeSet<LiteralValue>>,
}

impl BuiltinDatatypes {
    /// Create a reasoner with only the built-in datatypes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a datatype whose value space is exactly `values`.
    pub fn add_enumeration(&mut self, datatype: Name, values: impl IntoIterator<Item = LiteralValue>) {
        self.enumerations
            .entry(datatype)
            .or_default()
            .extend(values);
    }

    fn boolean_values() -> BTreeSet<LiteralValue> {
        ["false", "true"]
            .into_iter()
            .map(|lexical| LiteralValue::new(lexical, XSD_BOOLEAN))
            .collect()
    }

    /// A finite superset of the intersection, if any positive type is finite.
    fn finite_candidates(&self, positive: &[Name]) -> Option<BTreeSet<LiteralValue>> {
        positive.iter().find_map(|dt| {
            if let Some(values) = self.enumerations.get(dt) {
                Some(values.clone())
            } else if dt.as_str() == XSD_BOOLEAN {
                Some(Self::boolean_values())
            } else {
                None
            }
        })
    }

    /// Whether two distinct infinite built-in value spaces are required.
    fn disjoint_builtins(positive: &[Name]) -> bool {
        let builtins: BTreeSet<&str> = positive
            .iter()
            .map(Name::as_str)
            .filter(|dt| matches!(*dt, XSD_STRING | XSD_INTEGER | XSD_BOOLEAN))
            .collect();
        builtins.len() > 1
    }

    fn members(&self, positive: &[Name], negative: &[Name]) -> Option<BTreeSet<LiteralValue>> {
        if Self::disjoint_builtins(positive) {
            return Some(BTreeSet::new());
        }
        if negative.iter().any(|dt| dt.as_str() == RDFS_LITERAL) {
            return Some(BTreeSet::new());
        }
        let candidates = self.finite_candidates(positive)?;
        Some(
            candidates
                .into_iter()
                .filter(|v| self.is_valid(v))
                .filter(|v| positive.iter().all(|dt| self.contains(dt, v)))
                .filter(|v| !negative.iter().any(|dt| self.contains(dt, v)))
                .collect(),
        )
    }
}

impl DatatypeReasoner for BuiltinDatatypes {
    fn contains(&self, datatype: &Name, value: &LiteralValue) -> bool {
        if let Some(values) = self.enumerations.get(datatype) {
            return values.contains(value);
        }
        match datatype.as_str() {
            RDFS_LITERAL => true,
            XSD_STRING | XSD_INTEGER | XSD_BOOLEAN => {
                value.datatype == *datatype && self.is_valid(value)
            }
            _ => value.datatype == *datatype,
        }
    }

    fn is_valid(&self, value: &LiteralValue) -> bool {
        match value.datatype.as_str() {
            XSD_INTEGER => value.lexical.parse::<i128>().is_ok(),
            XSD_BOOLEAN => matches!(&*value.lexical, "true" | "false"),
            _ => true,
        }
    }

    fn intersection_size(&self, positive: &[Name], negative: &[Name]) -> Option<usize> {
        self.members(positive, negative).map(|m| m.len())
    }

    fn enumerate(&self, positive: &[Name], negative: &[Name]) -> Option<Vec<LiteralValue>> {
        self.members(positive, negative)
            .map(|m| m.into_iter().collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s)
    }

    #[test]
    fn builtin_membership() {
        let dt = BuiltinDatatypes::new();
        let n = LiteralValue::new("42", XSD_INTEGER);
        assert!(dt.contains(&name(XSD_INTEGER), &n));
        assert!(dt.contains(&name(RDFS_LITERAL), &n));
        assert!(!dt.contains(&name(XSD_STRING), &n));
        assert!(!dt.is_valid(&LiteralValue::new("forty", XSD_INTEGER)));
    }

    #[test]
    fn infinite_types_have_no_size() {
        let dt = BuiltinDatatypes::new();
        assert_eq!(dt.intersection_size(&[name(XSD_INTEGER)], &[]), None);
        assert_eq!(dt.intersection_size(&[], &[]), None);
    }

    #[test]
    fn distinct_builtins_are_disjoint() {
        let dt = BuiltinDatatypes::new();
        let size = dt.intersection_size(&[name(XSD_INTEGER), name(XSD_STRING)], &[]);
        assert_eq!(size, Some(0));
    }

    #[test]
    fn booleans_enumerate() {
        let dt = BuiltinDatatypes::new();
        let values = dt.enumerate(&[name(XSD_BOOLEAN)], &[]).expect("finite");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn enumeration_minus_negated_type() {
        let mut dt = BuiltinDatatypes::new();
        dt.add_enumeration(
            name("smallPrime"),
            ["2", "3", "5"].map(|v| LiteralValue::new(v, XSD_INTEGER)),
        );
        dt.add_enumeration(name("even"), [LiteralValue::new("2", XSD_INTEGER)]);

        let odd_primes = dt
            .enumerate(&[name("smallPrime")], &[name("even")])
            .expect("finite");
        assert_eq!(
            odd_primes,
            vec![
                LiteralValue::new("3", XSD_INTEGER),
                LiteralValue::new("5", XSD_INTEGER)
            ]
        );
    }

    #[test]
    fn negated_top_datatype_is_empty() {
        let dt = BuiltinDatatypes::new();
        assert_eq!(dt.intersection_size(&[], &[name(RDFS_LITERAL)]), Some(0));
    }
}
