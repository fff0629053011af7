//! # Reasoner Primitives
//!
//! Hardcoded runtime constants for the Tabula reasoner.
//!
//! These values are compiled into the binary and are immutable at runtime.

/// Branch number of facts that depend on no choice.
///
/// Branch indices start at 1; the dependency set of an unconditional fact is
/// empty and its `max()` is this value.
pub const NO_BRANCH: u32 = 0;

/// Nominal level of a fully blockable individual.
///
/// Named individuals have level 0. Nominals introduced by the guess rule get
/// the level of their creator plus one.
pub const BLOCKABLE: u32 = u32::MAX;

/// Default upper bound on the values a literal-value branch enumerates.
pub const DEFAULT_MAX_LITERAL_ENUMERATION: usize = 64;

/// Maximum length of a merge chain followed by `find`.
///
/// A longer chain means the union-find structure contains a cycle, which is
/// reported as an internal error.
pub const MAX_MERGE_CHAIN: usize = 1 << 20;

// =============================================================================
// DATATYPE NAMES
// =============================================================================

/// The universal datatype: every literal is a member.
pub const RDFS_LITERAL: &str = "rdfs:Literal";

/// Plain strings.
pub const XSD_STRING: &str = "xsd:string";

/// Arbitrary precision integers (lexical form validated as `i128`).
pub const XSD_INTEGER: &str = "xsd:integer";

/// Booleans: `true` and `false`.
pub const XSD_BOOLEAN: &str = "xsd:boolean";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_datatype_names_are_distinct() {
        let names: std::collections::BTreeSet<_> =
            [RDFS_LITERAL, XSD_STRING, XSD_INTEGER, XSD_BOOLEAN].into_iter().collect();
        assert_eq!(names.len(), 4);
    }
}
