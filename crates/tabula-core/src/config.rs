//! # Reasoner Configuration
//!
//! Options that change how (never whether) the reasoner finds an answer,
//! plus the unique-name assumption, which changes the semantics.
//!
//! The struct deserializes from any serde format with every field optional;
//! missing fields take the defaults below.

use crate::expressivity::BlockingKind;
use crate::primitives::DEFAULT_MAX_LITERAL_ENUMERATION;
use crate::types::ReasonerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the disjuncts of a new disjunction branch are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisjunctSorting {
    /// Keep the order of the normalized disjunction.
    None,
    /// Try disjuncts that clashed least often first.
    #[default]
    ClashCount,
}

/// Reasoner options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasonerConfig {
    /// Distinct names denote distinct individuals.
    pub unique_name_assumption: bool,
    /// Assert the negation of every failed disjunct before the next one.
    pub semantic_branching: bool,
    /// Restore by dependency rather than by recording branch.
    pub smart_restore: bool,
    /// Derived graphs share nodes with their source until first write.
    pub copy_on_write: bool,
    /// Use the satisfiability cache and `mergable` shortcuts.
    pub use_cache: bool,
    /// Disjunct ordering.
    pub disjunct_sorting: DisjunctSorting,
    /// Force a blocking condition instead of deriving it from expressivity.
    pub blocking: Option<BlockingKind>,
    /// Per-query deadline in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Track axioms in dependency sets for explanations.
    pub explain: bool,
    /// Largest finite value space a literal-value branch enumerates.
    pub max_literal_enumeration: usize,
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            unique_name_assumption: false,
            semantic_branching: true,
            smart_restore: true,
            copy_on_write: true,
            use_cache: true,
            disjunct_sorting: DisjunctSorting::ClashCount,
            blocking: None,
            timeout_ms: None,
            explain: false,
            max_literal_enumeration: DEFAULT_MAX_LITERAL_ENUMERATION,
        }
    }
}

impl ReasonerConfig {
    /// Check option values.
    pub fn validate(&self) -> Result<(), ReasonerError> {
        if self.max_literal_enumeration == 0 {
            return Err(ReasonerError::ConfigError(
                "max_literal_enumeration must be at least 1".to_string(),
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(ReasonerError::ConfigError(
                "timeout_ms must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// The deadline as a duration.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
