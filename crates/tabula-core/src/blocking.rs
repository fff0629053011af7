//! # Blocking
//!
//! Termination for expansion of anonymous individuals. A blockable node is
//! blocked when one of its blockable ancestors already stands for it, in
//! which case no rule expands it. Blocking is dynamic: it is evaluated each
//! time a rule looks at a node, so a block disappears as soon as the labels
//! diverge.
//!
//! - `Subset`: `L(x) ⊆ L(w)`
//! - `Equality`: `L(x) = L(w)`
//! - `Pairwise`: equality for `x`/`w` and for their parents, and the same
//!   roles on the two parent edges

use crate::abox::Abox;
use crate::expressivity::BlockingKind;
use crate::types::{NodeId, ReasonerError};
use std::fmt;

/// A blocking condition.
pub trait Blocking: fmt::Debug {
    /// Whether `w` may stand for `x`. Both are blockable and `w` is an
    /// ancestor of `x`.
    fn blocks(&self, abox: &Abox, w: NodeId, x: NodeId) -> Result<bool, ReasonerError>;

    /// Whether some ancestor of `x` blocks it.
    fn is_directly_blocked(&self, abox: &Abox, x: NodeId) -> Result<bool, ReasonerError> {
        let mut ancestor = blockable_parent(abox, x)?;
        while let Some(w) = ancestor {
            if self.blocks(abox, w, x)? {
                return Ok(true);
            }
            ancestor = blockable_parent(abox, w)?;
        }
        Ok(false)
    }

    /// Whether an ancestor of `x` is directly blocked.
    fn is_indirectly_blocked(&self, abox: &Abox, x: NodeId) -> Result<bool, ReasonerError> {
        let mut ancestor = blockable_parent(abox, x)?;
        while let Some(w) = ancestor {
            if self.is_directly_blocked(abox, w)? {
                return Ok(true);
            }
            ancestor = blockable_parent(abox, w)?;
        }
        Ok(false)
    }

    /// Whether rules must leave `x` alone. Roots are never blocked.
    fn is_blocked(&self, abox: &Abox, x: NodeId) -> Result<bool, ReasonerError> {
        let x = abox.find(x)?;
        if !abox.node(x)?.is_blockable() {
            return Ok(false);
        }
        Ok(self.is_directly_blocked(abox, x)? || self.is_indirectly_blocked(abox, x)?)
    }
}

/// The representative of `x`'s parent, if it is blockable.
fn blockable_parent(abox: &Abox, x: NodeId) -> Result<Option<NodeId>, ReasonerError> {
    let Some(parent) = abox.node(x)?.parent() else {
        return Ok(None);
    };
    let parent = abox.find(parent)?;
    let node = abox.node(parent)?;
    Ok((node.is_blockable() && !node.is_pruned()).then_some(parent))
}

/// `L(x) ⊆ L(w)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubsetBlocking;

impl Blocking for SubsetBlocking {
    fn blocks(&self, abox: &Abox, w: NodeId, x: NodeId) -> Result<bool, ReasonerError> {
        Ok(abox.node(x)?.label().is_subset_of(abox.node(w)?.label()))
    }
}

/// `L(x) = L(w)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualityBlocking;

impl Blocking for EqualityBlocking {
    fn blocks(&self, abox: &Abox, w: NodeId, x: NodeId) -> Result<bool, ReasonerError> {
        Ok(abox.node(x)?.label().same_concepts(abox.node(w)?.label()))
    }
}

/// Equal labels on `x`/`w` and on their parents, and equal parent edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseBlocking;

impl Blocking for PairwiseBlocking {
    fn blocks(&self, abox: &Abox, w: NodeId, x: NodeId) -> Result<bool, ReasonerError> {
        if !EqualityBlocking.blocks(abox, w, x)? {
            return Ok(false);
        }
        let (Some(px), Some(pw)) = (abox.node(x)?.parent(), abox.node(w)?.parent()) else {
            return Ok(false);
        };
        let (px, pw) = (abox.find(px)?, abox.find(pw)?);
        if !abox.node(px)?.label().same_concepts(abox.node(pw)?.label()) {
            return Ok(false);
        }
        Ok(abox.edge_roles(px, x)? == abox.edge_roles(pw, w)?)
    }
}

/// The blocking condition for `kind`.
#[must_use]
pub fn for_kind(kind: BlockingKind) -> Box<dyn Blocking> {
    match kind {
        BlockingKind::Subset => Box::new(SubsetBlocking),
        BlockingKind::Equality => Box::new(EqualityBlocking),
        BlockingKind::Pairwise => Box::new(PairwiseBlocking),
    }
}

// =============================================================================
// TESTS
// =============================================================================
