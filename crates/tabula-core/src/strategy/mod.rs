//! # Completion Strategy
//!
//! Drives one completion of an ABox to a fixpoint:
//!
//! ```text
//! loop:
//!     deadline passed         → Timeout
//!     clash                   → backtrack; no branch left → inconsistent
//!     deterministic rules     → to a fixpoint
//!     one non-deterministic   → none applicable → complete, consistent
//! ```
//!
//! Deterministic rules live in `rules`, rules that create branches or new
//! nodes in `branching`. Both only look at live individuals that are not
//! blocked.

mod branching;
mod rules;

use crate::abox::Abox;
use crate::blocking::{self, Blocking};
use crate::branch::{Branch, BranchKind};
use crate::clash::{Clash, ClashKind};
use crate::depset::DependencySet;
use crate::primitives::NO_BRANCH;
use crate::types::{NodeId, ReasonerError};
use std::time::Instant;
use tracing::{debug, trace};

/// One completion run over an ABox.
#[derive(Debug)]
pub struct CompletionStrategy<'a> {
    abox: &'a mut Abox,
    blocking: Box<dyn Blocking>,
    deadline: Option<Instant>,
    timeout_ms: u64,
}

impl<'a> CompletionStrategy<'a> {
    /// A strategy for `abox`, with blocking and deadline taken from its
    /// ontology.
    pub fn new(abox: &'a mut Abox) -> Self {
        let ontology = abox.ontology();
        let kind = ontology
            .config()
            .blocking
            .unwrap_or_else(|| ontology.expressivity().blocking());
        let timeout = ontology.config().timeout();
        let timeout_ms = ontology.config().timeout_ms.unwrap_or(0);
        Self {
            abox,
            blocking: blocking::for_kind(kind),
            deadline: timeout.map(|t| Instant::now() + t),
            timeout_ms,
        }
    }

    /// Complete the graph. `Ok(false)` means every branch clashed.
    pub fn complete(&mut self) -> Result<bool, ReasonerError> {
        self.abox.stats.tableau_runs = self.abox.stats.tableau_runs.saturating_add(1);
        debug!(
            nodes = self.abox.len(),
            blocking = ?self.blocking,
            "completion started"
        );
        loop {
            self.check_timeout()?;
            if self.abox.clash().is_some() {
                if !self.backtrack()? {
                    debug!(clash = ?self.abox.clash().map(ToString::to_string), "inconsistent");
                    return Ok(false);
                }
                continue;
            }
            self.apply_deterministic()?;
            if self.abox.clash().is_some() {
                continue;
            }
            if !self.apply_nondeterministic()? {
                debug!(
                    nodes = self.abox.len(),
                    branches = self.abox.branches.len(),
                    "completion finished"
                );
                return Ok(true);
            }
        }
    }

    fn check_timeout(&self) -> Result<(), ReasonerError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                debug!(timeout_ms = self.timeout_ms, "deadline passed");
                Err(ReasonerError::Timeout(self.timeout_ms))
            }
            _ => Ok(()),
        }
    }

    fn has_clash(&self) -> bool {
        self.abox.clash().is_some()
    }

    /// Live individuals rules may be applied to, in creation order.
    fn active_individuals(&self) -> Result<Vec<NodeId>, ReasonerError> {
        let mut active = Vec::new();
        for x in self.abox.individuals() {
            if !self.blocking.is_blocked(self.abox, x)? {
                active.push(x);
            }
        }
        Ok(active)
    }

    /// Whether `x` is still a live, unblocked individual.
    fn is_active(&self, x: NodeId) -> Result<bool, ReasonerError> {
        Ok(self.abox.is_live(x) && !self.blocking.is_blocked(self.abox, x)?)
    }
}

// =============================================================================
// BRANCHES AND BACKTRACKING
// =============================================================================

impl CompletionStrategy<'_> {
    /// Push a branch and apply its first alternative.
    fn add_branch(
        &mut self,
        node: NodeId,
        kind: BranchKind,
        term_ds: DependencySet,
    ) -> Result<(), ReasonerError> {
        let depth = self.abox.branches.len();
        if self.abox.branch as usize != depth {
            return Err(ReasonerError::Internal(format!(
                "branch counter {} does not match stack depth {depth}",
                self.abox.branch
            )));
        }
        let index = u32::try_from(depth + 1)
            .map_err(|_| ReasonerError::Internal("branch stack overflow".to_string()))?;
        let branch = Branch::new(
            index,
            node,
            kind,
            term_ds,
            self.abox.anon_count(),
            self.abox.len(),
        );
        debug!(branch = %branch, "branch created");
        self.abox.branches.push(branch);
        self.abox.branch = index;
        self.abox.stats.branches = self.abox.stats.branches.saturating_add(1);
        self.try_branch(index)
    }

    /// Apply the next alternatives of branch `index` until one does not
    /// clash because of it, or none is left.
    fn try_branch(&mut self, index: u32) -> Result<(), ReasonerError> {
        let pos = index.saturating_sub(1) as usize;
        loop {
            self.check_timeout()?;
            let branch = self
                .abox
                .branches
                .get(pos)
                .ok_or_else(|| ReasonerError::Internal(format!("no branch {index}")))?;

            if branch.is_exhausted() {
                let ds = branch.exhausted_ds();
                let kind = branch.last_clash.unwrap_or(ClashKind::Unexplained);
                let node = self.abox.find(branch.node)?;
                let name = self.abox.node(node)?.name().clone();
                let clash = Clash::unexplained(node, name, ds.clone()).rekind(kind, ds);
                trace!(branch = index, "branch exhausted");
                self.abox.branches.truncate(pos);
                self.abox.replace_clash(clash);
                return Ok(());
            }

            let alt = branch.try_next;
            let ds = branch.alternative_ds(alt);
            let snapshot = branch.clone();
            if let Some(branch) = self.abox.branches.get_mut(pos) {
                branch.try_next = alt + 1;
            }
            trace!(branch = %snapshot, alternative = alt, "trying alternative");
            self.apply_alternative(&snapshot, alt, ds)?;

            let failed = match self.abox.clash() {
                Some(clash) if clash.ds.contains(index) => Some((clash.ds.clone(), clash.kind)),
                _ => None,
            };
            let Some((clash_ds, clash_kind)) = failed else {
                return Ok(());
            };
            if let Some(branch) = self.abox.branches.get_mut(pos) {
                branch.record_failure(&clash_ds, clash_kind);
            }
            self.count_failed_disjunct(&snapshot, alt);
            self.abox.clear_clash();
            self.abox.restore(index)?;
        }
    }

    /// Jump back to the deepest branch the clash depends on.
    ///
    /// Returns `false` when the clash depends on no branch.
    fn backtrack(&mut self) -> Result<bool, ReasonerError> {
        let Some(clash) = self.abox.clash() else {
            return Ok(true);
        };
        let target = clash.ds.max();
        if target == NO_BRANCH {
            return Ok(false);
        }
        let (clash_ds, clash_kind) = (clash.ds.clone(), clash.kind);
        let depth = self.abox.branches.len();
        if target as usize > depth {
            return Err(ReasonerError::Internal(format!(
                "clash depends on branch {target} but only {depth} exist"
            )));
        }

        let skipped = (depth - target as usize) as u64;
        let stats = &mut self.abox.stats;
        stats.backtracks = stats.backtracks.saturating_add(1);
        stats.backjumps = stats.backjumps.saturating_add(skipped);
        debug!(target, skipped, kind = %clash_kind, "backjump");

        self.abox.branches.truncate(target as usize);
        let pos = target as usize - 1;
        let snapshot = self
            .abox
            .branches
            .get_mut(pos)
            .map(|branch| {
                branch.record_failure(&clash_ds, clash_kind);
                branch.clone()
            })
            .ok_or_else(|| ReasonerError::Internal(format!("no branch {target}")))?;
        self.count_failed_disjunct(&snapshot, snapshot.try_next.saturating_sub(1));
        self.abox.clear_clash();
        self.abox.restore(target)?;
        self.try_branch(target)?;
        Ok(true)
    }

    fn count_failed_disjunct(&mut self, branch: &Branch, alt: usize) {
        if let BranchKind::Disjunction { disjuncts, .. } = &branch.kind {
            if let Some(disjunct) = disjuncts.get(alt) {
                let count = self.abox.disjunct_clashes.entry(disjunct.clone()).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
