//! Rules that open branches or create nodes.
//!
//! Applied in a fixed order, one rule instance at a time; the deterministic
//! rules run to a fixpoint before the next one:
//!
//! 1. guess (nominal successors of a nominal under `≤n`)
//! 2. choose (`C` or `¬C` on every neighbor under `≤n r.C`)
//! 3. max (merge two neighbors)
//! 4. ground rules
//! 5. disjunction
//! 6. literal value
//! 7. some
//! 8. min

use super::CompletionStrategy;
use crate::branch::{Branch, BranchKind, MergePair};
use crate::concept::{Concept, Shape};
use crate::config::DisjunctSorting;
use crate::depset::DependencySet;
use crate::primitives::RDFS_LITERAL;
use crate::types::{Name, NodeId, ReasonerError, Role};
use tracing::trace;

impl CompletionStrategy<'_> {
    /// Apply one non-deterministic or generating rule. Returns `false` when
    /// none is applicable, i.e. the graph is complete.
    pub(super) fn apply_nondeterministic(&mut self) -> Result<bool, ReasonerError> {
        let needs_guess = self.abox.ontology().expressivity().needs_guess_rule();
        let active = self.active_individuals()?;

        if needs_guess {
            for &x in &active {
                if self.apply_guess(x)? {
                    return Ok(true);
                }
            }
        }
        for &x in &active {
            if self.apply_choose(x)? {
                return Ok(true);
            }
        }
        for &x in &active {
            if self.apply_max(x)? {
                return Ok(true);
            }
        }
        if self.apply_rule_branch()? {
            return Ok(true);
        }
        for &x in &active {
            if self.apply_disjunction(x)? {
                return Ok(true);
            }
        }
        if self.apply_literal_value()? {
            return Ok(true);
        }
        for &x in &active {
            if self.apply_some(x)? {
                return Ok(true);
            }
        }
        for &x in &active {
            if self.apply_min(x)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    // =========================================================================
    // GUESS
    // =========================================================================

    /// A nominal `x` with `≤n r.C` and a blockable `C`-predecessor over `r`
    /// guesses how many nominal `r`-neighbors it has.
    fn apply_guess(&mut self, x: NodeId) -> Result<bool, ReasonerError> {
        if !self.abox.node(x)?.is_nominal() {
            return Ok(false);
        }
        for (c, max_ds) in self.entries(x, Shape::MaxCard, 0)? {
            let Some((role, n, filler)) = c.as_max() else {
                continue;
            };
            if n == 0 {
                continue;
            }
            let mut trigger = None;
            for (y, ds) in self.qualified_neighbors(x, role, filler)? {
                if self.abox.node(y)?.is_blockable() {
                    trigger = Some(ds);
                    break;
                }
            }
            let Some(edge_ds) = trigger else {
                continue;
            };
            if self.already_guessed(x, role, n, filler)? {
                continue;
            }
            let term_ds = max_ds.union(&edge_ds);
            let kind = BranchKind::Guess {
                max: c.clone(),
                role: role.clone(),
                filler: filler.clone(),
                guesses: (1..=n).rev().collect(),
            };
            self.add_branch(x, kind, term_ds)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Whether some `≤m r.C` with `m <= n` is already matched by `m`
    /// pairwise-different nominal neighbors.
    fn already_guessed(&self, x: NodeId, role: &Role, n: u32, filler: &Concept) -> Result<bool, ReasonerError> {
        let mut nominals = Vec::new();
        for (y, ds) in self.qualified_neighbors(x, role, filler)? {
            if self.abox.node(y)?.is_nominal() {
                nominals.push((y, ds));
            }
        }
        for (c, _) in self.entries(x, Shape::MaxCard, 0)? {
            let Some((other, m, other_filler)) = c.as_max() else {
                continue;
            };
            if other != role || other_filler != filler || m > n || m == 0 {
                continue;
            }
            if nominals.len() == m as usize && self.pairwise_different_nominals(&nominals)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn pairwise_different_nominals(&self, nodes: &[(NodeId, DependencySet)]) -> Result<bool, ReasonerError> {
        for (i, (a, _)) in nodes.iter().enumerate() {
            for (b, _) in nodes.iter().skip(i + 1) {
                if self.abox.is_different(*a, *b)?.is_none() {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    // =========================================================================
    // CHOOSE
    // =========================================================================

    /// Under `≤n r.C`, every `r`-neighbor gets `C` or `¬C`.
    fn apply_choose(&mut self, x: NodeId) -> Result<bool, ReasonerError> {
        for (c, max_ds) in self.entries(x, Shape::MaxCard, 0)? {
            let Some((role, _, filler)) = c.as_max() else {
                continue;
            };
            if *filler == Concept::Top {
                continue;
            }
            let negation = filler.negate();
            for (y, edge_ds) in self.abox.r_neighbors(x, role)? {
                let label = self.abox.node(y)?.label();
                if label.contains(filler) || label.contains(&negation) {
                    continue;
                }
                let kind = BranchKind::Disjunction {
                    disjunction: Concept::or([filler.clone(), negation.clone()]),
                    disjuncts: vec![filler.clone(), negation],
                };
                self.add_branch(y, kind, max_ds.union(&edge_ds))?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    // =========================================================================
    // MAX
    // =========================================================================

    /// Too many `C`-neighbors under `≤n r.C`: branch over which two to merge.
    fn apply_max(&mut self, x: NodeId) -> Result<bool, ReasonerError> {
        for (c, max_ds) in self.entries(x, Shape::MaxCard, 0)? {
            let Some((role, n, filler)) = c.as_max() else {
                continue;
            };
            let neighbors = self.qualified_neighbors(x, role, filler)?;
            if neighbors.len() as u64 <= u64::from(n) {
                continue;
            }
            let neighbors = self.survivor_first(neighbors)?;
            let mut term_ds = max_ds.clone();
            let mut pairs = Vec::new();
            for (i, (into, into_ds)) in neighbors.iter().enumerate() {
                term_ds = term_ds.union(into_ds);
                for (from, from_ds) in neighbors.iter().skip(i + 1) {
                    if self.abox.is_different(*into, *from)?.is_some() {
                        continue;
                    }
                    pairs.push(MergePair {
                        from: *from,
                        into: *into,
                        ds: into_ds.union(from_ds),
                    });
                }
            }
            if pairs.is_empty() {
                // Every pair is different; the cardinality check reports it.
                continue;
            }
            self.add_branch(x, BranchKind::Max { max: c.clone(), pairs }, term_ds)?;
            return Ok(true);
        }
        Ok(false)
    }

    // =========================================================================
    // GROUND RULES
    // =========================================================================

    /// A rule whose body may still hold: either some open body atom is false
    /// or the whole head holds.
    fn apply_rule_branch(&mut self) -> Result<bool, ReasonerError> {
        let ontology = self.abox.shared_ontology();
        for (index, rule) in ontology.rules().iter().enumerate() {
            let Some((body, head)) = self.rule_atoms(rule)? else {
                continue;
            };
            if body.iter().any(|(_, _, state)| state.is_false())
                || head.iter().all(|(_, _, state)| state.is_true())
            {
                continue;
            }
            let mut alternatives: Vec<Vec<(NodeId, Concept)>> = body
                .iter()
                .filter(|(_, _, state)| state.is_unknown())
                .map(|(x, class, _)| vec![(*x, class.negate())])
                .collect();
            let mut term_ds = body
                .iter()
                .filter_map(|(_, _, state)| state.true_ds())
                .fold(
                    self.abox.because(&DependencySet::independent(), &rule.axiom),
                    |acc, ds| acc.union(ds),
                );
            match head.iter().find_map(|(_, _, state)| state.false_ds()) {
                Some(false_ds) => term_ds = term_ds.union(false_ds),
                None => alternatives.push(
                    head.iter()
                        .filter(|(_, _, state)| !state.is_true())
                        .map(|(x, class, _)| (*x, class.clone()))
                        .collect(),
                ),
            }
            if alternatives.len() < 2 {
                continue;
            }
            let node = alternatives
                .first()
                .and_then(|alt| alt.first())
                .map(|(x, _)| *x)
                .ok_or_else(|| ReasonerError::Internal("rule branch without atoms".to_string()))?;
            self.add_branch(node, BranchKind::Rule { rule: index, alternatives }, term_ds)?;
            return Ok(true);
        }
        Ok(false)
    }

    // =========================================================================
    // DISJUNCTION
    // =========================================================================

    fn apply_disjunction(&mut self, x: NodeId) -> Result<bool, ReasonerError> {
        let sorting = self.abox.ontology().config().disjunct_sorting;
        for (c, ds) in self.entries(x, Shape::Disjunction, 0)? {
            let Some(disjuncts) = c.disjuncts() else {
                continue;
            };
            let label = self.abox.node(x)?.label();
            if disjuncts.iter().any(|d| label.contains(d)) {
                continue;
            }
            let mut term_ds = ds.clone();
            let mut open = Vec::new();
            for d in disjuncts {
                match label.get(&d.negate()) {
                    Some(neg_ds) => term_ds = term_ds.union(neg_ds),
                    None => open.push(d),
                }
            }
            if open.len() < 2 {
                continue;
            }
            if sorting == DisjunctSorting::ClashCount {
                let counts = self.abox.disjunct_clashes();
                open.sort_by_key(|d| counts.get(d).copied().unwrap_or(0));
            }
            let kind = BranchKind::Disjunction {
                disjunction: c.clone(),
                disjuncts: open,
            };
            self.add_branch(x, kind, term_ds)?;
            return Ok(true);
        }
        Ok(false)
    }

    // =========================================================================
    // LITERAL VALUE
    // =========================================================================

    /// A literal that must differ from others picks a concrete value from a
    /// small finite value space.
    fn apply_literal_value(&mut self) -> Result<bool, ReasonerError> {
        let ontology = self.abox.shared_ontology();
        let limit = ontology.config().max_literal_enumeration;
        for l in self.abox.literals() {
            let node = self.abox.node(l)?;
            if node.literal_value().is_some() || node.differents().is_empty() {
                continue;
            }
            let mut positive = Vec::new();
            let mut negative = Vec::new();
            let mut term_ds = DependencySet::independent();
            for (c, ds) in node.label().iter() {
                match c {
                    Concept::Datatype(d) => positive.push(d.clone()),
                    Concept::Not(inner) => match inner.as_ref() {
                        Concept::Datatype(d) => negative.push(d.clone()),
                        _ => continue,
                    },
                    _ => continue,
                }
                term_ds = term_ds.union(ds);
            }
            if positive.is_empty() {
                positive.push(Name::new(RDFS_LITERAL));
            }
            let datatypes = ontology.datatypes();
            let Some(size) = datatypes.intersection_size(&positive, &negative) else {
                continue;
            };
            if size < 2 || size > limit {
                continue;
            }
            let Some(values) = datatypes.enumerate(&positive, &negative) else {
                continue;
            };
            self.add_branch(l, BranchKind::LiteralValue { values }, term_ds)?;
            return Ok(true);
        }
        Ok(false)
    }

    // =========================================================================
    // SOME
    // =========================================================================

    /// Give every unsatisfied `∃r.C` on `x` a witness.
    fn apply_some(&mut self, x: NodeId) -> Result<bool, ReasonerError> {
        let ontology = self.abox.shared_ontology();
        let rbox = ontology.rbox();
        let mut applied = false;
        for (c, ds) in self.entries(x, Shape::Existential, 0)? {
            if !self.abox.is_live(x) || self.has_clash() {
                break;
            }
            let Some((role, filler)) = c.as_exists() else {
                continue;
            };
            if !self.qualified_neighbors(x, role, &filler)?.is_empty() {
                continue;
            }
            applied = true;

            let reusable = match rbox.functional_supers(role).first() {
                Some(functional) => self.abox.r_neighbors(x, functional)?.into_iter().next(),
                None => None,
            };
            if let Some((y, edge_ds)) = reusable {
                trace!(node = %x, neighbor = %y, role = %role, "reusing functional neighbor");
                let ds = ds.union(&edge_ds);
                if !self.abox.r_neighbors(x, role)?.iter().any(|(n, _)| *n == y) {
                    self.abox.add_edge(x, role, y, ds.clone())?;
                }
                self.abox.add_type(y, &filler, ds)?;
                continue;
            }

            if let Concept::Value(name) = &filler {
                let target = match self.abox.individual(name) {
                    Some(id) => id,
                    None => self.abox.add_individual(name, DependencySet::independent())?,
                };
                self.abox.add_edge(x, role, target, ds)?;
                continue;
            }

            let y = if rbox.is_datatype_role(role) {
                let creation = ds.union(self.abox.node(x)?.creation_ds());
                self.abox.add_literal(None, false, creation)?
            } else {
                self.abox.add_fresh_individual(x, ds.clone())?
            };
            trace!(node = %x, successor = %y, role = %role, "some");
            self.abox.add_edge(x, role, y, ds.clone())?;
            self.abox.add_type(y, &filler, ds)?;
        }
        Ok(applied)
    }

    // =========================================================================
    // MIN
    // =========================================================================

    /// `≥n r.C` without `n` pairwise-different `C`-neighbors creates them.
    fn apply_min(&mut self, x: NodeId) -> Result<bool, ReasonerError> {
        let ontology = self.abox.shared_ontology();
        for (c, ds) in self.entries(x, Shape::MinCard, 0)? {
            let Some((role, n, filler)) = c.as_min() else {
                continue;
            };
            if self.different_witnesses(x, role, filler)? >= n as usize {
                continue;
            }
            trace!(node = %x, restriction = %c, "min");
            let literal = ontology.rbox().is_datatype_role(role);
            let mut created = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let y = if literal {
                    let creation = ds.union(self.abox.node(x)?.creation_ds());
                    self.abox.add_literal(None, false, creation)?
                } else {
                    self.abox.add_fresh_individual(x, ds.clone())?
                };
                self.abox.add_edge(x, role, y, ds.clone())?;
                self.abox.add_type(y, filler, ds.clone())?;
                created.push(y);
            }
            for (i, a) in created.iter().enumerate() {
                for b in created.iter().skip(i + 1) {
                    self.abox.set_different(*a, *b, ds.clone())?;
                }
            }
            return Ok(true);
        }
        Ok(false)
    }

    /// Size of a greedily built set of pairwise-different `C`-neighbors.
    fn different_witnesses(&self, x: NodeId, role: &Role, filler: &Concept) -> Result<usize, ReasonerError> {
        let mut chosen: Vec<NodeId> = Vec::new();
        for (y, _) in self.qualified_neighbors(x, role, filler)? {
            let mut fits = true;
            for other in &chosen {
                if self.abox.is_different(y, *other)?.is_none() {
                    fits = false;
                    break;
                }
            }
            if fits {
                chosen.push(y);
            }
        }
        Ok(chosen.len())
    }

    // =========================================================================
    // ALTERNATIVES
    // =========================================================================

    /// Apply alternative `alt` of `branch` with dependencies `ds`.
    pub(super) fn apply_alternative(
        &mut self,
        branch: &Branch,
        alt: usize,
        ds: DependencySet,
    ) -> Result<(), ReasonerError> {
        let semantic = self.abox.ontology().config().semantic_branching;
        let earlier = |j: usize| {
            branch
                .failure_ds(j)
                .map(|failure| failure.union(&branch.term_ds))
        };
        match &branch.kind {
            BranchKind::Disjunction { disjuncts, .. } => {
                if semantic {
                    for (j, disjunct) in disjuncts.iter().enumerate().take(alt) {
                        if let Some(neg_ds) = earlier(j) {
                            self.abox.add_type(branch.node, &disjunct.negate(), neg_ds)?;
                        }
                    }
                }
                let chosen = disjuncts.get(alt).ok_or_else(|| missing(branch, alt))?;
                self.abox.add_type(branch.node, chosen, ds)
            }
            BranchKind::Max { pairs, .. } => {
                if semantic {
                    for (j, pair) in pairs.iter().enumerate().take(alt) {
                        if let Some(diff_ds) = earlier(j) {
                            self.abox.set_different(pair.from, pair.into, diff_ds.union(&pair.ds))?;
                        }
                    }
                }
                let pair = pairs.get(alt).ok_or_else(|| missing(branch, alt))?;
                self.abox.merge_to(pair.from, pair.into, ds.union(&pair.ds))
            }
            BranchKind::Guess {
                role,
                filler,
                guesses,
                ..
            } => {
                let m = *guesses.get(alt).ok_or_else(|| missing(branch, alt))?;
                let x = branch.node;
                let bound = Concept::max(role.clone(), m, filler.clone()).normalize();
                self.abox.add_type(x, &bound, ds.clone())?;
                let mut created = Vec::with_capacity(m as usize);
                for _ in 0..m {
                    let z = self.abox.add_nominal_successor(x, ds.clone())?;
                    self.abox.add_edge(x, role, z, ds.clone())?;
                    self.abox.add_type(z, filler, ds.clone())?;
                    created.push(z);
                }
                for (i, a) in created.iter().enumerate() {
                    for b in created.iter().skip(i + 1) {
                        self.abox.set_different(*a, *b, ds.clone())?;
                    }
                }
                Ok(())
            }
            BranchKind::LiteralValue { values } => {
                let value = values.get(alt).ok_or_else(|| missing(branch, alt))?;
                self.abox.set_literal_value(branch.node, value.clone(), ds)
            }
            BranchKind::Rule { alternatives, .. } => {
                let facts = alternatives.get(alt).ok_or_else(|| missing(branch, alt))?;
                for (x, class) in facts {
                    self.abox.add_type(*x, class, ds.clone())?;
                }
                Ok(())
            }
        }
    }
}

fn missing(branch: &Branch, alt: usize) -> ReasonerError {
    ReasonerError::Internal(format!("{branch} has no alternative {alt}"))
}
