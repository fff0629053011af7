//! Deterministic completion rules.

use super::CompletionStrategy;
use crate::clash::Clash;
use crate::concept::{Concept, Shape};
use crate::depset::DependencySet;
use crate::ontology::GroundRule;
use crate::primitives::RDFS_LITERAL;
use crate::types::{LiteralValue, Name, NodeId, ReasonerError, Role};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

/// Truth of a rule atom in the current graph.
pub(super) enum AtomState {
    True(DependencySet),
    False(DependencySet),
    Unknown,
}

impl AtomState {
    pub(super) fn is_true(&self) -> bool {
        matches!(self, Self::True(_))
    }

    pub(super) fn is_false(&self) -> bool {
        matches!(self, Self::False(_))
    }

    pub(super) fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub(super) fn true_ds(&self) -> Option<&DependencySet> {
        match self {
            Self::True(ds) => Some(ds),
            _ => None,
        }
    }

    pub(super) fn false_ds(&self) -> Option<&DependencySet> {
        match self {
            Self::False(ds) => Some(ds),
            _ => None,
        }
    }
}

/// Rule atoms with their node and truth value.
pub(super) type RuleAtoms = Vec<(NodeId, Concept, AtomState)>;

/// Datatype facts of one literal.
struct LiteralFacts {
    positive: Vec<(Name, DependencySet)>,
    negative: Vec<(Name, DependencySet)>,
    value: Option<(LiteralValue, DependencySet)>,
    differents: Vec<(NodeId, DependencySet)>,
}

impl CompletionStrategy<'_> {
    /// Apply deterministic rules until nothing changes or a clash appears.
    pub(super) fn apply_deterministic(&mut self) -> Result<(), ReasonerError> {
        loop {
            self.abox.changed = false;
            for x in self.abox.individuals() {
                if self.has_clash() {
                    return Ok(());
                }
                if !self.is_active(x)? {
                    continue;
                }
                self.apply_unfolding(x)?;
                if self.ready(x) {
                    self.apply_nominals(x)?;
                }
                if self.ready(x) {
                    self.apply_all_values(x)?;
                }
                if self.ready(x) {
                    self.apply_functional(x)?;
                }
                if self.ready(x) {
                    self.apply_max_one(x)?;
                }
                if self.ready(x) {
                    self.check_cardinality(x)?;
                }
                if self.ready(x) {
                    self.apply_disjunction_bcp(x)?;
                }
            }
            if self.has_clash() {
                return Ok(());
            }
            self.apply_rule_bcp()?;
            if self.has_clash() {
                return Ok(());
            }
            self.check_literals()?;
            if self.has_clash() || !self.abox.changed {
                return Ok(());
            }
            self.check_timeout()?;
        }
    }

    fn ready(&self, x: NodeId) -> bool {
        !self.has_clash() && self.abox.is_live(x)
    }

    /// Label entries of one partition from position `start`, with their
    /// dependencies.
    pub(super) fn entries(
        &self,
        x: NodeId,
        shape: Shape,
        start: usize,
    ) -> Result<Vec<(Concept, DependencySet)>, ReasonerError> {
        let label = self.abox.node(x)?.label();
        Ok(label
            .partition(shape)
            .get(start..)
            .unwrap_or(&[])
            .iter()
            .filter_map(|c| label.get(c).map(|ds| (c.clone(), ds.clone())))
            .collect())
    }

    /// Neighbors of `x` over `role` that carry `filler`, with the
    /// dependencies of the edge and of the filler.
    pub(super) fn qualified_neighbors(
        &self,
        x: NodeId,
        role: &Role,
        filler: &Concept,
    ) -> Result<Vec<(NodeId, DependencySet)>, ReasonerError> {
        let mut found = Vec::new();
        for (y, edge_ds) in self.abox.r_neighbors(x, role)? {
            if *filler == Concept::Top {
                found.push((y, edge_ds));
            } else if let Some(ds) = self.abox.node(y)?.label().get(filler) {
                found.push((y, edge_ds.union(ds)));
            }
        }
        Ok(found)
    }

    /// Order merge candidates so roots, then older nodes, survive.
    pub(super) fn survivor_first(
        &self,
        nodes: Vec<(NodeId, DependencySet)>,
    ) -> Result<Vec<(NodeId, DependencySet)>, ReasonerError> {
        let mut keyed = Vec::with_capacity(nodes.len());
        for (id, ds) in nodes {
            keyed.push((!self.abox.node(id)?.is_root(), id, ds));
        }
        keyed.sort_by_key(|(blockable, id, _)| (*blockable, *id));
        Ok(keyed.into_iter().map(|(_, id, ds)| (id, ds)).collect())
    }

    // =========================================================================
    // UNFOLDING
    // =========================================================================

    fn apply_unfolding(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        let ontology = self.abox.shared_ontology();
        loop {
            let start = self.abox.node(x)?.cursor(Shape::Atomic);
            let batch = self.entries(x, Shape::Atomic, start)?;
            if batch.is_empty() {
                return Ok(());
            }
            for (c, ds) in &batch {
                for (d, axiom) in ontology.tbox().unfold(c) {
                    let ds = self.abox.because(ds, axiom);
                    self.abox.add_type(x, d, ds)?;
                }
            }
            if !self.ready(x) {
                return Ok(());
            }
            self.abox.node_mut(x)?.set_cursor(Shape::Atomic, start + batch.len());
        }
    }

    // =========================================================================
    // NOMINALS
    // =========================================================================

    fn apply_nominals(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        for (c, ds) in self.entries(x, Shape::Nominal, 0)? {
            let Concept::Value(name) = &c else {
                continue;
            };
            let here = self.abox.find(x)?;
            let target = match self.abox.individual(name) {
                Some(id) => self.abox.find(id)?,
                None => self.abox.add_individual(name, DependencySet::independent())?,
            };
            if target == here {
                continue;
            }
            trace!(node = %here, nominal = %name, "nominal merge");
            self.abox.merge_to(here, target, ds)?;
            if !self.ready(x) {
                return Ok(());
            }
        }
        Ok(())
    }

    // =========================================================================
    // ALL VALUES
    // =========================================================================

    fn apply_all_values(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        let ontology = self.abox.shared_ontology();
        loop {
            let start = self.abox.node(x)?.cursor(Shape::Universal);
            let batch = self.entries(x, Shape::Universal, start)?;
            if batch.is_empty() {
                return Ok(());
            }
            for (c, ds) in &batch {
                let Some((role, filler)) = c.as_all() else {
                    continue;
                };
                for (y, edge_ds) in self.abox.r_neighbors(x, role)? {
                    self.abox.add_type(y, filler, ds.union(&edge_ds))?;
                }
                for sub in ontology.rbox().transitive_sub_roles(role) {
                    let propagated = Concept::All(sub.clone(), Arc::new(filler.clone()));
                    for (y, edge_ds) in self.abox.r_neighbors(x, &sub)? {
                        self.abox.add_type(y, &propagated, ds.union(&edge_ds))?;
                    }
                }
                if !self.ready(x) {
                    return Ok(());
                }
            }
            // A self-loop added while propagating resets the cursor.
            let node = self.abox.node_mut(x)?;
            if node.cursor(Shape::Universal) != start {
                continue;
            }
            node.set_cursor(Shape::Universal, start + batch.len());
        }
    }

    // =========================================================================
    // FUNCTIONAL ROLES AND AT-MOST-ONE
    // =========================================================================

    fn apply_functional(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        let ontology = self.abox.shared_ontology();
        let rbox = ontology.rbox();
        let node = self.abox.node(x)?;
        let mut roles: BTreeSet<Role> = node.out_edges().iter().map(|e| e.role.clone()).collect();
        roles.extend(node.in_edges().iter().filter_map(|e| rbox.inverse(&e.role)));
        let functional: BTreeSet<Role> = roles
            .iter()
            .flat_map(|r| rbox.functional_supers(r))
            .collect();

        for role in functional {
            let neighbors = self.abox.r_neighbors(x, &role)?;
            if neighbors.len() < 2 {
                continue;
            }
            let neighbors = self.survivor_first(neighbors)?;
            let (head, head_ds) = neighbors[0].clone();
            let axiom_ds = rbox
                .functional_axiom(&role)
                .map(|axiom| self.abox.because(&DependencySet::independent(), axiom))
                .unwrap_or_default();
            for (other, other_ds) in neighbors.into_iter().skip(1) {
                let ds = head_ds.union(&other_ds).union(&axiom_ds);
                if let Some(different) = self.abox.is_different(head, other)? {
                    let name = self.abox.node(x)?.name().clone();
                    self.abox
                        .set_clash(Clash::functional(x, name, ds.union(&different), &role));
                    return Ok(());
                }
                self.abox.merge_to(other, head, ds)?;
                if !self.ready(x) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// `≤1 r.C`: every `C`-neighbor is the same node.
    fn apply_max_one(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        for (c, max_ds) in self.entries(x, Shape::MaxCard, 0)? {
            let Some((role, 1, filler)) = c.as_max() else {
                continue;
            };
            let neighbors = self.qualified_neighbors(x, role, filler)?;
            if neighbors.len() < 2 {
                continue;
            }
            let neighbors = self.survivor_first(neighbors)?;
            let (head, head_ds) = neighbors[0].clone();
            for (other, other_ds) in neighbors.into_iter().skip(1) {
                let ds = max_ds.union(&head_ds).union(&other_ds);
                if let Some(different) = self.abox.is_different(head, other)? {
                    let name = self.abox.node(x)?.name().clone();
                    self.abox
                        .set_clash(Clash::cardinality(x, name, ds.union(&different), c.clone()));
                    return Ok(());
                }
                self.abox.merge_to(other, head, ds)?;
                if !self.ready(x) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // CARDINALITY CLASHES
    // =========================================================================

    /// `≥n r.C` against `≤m s.D` with `r ⊑ s`, `D ∈ {C, ⊤}` and `n > m`;
    /// `≥2` over a functional role; more pairwise-different neighbors than
    /// a `≤m` allows.
    fn check_cardinality(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        let ontology = self.abox.shared_ontology();
        let rbox = ontology.rbox();
        let mins = self.entries(x, Shape::MinCard, 0)?;
        let maxes = self.entries(x, Shape::MaxCard, 0)?;
        let name = self.abox.node(x)?.name().clone();

        for (min, min_ds) in &mins {
            let Some((role, n, filler)) = min.as_min() else {
                continue;
            };
            for (max, max_ds) in &maxes {
                let Some((other, m, other_filler)) = max.as_max() else {
                    continue;
                };
                let same_filler = other_filler == filler || *other_filler == Concept::Top;
                if n > m && same_filler && rbox.is_sub_role_of(role, other) {
                    let clash = Clash::cardinality(x, name, min_ds.union(max_ds), max.clone());
                    self.abox.set_clash(clash);
                    return Ok(());
                }
            }
            let functional = rbox.functional_supers(role);
            if let Some(functional) = functional.first().filter(|_| n > 1) {
                let ds = rbox
                    .functional_axiom(functional)
                    .map(|axiom| self.abox.because(min_ds, axiom))
                    .unwrap_or_else(|| min_ds.clone());
                self.abox.set_clash(Clash::functional(x, name, ds, functional));
                return Ok(());
            }
        }

        for (max, max_ds) in &maxes {
            let Some((role, m, filler)) = max.as_max() else {
                continue;
            };
            let neighbors = self.qualified_neighbors(x, role, filler)?;
            if neighbors.len() as u64 <= u64::from(m) {
                continue;
            }
            if let Some(ds) = self.pairwise_different(&neighbors)? {
                let clash = Clash::cardinality(x, name, ds.union(max_ds), max.clone());
                self.abox.set_clash(clash);
                return Ok(());
            }
        }
        Ok(())
    }

    /// Why every pair of `nodes` is different, if every pair is.
    fn pairwise_different(
        &self,
        nodes: &[(NodeId, DependencySet)],
    ) -> Result<Option<DependencySet>, ReasonerError> {
        let mut ds = DependencySet::independent();
        for (i, (a, a_ds)) in nodes.iter().enumerate() {
            ds = ds.union(a_ds);
            for (b, _) in nodes.iter().skip(i + 1) {
                match self.abox.is_different(*a, *b)? {
                    Some(different) => ds = ds.union(&different),
                    None => return Ok(None),
                }
            }
        }
        Ok(Some(ds))
    }

    // =========================================================================
    // DISJUNCTION PROPAGATION
    // =========================================================================

    /// A disjunction with every disjunct but one excluded by its negation
    /// adds the last one; with every disjunct excluded it clashes.
    fn apply_disjunction_bcp(&mut self, x: NodeId) -> Result<(), ReasonerError> {
        for (c, ds) in self.entries(x, Shape::Disjunction, 0)? {
            let Some(disjuncts) = c.disjuncts() else {
                continue;
            };
            let label = self.abox.node(x)?.label();
            if disjuncts.iter().any(|d| label.contains(d)) {
                continue;
            }
            let mut excluded = ds.clone();
            let mut open = Vec::new();
            for d in disjuncts {
                match label.get(&d.negate()) {
                    Some(neg_ds) => excluded = excluded.union(neg_ds),
                    None => open.push(d),
                }
            }
            match open.as_slice() {
                [] => {
                    let name = self.abox.node(x)?.name().clone();
                    self.abox.set_clash(Clash::atomic(x, name, excluded, c.clone()));
                    return Ok(());
                }
                [last] => {
                    let last = last.clone();
                    self.abox.add_type(x, &last, excluded)?;
                    if !self.ready(x) {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    // =========================================================================
    // GROUND RULES
    // =========================================================================

    fn atom_state(
        &self,
        individual: &Name,
        class: &Concept,
    ) -> Result<Option<(NodeId, AtomState)>, ReasonerError> {
        let Some(id) = self.abox.individual(individual) else {
            return Ok(None);
        };
        let (x, merge_ds) = self.abox.find_with_ds(id)?;
        let label = self.abox.node(x)?.label();
        let state = if let Some(ds) = label.get(class) {
            AtomState::True(ds.union(&merge_ds))
        } else if let Some(ds) = label.get(&class.negate()) {
            AtomState::False(ds.union(&merge_ds))
        } else {
            AtomState::Unknown
        };
        Ok(Some((x, state)))
    }

    /// Evaluated body and head atoms of a rule, or `None` if an individual
    /// is missing.
    pub(super) fn rule_atoms(
        &self,
        rule: &GroundRule,
    ) -> Result<Option<(RuleAtoms, RuleAtoms)>, ReasonerError> {
        let mut sides = [Vec::new(), Vec::new()];
        for (side, atoms) in sides.iter_mut().zip([&rule.body, &rule.head]) {
            for atom in atoms {
                let Some((x, state)) = self.atom_state(&atom.individual, &atom.class)? else {
                    return Ok(None);
                };
                side.push((x, atom.class.clone(), state));
            }
        }
        let [body, head] = sides;
        Ok(Some((body, head)))
    }

    /// Unit propagation over ground rules: a true body forces the head, a
    /// false head atom with one open body atom forces that atom false.
    fn apply_rule_bcp(&mut self) -> Result<(), ReasonerError> {
        let ontology = self.abox.shared_ontology();
        for rule in ontology.rules() {
            let Some((body, head)) = self.rule_atoms(rule)? else {
                continue;
            };
            if body.iter().any(|(_, _, state)| state.is_false()) {
                continue;
            }
            let rule_ds = self.abox.because(&DependencySet::independent(), &rule.axiom);
            let body_ds = body
                .iter()
                .filter_map(|(_, _, state)| state.true_ds())
                .fold(rule_ds, |acc, ds| acc.union(ds));
            let open: Vec<&(NodeId, Concept, AtomState)> =
                body.iter().filter(|(_, _, state)| state.is_unknown()).collect();
            let head_false = head.iter().find_map(|(_, _, state)| state.false_ds());

            match (open.as_slice(), head_false) {
                ([], _) => {
                    for (x, class, state) in &head {
                        if !state.is_true() {
                            self.abox.add_type(*x, class, body_ds.clone())?;
                        }
                    }
                }
                ([(x, class, _)], Some(false_ds)) => {
                    self.abox.add_type(*x, &class.negate(), body_ds.union(false_ds))?;
                }
                _ => {}
            }
            if self.has_clash() {
                return Ok(());
            }
        }
        Ok(())
    }

    // =========================================================================
    // LITERALS
    // =========================================================================

    fn literal_facts(&self, l: NodeId) -> Result<LiteralFacts, ReasonerError> {
        let node = self.abox.node(l)?;
        let mut positive = Vec::new();
        let mut negative = Vec::new();
        for (c, ds) in node.label().iter() {
            match c {
                Concept::Datatype(d) => positive.push((d.clone(), ds.clone())),
                Concept::Not(inner) => {
                    if let Concept::Datatype(d) = inner.as_ref() {
                        negative.push((d.clone(), ds.clone()));
                    }
                }
                _ => {}
            }
        }
        Ok(LiteralFacts {
            positive,
            negative,
            value: node.literal_value().cloned(),
            differents: node
                .differents()
                .iter()
                .map(|(id, ds)| (*id, ds.clone()))
                .collect(),
        })
    }

    /// Why a literal's value is impossible, if it is.
    fn value_conflict(
        &self,
        value: &LiteralValue,
        value_ds: &DependencySet,
        facts: &LiteralFacts,
    ) -> Result<Option<(DependencySet, String)>, ReasonerError> {
        let datatypes = self.abox.ontology().datatypes();
        if !datatypes.is_valid(value) {
            return Ok(Some((value_ds.clone(), format!("{value} is not a valid lexical form"))));
        }
        if let Some((d, ds)) = facts.positive.iter().find(|(d, _)| !datatypes.contains(d, value)) {
            return Ok(Some((value_ds.union(ds), format!("{value} is not in {d}"))));
        }
        if let Some((d, ds)) = facts.negative.iter().find(|(d, _)| datatypes.contains(d, value)) {
            return Ok(Some((value_ds.union(ds), format!("{value} is in excluded {d}"))));
        }
        for (other, different) in &facts.differents {
            let other = self.abox.find(*other)?;
            if let Some((v, other_ds)) = self.abox.node(other)?.literal_value() {
                if v == value {
                    let ds = value_ds.union(different).union(other_ds);
                    return Ok(Some((ds, format!("two different literals have value {value}"))));
                }
            }
        }
        Ok(None)
    }

    /// Datatype checks on every live literal. A literal whose restrictions
    /// leave one possible value gets that value.
    fn check_literals(&mut self) -> Result<(), ReasonerError> {
        let ontology = self.abox.shared_ontology();
        let datatypes = ontology.datatypes();
        for l in self.abox.literals() {
            let facts = self.literal_facts(l)?;
            let name = self.abox.node(l)?.name().clone();

            if let Some((value, value_ds)) = &facts.value {
                if let Some((ds, detail)) = self.value_conflict(value, value_ds, &facts)? {
                    self.abox.set_clash(Clash::datatype(l, name, ds, detail));
                    return Ok(());
                }
                continue;
            }

            let mut positive: Vec<Name> = facts.positive.iter().map(|(d, _)| d.clone()).collect();
            if positive.is_empty() {
                positive.push(Name::new(RDFS_LITERAL));
            }
            let negative: Vec<Name> = facts.negative.iter().map(|(d, _)| d.clone()).collect();
            let ds = facts
                .positive
                .iter()
                .chain(&facts.negative)
                .fold(DependencySet::independent(), |acc, (_, ds)| acc.union(ds));
            match datatypes.intersection_size(&positive, &negative) {
                Some(0) => {
                    let detail = "empty value space".to_string();
                    self.abox.set_clash(Clash::datatype(l, name, ds, detail));
                    return Ok(());
                }
                Some(1) => {
                    let values = datatypes.enumerate(&positive, &negative).unwrap_or_default();
                    if let [value] = values.as_slice() {
                        self.abox.set_literal_value(l, value.clone(), ds)?;
                        if self.has_clash() {
                            return Ok(());
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
