//! Node merging and pruning.
//!
//! A merge of `y` into `z` copies `y`'s types, redirects its edges to `z`,
//! inherits its inequalities and then prunes `y` together with the
//! anonymous part of the graph hanging below it. Merges requested while one
//! is running are queued and drained in order.

use super::{Abox, MergeRequest};
use crate::clash::Clash;
use crate::depset::DependencySet;
use crate::graph::Edge;
use crate::types::{NodeId, ReasonerError, Role};
use tracing::{debug, trace};

impl Abox {
    /// Merge `y` into `z`, or queue the merge if one is running.
    ///
    /// Merging a node into itself does nothing. Merging it again into a
    /// node it was already merged with adds `ds` to that merge, as if both
    /// requests had been one merge with the union of their sets.
    pub fn merge_to(&mut self, y: NodeId, z: NodeId, ds: DependencySet) -> Result<(), ReasonerError> {
        self.merge_queue.push_back(MergeRequest { from: y, into: z, ds });
        if self.merging {
            return Ok(());
        }
        self.drain_merges()
    }

    fn drain_merges(&mut self) -> Result<(), ReasonerError> {
        self.merging = true;
        let result = loop {
            let Some(request) = self.merge_queue.pop_front() else {
                break Ok(());
            };
            if self.clash.is_some() {
                self.merge_queue.clear();
                break Ok(());
            }
            if let Err(error) = self.merge_now(request) {
                self.merge_queue.clear();
                break Err(error);
            }
        };
        self.merging = false;
        result
    }

    fn merge_now(&mut self, request: MergeRequest) -> Result<(), ReasonerError> {
        let (mut y, y_ds) = self.find_with_ds(request.from)?;
        let (mut z, z_ds) = self.find_with_ds(request.into)?;
        if y == z {
            if request.from != request.into {
                let extra = request.ds.with_branch(self.branch);
                self.widen_merge(request.from, &extra)?;
                self.widen_merge(request.into, &extra)?;
            }
            return Ok(());
        }

        let (from, into) = (self.node(y)?, self.node(z)?);
        if from.is_pruned() || into.is_pruned() {
            return Ok(());
        }
        if from.is_individual() != into.is_individual() {
            return Err(ReasonerError::Internal(format!(
                "cannot merge {} into {}",
                from.name(),
                into.name()
            )));
        }
        let swap = (from.is_root() && !into.is_root())
            || (from.is_root() && into.is_root() && from.nominal_level() < into.nominal_level());
        if swap {
            std::mem::swap(&mut y, &mut z);
        }

        let ds = request.ds.union(&y_ds).union(&z_ds).with_branch(self.branch);
        let (from, into) = (self.node(y)?, self.node(z)?);

        if let (Some((a, a_ds)), Some((b, b_ds))) = (from.literal_value(), into.literal_value()) {
            if a != b {
                let detail = format!("literal cannot be both {a} and {b}");
                let clash_ds = ds.union(a_ds).union(b_ds);
                let clash = Clash::datatype(z, into.name().clone(), clash_ds, detail);
                self.set_clash(clash);
                return Ok(());
            }
        }
        if let Some(different) = self.is_different(y, z)? {
            let (from, into) = (self.node(y)?, self.node(z)?);
            let clash = Clash::nominal_merge(y, from.name().clone(), ds.union(&different), into.name());
            self.set_clash(clash);
            return Ok(());
        }

        self.stats.merges = self.stats.merges.saturating_add(1);
        debug!(from = %self.node(y)?.name(), into = %self.node(z)?.name(), ds = %ds, "merge");

        {
            let node = self.node_mut(y)?;
            node.merged_to = z;
            node.merge_ds = ds.clone();
        }
        self.node_mut(z)?.merged.insert(y);
        self.changed = true;

        let from = self.node(y)?.clone();

        for (c, c_ds) in from.label().iter() {
            self.add_type(z, c, c_ds.union(&ds))?;
        }
        if let Some((value, value_ds)) = from.literal_value() {
            if self.node(z)?.literal_value().is_none() {
                self.set_literal_value(z, value.clone(), value_ds.union(&ds))?;
            }
        }

        let ontology = self.shared_ontology();
        for edge in from.in_edges().iter() {
            let pred = edge.from;
            let edge_ds = edge.ds.union(&ds);
            if pred == y || pred == z {
                self.add_edge(z, &edge.role, z, edge_ds)?;
            } else if !self.is_live(pred) {
                continue;
            } else if self.has_successor(z, pred)? {
                match ontology.rbox().inverse(&edge.role) {
                    Some(inverse) => self.add_edge(z, &inverse, pred, edge_ds)?,
                    None => self.add_edge(pred, &edge.role, z, edge_ds)?,
                };
            } else {
                self.add_edge(pred, &edge.role, z, edge_ds)?;
            }
        }

        for edge in from.out_edges().iter() {
            let succ = edge.to;
            if succ == y {
                continue;
            }
            let edge_ds = edge.ds.union(&ds);
            if succ == z {
                self.add_edge(z, &edge.role, z, edge_ds)?;
            } else if self.is_live(succ) && self.node(succ)?.is_root() {
                self.add_edge(z, &edge.role, succ, edge_ds)?;
            }
        }

        for (other, other_ds) in from.differents() {
            if *other != z {
                self.set_different(z, *other, other_ds.union(&ds))?;
            }
        }

        self.prune(y, &ds, z)
    }

    /// Add `extra` to the merge that joined `node` to its representative,
    /// and to the types, edges and inequalities that merge moved there.
    fn widen_merge(&mut self, node: NodeId, extra: &DependencySet) -> Result<(), ReasonerError> {
        let (rep, chain_ds) = self.find_with_ds(node)?;
        if rep == node || extra.branches().all(|b| chain_ds.contains(b)) {
            return Ok(());
        }
        let from = self.node(node)?.clone();

        {
            let target = self.node_mut(rep)?;
            for (c, own) in from.label().iter() {
                if let Some(ds) = target.label.get_mut(c) {
                    if same_branches(ds, &own.union(&chain_ds)) {
                        *ds = ds.union(extra);
                    }
                }
            }
        }

        let ontology = self.shared_ontology();
        let mut moved = Vec::new();
        for edge in from.out_edges().iter().chain(from.in_edges().iter()) {
            let (source, target) = (self.find(edge.from)?, self.find(edge.to)?);
            let expected = edge.ds.union(&chain_ds);
            if let Some(inverse) = ontology.rbox().inverse(&edge.role) {
                moved.push((inverse, target, source, expected.clone()));
            }
            moved.push((edge.role.clone(), source, target, expected));
        }
        for (role, source, target, expected) in moved {
            self.widen_edge(&role, source, target, &expected, extra)?;
        }

        for (other, own) in from.differents() {
            let (other, other_ds) = self.find_with_ds(*other)?;
            let expected = own.union(&chain_ds).union(&other_ds);
            for (x, y) in [(rep, other), (other, rep)] {
                if let Some(ds) = self.node_mut(x)?.differents.get_mut(&y) {
                    if same_branches(ds, &expected) {
                        *ds = ds.union(extra);
                    }
                }
            }
        }

        let link = self.node_mut(node)?;
        link.merge_ds = link.merge_ds.union(extra);
        trace!(node = %node, into = %rep, ds = %extra, "merge widened");
        Ok(())
    }

    fn widen_edge(
        &mut self,
        role: &Role,
        from: NodeId,
        to: NodeId,
        expected: &DependencySet,
        extra: &DependencySet,
    ) -> Result<(), ReasonerError> {
        let found = self
            .node(from)?
            .out_edges()
            .find(role, from, to)
            .is_some_and(|edge| same_branches(&edge.ds, expected));
        if !found {
            return Ok(());
        }
        if let Some(data) = self.node_mut(from)?.individual_data_mut() {
            for edge in data.out_edges.iter_mut().filter(|e| e.is(role, from, to)) {
                edge.ds = edge.ds.union(extra);
            }
        }
        for edge in self.node_mut(to)?.in_edges.iter_mut().filter(|e| e.is(role, from, to)) {
            edge.ds = edge.ds.union(extra);
        }
        Ok(())
    }

    /// Cut `start` out of the graph, together with the anonymous nodes only
    /// reachable through it. `keep` is never pruned.
    fn prune(&mut self, start: NodeId, ds: &DependencySet, keep: NodeId) -> Result<(), ReasonerError> {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.node(id)?;
            if node.is_pruned() {
                continue;
            }
            let incoming: Vec<Edge> = node.in_edges().iter().cloned().collect();
            let outgoing: Vec<Edge> = node.out_edges().iter().cloned().collect();
            self.node_mut(id)?.pruned = Some(ds.clone());

            for edge in incoming {
                if edge.from != id && self.is_live(edge.from) {
                    if let Some(data) = self.node_mut(edge.from)?.individual_data_mut() {
                        data.out_edges.remove(&edge);
                    }
                }
            }
            for edge in outgoing {
                let succ = edge.to;
                if succ == id || !self.is_live(succ) {
                    continue;
                }
                self.node_mut(succ)?.in_edges.remove(&edge);
                if succ != keep && !self.node(succ)?.is_root() {
                    stack.push(succ);
                }
            }
        }
        self.changed = true;
        Ok(())
    }
}

fn same_branches(a: &DependencySet, b: &DependencySet) -> bool {
    a.branches().eq(b.branches())
}
