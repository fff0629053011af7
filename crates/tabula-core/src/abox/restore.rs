//! Undoing the work of abandoned branches.
//!
//! `restore(b)` removes every fact a branch numbered `b` or later produced.
//! In the default mode a fact is undone when its stamp is at least `b`. In
//! smart mode it is undone only when it actually depends on such a branch
//! (`max() >= b`); survivors get their stamp lowered to `b` so a later
//! restore of `b` does not touch them again.

use super::Abox;
use crate::depset::DependencySet;
use crate::graph::{Edge, Node, NodeKind};
use crate::types::{NodeId, NodeName, ReasonerError};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
struct Undo {
    branch: u32,
    smart: bool,
}

impl Undo {
    fn undone(self, ds: &DependencySet) -> bool {
        if self.smart {
            ds.max() >= self.branch
        } else {
            ds.branch() >= self.branch
        }
    }

    fn dirty(self, ds: &DependencySet) -> bool {
        self.undone(ds) || ds.branch() > self.branch
    }

    fn keep(self, ds: &mut DependencySet) -> bool {
        if self.undone(ds) {
            return false;
        }
        ds.cap_branch(self.branch);
        true
    }
}

/// The restored form of `node`, or `None` when restoring leaves it as is.
fn restored(node: &Node, undo: Undo, removed: &BTreeSet<NodeId>) -> Option<Node> {
    let edge_dirty =
        |e: &Edge| undo.dirty(&e.ds) || removed.contains(&e.from) || removed.contains(&e.to);
    let dirty = node.label().iter().any(|(_, ds)| undo.dirty(ds))
        || node.out_edges().iter().any(edge_dirty)
        || node.in_edges().iter().any(edge_dirty)
        || node
            .differents()
            .iter()
            .any(|(other, ds)| undo.dirty(ds) || removed.contains(other))
        || (node.is_merged() && undo.undone(&node.merge_ds))
        || node.pruned.as_ref().is_some_and(|ds| undo.undone(ds))
        || node.literal_value().is_some_and(|(_, ds)| undo.undone(ds))
        || node.changed_at >= undo.branch;
    if !dirty {
        return None;
    }

    let mut node = node.clone();
    node.label.retain(|_, ds| undo.keep(ds));
    let edge_live =
        |e: &Edge| !undo.undone(&e.ds) && !removed.contains(&e.from) && !removed.contains(&e.to);
    node.in_edges.retain(edge_live);
    for edge in node.in_edges.iter_mut() {
        edge.ds.cap_branch(undo.branch);
    }
    match &mut node.kind {
        NodeKind::Individual(data) => {
            data.out_edges.retain(edge_live);
            for edge in data.out_edges.iter_mut() {
                edge.ds.cap_branch(undo.branch);
            }
        }
        NodeKind::Literal(data) => {
            if data.value.as_ref().is_some_and(|(_, ds)| undo.undone(ds)) {
                data.value = None;
            }
        }
    }
    node.differents
        .retain(|other, ds| !removed.contains(other) && undo.keep(ds));
    if node.is_merged() && undo.undone(&node.merge_ds) {
        node.merged_to = node.id;
        node.merge_ds = DependencySet::independent();
    }
    if node.pruned.as_ref().is_some_and(|ds| undo.undone(ds)) {
        node.pruned = None;
    }
    node.reset_cursors();
    node.changed_at = node.changed_at.min(undo.branch);
    Some(node)
}

impl Abox {
    /// Undo everything produced at branch `b` or later.
    pub fn restore(&mut self, b: u32) -> Result<(), ReasonerError> {
        if b == 0 {
            return Err(ReasonerError::Internal(
                "cannot restore below the first branch".to_string(),
            ));
        }
        let undo = Undo {
            branch: b,
            smart: self.ontology.config().smart_restore,
        };
        self.branch = b;

        let removed: BTreeSet<NodeId> = self
            .nodes
            .values()
            .filter(|node| undo.undone(node.creation_ds()))
            .map(|node| node.id())
            .collect();
        self.nodes.retain(|id, _| !removed.contains(id));
        self.names.retain(|_, id| !removed.contains(id));

        let mut unpruned = Vec::new();
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let Some(shared) = self.nodes.get(&id) else {
                continue;
            };
            let was_pruned = shared.is_pruned();
            if let Some(node) = restored(shared, undo, &removed) {
                if was_pruned && !node.is_pruned() {
                    unpruned.push(id);
                }
                self.nodes.insert(id, Arc::new(node));
            }
        }

        let stale: Vec<(NodeId, NodeId)> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.merged_nodes()
                    .iter()
                    .filter(|m| self.nodes.get(m).is_none_or(|merged| merged.merged_to() != node.id()))
                    .map(|m| (node.id(), *m))
                    .collect::<Vec<_>>()
            })
            .collect();
        for (id, merged) in stale {
            self.node_mut(id)?.merged.remove(&merged);
        }

        for id in unpruned {
            let node = self.node(id)?;
            let outgoing: Vec<Edge> = node.out_edges().iter().cloned().collect();
            let incoming: Vec<Edge> = node.in_edges().iter().cloned().collect();
            for edge in outgoing {
                if edge.to != id && self.is_live(edge.to) {
                    self.node_mut(edge.to)?.in_edges.insert(edge);
                }
            }
            for edge in incoming {
                if edge.from != id && self.is_live(edge.from) {
                    if let Some(data) = self.node_mut(edge.from)?.individual_data_mut() {
                        data.out_edges.insert(edge);
                    }
                }
            }
        }

        let snapshot = b
            .checked_sub(1)
            .and_then(|i| self.branches.get(i as usize))
            .map(|branch| (branch.anon_count, branch.node_count));
        let surviving_anon = self
            .nodes
            .values()
            .filter_map(|node| match node.name() {
                NodeName::Anon(n) => Some(n.saturating_add(1)),
                NodeName::Named(_) | NodeName::Literal(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.anon_count = snapshot.map_or(0, |(anon, _)| anon).max(surviving_anon);

        self.merge_queue.clear();
        self.merging = false;
        self.changed = true;
        self.stats.restores = self.stats.restores.saturating_add(1);
        trace!(
            branch = b,
            removed = removed.len(),
            nodes = self.nodes.len(),
            nodes_at_branch = snapshot.map_or(0, |(_, count)| count),
            "restored"
        );
        Ok(())
    }
}
