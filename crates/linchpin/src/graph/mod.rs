//! Dependency graph algorithms.
//!
//! All functions here are pure: they take an edge snapshot (and, where
//! needed, work item metadata) and never touch storage. That keeps verdicts
//! deterministic: the same candidate against the same edges always gets the
//! same answer.
//!
//! - [`cycle`]: bounded cycle detection for a candidate edge
//! - [`reachability`]: cached reachability index for large graphs
//! - [`subgraph`]: connected-component expansion for visualization
//! - [`critical_path`]: longest weighted chain honoring lag and dependency type
//! - [`blocked`]: which items cannot start yet

pub mod blocked;
pub mod critical_path;
pub mod cycle;
pub mod reachability;
pub mod subgraph;

pub use blocked::find_blocked_items;
pub use critical_path::critical_path;
pub use cycle::{CycleCheck, CycleDetector};
pub use reachability::ReachabilityIndex;
pub use subgraph::build_subgraph;

use crate::domain::{DependencyEdge, WorkItemId};
use petgraph::algo;
use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

/// Borrowed petgraph view over an edge slice.
///
/// Graph edges follow the storage convention: source is the dependent,
/// target is the prerequisite. Nodes are added in order of first appearance.
pub(crate) struct EdgeGraph<'a> {
    pub(crate) graph: DiGraph<&'a WorkItemId, &'a DependencyEdge>,
    nodes: HashMap<&'a WorkItemId, NodeIndex>,
}

impl<'a> EdgeGraph<'a> {
    pub(crate) fn from_edges(edges: &'a [DependencyEdge]) -> Self {
        let mut graph = DiGraph::with_capacity(edges.len(), edges.len());
        let mut nodes = HashMap::new();

        for edge in edges {
            let from = *nodes
                .entry(&edge.from_id)
                .or_insert_with(|| graph.add_node(&edge.from_id));
            let to = *nodes
                .entry(&edge.to_id)
                .or_insert_with(|| graph.add_node(&edge.to_id));
            graph.add_edge(from, to, edge);
        }

        Self { graph, nodes }
    }

    pub(crate) fn node(&self, id: &WorkItemId) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }

    /// Edges leaving `node` in insertion order.
    ///
    /// petgraph walks adjacency lists newest-first; sorting by edge index
    /// restores the order of the input slice.
    pub(crate) fn outgoing(
        &self,
        node: NodeIndex,
    ) -> Vec<EdgeReference<'_, &'a DependencyEdge>> {
        let mut out: Vec<_> = self.graph.edges_directed(node, Direction::Outgoing).collect();
        out.sort_by_key(|e| e.id());
        out
    }
}

/// Whether a chain of dependencies leads from `from` to `to`.
///
/// Unbounded. An item trivially reaches itself.
#[must_use]
pub fn is_reachable(edges: &[DependencyEdge], from: &WorkItemId, to: &WorkItemId) -> bool {
    if from == to {
        return true;
    }
    let view = EdgeGraph::from_edges(edges);
    match (view.node(from), view.node(to)) {
        (Some(start), Some(end)) => algo::has_path_connecting(&view.graph, start, end, None),
        _ => false,
    }
}
