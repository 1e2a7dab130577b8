//! Connected-component expansion.

use crate::domain::{DependencyEdge, DependencyGraph, WorkItemId};
use std::collections::BTreeSet;

/// Collect every item connected to any seed, in either direction, together
/// with the edges among them.
///
/// Expansion repeats until a pass over the edges adds no new item, so the
/// result is the union of the seeds' weakly connected components. Seeds with
/// no edges still appear as isolated nodes. Edges keep their input order.
#[must_use]
pub fn build_subgraph(seeds: &[WorkItemId], edges: &[DependencyEdge]) -> DependencyGraph {
    let mut nodes: BTreeSet<WorkItemId> = seeds.iter().cloned().collect();

    loop {
        let mut grew = false;
        for edge in edges {
            let has_from = nodes.contains(&edge.from_id);
            let has_to = nodes.contains(&edge.to_id);
            if has_from && !has_to {
                nodes.insert(edge.to_id.clone());
                grew = true;
            } else if has_to && !has_from {
                nodes.insert(edge.from_id.clone());
                grew = true;
            }
        }
        if !grew {
            break;
        }
    }

    let edges = edges
        .iter()
        .filter(|edge| nodes.contains(&edge.from_id) && nodes.contains(&edge.to_id))
        .cloned()
        .collect();

    DependencyGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::dep;
    use super::*;

    fn node_ids(graph: &DependencyGraph) -> Vec<&str> {
        graph.nodes.iter().map(WorkItemId::as_str).collect()
    }

    #[test]
    fn isolated_seed_yields_single_node() {
        let edges = vec![dep("b", "a")];
        let graph = build_subgraph(&["x".into()], &edges);

        assert_eq!(node_ids(&graph), vec!["x"]);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn expands_in_both_directions() {
        // a <- b <- c, and d depends on b as well.
        let edges = vec![dep("b", "a"), dep("c", "b"), dep("d", "b"), dep("z", "y")];
        let graph = build_subgraph(&["c".into()], &edges);

        assert_eq!(node_ids(&graph), vec!["a", "b", "c", "d"]);
        assert_eq!(graph.edges.len(), 3);
    }

    #[test]
    fn expansion_reaches_fixpoint_regardless_of_edge_order() {
        // Edges listed so that a single pass would miss the far end.
        let edges = vec![dep("d", "c"), dep("c", "b"), dep("b", "a")];
        let graph = build_subgraph(&["a".into()], &edges);

        assert_eq!(node_ids(&graph), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn multiple_seeds_union_components() {
        let edges = vec![dep("b", "a"), dep("z", "y")];
        let graph = build_subgraph(&["a".into(), "y".into()], &edges);

        assert_eq!(node_ids(&graph), vec!["a", "b", "y", "z"]);
        assert_eq!(graph.edges.len(), 2);
    }
}
