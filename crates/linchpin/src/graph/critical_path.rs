//! Critical path over a set of work items.
//!
//! Items are scheduled on a day-offset axis starting at 0. Each dependency
//! constrains the dependent's start `S` given the prerequisite's start `s`,
//! finish `f`, the edge lag `L` and the dependent's own duration `D`:
//!
//! | Type | Constraint |
//! |------|------------|
//! | finish-to-start  | `S >= f + L` |
//! | start-to-start   | `S >= s + L` |
//! | finish-to-finish | `S >= f + L - D` |
//! | start-to-finish  | `S >= s + L - D` |
//!
//! Starts never go below 0. The critical path ends at the item with the
//! latest finish and walks back through whichever predecessor bound each
//! start. Ties go to the item listed first.

use crate::domain::{CriticalPath, DependencyEdge, DependencyType, WorkItem, WorkItemId};
use crate::error::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, VecDeque};

/// Compute the critical path through `items`.
///
/// Only edges with both endpoints in `items` are considered. Returns an empty
/// path with zero span for an empty item list.
///
/// # Errors
///
/// Returns [`Error::GraphInvariant`] if the induced edges contain a cycle.
/// Write-time validation prevents this; hitting it means the stored graph
/// was corrupted.
pub fn critical_path(items: &[WorkItem], edges: &[DependencyEdge]) -> Result<CriticalPath> {
    if items.is_empty() {
        return Ok(CriticalPath::default());
    }

    // Scheduling graph: prerequisite -> dependent, node index == position in `items`.
    let mut graph: DiGraph<usize, &DependencyEdge> = DiGraph::with_capacity(items.len(), edges.len());
    let mut index_of: HashMap<&WorkItemId, NodeIndex> = HashMap::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let node = graph.add_node(position);
        index_of.entry(&item.id).or_insert(node);
    }
    for edge in edges {
        if let (Some(&dependent), Some(&prerequisite)) =
            (index_of.get(&edge.from_id), index_of.get(&edge.to_id))
        {
            graph.add_edge(prerequisite, dependent, edge);
        }
    }

    let order = topological_order(&graph, items)?;

    let mut start = vec![0_i64; items.len()];
    let mut finish = vec![0_i64; items.len()];
    let mut driver: Vec<Option<NodeIndex>> = vec![None; items.len()];

    for &node in &order {
        let own = node.index();
        let duration = i64::from(items[own].duration_days);

        let mut incoming: Vec<_> = graph.edges_directed(node, Direction::Incoming).collect();
        incoming.sort_by_key(|e| (e.source().index(), e.id().index()));

        let mut earliest = 0_i64;
        for edge in incoming {
            let prerequisite = edge.source().index();
            let lag = i64::from(edge.weight().lag_days);
            let bound = match edge.weight().dependency_type {
                DependencyType::FinishToStart => finish[prerequisite] + lag,
                DependencyType::StartToStart => start[prerequisite] + lag,
                DependencyType::FinishToFinish => finish[prerequisite] + lag - duration,
                DependencyType::StartToFinish => start[prerequisite] + lag - duration,
            };
            if bound > earliest || (bound == earliest && driver[own].is_none()) {
                earliest = bound;
                driver[own] = Some(edge.source());
            }
        }

        start[own] = earliest;
        finish[own] = earliest + duration;
    }

    let mut sink = 0;
    for position in 1..items.len() {
        if finish[position] > finish[sink] {
            sink = position;
        }
    }

    let mut path = vec![items[sink].id.clone()];
    let mut current = sink;
    while let Some(previous) = driver[current] {
        current = previous.index();
        path.push(items[current].id.clone());
    }
    path.reverse();

    Ok(CriticalPath {
        items: path,
        span_days: finish[sink],
    })
}

/// Kahn's algorithm, seeding and releasing nodes in input order.
fn topological_order(
    graph: &DiGraph<usize, &DependencyEdge>,
    items: &[WorkItem],
) -> Result<Vec<NodeIndex>> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.edges_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: VecDeque<NodeIndex> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .collect();
    let mut order = Vec::with_capacity(items.len());

    while let Some(node) = ready.pop_front() {
        order.push(node);
        let mut outgoing: Vec<_> = graph.edges_directed(node, Direction::Outgoing).collect();
        outgoing.sort_by_key(|e| e.id());
        for edge in outgoing {
            let target = edge.target().index();
            in_degree[target] -= 1;
            if in_degree[target] == 0 {
                ready.push_back(edge.target());
            }
        }
    }

    if order.len() < items.len() {
        let remaining: Vec<WorkItemId> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree > 0)
            .map(|(position, _)| items[position].id.clone())
            .collect();
        tracing::error!(
            remaining = remaining.len(),
            "Cycle detected in stored dependency graph"
        );
        return Err(Error::GraphInvariant { remaining });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{dep, typed};
    use super::*;
    use rstest::rstest;

    fn item(id: &str, duration: u32) -> WorkItem {
        WorkItem::new(id, id.to_uppercase(), duration)
    }

    fn ids(path: &CriticalPath) -> Vec<&str> {
        path.items.iter().map(WorkItemId::as_str).collect()
    }

    #[test]
    fn empty_input_has_empty_path() {
        let path = critical_path(&[], &[]).unwrap();
        assert!(path.items.is_empty());
        assert_eq!(path.span_days, 0);
    }

    #[test]
    fn chain_with_lags() {
        let items = vec![item("a", 5), item("b", 3), item("c", 4), item("d", 2)];
        let edges = vec![
            typed("b", "a", DependencyType::FinishToStart, 2),
            typed("c", "b", DependencyType::FinishToStart, 3),
            typed("d", "c", DependencyType::FinishToStart, 1),
        ];

        let path = critical_path(&items, &edges).unwrap();
        assert_eq!(ids(&path), vec!["a", "b", "c", "d"]);
        assert_eq!(path.span_days, 20);
    }

    #[test]
    fn longer_branch_wins() {
        // a feeds both b (1 day) and c (10 days); d waits on both.
        let items = vec![item("a", 2), item("b", 1), item("c", 10), item("d", 1)];
        let edges = vec![dep("b", "a"), dep("c", "a"), dep("d", "b"), dep("d", "c")];

        let path = critical_path(&items, &edges).unwrap();
        assert_eq!(ids(&path), vec!["a", "c", "d"]);
        assert_eq!(path.span_days, 13);
    }

    #[test]
    fn isolated_items_pick_longest_then_first() {
        let items = vec![item("a", 3), item("b", 7), item("c", 7)];
        let path = critical_path(&items, &[]).unwrap();

        assert_eq!(ids(&path), vec!["b"]);
        assert_eq!(path.span_days, 7);
    }

    #[rstest]
    #[case::finish_to_start(DependencyType::FinishToStart, 0, 9)]
    #[case::start_to_start(DependencyType::StartToStart, 1, 5)]
    #[case::finish_to_finish(DependencyType::FinishToFinish, 0, 5)]
    #[case::start_to_finish(DependencyType::StartToFinish, 6, 6)]
    fn dependency_types_shape_schedule(
        #[case] dependency_type: DependencyType,
        #[case] lag: i32,
        #[case] expected_span: i64,
    ) {
        // a: 5 days, b: 4 days, b depends on a.
        let items = vec![item("a", 5), item("b", 4)];
        let edges = vec![typed("b", "a", dependency_type, lag)];

        let path = critical_path(&items, &edges).unwrap();
        assert_eq!(path.span_days, expected_span);
    }

    #[test]
    fn lead_time_floors_at_zero() {
        let items = vec![item("a", 2), item("b", 3)];
        let edges = vec![typed("b", "a", DependencyType::FinishToStart, -10)];

        let path = critical_path(&items, &edges).unwrap();
        // b starts at 0 (floored) and finishes at 3; nothing binds it.
        assert_eq!(ids(&path), vec!["b"]);
        assert_eq!(path.span_days, 3);
    }

    #[test]
    fn edges_outside_item_set_are_ignored() {
        let items = vec![item("a", 1), item("b", 1)];
        let edges = vec![dep("b", "a"), dep("a", "elsewhere")];

        let path = critical_path(&items, &edges).unwrap();
        assert_eq!(ids(&path), vec!["a", "b"]);
    }

    #[test]
    fn stored_cycle_is_an_invariant_violation() {
        let items = vec![item("a", 1), item("b", 1), item("c", 1)];
        let edges = vec![dep("a", "b"), dep("b", "a")];

        match critical_path(&items, &edges) {
            Err(Error::GraphInvariant { remaining }) => {
                let remaining: Vec<&str> = remaining.iter().map(WorkItemId::as_str).collect();
                assert_eq!(remaining, vec!["a", "b"]);
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }
}
