//! Memoized reachability for large graphs.
//!
//! A [`ReachabilityIndex`] records, per source item, the breadth-first
//! distance and discovering parent of everything reachable from it. Repeated
//! cycle checks against the same snapshot (batch validation, bulk imports)
//! then cost a map lookup instead of a traversal. The index is tied to one
//! edge snapshot; any write invalidates it and callers rebuild.
//!
//! Verdicts match [`CycleDetector`](super::CycleDetector) exactly, including
//! the depth bound: the index knows the true distance, so a cycle farther
//! away than the bound still reports [`CycleCheck::DepthLimitExceeded`].

use super::CycleCheck;
use crate::domain::{DependencyEdge, WorkItemId};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
struct Reach {
    distance: HashMap<WorkItemId, usize>,
    parent: HashMap<WorkItemId, WorkItemId>,
    eccentricity: usize,
}

/// Cached reachability over a fixed edge snapshot.
#[derive(Debug, Default)]
pub struct ReachabilityIndex {
    adjacency: HashMap<WorkItemId, Vec<WorkItemId>>,
    edge_count: usize,
    cache: HashMap<WorkItemId, Reach>,
}

impl ReachabilityIndex {
    /// Index the given snapshot. Traversals run lazily on first query.
    #[must_use]
    pub fn build(edges: &[DependencyEdge]) -> Self {
        let mut adjacency: HashMap<WorkItemId, Vec<WorkItemId>> = HashMap::new();
        for edge in edges {
            adjacency
                .entry(edge.from_id.clone())
                .or_default()
                .push(edge.to_id.clone());
        }
        Self {
            adjacency,
            edge_count: edges.len(),
            cache: HashMap::new(),
        }
    }

    /// Number of edges in the indexed snapshot.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Record an accepted edge, dropping cached traversals it may affect.
    ///
    /// Used by batch validation, which grows the snapshot one accepted
    /// candidate at a time.
    pub fn add_edge(&mut self, from: &WorkItemId, to: &WorkItemId) {
        self.adjacency
            .entry(from.clone())
            .or_default()
            .push(to.clone());
        self.edge_count += 1;
        self.cache.clear();
    }

    /// Whether `to` is reachable from `from`, ignoring any depth bound.
    pub fn can_reach(&mut self, from: &WorkItemId, to: &WorkItemId) -> bool {
        from == to || self.reach(from).distance.contains_key(to)
    }

    /// Same verdict as [`CycleDetector::check`](super::CycleDetector::check)
    /// for the candidate `from -> to`.
    pub fn check(&mut self, from: &WorkItemId, to: &WorkItemId, max_depth: usize) -> CycleCheck {
        if from == to {
            return CycleCheck::Cycle {
                path: vec![from.clone(), to.clone()],
            };
        }

        let reach = self.reach(to);
        if let Some(&distance) = reach.distance.get(from) {
            if distance <= max_depth {
                let mut trail = vec![from.clone()];
                let mut current = from;
                while let Some(parent) = reach.parent.get(current) {
                    trail.push(parent.clone());
                    current = parent;
                }
                trail.reverse();

                let mut path = Vec::with_capacity(trail.len() + 1);
                path.push(from.clone());
                path.extend(trail);
                return CycleCheck::Cycle { path };
            }
        }

        if reach.eccentricity > max_depth {
            CycleCheck::DepthLimitExceeded { max_depth }
        } else {
            CycleCheck::Acyclic
        }
    }

    fn reach(&mut self, source: &WorkItemId) -> &Reach {
        if !self.cache.contains_key(source) {
            let computed = self.traverse(source);
            self.cache.insert(source.clone(), computed);
        }
        &self.cache[source]
    }

    fn traverse(&self, source: &WorkItemId) -> Reach {
        let mut reach = Reach::default();
        let mut queue = VecDeque::from([(source, 0_usize)]);
        reach.distance.insert(source.clone(), 0);

        while let Some((node, depth)) = queue.pop_front() {
            let Some(targets) = self.adjacency.get(node) else {
                continue;
            };
            for next in targets {
                if reach.distance.contains_key(next) {
                    continue;
                }
                reach.distance.insert(next.clone(), depth + 1);
                reach.parent.insert(next.clone(), node.clone());
                reach.eccentricity = reach.eccentricity.max(depth + 1);
                queue.push_back((next, depth + 1));
            }
        }

        // The source itself is not "reached" by any edge.
        reach.distance.remove(source);
        reach
    }
}
