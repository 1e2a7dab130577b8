//! Bounded cycle detection for candidate edges.
//!
//! Adding `from -> to` closes a cycle exactly when `from` is already
//! reachable from `to`. The search walks breadth-first from `to` and never
//! goes deeper than the configured bound. If the bound cuts the search short
//! without finding `from`, the verdict is [`CycleCheck::DepthLimitExceeded`]:
//! an unfinished search is never reported as acyclic.

use super::EdgeGraph;
use crate::config::DEFAULT_MAX_TRAVERSAL_DEPTH;
use crate::domain::{DependencyEdge, WorkItemId};
use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// Outcome of checking a candidate edge against the existing graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleCheck {
    /// The candidate keeps the graph acyclic.
    Acyclic,

    /// The candidate would close a cycle.
    Cycle {
        /// `from -> to -> ... -> from`, starting and ending at the candidate's dependent.
        path: Vec<WorkItemId>,
    },

    /// The search hit the depth bound before it could prove the absence of a cycle.
    DepthLimitExceeded {
        /// The bound that was hit.
        max_depth: usize,
    },
}

impl CycleCheck {
    /// Whether the candidate may be accepted.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        matches!(self, Self::Acyclic)
    }
}

/// Checks candidate edges for cycles with a bounded traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleDetector {
    max_depth: usize,
}

impl Default for CycleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TRAVERSAL_DEPTH)
    }
}

impl CycleDetector {
    /// Create a detector that explores at most `max_depth` hops.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// The traversal bound in hops.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Whether adding `from -> to` to `edges` would create a cycle.
    ///
    /// Convenience wrapper over [`check`](Self::check) that treats an
    /// exhausted depth bound as a cycle.
    #[must_use]
    pub fn would_create_cycle(
        &self,
        edges: &[DependencyEdge],
        from: &WorkItemId,
        to: &WorkItemId,
    ) -> bool {
        !self.check(edges, from, to).is_acyclic()
    }

    /// Check the candidate edge `from -> to` against `edges`.
    ///
    /// The candidate itself must not be part of `edges`.
    #[must_use]
    pub fn check(&self, edges: &[DependencyEdge], from: &WorkItemId, to: &WorkItemId) -> CycleCheck {
        if from == to {
            return CycleCheck::Cycle {
                path: vec![from.clone(), to.clone()],
            };
        }

        let view = EdgeGraph::from_edges(edges);
        let Some(start) = view.node(to) else {
            // `to` has no dependencies of its own, so nothing is reachable from it.
            return CycleCheck::Acyclic;
        };

        let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start, 0)]);
        let mut truncated = false;

        while let Some((node, depth)) = queue.pop_front() {
            for edge in view.outgoing(node) {
                let next = edge.target();
                if visited.contains(&next) {
                    continue;
                }
                if depth + 1 > self.max_depth {
                    truncated = true;
                    continue;
                }

                parents.insert(next, node);
                if view.graph[next] == from {
                    let mut trail = vec![next];
                    let mut current = next;
                    while let Some(&parent) = parents.get(&current) {
                        trail.push(parent);
                        current = parent;
                    }
                    trail.reverse();

                    let mut path = Vec::with_capacity(trail.len() + 1);
                    path.push(from.clone());
                    path.extend(trail.into_iter().map(|n| view.graph[n].clone()));
                    return CycleCheck::Cycle { path };
                }

                visited.insert(next);
                queue.push_back((next, depth + 1));
            }
        }

        if truncated {
            tracing::debug!(
                from = %from,
                to = %to,
                max_depth = self.max_depth,
                "Cycle search truncated at depth bound"
            );
            CycleCheck::DepthLimitExceeded {
                max_depth: self.max_depth,
            }
        } else {
            CycleCheck::Acyclic
        }
    }
}
