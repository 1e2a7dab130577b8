//! Which work items are waiting on their prerequisites.

use crate::domain::{BlockedItem, DependencyEdge, DependencyType, WorkItem, WorkItemId, WorkItemStatus};
use std::collections::HashMap;

/// Find items that cannot start because of an unmet prerequisite.
///
/// A finish-to-start prerequisite blocks until it is completed or cancelled.
/// A start-to-start prerequisite blocks until it has started. Finish-to-finish
/// and start-to-finish edges constrain the end of the dependent, so they never
/// block its start. Completed and cancelled items are never reported, and
/// prerequisites missing from `items` are ignored.
#[must_use]
pub fn find_blocked_items(items: &[WorkItem], edges: &[DependencyEdge]) -> Vec<BlockedItem> {
    let status_of: HashMap<&WorkItemId, WorkItemStatus> =
        items.iter().map(|item| (&item.id, item.status)).collect();

    items
        .iter()
        .filter(|item| !item.status.is_done())
        .filter_map(|item| {
            let mut blockers: Vec<WorkItemId> = Vec::new();
            for edge in edges.iter().filter(|e| e.from_id == item.id) {
                let Some(&status) = status_of.get(&edge.to_id) else {
                    continue;
                };
                if blocks(edge.dependency_type, status) && !blockers.contains(&edge.to_id) {
                    blockers.push(edge.to_id.clone());
                }
            }
            (!blockers.is_empty()).then(|| BlockedItem {
                item_id: item.id.clone(),
                blockers,
            })
        })
        .collect()
}

fn blocks(dependency_type: DependencyType, prerequisite: WorkItemStatus) -> bool {
    match dependency_type {
        DependencyType::FinishToStart => !prerequisite.is_done(),
        DependencyType::StartToStart => !(prerequisite.has_started() || prerequisite.is_done()),
        DependencyType::FinishToFinish | DependencyType::StartToFinish => false,
    }
}
