//! End-to-end behavior of `DependencyService` over the in-memory store.

use futures::future::join_all;
use linchpin::error::ErrorCode;
use linchpin::graph::is_reachable;
use linchpin::notify::ChangeEvent;
use linchpin::{DependencyEdge, DependencyType, EngineConfig, NewDependency, WorkItemId};
use proptest::prelude::*;
use rstest::rstest;
use std::sync::Arc;

mod common;
use common::{service_with_config, service_with_items};

fn fs(from: &str, to: &str, lag: i32) -> NewDependency {
    NewDependency::new(from, to)
        .with_type(DependencyType::FinishToStart)
        .with_lag(lag)
}

fn has_cycle(edges: &[DependencyEdge]) -> bool {
    edges
        .iter()
        .any(|edge| is_reachable(edges, &edge.to_id, &edge.from_id))
}

fn ids(raw: &[&str]) -> Vec<WorkItemId> {
    raw.iter().map(|id| WorkItemId::new(*id)).collect()
}

// ============================================================================
// Write-path rules
// ============================================================================

#[tokio::test]
async fn second_of_two_opposite_edges_is_circular() {
    let (service, _) = service_with_items(&[("a", 1), ("b", 1)]);

    service.create_dependency(fs("a", "b", 0)).await.unwrap();
    let err = service.create_dependency(fs("b", "a", 0)).await.unwrap_err();

    assert_eq!(err.validation_code(), Some(ErrorCode::CircularDependency));
    assert_eq!(service.list_dependencies(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn self_dependency_is_rejected_regardless_of_graph() {
    let (service, _) = service_with_items(&[("a", 1), ("b", 1), ("c", 1)]);

    let empty = service.create_dependency(fs("a", "a", 0)).await.unwrap_err();
    assert_eq!(empty.validation_code(), Some(ErrorCode::SelfDependency));

    service.create_dependency(fs("a", "b", 0)).await.unwrap();
    service.create_dependency(fs("b", "c", 0)).await.unwrap();
    let populated = service.create_dependency(fs("a", "a", 0)).await.unwrap_err();
    assert_eq!(populated.validation_code(), Some(ErrorCode::SelfDependency));
}

#[tokio::test]
async fn repeated_pair_is_duplicate() {
    let (service, _) = service_with_items(&[("a", 1), ("b", 1)]);

    service.create_dependency(fs("a", "b", 0)).await.unwrap();
    let err = service
        .create_dependency(fs("a", "b", 4).with_type(DependencyType::StartToStart))
        .await
        .unwrap_err();

    assert_eq!(err.validation_code(), Some(ErrorCode::DuplicateDependency));
}

#[tokio::test]
async fn cycle_rejection_names_the_chain() {
    let (service, _) = service_with_items(&[("x", 1), ("y", 1), ("z", 1)]);
    service.create_dependency(fs("y", "z", 0)).await.unwrap();
    service.create_dependency(fs("z", "x", 0)).await.unwrap();

    let err = service.create_dependency(fs("x", "y", 0)).await.unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("CIRCULAR_DEPENDENCY"), "{message}");
    assert!(message.contains("x→y→z→x"), "{message}");
}

/// Bounded traversal below the index threshold, the cached index at threshold 0.
#[rstest]
#[case::bounded(500)]
#[case::indexed(0)]
#[tokio::test]
async fn chain_deeper_than_bound_is_rejected_conservatively(#[case] threshold: usize) {
    let names: Vec<String> = (0..=51).map(|i| format!("n{i}")).chain(["x".into()]).collect();
    let items: Vec<(&str, u32)> = names.iter().map(|id| (id.as_str(), 1)).collect();
    let config = EngineConfig {
        reachability_index_threshold: threshold,
        ..EngineConfig::default()
    };
    let (service, _) = service_with_config(&items, config);

    for i in 1..=51 {
        service
            .create_dependency(fs(&names[i], &names[i - 1], 0))
            .await
            .unwrap();
    }
    let before = service.list_dependencies(None).await.unwrap();

    let err = service.create_dependency(fs("x", "n51", 0)).await.unwrap_err();
    assert_eq!(err.validation_code(), Some(ErrorCode::DepthLimitExceeded));
    assert!(!err.is_retryable());
    assert!(err.to_string().contains("deeper than 50 hops"), "{err}");
    assert_eq!(service.list_dependencies(None).await.unwrap(), before);

    // Exactly at the bound is still provable.
    service.create_dependency(fs("x", "n50", 0)).await.unwrap();
    assert_eq!(service.list_dependencies(None).await.unwrap().len(), 52);
}

#[tokio::test]
async fn deleting_edges_never_introduces_a_cycle() {
    let (service, _) = service_with_items(&[("a", 1), ("b", 1), ("c", 1), ("d", 1)]);
    let mut created = Vec::new();
    for (from, to) in [("b", "a"), ("c", "b"), ("d", "c"), ("d", "a")] {
        created.push(service.create_dependency(fs(from, to, 0)).await.unwrap());
    }

    for edge in created {
        service.delete_dependency(&edge.id).await.unwrap();
        let remaining = service.list_dependencies(None).await.unwrap();
        assert!(!has_cycle(&remaining));
        assert!(service.validate_dependencies(&[]).await.unwrap().is_valid);
    }
}

#[tokio::test]
async fn removing_a_work_item_cascades_and_notifies() {
    let (service, notifier) = service_with_items(&[("a", 1), ("b", 1), ("c", 1)]);
    service.create_dependency(fs("b", "a", 0)).await.unwrap();
    service.create_dependency(fs("c", "b", 0)).await.unwrap();
    let mut events = notifier.subscribe();

    let removed = service.remove_work_item(&"b".into()).await.unwrap();

    assert_eq!(removed.len(), 2);
    assert!(service.list_dependencies(None).await.unwrap().is_empty());
    match events.recv().await.unwrap() {
        ChangeEvent::WorkItemRemoved { item_id, removed_edges } => {
            assert_eq!(item_id.as_str(), "b");
            assert_eq!(removed_edges.len(), 2);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

// ============================================================================
// Read-path computations
// ============================================================================

#[tokio::test]
async fn critical_path_of_lagged_chain() {
    let (service, _) = service_with_items(&[("A", 5), ("B", 3), ("C", 4), ("D", 2)]);
    // "A→B" in scheduling terms: B waits on A.
    service.create_dependency(fs("B", "A", 2)).await.unwrap();
    service.create_dependency(fs("C", "B", 3)).await.unwrap();
    service.create_dependency(fs("D", "C", 1)).await.unwrap();

    let path = service.get_critical_path(&[]).await.unwrap();

    assert_eq!(path.items, ids(&["A", "B", "C", "D"]));
    assert_eq!(path.span_days, 20);

    let again = service
        .get_critical_path(&ids(&["A", "B", "C", "D"]))
        .await
        .unwrap();
    assert_eq!(again, path);
}

#[tokio::test]
async fn isolated_seed_builds_single_node_graph() {
    let (service, _) = service_with_items(&[("lonely", 1), ("a", 1), ("b", 1)]);
    service.create_dependency(fs("b", "a", 0)).await.unwrap();

    let graph = service.build_dependency_graph(&ids(&["lonely"])).await.unwrap();

    assert_eq!(graph.nodes.into_iter().collect::<Vec<_>>(), ids(&["lonely"]));
    assert!(graph.edges.is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_opposite_inserts_leave_exactly_one_edge() {
    for _ in 0..25 {
        let (service, _) = service_with_items(&[("a", 1), ("b", 1)]);
        let service = Arc::new(service);

        let handles = [fs("a", "b", 0), fs("b", "a", 0)].map(|input| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.create_dependency(input).await })
        });
        let results: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.expect("task panicked"))
            .collect();

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1, "{results:?}");
        let rejected = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(rejected.validation_code(), Some(ErrorCode::CircularDependency));

        let edges = service.list_dependencies(None).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert!(!has_cycle(&edges));
    }
}

// ============================================================================
// Properties
// ============================================================================

const NODES: [&str; 6] = ["n0", "n1", "n2", "n3", "n4", "n5"];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn accepted_insertions_keep_the_graph_acyclic(
        pairs in prop::collection::vec((0..NODES.len(), 0..NODES.len()), 1..40)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let items: Vec<(&str, u32)> = NODES.iter().map(|id| (*id, 1)).collect();
            let (service, _) = service_with_items(&items);

            for (from, to) in pairs {
                let before = service.list_dependencies(None).await.unwrap();
                let result = service.create_dependency(fs(NODES[from], NODES[to], 0)).await;
                let after = service.list_dependencies(None).await.unwrap();

                assert!(!has_cycle(&after));
                match result {
                    Ok(_) => assert_eq!(after.len(), before.len() + 1),
                    Err(err) => {
                        assert_eq!(after.len(), before.len());
                        if err.validation_code() == Some(ErrorCode::CircularDependency) {
                            let to = WorkItemId::new(NODES[to]);
                            let from = WorkItemId::new(NODES[from]);
                            assert!(is_reachable(&before, &to, &from));
                        }
                    }
                }
            }
        });
    }
}
