//! Ephemeral edge storage.
//!
//! All edges live in RAM behind an `Arc<RwLock<…>>` and are lost when the
//! process exits. Clones share the same table, which makes this store
//! convenient for tests that hand one instance to several services.

use super::{EdgeStore, EdgeTable};
use crate::domain::{DependencyEdge, EdgeId, WorkItemId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory [`EdgeStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryEdgeStore {
    table: Arc<RwLock<EdgeTable>>,
}

impl InMemoryEdgeStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with edges, bypassing all constraints.
    ///
    /// Meant for tests that need a specific (even corrupt) starting state.
    #[must_use]
    pub fn with_edges(edges: Vec<DependencyEdge>) -> Self {
        Self {
            table: Arc::new(RwLock::new(EdgeTable::from_edges(edges))),
        }
    }
}

#[async_trait]
impl EdgeStore for InMemoryEdgeStore {
    async fn list(&self, item: Option<&WorkItemId>) -> Result<Vec<DependencyEdge>> {
        Ok(self.table.read().await.list(item))
    }

    async fn get(&self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        Ok(self.table.read().await.get(id))
    }

    async fn insert(&self, edge: DependencyEdge) -> Result<DependencyEdge> {
        self.table.write().await.insert(edge.clone())?;
        Ok(edge)
    }

    async fn remove(&self, id: &EdgeId) -> Result<DependencyEdge> {
        self.table.write().await.remove(id)
    }

    async fn remove_for_item(&self, item: &WorkItemId) -> Result<Vec<DependencyEdge>> {
        Ok(self.table.write().await.remove_for_item(item))
    }
}
