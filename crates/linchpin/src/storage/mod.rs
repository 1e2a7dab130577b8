//! Storage abstraction layer for linchpin.
//!
//! Two collaborator contracts live here:
//!
//! - [`EdgeStore`]: durable storage of dependency edges with a store-level
//!   unique-pair constraint and cascade removal when a work item goes away.
//! - [`WorkItemLookup`]: read access to work item metadata (status, dates,
//!   durations) owned by the surrounding system.
//!
//! Both traits take `&self` and are object safe, so one instance can be
//! shared as `Arc<dyn EdgeStore>` between the dependency service and any
//! read paths. Implementations use interior mutability.
//!
//! # Backends
//!
//! - [`InMemoryEdgeStore`]: ephemeral, for tests and embedding
//! - [`JsonlEdgeStore`]: in-memory table rewritten atomically to a JSONL file
//!   after every write
//! - [`WorkItemCatalog`]: in-memory or JSONL-backed work items

use crate::domain::{DependencyEdge, EdgeId, WorkItem, WorkItemId};
use crate::error::{Error, Result, StorageError};
use async_trait::async_trait;

pub mod in_memory;
pub mod jsonl;
pub mod lock;
pub mod work_items;

pub use in_memory::InMemoryEdgeStore;
pub use jsonl::{JsonlEdgeStore, LoadWarning};
pub use work_items::WorkItemCatalog;

/// Durable storage of dependency edges.
///
/// The store enforces only what it can check locally: no self-loops and no
/// duplicate `(from, to)` pairs. Acyclicity is the dependency service's job,
/// which serializes validate-then-insert.
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// List edges in insertion order.
    ///
    /// With `item`, only edges touching it at either end.
    async fn list(&self, item: Option<&WorkItemId>) -> Result<Vec<DependencyEdge>>;

    /// Get an edge by id.
    async fn get(&self, id: &EdgeId) -> Result<Option<DependencyEdge>>;

    /// Commit an edge.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Constraint`] if the edge is a self-loop or its
    /// pair or id already exists, [`StorageError::Conflict`] if another
    /// writer changed the store since it was last read, and
    /// [`StorageError::Unavailable`] if the write could not be persisted.
    async fn insert(&self, edge: DependencyEdge) -> Result<DependencyEdge>;

    /// Remove an edge, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EdgeNotFound`] if no edge has this id.
    async fn remove(&self, id: &EdgeId) -> Result<DependencyEdge>;

    /// Remove every edge touching `item`, returning them.
    ///
    /// Removing nothing is not an error.
    async fn remove_for_item(&self, item: &WorkItemId) -> Result<Vec<DependencyEdge>>;
}

/// Read access to work item metadata.
#[async_trait]
pub trait WorkItemLookup: Send + Sync {
    /// Get a work item by id.
    async fn get(&self, id: &WorkItemId) -> Result<Option<WorkItem>>;

    /// Every known work item, in a stable order.
    async fn list(&self) -> Result<Vec<WorkItem>>;
}

/// Edge table shared by the in-memory and JSONL stores.
#[derive(Debug, Default)]
pub(crate) struct EdgeTable {
    edges: Vec<DependencyEdge>,
}

impl EdgeTable {
    pub(crate) fn from_edges(edges: Vec<DependencyEdge>) -> Self {
        Self { edges }
    }

    pub(crate) fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    pub(crate) fn list(&self, item: Option<&WorkItemId>) -> Vec<DependencyEdge> {
        match item {
            Some(item) => self
                .edges
                .iter()
                .filter(|edge| edge.touches(item))
                .cloned()
                .collect(),
            None => self.edges.clone(),
        }
    }

    pub(crate) fn get(&self, id: &EdgeId) -> Option<DependencyEdge> {
        self.edges.iter().find(|edge| &edge.id == id).cloned()
    }

    pub(crate) fn insert(&mut self, edge: DependencyEdge) -> Result<()> {
        let violated = |reason: &str| {
            Error::Storage(StorageError::Constraint {
                from: edge.from_id.clone(),
                to: edge.to_id.clone(),
                reason: reason.to_string(),
            })
        };

        if edge.from_id == edge.to_id {
            return Err(violated("self-loop"));
        }
        if self.edges.iter().any(|e| e.pair() == edge.pair()) {
            return Err(violated("pair already exists"));
        }
        if self.edges.iter().any(|e| e.id == edge.id) {
            return Err(violated(&format!("edge id {} already exists", edge.id)));
        }

        self.edges.push(edge);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &EdgeId) -> Result<DependencyEdge> {
        let position = self
            .edges
            .iter()
            .position(|edge| &edge.id == id)
            .ok_or_else(|| Error::EdgeNotFound(id.clone()))?;
        Ok(self.edges.remove(position))
    }

    pub(crate) fn remove_for_item(&mut self, item: &WorkItemId) -> Vec<DependencyEdge> {
        let (removed, kept) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| edge.touches(item));
        self.edges = kept;
        removed
    }
}
