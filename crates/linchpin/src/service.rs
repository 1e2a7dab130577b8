//! The dependency service: the single authority for edge writes.
//!
//! [`DependencyService`] ties the collaborators together. It owns no data;
//! edges live in an [`EdgeStore`], work items behind a [`WorkItemLookup`],
//! and change events go to a [`ChangePublisher`], all injected at
//! construction so tests can build isolated instances.
//!
//! # Concurrency
//!
//! Edge creation holds one async writer lock across snapshot, validation
//! and insert. The whole store is treated as a single graph partition, so
//! two racing inserts can never both pass validation against a stale
//! snapshot. Reads take no lock and may observe a slightly stale graph;
//! structural correctness is enforced at write time.
//!
//! Deletes need no serialization for correctness (removing an edge cannot
//! create a cycle). They only take the writer lock briefly to discard the
//! cached reachability index.

use crate::config::EngineConfig;
use crate::domain::{
    BlockedItem, CriticalPath, DependencyEdge, DependencyGraph, EdgeId, NewDependency, WorkItem,
    WorkItemId,
};
use crate::error::{Error, Result, StorageError};
use crate::graph::{self, ReachabilityIndex};
use crate::id_generation::EdgeIdGenerator;
use crate::notify::{ChangeEvent, ChangePublisher};
use crate::storage::{EdgeStore, WorkItemLookup};
use crate::validation::{ItemMap, ValidationResult, ValidationService};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Commit rounds tried when another writer keeps changing the store.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// State guarded by the writer lock.
#[derive(Debug, Default)]
struct WriterState {
    /// Reachability over the last committed snapshot, once the graph is large.
    index: Option<ReachabilityIndex>,
}

/// Dependency graph engine bound to its collaborators.
pub struct DependencyService {
    edges: Arc<dyn EdgeStore>,
    items: Arc<dyn WorkItemLookup>,
    publisher: Arc<dyn ChangePublisher>,
    validator: ValidationService,
    config: EngineConfig,
    writer: Mutex<WriterState>,
}

impl DependencyService {
    /// Build a service over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` holds unusable values.
    pub fn new(
        edges: Arc<dyn EdgeStore>,
        items: Arc<dyn WorkItemLookup>,
        publisher: Arc<dyn ChangePublisher>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            edges,
            items,
            publisher,
            validator: ValidationService::new(&config),
            config,
            writer: Mutex::new(WriterState::default()),
        })
    }

    /// The engine settings in effect.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// List edges, optionally only those touching `item`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_dependencies(&self, item: Option<&WorkItemId>) -> Result<Vec<DependencyEdge>> {
        let edges = self.edges.list(item).await?;
        debug!(item = ?item.map(WorkItemId::as_str), count = edges.len(), "Listed dependencies");
        Ok(edges)
    }

    /// Validate and commit a new dependency.
    ///
    /// Validation and insert happen under the writer lock, so concurrent
    /// creates are judged against each other's results.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] with the failing code when the edge is rejected
    /// - [`Error::Storage`] when the store cannot commit it (retryable)
    ///
    /// A [`StorageError::Conflict`] from the store means another process
    /// committed first; the edge is re-validated against the fresh edges and
    /// the commit retried a bounded number of times.
    pub async fn create_dependency(&self, input: NewDependency) -> Result<DependencyEdge> {
        let mut writer = self.writer.lock().await;

        let mut attempt = 1;
        let edge = loop {
            match self.try_commit(&mut writer, &input).await {
                Err(Error::Storage(StorageError::Conflict { reason, .. }))
                    if attempt < MAX_COMMIT_ATTEMPTS =>
                {
                    debug!(attempt, %reason, "Store changed under us, re-validating");
                    attempt += 1;
                }
                result => break result?,
            }
        };
        drop(writer);

        info!(
            id = %edge.id,
            from = %edge.from_id,
            to = %edge.to_id,
            dependency_type = %edge.dependency_type,
            lag_days = edge.lag_days,
            "Created dependency"
        );
        self.publisher.publish(ChangeEvent::DependencyCreated { edge: edge.clone() });
        Ok(edge)
    }

    /// One snapshot, validate, insert round under the writer lock.
    async fn try_commit(
        &self,
        writer: &mut WriterState,
        input: &NewDependency,
    ) -> Result<DependencyEdge> {
        let snapshot = self.edges.list(None).await?;
        let items = self.endpoint_items(&input.from_id, &input.to_id).await?;

        let result = if self.validator.prefers_index(snapshot.len()) {
            let index = match writer.index.take() {
                Some(index) if index.edge_count() == snapshot.len() => index,
                _ => ReachabilityIndex::build(&snapshot),
            };
            let index = writer.index.insert(index);
            self.validator
                .validate_new_indexed(&snapshot, index, input.into(), &items)
        } else {
            writer.index = None;
            self.validator.validate_new(&snapshot, input.into(), &items)
        };

        log_warnings(&result);
        if let Some(rejection) = result.first_error() {
            debug!(
                from = %input.from_id,
                to = %input.to_id,
                code = %rejection.code,
                "Dependency rejected"
            );
            return Err(rejection.into());
        }

        let mut ids = EdgeIdGenerator::new(snapshot.len());
        for edge in &snapshot {
            ids.register(&edge.id);
        }
        let id = ids.generate(
            input.from_id.as_str(),
            input.to_id.as_str(),
            &input.created_by,
        )?;
        let edge = input.clone().into_edge(id, Utc::now());

        let edge = match self.edges.insert(edge).await {
            Ok(edge) => edge,
            Err(e) => {
                writer.index = None;
                return Err(e);
            }
        };
        if let Some(index) = writer.index.as_mut() {
            index.add_edge(&edge.from_id, &edge.to_id);
        }
        Ok(edge)
    }

    /// Check a dependency without committing it or taking the writer lock.
    ///
    /// The verdict is optimistic feedback only; [`create_dependency`](Self::create_dependency)
    /// re-validates authoritatively.
    ///
    /// # Errors
    ///
    /// Propagates store and lookup failures.
    pub async fn preview_dependency(&self, input: &NewDependency) -> Result<ValidationResult> {
        let snapshot = self.edges.list(None).await?;
        let items = self.endpoint_items(&input.from_id, &input.to_id).await?;
        Ok(self.validator.validate_new(&snapshot, input.into(), &items))
    }

    /// Delete an edge by id, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EdgeNotFound`] for an unknown id.
    pub async fn delete_dependency(&self, id: &EdgeId) -> Result<DependencyEdge> {
        let removed = self.edges.remove(id).await?;
        self.writer.lock().await.index = None;

        info!(id = %removed.id, from = %removed.from_id, to = %removed.to_id, "Deleted dependency");
        self.publisher.publish(ChangeEvent::DependencyDeleted {
            edge_id: removed.id.clone(),
            from_id: removed.from_id.clone(),
            to_id: removed.to_id.clone(),
        });
        Ok(removed)
    }

    /// Re-validate stored edges.
    ///
    /// With an empty `item_ids`, every edge is checked; otherwise only edges
    /// touching one of the given items. Edges are replayed in store order,
    /// each against the ones accepted before it.
    ///
    /// # Errors
    ///
    /// Propagates store and lookup failures.
    pub async fn validate_dependencies(&self, item_ids: &[WorkItemId]) -> Result<ValidationResult> {
        let edges = self.edges.list(None).await?;
        let edges: Vec<DependencyEdge> = if item_ids.is_empty() {
            edges
        } else {
            edges
                .into_iter()
                .filter(|edge| item_ids.iter().any(|id| edge.touches(id)))
                .collect()
        };

        let items: ItemMap = self
            .items
            .list()
            .await?
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let result = self.validator.validate(&edges, &items);
        log_warnings(&result);
        debug!(
            edges = edges.len(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated dependencies"
        );
        Ok(result)
    }

    /// Critical path through the given items, or through every known item
    /// when `item_ids` is empty.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkItemNotFound`] if a requested id is unknown
    /// - [`Error::GraphInvariant`] if the stored edges contain a cycle
    pub async fn get_critical_path(&self, item_ids: &[WorkItemId]) -> Result<CriticalPath> {
        let items = self.resolve_items(item_ids).await?;
        let edges = self.edges.list(None).await?;
        let path = graph::critical_path(&items, &edges)?;
        debug!(items = items.len(), span_days = path.span_days, "Computed critical path");
        Ok(path)
    }

    /// Connected subgraph around the given items.
    ///
    /// With an empty `item_ids` the whole graph is returned: every known item
    /// and every edge.
    ///
    /// # Errors
    ///
    /// Propagates store and lookup failures.
    pub async fn build_dependency_graph(&self, item_ids: &[WorkItemId]) -> Result<DependencyGraph> {
        let edges = self.edges.list(None).await?;
        if !item_ids.is_empty() {
            return Ok(graph::build_subgraph(item_ids, &edges));
        }

        let mut nodes: BTreeSet<WorkItemId> =
            self.items.list().await?.into_iter().map(|item| item.id).collect();
        for edge in &edges {
            nodes.insert(edge.from_id.clone());
            nodes.insert(edge.to_id.clone());
        }
        Ok(DependencyGraph { nodes, edges })
    }

    /// Items that cannot start yet, with what holds each one back.
    ///
    /// # Errors
    ///
    /// Propagates store and lookup failures.
    pub async fn blocked_items(&self) -> Result<Vec<BlockedItem>> {
        let items = self.items.list().await?;
        let edges = self.edges.list(None).await?;
        Ok(graph::find_blocked_items(&items, &edges))
    }

    /// Whether `from` transitively depends on `to`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn is_reachable(&self, from: &WorkItemId, to: &WorkItemId) -> Result<bool> {
        let edges = self.edges.list(None).await?;
        Ok(graph::is_reachable(&edges, from, to))
    }

    /// Cascade-delete the edges of a work item its owner has removed.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn remove_work_item(&self, item: &WorkItemId) -> Result<Vec<DependencyEdge>> {
        let removed = self.edges.remove_for_item(item).await?;
        self.writer.lock().await.index = None;

        info!(item = %item, edges = removed.len(), "Removed work item dependencies");
        self.publisher.publish(ChangeEvent::WorkItemRemoved {
            item_id: item.clone(),
            removed_edges: removed.iter().map(|edge| edge.id.clone()).collect(),
        });
        Ok(removed)
    }

    async fn endpoint_items(&self, from: &WorkItemId, to: &WorkItemId) -> Result<ItemMap> {
        let mut items = ItemMap::new();
        for id in [from, to] {
            if let Some(item) = self.items.get(id).await? {
                items.insert(item.id.clone(), item);
            }
        }
        Ok(items)
    }

    async fn resolve_items(&self, item_ids: &[WorkItemId]) -> Result<Vec<WorkItem>> {
        if item_ids.is_empty() {
            return self.items.list().await;
        }

        let mut items = Vec::with_capacity(item_ids.len());
        for id in item_ids {
            let item = self
                .items
                .get(id)
                .await?
                .ok_or_else(|| Error::WorkItemNotFound(id.clone()))?;
            items.push(item);
        }
        Ok(items)
    }
}

fn log_warnings(result: &ValidationResult) {
    for warning in &result.warnings {
        warn!(from = %warning.from_id, to = %warning.to_id, "{}", warning.message);
    }
}
