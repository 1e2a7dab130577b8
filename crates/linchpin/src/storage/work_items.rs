//! Work item catalog.
//!
//! Work items belong to the surrounding system; the engine only reads them.
//! [`WorkItemCatalog`] is the catalog the CLI and tests use: an ordered list
//! of items, optionally mirrored to a JSONL file the same way
//! [`JsonlEdgeStore`](super::JsonlEdgeStore) mirrors edges.

use super::jsonl::jsonl_error;
use super::WorkItemLookup;
use crate::domain::{WorkItem, WorkItemId};
use crate::error::{Error, Result, StorageError};
use async_trait::async_trait;
use linchpin_jsonl::{read_jsonl_resilient, write_jsonl_atomic};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ordered work items, optionally persisted.
#[derive(Debug, Clone, Default)]
pub struct WorkItemCatalog {
    items: Arc<RwLock<Vec<WorkItem>>>,
    path: Option<PathBuf>,
}

impl WorkItemCatalog {
    /// In-memory catalog holding `items`.
    ///
    /// Later duplicates of an id are dropped.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = WorkItem>) -> Self {
        Self {
            items: Arc::new(RwLock::new(dedup(items.into_iter().collect()))),
            path: None,
        }
    }

    /// Open a catalog persisted at `path`. A missing file is an empty catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = load_items(&path).await?;
        tracing::debug!(path = %path.display(), items = items.len(), "Loaded work items");

        Ok(Self {
            items: Arc::new(RwLock::new(items)),
            path: Some(path),
        })
    }

    /// Add an item, or replace the item with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the catalog file could not be written.
    pub async fn insert(&self, item: WorkItem) -> Result<()> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        self.persist(&mut items).await
    }

    /// Remove an item, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkItemNotFound`] for an unknown id.
    pub async fn remove(&self, id: &WorkItemId) -> Result<WorkItem> {
        let mut items = self.items.write().await;
        let position = items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| Error::WorkItemNotFound(id.clone()))?;
        let removed = items.remove(position);
        self.persist(&mut items).await?;
        Ok(removed)
    }

    async fn persist(&self, items: &mut Vec<WorkItem>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let Err(e) = write_jsonl_atomic(path, items.as_slice()).await else {
            return Ok(());
        };

        tracing::error!(path = %path.display(), error = %e, "Failed to save work items");
        if let Ok(on_disk) = load_items(path).await {
            *items = on_disk;
        }
        Err(StorageError::Unavailable(format!("could not write {}: {e}", path.display())).into())
    }
}

#[async_trait]
impl WorkItemLookup for WorkItemCatalog {
    async fn get(&self, id: &WorkItemId) -> Result<Option<WorkItem>> {
        Ok(self.items.read().await.iter().find(|item| &item.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<WorkItem>> {
        Ok(self.items.read().await.clone())
    }
}

async fn load_items(path: &Path) -> Result<Vec<WorkItem>> {
    if !tokio::fs::try_exists(path).await? {
        return Ok(Vec::new());
    }
    let (items, warnings) = read_jsonl_resilient::<WorkItem, _>(path)
        .await
        .map_err(jsonl_error)?;
    for warning in &warnings {
        tracing::warn!(path = %path.display(), line = warning.line_number(), "{warning}");
    }
    Ok(dedup(items))
}

fn dedup(items: Vec<WorkItem>) -> Vec<WorkItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            let fresh = seen.insert(item.id.clone());
            if !fresh {
                tracing::warn!(id = %item.id, "Skipping duplicate work item");
            }
            fresh
        })
        .collect()
}
