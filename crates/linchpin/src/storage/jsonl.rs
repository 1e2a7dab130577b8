//! JSONL-backed edge storage.
//!
//! The whole edge table is kept in memory and rewritten to disk with
//! [`linchpin_jsonl::write_jsonl_atomic`] after every successful mutation.
//! If the rewrite fails the in-memory table is reloaded from disk, so memory
//! never runs ahead of the file, and the caller gets
//! [`StorageError::Unavailable`].
//!
//! Several processes may open the same file. Every mutation holds an
//! advisory [`WriteLock`] and re-reads the file first. Removals apply to the
//! fresh contents. An insert whose in-memory view no longer matches the file
//! was validated against stale data: the view is refreshed and the insert
//! fails with [`StorageError::Conflict`] so the caller can re-validate.
//!
//! Loading is resilient. Lines that do not parse, self-loops, repeated pairs
//! or ids, and edges that would close a cycle with the edges before them are
//! skipped and reported as [`LoadWarning`]s.

use super::lock::{lock_path_for, WriteLock, DEFAULT_LOCK_TIMEOUT};
use super::{EdgeStore, EdgeTable};
use crate::domain::{DependencyEdge, EdgeId, WorkItemId};
use crate::error::{Error, Result, StorageError};
use crate::graph::ReachabilityIndex;
use async_trait::async_trait;
use linchpin_jsonl::{read_jsonl_resilient, write_jsonl_atomic, Warning as JsonlWarning};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Non-fatal problems found while loading an edges file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line could not be parsed as an edge; the line is skipped.
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser message
        error: String,
    },

    /// An edge pointed at its own source; the edge is skipped.
    SelfDependency {
        /// The skipped edge
        edge_id: EdgeId,
    },

    /// An edge repeated an earlier id or `(from, to)` pair; the later one is skipped.
    Duplicate {
        /// The skipped edge
        edge_id: EdgeId,
        /// Dependent side
        from: WorkItemId,
        /// Prerequisite side
        to: WorkItemId,
    },

    /// An edge would close a cycle with the edges loaded before it; it is skipped.
    CircularDependency {
        /// The skipped edge
        edge_id: EdgeId,
        /// Dependent side
        from: WorkItemId,
        /// Prerequisite side
        to: WorkItemId,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed edge record: {error}")
            }
            Self::SelfDependency { edge_id } => {
                write!(f, "{edge_id}: self-dependency skipped")
            }
            Self::Duplicate { edge_id, from, to } => {
                write!(f, "{edge_id}: duplicate of an earlier {from} -> {to} edge skipped")
            }
            Self::CircularDependency { edge_id, from, to } => {
                write!(f, "{edge_id}: {from} -> {to} would close a cycle, skipped")
            }
        }
    }
}

/// [`EdgeStore`] persisted to a JSON Lines file.
#[derive(Debug, Clone)]
pub struct JsonlEdgeStore {
    table: Arc<RwLock<EdgeTable>>,
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonlEdgeStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store; the file is created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub async fn open(path: impl Into<PathBuf>) -> Result<(Self, Vec<LoadWarning>)> {
        let path = path.into();
        let (edges, warnings) = load_edges(&path).await?;
        for warning in &warnings {
            tracing::warn!(path = %path.display(), "{warning}");
        }
        tracing::debug!(path = %path.display(), edges = edges.len(), "Loaded dependency edges");

        let store = Self {
            table: Arc::new(RwLock::new(EdgeTable::from_edges(edges))),
            path,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        };
        Ok((store, warnings))
    }

    /// How long a write waits for another process holding the lock.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Discard in-memory state and re-read the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn reload(&self) -> Result<Vec<LoadWarning>> {
        let mut table = self.table.write().await;
        let (edges, warnings) = load_edges(&self.path).await?;
        *table = EdgeTable::from_edges(edges);
        Ok(warnings)
    }

    async fn lock(&self) -> Result<WriteLock> {
        WriteLock::acquire(lock_path_for(&self.path), self.lock_timeout).await
    }

    /// Replace `table` with the file contents. Returns whether they differed.
    async fn refresh(&self, table: &mut EdgeTable) -> Result<bool> {
        let (on_disk, _) = load_edges(&self.path).await?;
        if on_disk.as_slice() == table.edges() {
            return Ok(false);
        }
        tracing::debug!(
            path = %self.path.display(),
            cached = table.edges().len(),
            on_disk = on_disk.len(),
            "Edges file changed by another writer"
        );
        *table = EdgeTable::from_edges(on_disk);
        Ok(true)
    }

    /// Persist `table`, restoring it from disk if the write fails.
    async fn persist(&self, table: &mut EdgeTable) -> Result<()> {
        let Err(e) = write_jsonl_atomic(&self.path, table.edges()).await else {
            return Ok(());
        };

        tracing::error!(path = %self.path.display(), error = %e, "Failed to save dependency edges");
        match load_edges(&self.path).await {
            Ok((edges, _)) => *table = EdgeTable::from_edges(edges),
            Err(reload_error) => {
                tracing::error!(error = %reload_error, "Reload after failed save also failed");
            }
        }
        Err(StorageError::Unavailable(format!(
            "could not write {}: {e}",
            self.path.display()
        ))
        .into())
    }
}

#[async_trait]
impl EdgeStore for JsonlEdgeStore {
    async fn list(&self, item: Option<&WorkItemId>) -> Result<Vec<DependencyEdge>> {
        Ok(self.table.read().await.list(item))
    }

    async fn get(&self, id: &EdgeId) -> Result<Option<DependencyEdge>> {
        Ok(self.table.read().await.get(id))
    }

    async fn insert(&self, edge: DependencyEdge) -> Result<DependencyEdge> {
        let mut table = self.table.write().await;
        let _lock = self.lock().await?;
        if self.refresh(&mut table).await? {
            return Err(StorageError::Conflict {
                from: edge.from_id,
                to: edge.to_id,
                reason: format!("{} changed since it was read", self.path.display()),
            }
            .into());
        }
        table.insert(edge.clone())?;
        self.persist(&mut table).await?;
        Ok(edge)
    }

    async fn remove(&self, id: &EdgeId) -> Result<DependencyEdge> {
        let mut table = self.table.write().await;
        let _lock = self.lock().await?;
        self.refresh(&mut table).await?;
        let removed = table.remove(id)?;
        self.persist(&mut table).await?;
        Ok(removed)
    }

    async fn remove_for_item(&self, item: &WorkItemId) -> Result<Vec<DependencyEdge>> {
        let mut table = self.table.write().await;
        let _lock = self.lock().await?;
        self.refresh(&mut table).await?;
        let removed = table.remove_for_item(item);
        if !removed.is_empty() {
            self.persist(&mut table).await?;
        }
        Ok(removed)
    }
}

pub(crate) fn jsonl_error(e: linchpin_jsonl::Error) -> Error {
    match e {
        linchpin_jsonl::Error::Io(io_err) => Error::Io(io_err),
        linchpin_jsonl::Error::Json { source, .. } => Error::Json(source),
        linchpin_jsonl::Error::InvalidFormat(msg) => StorageError::InvalidFormat(msg).into(),
    }
}

async fn load_edges(path: &Path) -> Result<(Vec<DependencyEdge>, Vec<LoadWarning>)> {
    if !tokio::fs::try_exists(path).await? {
        return Ok((Vec::new(), Vec::new()));
    }

    let (parsed, jsonl_warnings) = read_jsonl_resilient::<DependencyEdge, _>(path)
        .await
        .map_err(jsonl_error)?;

    let mut warnings: Vec<LoadWarning> = jsonl_warnings
        .into_iter()
        .map(|warning| match warning {
            JsonlWarning::MalformedJson { line_number, error } => {
                LoadWarning::MalformedJson { line_number, error }
            }
            JsonlWarning::SkippedLine {
                line_number,
                reason,
            } => LoadWarning::MalformedJson {
                line_number,
                error: reason,
            },
        })
        .collect();

    let mut edges = Vec::with_capacity(parsed.len());
    let mut ids: HashSet<EdgeId> = HashSet::new();
    let mut pairs: HashSet<(WorkItemId, WorkItemId)> = HashSet::new();
    let mut reachability = ReachabilityIndex::build(&[]);

    for edge in parsed {
        if edge.from_id == edge.to_id {
            warnings.push(LoadWarning::SelfDependency { edge_id: edge.id });
            continue;
        }
        if ids.contains(&edge.id) || pairs.contains(&(edge.from_id.clone(), edge.to_id.clone())) {
            warnings.push(LoadWarning::Duplicate {
                edge_id: edge.id,
                from: edge.from_id,
                to: edge.to_id,
            });
            continue;
        }
        if reachability.can_reach(&edge.to_id, &edge.from_id) {
            warnings.push(LoadWarning::CircularDependency {
                edge_id: edge.id,
                from: edge.from_id,
                to: edge.to_id,
            });
            continue;
        }

        reachability.add_edge(&edge.from_id, &edge.to_id);
        ids.insert(edge.id.clone());
        pairs.insert((edge.from_id.clone(), edge.to_id.clone()));
        edges.push(edge);
    }

    Ok((edges, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::dep;
    use tempfile::TempDir;

    #[test]
    fn jsonl_errors_map_onto_engine_errors() {
        let source = serde_json::from_str::<DependencyEdge>("{").unwrap_err();
        let err = jsonl_error(linchpin_jsonl::Error::Json {
            line_number: 3,
            source,
        });
        assert!(matches!(err, Error::Json(_)));

        let err = jsonl_error(linchpin_jsonl::Error::InvalidFormat("bad".to_string()));
        assert!(matches!(err, Error::Storage(StorageError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let (store, warnings) = JsonlEdgeStore::open(dir.path().join("deps.jsonl")).await.unwrap();

        assert!(warnings.is_empty());
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");

        let (store, _) = JsonlEdgeStore::open(&path).await.unwrap();
        store.insert(dep("b", "a")).await.unwrap();
        let doomed = store.insert(dep("c", "b")).await.unwrap();
        store.remove(&doomed.id).await.unwrap();

        let (reopened, warnings) = JsonlEdgeStore::open(&path).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(reopened.list(None).await.unwrap(), vec![dep("b", "a")]);
    }

    #[tokio::test]
    async fn load_skips_corrupt_and_invalid_edges() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");

        let mut dup = dep("b", "a");
        dup.id = EdgeId::new("dep-dupe");
        let lines = [
            serde_json::to_string(&dep("b", "a")).unwrap(),
            "{not json".to_string(),
            serde_json::to_string(&dep("a", "a")).unwrap(),
            serde_json::to_string(&dup).unwrap(),
            serde_json::to_string(&dep("a", "b")).unwrap(),
            serde_json::to_string(&dep("c", "b")).unwrap(),
        ];
        tokio::fs::write(&path, lines.join("\n")).await.unwrap();

        let (store, warnings) = JsonlEdgeStore::open(&path).await.unwrap();

        assert_eq!(warnings.len(), 4);
        assert!(matches!(warnings[0], LoadWarning::MalformedJson { line_number: 2, .. }));
        assert!(matches!(warnings[1], LoadWarning::SelfDependency { .. }));
        assert!(matches!(warnings[2], LoadWarning::Duplicate { .. }));
        assert!(matches!(warnings[3], LoadWarning::CircularDependency { .. }));

        let kept: Vec<_> = store
            .list(None)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.from_id.to_string())
            .collect();
        assert_eq!(kept, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn reload_discards_unsaved_view() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");
        let (store, _) = JsonlEdgeStore::open(&path).await.unwrap();
        store.insert(dep("b", "a")).await.unwrap();

        tokio::fs::write(&path, "").await.unwrap();
        store.reload().await.unwrap();

        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_insert_conflicts_and_refreshes_view() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");
        let (first, _) = JsonlEdgeStore::open(&path).await.unwrap();
        let (second, _) = JsonlEdgeStore::open(&path).await.unwrap();

        first.insert(dep("b", "a")).await.unwrap();
        let err = second.insert(dep("a", "b")).await.unwrap_err();

        assert!(matches!(err, Error::Storage(StorageError::Conflict { .. })));
        assert!(err.is_retryable());
        assert_eq!(second.list(None).await.unwrap(), vec![dep("b", "a")]);

        let (reopened, _) = JsonlEdgeStore::open(&path).await.unwrap();
        assert_eq!(reopened.list(None).await.unwrap(), vec![dep("b", "a")]);
    }

    #[tokio::test]
    async fn removals_apply_to_the_current_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");
        let (first, _) = JsonlEdgeStore::open(&path).await.unwrap();
        let (second, _) = JsonlEdgeStore::open(&path).await.unwrap();

        first.insert(dep("b", "a")).await.unwrap();
        first.insert(dep("c", "b")).await.unwrap();
        let removed = second.remove(&dep("c", "b").id).await.unwrap();
        assert_eq!(removed, dep("c", "b"));

        let (reopened, _) = JsonlEdgeStore::open(&path).await.unwrap();
        assert_eq!(reopened.list(None).await.unwrap(), vec![dep("b", "a")]);
    }

    #[tokio::test]
    async fn held_lock_makes_writes_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");
        let (store, _) = JsonlEdgeStore::open(&path).await.unwrap();
        let store = store.with_lock_timeout(Duration::from_millis(50));

        let held = WriteLock::acquire(lock_path_for(&path), DEFAULT_LOCK_TIMEOUT)
            .await
            .unwrap();
        let err = store.insert(dep("b", "a")).await.unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::Unavailable(_))));
        assert!(store.list(None).await.unwrap().is_empty());

        drop(held);
        store.insert(dep("b", "a")).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_save_restores_disk_state() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("deps.jsonl");
        let (store, _) = JsonlEdgeStore::open(&path).await.unwrap();
        store.insert(dep("b", "a")).await.unwrap();

        // A read-only directory makes the temp file impossible to create.
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();
        let canary = dir.path().join("canary");
        if std::fs::write(&canary, b"x").is_ok() {
            // Running with privileges that ignore permissions; nothing to test.
            std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = store.insert(dep("c", "b")).await;
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = result.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(store.list(None).await.unwrap(), vec![dep("b", "a")]);
    }
}
