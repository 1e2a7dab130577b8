//! Application context for CLI command execution.
//!
//! [`App`] opens a workspace: it finds `.linchpin/`, loads the config, opens
//! the JSONL-backed stores and builds a [`DependencyService`] over them.
//!
//! ```no_run
//! use linchpin::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let edges = app.service().list_dependencies(None).await?;
//!     println!("{} dependencies", edges.len());
//!     Ok(())
//! }
//! ```

use crate::commands::init::{find_workspace_root, CONFIG_FILE_NAME, WORKSPACE_DIR_NAME};
use crate::config::WorkspaceConfig;
use crate::domain::{DependencyEdge, WorkItem, WorkItemId};
use crate::error::{ConfigError, Error, Result};
use crate::notify::NoopPublisher;
use crate::service::DependencyService;
use crate::storage::{JsonlEdgeStore, LoadWarning, WorkItemCatalog, WorkItemLookup};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open workspace.
pub struct App {
    service: DependencyService,
    catalog: WorkItemCatalog,
    config: WorkspaceConfig,
    workspace_dir: PathBuf,
    load_warnings: Vec<LoadWarning>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("workspace_dir", &self.workspace_dir)
            .field("actor", &self.config.actor)
            .field("service", &"<DependencyService>")
            .finish_non_exhaustive()
    }
}

impl App {
    /// Open the workspace containing `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - no `.linchpin/` is found in `working_dir` or its parents
    /// - the configuration cannot be loaded
    /// - a data file cannot be read
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root = find_workspace_root(working_dir)
            .ok_or_else(|| ConfigError::NotInitialized(working_dir.display().to_string()))?;
        let workspace_dir = root.join(WORKSPACE_DIR_NAME);
        let config = WorkspaceConfig::load(&workspace_dir.join(CONFIG_FILE_NAME)).await?;

        let (edges, load_warnings) = JsonlEdgeStore::open(config.edges_path(&root)).await?;
        let catalog = WorkItemCatalog::open(config.items_path(&root)).await?;

        // A one-shot CLI process has nobody to notify.
        let service = DependencyService::new(
            Arc::new(edges),
            Arc::new(catalog.clone()),
            Arc::new(NoopPublisher),
            config.engine.clone(),
        )?;

        Ok(Self {
            service,
            catalog,
            config,
            workspace_dir,
            load_warnings,
        })
    }

    /// The dependency service.
    #[must_use]
    pub fn service(&self) -> &DependencyService {
        &self.service
    }

    /// The work item catalog.
    #[must_use]
    pub fn catalog(&self) -> &WorkItemCatalog {
        &self.catalog
    }

    /// Actor recorded on new edges.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.config.actor
    }

    /// The `.linchpin` directory.
    #[must_use]
    pub fn workspace_dir(&self) -> &Path {
        &self.workspace_dir
    }

    /// Remove a work item together with every dependency touching it.
    ///
    /// Edges are cascaded before the item leaves the catalog. If the cascade
    /// cannot be saved, the item stays put and nothing dangles; if the
    /// catalog write fails afterwards, the item merely survives without edges.
    ///
    /// # Errors
    ///
    /// - [`Error::WorkItemNotFound`](crate::error::Error::WorkItemNotFound) for an unknown id
    /// - storage errors from either file
    pub async fn remove_work_item(&self, id: &WorkItemId) -> Result<(WorkItem, Vec<DependencyEdge>)> {
        if self.catalog.get(id).await?.is_none() {
            return Err(Error::WorkItemNotFound(id.clone()));
        }
        let removed_edges = self.service.remove_work_item(id).await?;
        let item = self.catalog.remove(id).await?;
        Ok((item, removed_edges))
    }

    /// Problems found while loading the edges file.
    #[must_use]
    pub fn load_warnings(&self) -> &[LoadWarning] {
        &self.load_warnings
    }
}
