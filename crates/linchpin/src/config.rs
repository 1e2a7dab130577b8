//! Configuration for the dependency engine and for on-disk workspaces.
//!
//! Workspaces keep their settings in `.linchpin/config.yaml`:
//!
//! ```yaml
//! actor: alice
//! engine:
//!   max_traversal_depth: 50
//!   reachability_index_threshold: 500
//! storage:
//!   edges_file: .linchpin/dependencies.jsonl
//!   items_file: .linchpin/items.jsonl
//! ```
//!
//! Every engine field has a default, so partial files are fine.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default hop bound for cycle detection.
///
/// A known approximation: candidate edges whose cycle search would need
/// more hops than this are rejected conservatively with
/// `DEPTH_LIMIT_EXCEEDED`. Raise it per workspace when real chains get deep.
pub const DEFAULT_MAX_TRAVERSAL_DEPTH: usize = 50;

/// Edge count at which cycle checks switch to the cached reachability index.
pub const DEFAULT_REACHABILITY_INDEX_THRESHOLD: usize = 500;

/// Buffered change events per subscriber before it is reported as lagging.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;

/// Tunables for the dependency engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum hops explored when searching for a cycle
    pub max_traversal_depth: usize,

    /// Use the cached reachability index once the store holds this many edges
    pub reachability_index_threshold: usize,

    /// Broadcast channel capacity for change notifications
    pub notification_capacity: usize,

    /// Emit non-blocking schedule warnings during validation
    pub lag_warnings: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_traversal_depth: DEFAULT_MAX_TRAVERSAL_DEPTH,
            reachability_index_threshold: DEFAULT_REACHABILITY_INDEX_THRESHOLD,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            lag_warnings: true,
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero depth bound or zero
    /// notification capacity.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_traversal_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_traversal_depth must be at least 1".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::Invalid(
                "notification_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage section of the workspace config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Dependency edges file, relative to the workspace root
    pub edges_file: PathBuf,

    /// Work items file, relative to the workspace root
    pub items_file: PathBuf,
}

/// Contents of `.linchpin/config.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Name recorded as `created_by` on new edges
    pub actor: String,

    /// Engine tunables
    #[serde(default)]
    pub engine: EngineConfig,

    /// Data file locations
    pub storage: StorageConfig,
}

impl WorkspaceConfig {
    /// Config with default engine settings and the standard data file layout.
    pub fn new(actor: &str, workspace_dir_name: &str) -> Self {
        Self {
            actor: actor.to_string(),
            engine: EngineConfig::default(),
            storage: StorageConfig {
                edges_file: Path::new(workspace_dir_name).join("dependencies.jsonl"),
                items_file: Path::new(workspace_dir_name).join("items.jsonl"),
            },
        }
    }

    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or
    /// [`ConfigError::Invalid`] if it does not parse or validate.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.engine.validate()?;
        tracing::debug!(path = %path.display(), actor = %config.actor, "Loaded workspace config");
        Ok(config)
    }

    /// Save configuration to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Absolute path of the edges file for a workspace rooted at `root`.
    #[must_use]
    pub fn edges_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.edges_file)
    }

    /// Absolute path of the work items file for a workspace rooted at `root`.
    #[must_use]
    pub fn items_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.items_file)
    }
}
