//! Implementation of the `init` command.
//!
//! Creates the `.linchpin/` workspace directory with a configuration file,
//! empty edge and work item files, and a `.gitignore`.

use crate::config::WorkspaceConfig;
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Actor recorded on new edges when none is given
pub const DEFAULT_ACTOR: &str = "linchpin";

/// Name of the workspace directory
pub const WORKSPACE_DIR_NAME: &str = ".linchpin";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the gitignore file within the workspace directory
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum actor name length
pub const MAX_ACTOR_LENGTH: usize = 64;

/// Maximum number of parent directories searched for a workspace
pub const MAX_PARENT_SEARCH_DEPTH: usize = 256;

/// Paths created by [`init`]
#[derive(Debug)]
pub struct InitResult {
    /// The workspace directory
    pub workspace_dir: PathBuf,
    /// The config file
    pub config_file: PathBuf,
    /// The dependency edges file
    pub edges_file: PathBuf,
    /// The work items file
    pub items_file: PathBuf,
    /// The gitignore file
    pub gitignore_file: PathBuf,
    /// Actor written to the config
    pub actor: String,
}

/// Validate an actor name.
///
/// Expects trimmed input: 1-64 characters, no whitespace or control characters.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] describing the first problem found.
pub fn validate_actor(actor: &str) -> Result<()> {
    if actor.is_empty() {
        return Err(ConfigError::Invalid("Actor cannot be empty".to_string()).into());
    }
    if actor.chars().count() > MAX_ACTOR_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "Actor cannot exceed {MAX_ACTOR_LENGTH} characters"
        ))
        .into());
    }
    if actor.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(
            ConfigError::Invalid("Actor cannot contain whitespace".to_string()).into(),
        );
    }
    Ok(())
}

/// Initialize a workspace in `base_dir`.
///
/// # Errors
///
/// Returns an error if:
/// - `.linchpin/` already exists
/// - the actor is invalid
/// - file system operations fail
pub async fn init(base_dir: &Path, actor: Option<&str>) -> Result<InitResult> {
    let actor = actor.unwrap_or(DEFAULT_ACTOR).trim();
    validate_actor(actor)?;

    let workspace_dir = base_dir.join(WORKSPACE_DIR_NAME);
    if fs::try_exists(&workspace_dir).await? {
        return Err(ConfigError::AlreadyInitialized(WORKSPACE_DIR_NAME.to_string()).into());
    }
    fs::create_dir_all(&workspace_dir).await?;

    let config = WorkspaceConfig::new(actor, WORKSPACE_DIR_NAME);
    let config_file = workspace_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    let edges_file = config.edges_path(base_dir);
    let items_file = config.items_path(base_dir);
    fs::write(&edges_file, "").await?;
    fs::write(&items_file, "").await?;

    let gitignore_file = workspace_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# Temp files left behind by an interrupted atomic write
*.tmp
# Advisory write locks
*.lock
";
    fs::write(&gitignore_file, gitignore_content).await?;

    tracing::info!(path = %workspace_dir.display(), actor, "Initialized workspace");

    Ok(InitResult {
        workspace_dir,
        config_file,
        edges_file,
        items_file,
        gitignore_file,
        actor: actor.to_string(),
    })
}

/// Find the directory containing `.linchpin/`, walking up from `start_dir`.
#[must_use]
pub fn find_workspace_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(WORKSPACE_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_PARENT_SEARCH_DEPTH || !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::simple("alice")]
    #[case::email("bob@example.com")]
    #[case::max_length("a".repeat(64))]
    fn valid_actors(#[case] actor: impl AsRef<str>) {
        assert!(validate_actor(actor.as_ref()).is_ok());
    }

    #[rstest]
    #[case::empty("", "empty")]
    #[case::too_long("a".repeat(65), "exceed")]
    #[case::space("two words", "whitespace")]
    fn invalid_actors(#[case] actor: impl AsRef<str>, #[case] expected: &str) {
        let err = validate_actor(actor.as_ref()).unwrap_err().to_string().to_lowercase();
        assert!(err.contains(expected), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn init_creates_workspace_files() {
        let dir = TempDir::new().unwrap();
        let result = init(dir.path(), Some("alice")).await.unwrap();

        assert!(result.workspace_dir.is_dir());
        assert!(result.config_file.is_file());
        assert!(result.edges_file.is_file());
        assert!(result.items_file.is_file());
        assert!(result.gitignore_file.is_file());
        let ignored = std::fs::read_to_string(&result.gitignore_file).unwrap();
        assert!(ignored.lines().any(|l| l == "*.lock"));

        let config = WorkspaceConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config.actor, "alice");
        assert_eq!(config.engine.max_traversal_depth, 50);
    }

    #[tokio::test]
    async fn init_twice_fails() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), None).await.unwrap();

        let result = init(dir.path(), None).await;
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::AlreadyInitialized(_)))
        ));
    }

    #[tokio::test]
    async fn root_is_found_from_nested_directory() {
        let dir = TempDir::new().unwrap();
        init(dir.path(), None).await.unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_workspace_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn missing_workspace_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(find_workspace_root(dir.path()).is_none());
    }
}
