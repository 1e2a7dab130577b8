//! Error types for the linchpin dependency engine.
//!
//! Errors fall into two families:
//!
//! - **Validation errors** ([`ValidationError`]): a proposed edge breaks a graph
//!   invariant. These are deterministic for a given graph and must never be
//!   retried automatically.
//! - **Infrastructure errors** ([`StorageError`], I/O): the store could not
//!   complete the request. [`Error::is_retryable`] says whether a retry with
//!   backoff may succeed.

use crate::domain::{EdgeId, WorkItemId};
use crate::id_generation::IdGenerationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// The error type for linchpin operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A proposed dependency was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage backend failure.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dependency edge not found.
    #[error("Dependency not found: {0}")]
    EdgeNotFound(EdgeId),

    /// Work item not found.
    #[error("Work item not found: {0}")]
    WorkItemNotFound(WorkItemId),

    /// No free edge ID could be generated.
    #[error(transparent)]
    IdGeneration(#[from] IdGenerationError),

    /// The stored graph contains a cycle, which write-time validation should
    /// have made impossible.
    #[error("Dependency graph invariant violated: cycle among {}", join_ids(.remaining))]
    GraphInvariant {
        /// Items that could not be topologically ordered.
        remaining: Vec<WorkItemId>,
    },
}

impl Error {
    /// Whether the caller may retry the operation with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Storage(StorageError::Unavailable(_) | StorageError::Conflict { .. })
        )
    }

    /// The validation code, if this is a validation rejection.
    #[must_use]
    pub fn validation_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Validation(e) => Some(e.code),
            _ => None,
        }
    }
}

/// Storage-specific errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store could not be reached or written.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Another writer changed the store between validation and commit.
    #[error("Transaction conflict on {from} -> {to}: {reason}")]
    Conflict {
        /// Dependent side of the conflicting edge.
        from: WorkItemId,
        /// Prerequisite side of the conflicting edge.
        to: WorkItemId,
        /// What collided.
        reason: String,
    },

    /// The edge breaks a store-level constraint (self-loop, repeated pair or id).
    #[error("Constraint violated by {from} -> {to}: {reason}")]
    Constraint {
        /// Dependent side of the rejected edge.
        from: WorkItemId,
        /// Prerequisite side of the rejected edge.
        to: WorkItemId,
        /// Which constraint.
        reason: String,
    },

    /// Persisted data could not be parsed.
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No workspace directory found walking up from the start directory.
    #[error("Not a linchpin workspace (or any parent): {0}")]
    NotInitialized(String),

    /// A workspace already exists.
    #[error("Linchpin is already initialized: found existing '{0}'")]
    AlreadyInitialized(String),

    /// Config file could not be parsed or holds invalid values.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Machine-readable validation failure codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// `from_id == to_id`
    SelfDependency,
    /// The ordered pair already exists
    DuplicateDependency,
    /// An endpoint is not a known work item
    DanglingReference,
    /// The edge would close a cycle
    CircularDependency,
    /// Cycle search hit the traversal bound; rejected conservatively
    DepthLimitExceeded,
}

impl ErrorCode {
    /// The wire form, e.g. `CIRCULAR_DEPENDENCY`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelfDependency => "SELF_DEPENDENCY",
            Self::DuplicateDependency => "DUPLICATE_DEPENDENCY",
            Self::DanglingReference => "DANGLING_REFERENCE",
            Self::CircularDependency => "CIRCULAR_DEPENDENCY",
            Self::DepthLimitExceeded => "DEPTH_LIMIT_EXCEEDED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected dependency, with enough context to explain the rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{code}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Failure code
    pub code: ErrorCode,
    /// Dependent side of the offending edge
    pub from_id: WorkItemId,
    /// Prerequisite side of the offending edge
    pub to_id: WorkItemId,
    /// Human-readable explanation
    pub message: String,
    /// For cycles, the closing chain `from -> to -> ... -> from`
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<WorkItemId>,
}

/// Render ids as `a→b→c`.
pub(crate) fn join_ids(ids: &[WorkItemId]) -> String {
    ids.iter()
        .map(WorkItemId::as_str)
        .collect::<Vec<_>>()
        .join("→")
}

/// A specialized Result type for linchpin operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_infrastructure_errors_are_retryable() {
        let unavailable = Error::Storage(StorageError::Unavailable("disk full".into()));
        let conflict = Error::Storage(StorageError::Conflict {
            from: "b".into(),
            to: "a".into(),
            reason: "edges file changed".into(),
        });
        let constraint = Error::Storage(StorageError::Constraint {
            from: "b".into(),
            to: "a".into(),
            reason: "pair already exists".into(),
        });
        let rejected = Error::Validation(ValidationError {
            code: ErrorCode::SelfDependency,
            from_id: "a".into(),
            to_id: "a".into(),
            message: "a cannot depend on itself".into(),
            path: vec![],
        });

        assert!(unavailable.is_retryable());
        assert!(conflict.is_retryable());
        assert!(!constraint.is_retryable());
        assert!(!rejected.is_retryable());
        assert!(!Error::EdgeNotFound("dep-x".into()).is_retryable());
    }

    #[test]
    fn validation_error_display_leads_with_code() {
        let err = ValidationError {
            code: ErrorCode::CircularDependency,
            from_id: "a".into(),
            to_id: "b".into(),
            message: "would create a cycle through a→b→a".into(),
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(
            err.to_string(),
            "CIRCULAR_DEPENDENCY: would create a cycle through a→b→a"
        );
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::DepthLimitExceeded).unwrap();
        assert_eq!(json, "\"DEPTH_LIMIT_EXCEEDED\"");
    }
}
