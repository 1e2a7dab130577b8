//! Domain types for the dependency engine.
//!
//! Work items (tasks and milestones) are owned by an external collaborator; the
//! engine only reads them. Dependency edges are the engine's own data.
//!
//! # Edge Direction Convention
//!
//! An edge points from the **dependent** to the **prerequisite**:
//!
//! - **`from_id`**: the item that waits
//! - **`to_id`**: the item being waited on
//!
//! If milestone B cannot start until task A finishes, the edge is `B -> A` with
//! [`DependencyType::FinishToStart`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Unique identifier for a work item (task or milestone).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkItemId(pub String);

impl WorkItemId {
    /// Create a new work item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a dependency edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A task or milestone as seen by the engine.
///
/// The engine never mutates work items. Only `duration_days`, `due_date` and
/// `status` feed into scheduling and blocked-status math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier
    pub id: WorkItemId,

    /// Display title
    pub title: String,

    /// Current status
    #[serde(default)]
    pub status: WorkItemStatus,

    /// Optional due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,

    /// Estimated duration in whole days (milestones are usually 0)
    #[serde(default)]
    pub duration_days: u32,

    /// Priority level (0 = highest, 4 = lowest)
    #[serde(default = "default_priority")]
    pub priority: u8,
}

fn default_priority() -> u8 {
    2
}

impl WorkItem {
    /// Create an open work item with the given duration and default priority.
    pub fn new(id: impl Into<WorkItemId>, title: impl Into<String>, duration_days: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: WorkItemStatus::Open,
            due_date: None,
            duration_days,
            priority: default_priority(),
        }
    }

    /// Builder-style status override
    #[must_use]
    pub fn with_status(mut self, status: WorkItemStatus) -> Self {
        self.status = status;
        self
    }

    /// Builder-style due date
    #[must_use]
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Status of a work item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    /// Not started
    #[default]
    Open,

    /// Work has started
    InProgress,

    /// Flagged as blocked by its owner
    Blocked,

    /// Finished
    Completed,

    /// Abandoned; never blocks anything and is never blocked
    Cancelled,
}

impl WorkItemStatus {
    /// Whether the item has started (in progress or finished).
    #[must_use]
    pub fn has_started(self) -> bool {
        matches!(self, Self::InProgress | Self::Completed)
    }

    /// Whether the item is finished for scheduling purposes.
    #[must_use]
    pub fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Which lifecycle event of the prerequisite anchors which event of the dependent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    /// Dependent starts after the prerequisite finishes
    #[default]
    FinishToStart,

    /// Dependent starts after the prerequisite starts
    StartToStart,

    /// Dependent finishes after the prerequisite finishes
    FinishToFinish,

    /// Dependent finishes after the prerequisite starts
    StartToFinish,
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FinishToStart => "finish_to_start",
            Self::StartToStart => "start_to_start",
            Self::FinishToFinish => "finish_to_finish",
            Self::StartToFinish => "start_to_finish",
        };
        f.write_str(s)
    }
}

/// A committed dependency between two work items.
///
/// Edges are immutable once stored; changing type or lag means deleting the
/// edge and creating a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    /// Unique edge identifier
    pub id: EdgeId,

    /// The dependent item
    pub from_id: WorkItemId,

    /// The prerequisite item
    pub to_id: WorkItemId,

    /// Anchor semantics
    #[serde(default)]
    pub dependency_type: DependencyType,

    /// Offset in days between the anchor events; negative values express lead time
    #[serde(default)]
    pub lag_days: i32,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Who created the edge
    pub created_by: String,

    /// Free-form notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DependencyEdge {
    /// The ordered `(from, to)` pair that must be unique across the store.
    #[must_use]
    pub fn pair(&self) -> (&WorkItemId, &WorkItemId) {
        (&self.from_id, &self.to_id)
    }

    /// Whether this edge touches `item` at either end.
    #[must_use]
    pub fn touches(&self, item: &WorkItemId) -> bool {
        &self.from_id == item || &self.to_id == item
    }
}

/// Input for creating a dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDependency {
    /// The dependent item
    pub from_id: WorkItemId,

    /// The prerequisite item
    pub to_id: WorkItemId,

    /// Anchor semantics
    pub dependency_type: DependencyType,

    /// Offset in days, negative for lead time
    pub lag_days: i32,

    /// Who is creating the edge
    pub created_by: String,

    /// Free-form notes
    pub notes: Option<String>,
}

impl NewDependency {
    /// A finish-to-start dependency with no lag.
    pub fn new(from_id: impl Into<WorkItemId>, to_id: impl Into<WorkItemId>) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            dependency_type: DependencyType::FinishToStart,
            lag_days: 0,
            created_by: String::from("system"),
            notes: None,
        }
    }

    /// Set the dependency type
    #[must_use]
    pub fn with_type(mut self, dependency_type: DependencyType) -> Self {
        self.dependency_type = dependency_type;
        self
    }

    /// Set the lag in days
    #[must_use]
    pub fn with_lag(mut self, lag_days: i32) -> Self {
        self.lag_days = lag_days;
        self
    }

    /// Set the creator
    #[must_use]
    pub fn created_by(mut self, actor: impl Into<String>) -> Self {
        self.created_by = actor.into();
        self
    }

    /// Attach notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Materialize the input into a stored edge.
    #[must_use]
    pub fn into_edge(self, id: EdgeId, created_at: DateTime<Utc>) -> DependencyEdge {
        DependencyEdge {
            id,
            from_id: self.from_id,
            to_id: self.to_id,
            dependency_type: self.dependency_type,
            lag_days: self.lag_days,
            created_at,
            created_by: self.created_by,
            notes: self.notes,
        }
    }
}

/// A connected slice of the dependency graph, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    /// Every item in the connected component(s)
    pub nodes: BTreeSet<WorkItemId>,

    /// Every edge between those items, in store order
    pub edges: Vec<DependencyEdge>,
}

/// Longest duration-weighted chain through a set of work items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CriticalPath {
    /// Items on the chain, earliest prerequisite first
    pub items: Vec<WorkItemId>,

    /// Day offset at which the last item on the chain finishes
    pub span_days: i64,
}

/// A work item that cannot start yet, with the prerequisites holding it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedItem {
    /// The waiting item
    pub item_id: WorkItemId,

    /// Prerequisites that are not yet far enough along
    pub blockers: Vec<WorkItemId>,
}
