//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::{DependencyType, WorkItemStatus};

/// Dependency type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyTypeArg {
    /// Dependent starts after the prerequisite finishes
    #[default]
    #[value(name = "fs", aliases = ["finish-to-start", "finish_to_start"])]
    FinishToStart,
    /// Dependent starts after the prerequisite starts
    #[value(name = "ss", aliases = ["start-to-start", "start_to_start"])]
    StartToStart,
    /// Dependent finishes after the prerequisite finishes
    #[value(name = "ff", aliases = ["finish-to-finish", "finish_to_finish"])]
    FinishToFinish,
    /// Dependent finishes after the prerequisite starts
    #[value(name = "sf", aliases = ["start-to-finish", "start_to_finish"])]
    StartToFinish,
}

impl From<DependencyTypeArg> for DependencyType {
    fn from(arg: DependencyTypeArg) -> Self {
        match arg {
            DependencyTypeArg::FinishToStart => Self::FinishToStart,
            DependencyTypeArg::StartToStart => Self::StartToStart,
            DependencyTypeArg::FinishToFinish => Self::FinishToFinish,
            DependencyTypeArg::StartToFinish => Self::StartToFinish,
        }
    }
}

/// Work item status for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkItemStatusArg {
    /// Not started
    #[default]
    Open,
    /// Work has started
    #[value(name = "in_progress", alias = "in-progress")]
    InProgress,
    /// Flagged as blocked
    Blocked,
    /// Finished
    Completed,
    /// Abandoned
    Cancelled,
}

impl From<WorkItemStatusArg> for WorkItemStatus {
    fn from(arg: WorkItemStatusArg) -> Self {
        match arg {
            WorkItemStatusArg::Open => Self::Open,
            WorkItemStatusArg::InProgress => Self::InProgress,
            WorkItemStatusArg::Blocked => Self::Blocked,
            WorkItemStatusArg::Completed => Self::Completed,
            WorkItemStatusArg::Cancelled => Self::Cancelled,
        }
    }
}
