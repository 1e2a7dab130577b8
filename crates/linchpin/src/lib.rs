//! Linchpin - a dependency graph engine for milestones and tasks.
//!
//! Work items (owned elsewhere) are linked by typed, lagged dependency
//! edges. The engine refuses edges that would close a cycle, re-validates
//! stored edges, derives blocked status, and computes critical paths.
//!
//! The library entry point is [`service::DependencyService`], which combines
//! an [`storage::EdgeStore`], a [`storage::WorkItemLookup`] and a
//! [`notify::ChangePublisher`]. The `linchpin` binary wraps it in a CLI over
//! JSONL files in a `.linchpin/` workspace.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod id_generation;
pub mod notify;
pub mod service;
pub mod storage;
pub mod validation;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

pub mod app;
pub mod output;

pub use config::EngineConfig;
pub use domain::{
    BlockedItem, CriticalPath, DependencyEdge, DependencyGraph, DependencyType, EdgeId,
    NewDependency, WorkItem, WorkItemId, WorkItemStatus,
};
pub use error::{Error, Result};
pub use service::DependencyService;
