//! CLI argument structs for all commands.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use super::types::{DependencyTypeArg, WorkItemStatusArg};
use super::validators::{validate_edge_id, validate_item_id, validate_title};

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Name recorded as the creator of new dependencies
    #[arg(short, long)]
    pub actor: Option<String>,

    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments for the `item` command
#[derive(Parser, Debug, Clone)]
pub struct ItemArgs {
    /// Work item subcommand
    #[command(subcommand)]
    pub action: ItemAction,
}

/// Work item management actions
#[derive(Subcommand, Debug, Clone)]
pub enum ItemAction {
    /// Add a work item, or replace one with the same ID
    Add {
        /// Work item ID
        #[arg(value_parser = validate_item_id)]
        id: String,

        /// Display title
        #[arg(long, value_parser = validate_title)]
        title: String,

        /// Estimated duration in days
        #[arg(short, long, default_value = "1")]
        duration: u32,

        /// Current status
        #[arg(short, long, value_enum, default_value = "open")]
        status: WorkItemStatusArg,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Priority level (0=highest, 4=lowest)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=4), default_value = "2")]
        priority: u8,
    },

    /// List work items
    List,

    /// Remove a work item and every dependency touching it
    Remove {
        /// Work item ID
        #[arg(value_parser = validate_item_id)]
        id: String,
    },
}

/// Arguments for the `dep` command
#[derive(Parser, Debug, Clone)]
pub struct DepArgs {
    /// Dependency subcommand
    #[command(subcommand)]
    pub action: DepAction,
}

/// Options shared by `dep add` and `dep check`
#[derive(Args, Debug, Clone)]
pub struct EdgeArgs {
    /// The dependent work item
    #[arg(value_parser = validate_item_id)]
    pub from: String,

    /// The prerequisite work item
    #[arg(value_parser = validate_item_id)]
    pub to: String,

    /// Dependency type
    #[arg(short = 't', long = "type", value_enum, default_value = "fs")]
    pub dep_type: DependencyTypeArg,

    /// Lag in days (negative for lead time)
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    pub lag: i32,
}

/// Dependency management actions
#[derive(Subcommand, Debug, Clone)]
pub enum DepAction {
    /// Add a dependency: FROM depends on TO
    Add {
        /// Edge to create
        #[command(flatten)]
        edge: EdgeArgs,

        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Remove a dependency by ID
    Remove {
        /// Dependency ID
        #[arg(value_parser = validate_edge_id)]
        id: String,
    },

    /// List dependencies
    List {
        /// Only dependencies touching this work item
        #[arg(value_parser = validate_item_id)]
        item: Option<String>,
    },

    /// Check whether a dependency would be accepted, without creating it
    Check {
        /// Edge to check
        #[command(flatten)]
        edge: EdgeArgs,
    },
}

/// Arguments for the `validate` command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Limit to dependencies touching these work items (default: all)
    #[arg(value_parser = validate_item_id)]
    pub ids: Vec<String>,
}

/// Arguments for the `critical-path` command
#[derive(Parser, Debug, Clone)]
pub struct CriticalPathArgs {
    /// Work items to schedule (default: all)
    #[arg(value_parser = validate_item_id)]
    pub ids: Vec<String>,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Seed work items
    #[arg(required = true, value_parser = validate_item_id)]
    pub ids: Vec<String>,
}

/// Arguments for the `blocked` command
#[derive(Parser, Debug, Clone)]
pub struct BlockedArgs {}
