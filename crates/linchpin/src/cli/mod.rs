//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Initialize a `.linchpin/` workspace
//! - `item`: Add, list or remove work items
//! - `dep`: Add, remove, list or dry-run dependencies
//! - `validate`: Re-validate stored dependencies
//! - `critical-path`: Compute the critical path
//! - `graph`: Show the connected dependency subgraph of some work items
//! - `blocked`: Show work items waiting on prerequisites
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! linchpin item add design --title "Design review" --duration 5
//! linchpin item add build --title "Build" --duration 10
//! linchpin dep add build design --type fs --lag 2
//! linchpin critical-path
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    BlockedArgs, CriticalPathArgs, DepAction, DepArgs, EdgeArgs, GraphArgs, InitArgs, ItemAction,
    ItemArgs, ValidateArgs,
};
pub use types::{DependencyTypeArg, WorkItemStatusArg};
pub use validators::{validate_edge_id, validate_item_id, validate_title};

/// Linchpin - dependency tracking between milestones and tasks
///
/// Records typed, lagged dependencies between work items, refuses cycles,
/// and computes critical paths. Data lives in `.linchpin/` as JSONL.
#[derive(Parser, Debug)]
#[command(name = "linchpin")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new linchpin workspace
    ///
    /// Creates the `.linchpin/` directory with configuration and empty data files.
    Init(InitArgs),

    /// Manage work items
    Item(ItemArgs),

    /// Manage dependencies between work items
    ///
    /// `dep add FROM TO` records that FROM depends on TO.
    Dep(DepArgs),

    /// Re-validate stored dependencies
    ///
    /// Replays every stored edge (or those touching the given items) and
    /// reports cycles, duplicates and dangling references.
    Validate(ValidateArgs),

    /// Compute the critical path
    ///
    /// Schedules the given work items (default: all) and prints the longest
    /// chain of dependencies with its span in days.
    CriticalPath(CriticalPathArgs),

    /// Show the dependency graph connected to some work items
    Graph(GraphArgs),

    /// Show blocked work items
    ///
    /// Lists work items waiting on unfinished prerequisites, with their blockers.
    Blocked(BlockedArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Linchpin dependency tracker");
            println!("Use --help for more information");
            return Ok(());
        };

        if let Commands::Init(args) = command {
            return execute::execute_init(args).await;
        }

        let app = App::from_directory(&std::env::current_dir()?).await?;
        match command {
            Commands::Init(_) => Ok(()),
            Commands::Item(args) => execute::execute_item(&app, args, output_mode).await,
            Commands::Dep(args) => execute::execute_dep(&app, args, output_mode).await,
            Commands::Validate(args) => execute::execute_validate(&app, args, output_mode).await,
            Commands::CriticalPath(args) => {
                execute::execute_critical_path(&app, args, output_mode).await
            }
            Commands::Graph(args) => execute::execute_graph(&app, args, output_mode).await,
            Commands::Blocked(args) => execute::execute_blocked(&app, args, output_mode).await,
        }
    }
}
