//! Command execution logic.

use anyhow::Result;

use super::args::{
    BlockedArgs, CriticalPathArgs, DepAction, DepArgs, EdgeArgs, GraphArgs, InitArgs, ItemAction,
    ItemArgs, ValidateArgs,
};
use crate::app::App;
use crate::domain::{EdgeId, NewDependency, WorkItem, WorkItemId};
use crate::output::{self, OutputMode};
use crate::storage::WorkItemLookup;

fn to_ids(ids: &[String]) -> Vec<WorkItemId> {
    ids.iter().map(WorkItemId::new).collect()
}

fn to_new_dependency(edge: &EdgeArgs, actor: &str) -> NewDependency {
    NewDependency::new(edge.from.as_str(), edge.to.as_str())
        .with_type(edge.dep_type.into())
        .with_lag(edge.lag)
        .created_by(actor)
}

/// Surface problems found while loading the edges file.
fn report_load_warnings(app: &App) -> Result<()> {
    output::print_load_warnings(app.load_warnings())?;
    Ok(())
}

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;
    let result = init::init(&current_dir, args.actor.as_deref()).await?;

    if !args.quiet {
        println!("Initialized linchpin in {}", result.workspace_dir.display());
        println!("  Config: {}", result.config_file.display());
        println!("  Dependencies: {}", result.edges_file.display());
        println!("  Work items: {}", result.items_file.display());
        println!("  Actor: {}", result.actor);
    }

    Ok(())
}

/// Execute the item command
pub async fn execute_item(app: &App, args: &ItemArgs, output_mode: OutputMode) -> Result<()> {
    report_load_warnings(app)?;

    match &args.action {
        ItemAction::Add {
            id,
            title,
            duration,
            status,
            due,
            priority,
        } => {
            let mut item = WorkItem::new(id.as_str(), title.as_str(), *duration)
                .with_status((*status).into());
            item.due_date = *due;
            item.priority = *priority;

            app.catalog().insert(item.clone()).await?;
            match output_mode {
                OutputMode::Json => output::print_json(&item)?,
                OutputMode::Text => output::print_message(&format!("Saved work item {id}"))?,
            }
        }
        ItemAction::List => {
            let items = app.catalog().list().await?;
            output::print_items(&items, output_mode)?;
        }
        ItemAction::Remove { id } => {
            let id = WorkItemId::new(id.as_str());
            let (item, removed) = app.remove_work_item(&id).await?;
            match output_mode {
                OutputMode::Json => output::print_json(&serde_json::json!({
                    "removed": item,
                    "removed_dependencies": removed,
                }))?,
                OutputMode::Text => output::print_message(&format!(
                    "Removed work item {id} and {} dependenc{}",
                    removed.len(),
                    if removed.len() == 1 { "y" } else { "ies" }
                ))?,
            }
        }
    }

    Ok(())
}

/// Execute the dep command
pub async fn execute_dep(app: &App, args: &DepArgs, output_mode: OutputMode) -> Result<()> {
    report_load_warnings(app)?;
    let service = app.service();

    match &args.action {
        DepAction::Add { edge, notes } => {
            let mut input = to_new_dependency(edge, app.actor());
            if let Some(notes) = notes {
                input = input.with_notes(notes.as_str());
            }
            let edge = service.create_dependency(input).await?;
            match output_mode {
                OutputMode::Json => output::print_edge(&edge, output_mode)?,
                OutputMode::Text => {
                    output::print_message(&format!("Created dependency {}", edge.id))?;
                    output::print_edge(&edge, output_mode)?;
                }
            }
        }
        DepAction::Remove { id } => {
            let removed = service.delete_dependency(&EdgeId::new(id.as_str())).await?;
            match output_mode {
                OutputMode::Json => output::print_edge(&removed, output_mode)?,
                OutputMode::Text => {
                    output::print_message(&format!("Removed dependency {}", removed.id))?;
                }
            }
        }
        DepAction::List { item } => {
            let item = item.as_deref().map(WorkItemId::new);
            let edges = service.list_dependencies(item.as_ref()).await?;
            output::print_edges(&edges, output_mode)?;
        }
        DepAction::Check { edge } => {
            let input = to_new_dependency(edge, app.actor());
            let result = service.preview_dependency(&input).await?;
            output::print_validation(&result, output_mode)?;
        }
    }

    Ok(())
}

/// Execute the validate command
pub async fn execute_validate(app: &App, args: &ValidateArgs, output_mode: OutputMode) -> Result<()> {
    report_load_warnings(app)?;
    let result = app.service().validate_dependencies(&to_ids(&args.ids)).await?;
    output::print_validation(&result, output_mode)?;
    Ok(())
}

/// Execute the critical-path command
pub async fn execute_critical_path(
    app: &App,
    args: &CriticalPathArgs,
    output_mode: OutputMode,
) -> Result<()> {
    report_load_warnings(app)?;
    let path = app.service().get_critical_path(&to_ids(&args.ids)).await?;
    output::print_critical_path(&path, output_mode)?;
    Ok(())
}

/// Execute the graph command
pub async fn execute_graph(app: &App, args: &GraphArgs, output_mode: OutputMode) -> Result<()> {
    report_load_warnings(app)?;
    let graph = app.service().build_dependency_graph(&to_ids(&args.ids)).await?;
    output::print_graph(&graph, output_mode)?;
    Ok(())
}

/// Execute the blocked command
pub async fn execute_blocked(app: &App, _args: &BlockedArgs, output_mode: OutputMode) -> Result<()> {
    report_load_warnings(app)?;
    let blocked = app.service().blocked_items().await?;
    output::print_blocked(&blocked, output_mode)?;
    Ok(())
}
