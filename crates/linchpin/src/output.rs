//! Output formatting for CLI commands.
//!
//! Every printer has a text form (colored with `colored`) and a JSON form
//! for scripts, selected by [`OutputMode`].

use crate::domain::{
    BlockedItem, CriticalPath, DependencyEdge, DependencyGraph, DependencyType, WorkItem,
    WorkItemStatus,
};
use crate::error::join_ids;
use crate::storage::LoadWarning;
use crate::validation::ValidationResult;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Color Helpers
// ============================================================================

fn colorize_id(id: &str) -> String {
    id.cyan().to_string()
}

fn colorize_status(status: WorkItemStatus) -> String {
    let text = status.to_string();
    match status {
        WorkItemStatus::Open => text.white().to_string(),
        WorkItemStatus::InProgress => text.yellow().to_string(),
        WorkItemStatus::Blocked => text.red().to_string(),
        WorkItemStatus::Completed => text.green().to_string(),
        WorkItemStatus::Cancelled => text.dimmed().to_string(),
    }
}

fn type_abbrev(dependency_type: DependencyType) -> &'static str {
    match dependency_type {
        DependencyType::FinishToStart => "FS",
        DependencyType::StartToStart => "SS",
        DependencyType::FinishToFinish => "FF",
        DependencyType::StartToFinish => "SF",
    }
}

fn format_lag(lag_days: i32) -> String {
    match lag_days {
        0 => String::new(),
        lag if lag > 0 => format!(" +{lag}d"),
        lag => format!(" {lag}d"),
    }
}

// ============================================================================
// Public Printers
// ============================================================================

fn emit<T: Serialize + ?Sized>(
    value: &T,
    mode: OutputMode,
    text: impl FnOnce(&mut io::StdoutLock<'static>) -> io::Result<()>,
) -> io::Result<()> {
    let mut handle = io::stdout().lock();
    match mode {
        OutputMode::Text => text(&mut handle),
        OutputMode::Json => write_json(&mut handle, value),
    }
}

/// Print a single edge
pub fn print_edge(edge: &DependencyEdge, mode: OutputMode) -> io::Result<()> {
    emit(edge, mode, |w| write_edge(w, edge))
}

/// Print a list of edges
pub fn print_edges(edges: &[DependencyEdge], mode: OutputMode) -> io::Result<()> {
    emit(edges, mode, |w| write_edges(w, edges))
}

/// Print work items
pub fn print_items(items: &[WorkItem], mode: OutputMode) -> io::Result<()> {
    emit(items, mode, |w| write_items(w, items))
}

/// Print a validation result
pub fn print_validation(result: &ValidationResult, mode: OutputMode) -> io::Result<()> {
    emit(result, mode, |w| write_validation(w, result))
}

/// Print a critical path
pub fn print_critical_path(path: &CriticalPath, mode: OutputMode) -> io::Result<()> {
    emit(path, mode, |w| write_critical_path(w, path))
}

/// Print a dependency graph
pub fn print_graph(graph: &DependencyGraph, mode: OutputMode) -> io::Result<()> {
    emit(graph, mode, |w| write_graph(w, graph))
}

/// Print blocked items
pub fn print_blocked(blocked: &[BlockedItem], mode: OutputMode) -> io::Result<()> {
    emit(blocked, mode, |w| write_blocked(w, blocked))
}

/// Print edge file load warnings to stderr
pub fn print_load_warnings(warnings: &[LoadWarning]) -> io::Result<()> {
    let mut handle = io::stderr().lock();
    for warning in warnings {
        writeln!(handle, "{} {warning}", "warning:".yellow().bold())?;
    }
    Ok(())
}

/// Print a simple message
pub fn print_message(msg: &str) -> io::Result<()> {
    writeln!(io::stdout().lock(), "{msg}")
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> io::Result<()> {
    write_json(&mut io::stdout().lock(), value)
}

fn write_json<W: Write, T: Serialize + ?Sized>(w: &mut W, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(w, "{json}")
}

// ============================================================================
// Text Formatting
// ============================================================================

fn write_edge<W: Write>(w: &mut W, edge: &DependencyEdge) -> io::Result<()> {
    writeln!(
        w,
        "{}  {} {} {}  {}{}",
        colorize_id(edge.id.as_str()),
        edge.from_id,
        "depends on".dimmed(),
        edge.to_id,
        type_abbrev(edge.dependency_type).magenta(),
        format_lag(edge.lag_days)
    )?;
    if let Some(notes) = &edge.notes {
        writeln!(w, "  {} {notes}", "Notes:".dimmed())?;
    }
    Ok(())
}

fn write_edges<W: Write>(w: &mut W, edges: &[DependencyEdge]) -> io::Result<()> {
    if edges.is_empty() {
        return writeln!(w, "No dependencies found.");
    }
    let noun = if edges.len() == 1 { "dependency" } else { "dependencies" };
    writeln!(w, "Found {} {noun}:", edges.len())?;
    writeln!(w)?;
    for edge in edges {
        write_edge(w, edge)?;
    }
    Ok(())
}

fn write_items<W: Write>(w: &mut W, items: &[WorkItem]) -> io::Result<()> {
    if items.is_empty() {
        return writeln!(w, "No work items found.");
    }
    writeln!(w, "Found {} work item(s):", items.len())?;
    writeln!(w)?;
    for item in items {
        write!(
            w,
            "{}  {}  {}d  P{}  {}",
            colorize_id(item.id.as_str()),
            colorize_status(item.status),
            item.duration_days,
            item.priority,
            item.title
        )?;
        if let Some(due) = item.due_date {
            write!(w, "  {} {due}", "due".dimmed())?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_validation<W: Write>(w: &mut W, result: &ValidationResult) -> io::Result<()> {
    if result.is_valid {
        writeln!(w, "{}", "✓ All dependencies are valid".green())?;
    } else {
        writeln!(w, "{}", format!("✗ {} problem(s) found", result.errors.len()).red())?;
    }

    for issue in &result.errors {
        writeln!(
            w,
            "  {} {} -> {}: {}",
            issue.code.to_string().red().bold(),
            issue.from_id,
            issue.to_id,
            issue.message
        )?;
    }
    for warning in &result.warnings {
        writeln!(
            w,
            "  {} {} -> {}: {}",
            "warning".yellow(),
            warning.from_id,
            warning.to_id,
            warning.message
        )?;
    }
    Ok(())
}

fn write_critical_path<W: Write>(w: &mut W, path: &CriticalPath) -> io::Result<()> {
    if path.items.is_empty() {
        return writeln!(w, "No work items to schedule.");
    }
    writeln!(w, "{} {}", "Critical path:".bold(), join_ids(&path.items).cyan())?;
    writeln!(w, "{} {} day(s)", "Span:".dimmed(), path.span_days)
}

fn write_graph<W: Write>(w: &mut W, graph: &DependencyGraph) -> io::Result<()> {
    let nodes: Vec<String> = graph.nodes.iter().map(|n| colorize_id(n.as_str())).collect();
    writeln!(w, "{} {}", "Nodes:".bold(), nodes.join(", "))?;
    if graph.edges.is_empty() {
        return writeln!(w, "{} none", "Edges:".bold());
    }
    writeln!(w, "{}", "Edges (prerequisite -> dependent):".bold())?;
    for edge in &graph.edges {
        writeln!(
            w,
            "  {} -> {}  {}{}",
            edge.to_id,
            edge.from_id,
            type_abbrev(edge.dependency_type).magenta(),
            format_lag(edge.lag_days)
        )?;
    }
    Ok(())
}

fn write_blocked<W: Write>(w: &mut W, blocked: &[BlockedItem]) -> io::Result<()> {
    if blocked.is_empty() {
        return writeln!(w, "No blocked work items.");
    }
    writeln!(w, "Found {} blocked work item(s):", blocked.len())?;
    writeln!(w)?;
    for entry in blocked {
        writeln!(w, "{} {}", "✗".red(), colorize_id(entry.item_id.as_str()))?;
        let blockers: Vec<String> = entry.blockers.iter().map(|b| colorize_id(b.as_str())).collect();
        writeln!(w, "  {} {}", "Waiting on:".dimmed(), blockers.join(", "))?;
    }
    Ok(())
}
