//! Integration tests for the linchpin CLI.

use rstest::{fixture, rstest};
use tempfile::TempDir;

mod common;
use common::run_linchpin_in_dir;

/// A temporary directory with an initialized workspace
#[fixture]
fn initialized_dir() -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp directory");
    let output = run_linchpin_in_dir(temp.path(), &["init", "--actor", "tester", "--quiet"]);
    assert!(
        output.status.success(),
        "Failed to initialize linchpin: {:?}",
        String::from_utf8_lossy(&output.stderr)
    );
    temp
}

/// An initialized workspace with the design/build/launch items
#[fixture]
fn planned_dir(initialized_dir: TempDir) -> TempDir {
    for (id, duration) in [("design", "5"), ("build", "10"), ("launch", "1")] {
        let output = run_linchpin_in_dir(
            initialized_dir.path(),
            &["item", "add", id, "--title", id, "--duration", duration],
        );
        assert!(output.status.success());
    }
    initialized_dir
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_cli_help() {
    let temp = TempDir::new().unwrap();
    let output = run_linchpin_in_dir(temp.path(), &["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("linchpin"));
    assert!(stdout.contains("Usage:"));
}

#[test]
fn test_commands_outside_workspace_fail() {
    let temp = TempDir::new().unwrap();
    let output = run_linchpin_in_dir(temp.path(), &["dep", "list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Not a linchpin workspace"));
}

#[rstest]
fn test_init_twice_fails(initialized_dir: TempDir) {
    let output = run_linchpin_in_dir(initialized_dir.path(), &["init"]);
    assert!(!output.status.success());
}

#[rstest]
fn test_dep_add_and_list_json(planned_dir: TempDir) {
    let dir = planned_dir.path();
    let output = run_linchpin_in_dir(
        dir,
        &["--json", "dep", "add", "build", "design", "--lag", "2", "--notes", "after review"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let edge = stdout_json(&output);
    assert_eq!(edge["from_id"], "build");
    assert_eq!(edge["to_id"], "design");
    assert_eq!(edge["lag_days"], 2);
    assert_eq!(edge["created_by"], "tester");

    let listed = stdout_json(&run_linchpin_in_dir(dir, &["dep", "list", "design", "--json"]));
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
}

#[rstest]
fn test_reverse_dep_reports_cycle(planned_dir: TempDir) {
    let dir = planned_dir.path();
    assert!(run_linchpin_in_dir(dir, &["dep", "add", "build", "design"]).status.success());

    let output = run_linchpin_in_dir(dir, &["dep", "add", "design", "build"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CIRCULAR_DEPENDENCY"), "{stderr}");
    assert!(stderr.contains("design→build→design"), "{stderr}");
}

#[rstest]
fn test_dep_check_does_not_write(planned_dir: TempDir) {
    let dir = planned_dir.path();
    let output = run_linchpin_in_dir(dir, &["--json", "dep", "check", "build", "ghost"]);
    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["isValid"], false);
    assert_eq!(result["errors"][0]["code"], "DANGLING_REFERENCE");

    let listed = stdout_json(&run_linchpin_in_dir(dir, &["--json", "dep", "list"]));
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[rstest]
fn test_critical_path_and_blocked(planned_dir: TempDir) {
    let dir = planned_dir.path();
    assert!(run_linchpin_in_dir(dir, &["dep", "add", "build", "design", "-l", "2"]).status.success());
    assert!(run_linchpin_in_dir(dir, &["dep", "add", "launch", "build"]).status.success());

    let path = stdout_json(&run_linchpin_in_dir(dir, &["--json", "critical-path"]));
    assert_eq!(path["items"], serde_json::json!(["design", "build", "launch"]));
    assert_eq!(path["span_days"], 18);

    let text = run_linchpin_in_dir(dir, &["critical-path"]);
    assert!(String::from_utf8_lossy(&text.stdout).contains("design→build→launch"));

    let blocked = stdout_json(&run_linchpin_in_dir(dir, &["--json", "blocked"]));
    assert_eq!(blocked.as_array().map(Vec::len), Some(2));
}

#[rstest]
fn test_item_remove_cascades(planned_dir: TempDir) {
    let dir = planned_dir.path();
    assert!(run_linchpin_in_dir(dir, &["dep", "add", "build", "design"]).status.success());

    let output = run_linchpin_in_dir(dir, &["item", "remove", "design"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 dependency"));

    let validation = stdout_json(&run_linchpin_in_dir(dir, &["--json", "validate"]));
    assert_eq!(validation["isValid"], true);
}

#[rstest]
fn test_graph_of_isolated_item(planned_dir: TempDir) {
    let graph = stdout_json(&run_linchpin_in_dir(
        planned_dir.path(),
        &["--json", "graph", "launch"],
    ));
    assert_eq!(graph["nodes"], serde_json::json!(["launch"]));
    assert_eq!(graph["edges"], serde_json::json!([]));
}
