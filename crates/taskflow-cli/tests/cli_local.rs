//! CLI end-to-end tests against the local store.
//!
//! Each test points HOME at a temporary directory so config and data stay
//! isolated.

use std::path::Path;
use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_taskflow"))
        .args(args)
        .env("HOME", home)
        .env_remove("TASKFLOW_ENV")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run taskflow");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);
    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "taskflow {args:?} failed: {stderr}");
    stdout
}

fn run_json(home: &Path, args: &[&str]) -> Value {
    serde_json::from_str(&run_ok(home, args)).expect("output is not JSON")
}

/// `Task created: <id>` / `Event created: <id>` on the first line.
fn created_id(stdout: &str) -> String {
    let first = stdout.lines().next().unwrap_or_default();
    first.rsplit(' ').next().unwrap_or_default().to_string()
}

#[test]
fn task_add_list_and_status() {
    let home = TempDir::new().unwrap();
    let out = run_ok(
        home.path(),
        &["task", "add", "Write docs", "--priority", "high", "--assignee", "Ana"],
    );
    let id = created_id(&out);
    assert_eq!(id.len(), 36);

    run_ok(home.path(), &["task", "add", "Tidy desk", "--priority", "low"]);

    let tasks = run_json(home.path(), &["task", "list", "--sort", "priority", "--json"]);
    let titles: Vec<_> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Write docs", "Tidy desk"]);

    let filtered = run_json(home.path(), &["task", "list", "--assignee", "ana", "--json"]);
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    run_ok(home.path(), &["task", "status", &id, "completed"]);
    let shown = run_json(home.path(), &["task", "show", &id]);
    assert_eq!(shown["status"], "completed");
}

#[test]
fn blank_title_fails_with_message() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["task", "add", "   "]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error: "), "stderr: {stderr}");
    assert!(stderr.contains("Task title cannot be empty"));
}

#[test]
fn unknown_id_is_reported() {
    let home = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["task", "delete", "missing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Task not found: missing"), "stderr: {stderr}");
}

#[test]
fn events_on_a_date_and_conflicts() {
    let home = TempDir::new().unwrap();
    let out = run_ok(
        home.path(),
        &[
            "event", "add", "Standup", "--date", "2030-01-10", "--start", "09:00", "--end", "09:30",
        ],
    );
    let id = created_id(&out);

    let (_, stderr, code) = run_cli(
        home.path(),
        &[
            "event", "add", "Sync", "--date", "2030-01-10", "--start", "09:15", "--end", "10:00",
        ],
    );
    assert_eq!(code, 0);
    assert!(stderr.contains("warning: overlaps"), "stderr: {stderr}");

    let day = run_json(home.path(), &["event", "list", "--date", "2030-01-10", "--json"]);
    let day = day.as_array().unwrap();
    assert_eq!(day.len(), 2);
    assert_eq!(day[0]["title"], "Standup");
    assert_eq!(day[0]["color"], "hsl(260, 70%, 55%)");

    let clashes = run_ok(
        home.path(),
        &[
            "event", "conflicts", "--date", "2030-01-10", "--start", "09:00", "--end", "09:10",
            "--exclude", &id,
        ],
    );
    assert!(clashes.contains("No events found"));

    let (_, stderr, code) = run_cli(
        home.path(),
        &["event", "update", &id, "--start", "11:00"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid time range"), "stderr: {stderr}");
}

#[test]
fn config_round_trip() {
    let home = TempDir::new().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "get", "provider.mode"]).trim(), "local");
    run_ok(home.path(), &["config", "set", "calendar.upcoming_days", "14"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "calendar.upcoming_days"]).trim(), "14");

    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "no.such_key", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key"));
}

#[test]
fn storage_stats_and_clear() {
    let home = TempDir::new().unwrap();
    run_ok(home.path(), &["task", "add", "One"]);
    run_ok(home.path(), &["storage", "set-setting", "theme", "dark"]);

    let stats = run_json(home.path(), &["storage", "stats", "--json"]);
    let items = stats["items"].as_array().unwrap();
    assert_eq!(items[0]["key"], "taskflow_tasks");
    assert_eq!(items[0]["itemCount"], 1);
    assert!(stats["total"].as_u64().unwrap() > 0);

    let (_, _, code) = run_cli(home.path(), &["storage", "clear"]);
    assert_eq!(code, 1);
    run_ok(home.path(), &["storage", "clear", "--yes"]);
    let tasks = run_json(home.path(), &["task", "list", "--json"]);
    assert!(tasks.as_array().unwrap().is_empty());
}
