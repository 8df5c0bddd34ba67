use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn todo(dir: &TempDir) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_todo_cli"));
    command
        .env("TODOAPP_STORE_PATH", store_path(dir))
        .env("TODOAPP_CONFIG_PATH", dir.path().join("config.json"));
    command
}

fn store_path(dir: &TempDir) -> PathBuf {
    dir.path().join("tasks.json")
}

fn read_tasks(path: &Path) -> serde_json::Value {
    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    serde_json::from_str(stored["todos"].as_str().expect("todos slot")).unwrap()
}

#[test]
fn add_command_persists_pending_task() {
    let dir = tempfile::tempdir().unwrap();
    let output = todo(&dir)
        .args(["add", "  Buy milk  ", "2025-01-10"])
        .output()
        .expect("failed to run add command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Added task: Buy milk"));
    assert!(stdout.contains("Jan 10, 2025"));

    let tasks = read_tasks(&store_path(&dir));
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["text"], "Buy milk");
    assert_eq!(tasks[0]["date"], "2025-01-10");
    assert_eq!(tasks[0]["completed"], false);
    assert!(tasks[0]["id"].is_i64());
}

#[test]
fn add_command_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = todo(&dir)
        .args(["add", "Pay rent", "2025-01-05", "--json"])
        .output()
        .expect("failed to run add command");

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(payload["text"], "Pay rent");
    assert_eq!(payload["date"], "2025-01-05");
    assert_eq!(payload["due"], "Jan 5, 2025");
    assert_eq!(payload["completed"], false);
}

#[test]
fn add_command_rejects_missing_text() {
    let dir = tempfile::tempdir().unwrap();
    let output = todo(&dir)
        .args(["add"])
        .output()
        .expect("failed to run add command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - text is required"));
    assert!(!store_path(&dir).exists());
}

#[test]
fn add_command_rejects_missing_date() {
    let dir = tempfile::tempdir().unwrap();
    let output = todo(&dir)
        .args(["add", "Buy milk"])
        .output()
        .expect("failed to run add command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - date is required"));
    assert!(!store_path(&dir).exists());
}

#[test]
fn add_command_rejects_malformed_date() {
    let dir = tempfile::tempdir().unwrap();
    let output = todo(&dir)
        .args(["add", "Buy milk", "10/01/2025"])
        .output()
        .expect("failed to run add command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - date must be YYYY-MM-DD"));
}
