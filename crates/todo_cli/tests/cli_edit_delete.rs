use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn todo_command(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_todo"));
    command
        .env("TODOLIST_STORE_PATH", dir.join("todos.json"))
        .env("TODOLIST_CONFIG_PATH", dir.join("config.json"))
        .env_remove("RUST_LOG");
    command
}

fn write_store(dir: &Path, todos: serde_json::Value) {
    let content = serde_json::json!({
        "schema_version": 1,
        "todos": todos
    });
    std::fs::write(
        dir.join("todos.json"),
        serde_json::to_string_pretty(&content).unwrap(),
    )
    .unwrap();
}

fn read_todos(dir: &Path) -> Vec<serde_json::Value> {
    let content = std::fs::read_to_string(dir.join("todos.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&content).unwrap();
    stored["todos"].as_array().cloned().unwrap_or_default()
}

fn seed(dir: &Path) {
    write_store(
        dir,
        serde_json::json!([
            { "id": 1, "text": "buy milk", "completed": false, "startDate": null, "endDate": "2024-06-10" },
            { "id": 2, "text": "walk dog", "completed": true, "startDate": null, "endDate": null }
        ]),
    );
}

#[test]
fn edit_command_updates_fields_in_place() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["edit", "1", "--text", "buy oat milk", "--start", "2024-06-01"])
        .output()
        .expect("failed to run edit command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Updated todo: buy oat milk (1)"));

    let todos = read_todos(dir.path());
    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0]["id"], 1);
    assert_eq!(todos[0]["text"], "buy oat milk");
    assert_eq!(todos[0]["startDate"], "2024-06-01");
    assert_eq!(todos[0]["endDate"], "2024-06-10");
    assert_eq!(todos[1]["text"], "walk dog");
}

#[test]
fn edit_command_clears_date_with_empty_value() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["edit", "1", "--end", ""])
        .output()
        .expect("failed to run edit command");

    assert!(output.status.success());
    let todos = read_todos(dir.path());
    assert!(todos[0]["endDate"].is_null());
}

#[test]
fn edit_command_rejects_blank_text_and_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let before = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();

    let output = todo_command(dir.path())
        .args(["edit", "1", "--text", "   "])
        .output()
        .expect("failed to run edit command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - text is required"));

    let after = std::fs::read_to_string(dir.path().join("todos.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn edit_command_rejects_start_after_end() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["edit", "1", "--start", "2024-06-20"])
        .output()
        .expect("failed to run edit command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("start date must not be after end date"));
    assert!(read_todos(dir.path())[0]["startDate"].is_null());
}

#[test]
fn edit_command_requires_a_field() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["edit", "1"])
        .output()
        .expect("failed to run edit command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - nothing to edit"));
}

#[test]
fn delete_with_yes_removes_todo() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["delete", "1", "--yes"])
        .output()
        .expect("failed to run delete command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted todo: buy milk (1)"));

    let todos = read_todos(dir.path());
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["id"], 2);
}

#[test]
fn delete_without_confirmation_input_is_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["delete", "1"])
        .stdin(Stdio::null())
        .output()
        .expect("failed to run delete command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Are you sure you want to delete this todo item?"));
    assert!(stdout.contains("\"buy milk\""));
    assert!(stdout.contains("Delete cancelled."));
    assert_eq!(read_todos(dir.path()).len(), 2);
}

#[test]
fn delete_confirmed_on_stdin_removes_todo() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let mut child = todo_command(dir.path())
        .args(["delete", "2"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn delete command");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"y\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Deleted todo: walk dog (2)"));

    let todos = read_todos(dir.path());
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["id"], 1);
}

#[test]
fn delete_missing_todo_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["delete", "99", "--yes"])
        .output()
        .expect("failed to run delete command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input - todo not found"));
    assert_eq!(read_todos(dir.path()).len(), 2);
}

#[test]
fn clear_with_yes_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["clear", "--yes"])
        .output()
        .expect("failed to run clear command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cleared 2 todo(s)."));
    assert!(read_todos(dir.path()).is_empty());

    let listed = todo_command(dir.path())
        .args(["list"])
        .output()
        .expect("failed to run list command");
    assert!(String::from_utf8_lossy(&listed.stdout).contains("No todos."));
}

#[test]
fn clear_declined_keeps_todos() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());

    let output = todo_command(dir.path())
        .args(["clear"])
        .stdin(Stdio::null())
        .output()
        .expect("failed to run clear command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("delete all 2 todo item(s)?"));
    assert!(stdout.contains("Clear cancelled."));
    assert_eq!(read_todos(dir.path()).len(), 2);
}
