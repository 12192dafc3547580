mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestBoard;

#[test]
fn task_new_list_show_round_trip() {
    let board = TestBoard::new();
    let first = board.create(&["task", "new", "Write docs", "-d", "cover the CLI"]);
    let second = board.create(&["task", "new", "Ship", "--status", "in-progress"]);
    assert_eq!((first, second), (1, 2));

    let list = board.json(&["task", "list"]);
    assert_eq!(list["total"], 2);
    assert_eq!(list["tasks"][1]["status"], "IN_PROGRESS");

    let shown = board.json(&["task", "show", "1"]);
    assert_eq!(shown["name"], "Write docs");
    assert_eq!(shown["description"], "cover the CLI");
    assert_eq!(shown["status"], "NEW");
}

#[test]
fn task_list_filters_by_status() {
    let board = TestBoard::new();
    board.create(&["task", "new", "A"]);
    board.create(&["task", "new", "B", "--status", "DONE"]);

    let done = board.json(&["task", "list", "--status", "done"]);
    assert_eq!(done["total"], 1);
    assert_eq!(done["tasks"][0]["name"], "B");
}

#[test]
fn task_edit_changes_only_given_fields() {
    let board = TestBoard::new();
    let id = board.create(&["task", "new", "Draft", "-d", "keep me"]);

    let edited = board.json(&["task", "edit", &id.to_string(), "--name", "Final"]);
    assert_eq!(edited["name"], "Final");
    assert_eq!(edited["description"], "keep me");
    assert_eq!(edited["status"], "NEW");
}

#[test]
fn task_status_and_human_output() {
    let board = TestBoard::new();
    let id = board.create(&["task", "new", "Review"]);

    board
        .cmd()
        .args(["task", "status", &id.to_string(), "IN_PROGRESS"])
        .assert()
        .success()
        .stdout(contains("is now In Progress"));

    let shown = board.json(&["task", "show", &id.to_string()]);
    assert_eq!(shown["status"], "IN_PROGRESS");
}

#[test]
fn task_rm_and_clear() {
    let board = TestBoard::new();
    board.create(&["task", "new", "A"]);
    board.create(&["task", "new", "B"]);
    board.create(&["task", "new", "C"]);

    let removed = board.json(&["task", "rm", "2"]);
    assert_eq!(removed["name"], "B");

    let cleared = board.json(&["task", "clear"]);
    assert_eq!(cleared["removed"], 2);
    assert_eq!(board.json(&["task", "list"])["total"], 0);
}

#[test]
fn ids_continue_across_processes_and_kinds() {
    let board = TestBoard::new();
    assert_eq!(board.create(&["task", "new", "A"]), 1);
    assert_eq!(board.create(&["epic", "new", "B"]), 2);
    assert_eq!(board.create(&["subtask", "new", "2", "C"]), 3);
    assert_eq!(board.create(&["task", "new", "D"]), 4);
}

#[test]
fn missing_task_is_a_user_error() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "show", "42"])
        .assert()
        .code(2)
        .stderr(contains("Task not found: 42"))
        .stderr(contains("hint: kanban task list"));
}

#[test]
fn missing_task_json_error_envelope() {
    let board = TestBoard::new();
    let output = board
        .cmd()
        .args(["task", "rm", "7", "--json"])
        .assert()
        .code(2)
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("json error");
    assert_eq!(value["status"], "error");
    assert_eq!(value["command"], "task rm");
    assert_eq!(value["error"]["code"], 2);
    assert_eq!(value["error"]["kind"], "user_error");
    assert_eq!(value["error"]["details"]["kind"], "task");
    assert_eq!(value["error"]["details"]["id"], 7);
}

#[test]
fn blank_name_is_rejected_without_writing() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["task", "new", "   "])
        .assert()
        .code(2)
        .stderr(contains("name cannot be empty"));
    assert!(!board.data_file().exists());
}

#[test]
fn zero_is_not_an_item_id() {
    let board = TestBoard::new();
    board.create(&["task", "new", "A"]);
    board
        .cmd()
        .args(["task", "show", "0"])
        .assert()
        .code(2)
        .stderr(contains("item id must be between 1 and"));
    board
        .cmd()
        .args(["view", "1", "0"])
        .assert()
        .code(2);
}

#[test]
fn an_epic_id_is_not_a_task() {
    let board = TestBoard::new();
    let epic = board.create(&["epic", "new", "Release"]);
    board
        .cmd()
        .args(["task", "status", &epic.to_string(), "DONE"])
        .assert()
        .code(2);
}

#[test]
fn quiet_suppresses_human_output() {
    let board = TestBoard::new();
    board
        .cmd()
        .args(["--quiet", "task", "new", "Silent"])
        .assert()
        .success()
        .stdout("");
    assert_eq!(board.json(&["task", "list"])["total"], 1);
}
