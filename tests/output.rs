use kanban::output::{format_human, item_line, HumanOutput};
use kanban::{Item, ItemId, Status, Subtask, Task};

#[test]
fn format_human_includes_sections() {
    let mut human = HumanOutput::new("Task #1 created");
    human.push_summary("Name", "Write docs");
    human.push_detail("#1 [To Do] Write docs (task)");
    human.push_warning("data file was empty");
    human.push_next_step("kanban task list");

    let rendered = format_human(&human);
    assert!(rendered.contains("Task #1 created"));
    assert!(rendered.contains("Summary:"));
    assert!(rendered.contains("- Name: Write docs"));
    assert!(rendered.contains("Details:"));
    assert!(rendered.contains("- #1 [To Do] Write docs (task)"));
    assert!(rendered.contains("Warnings:"));
    assert!(rendered.contains("- data file was empty"));
    assert!(rendered.contains("Next steps:"));
    assert!(rendered.contains("- kanban task list"));
}

#[test]
fn format_human_omits_empty_sections() {
    let human = HumanOutput::new("Tasks cleared");
    assert_eq!(format_human(&human), "Tasks cleared");
}

#[test]
fn item_lines_name_kind_status_and_epic() {
    let task = Item::Task(Task::new("Ship", "", Status::Done).with_id(ItemId::new(1)));
    assert_eq!(item_line(&task), "#1 [Done] Ship (task)");

    let subtask = Item::Subtask(
        Subtask::new(ItemId::new(2), "Tag build", "", Status::InProgress).with_id(ItemId::new(5)),
    );
    assert_eq!(
        item_line(&subtask),
        "#5 [In Progress] Tag build (subtask) in epic #2"
    );

    let unsaved = Item::Task(Task::new("Draft", "", Status::New));
    assert_eq!(item_line(&unsaved), "#- [To Do] Draft (task)");
}
