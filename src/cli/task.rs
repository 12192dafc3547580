//! kanban task command implementations.

use serde::Serialize;

use crate::cli::{push_item_summary, StoreOptions};
use crate::error::{Error, Result};
use crate::issue::{Item, ItemId, ItemKind, Status, Task};
use crate::output::{emit_success, item_line, HumanOutput, OutputOptions};
use crate::storage::FileBackedManager;

pub struct NewOptions {
    pub name: String,
    pub description: String,
    pub status: Status,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub status: Option<Status>,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct ShowOptions {
    pub id: ItemId,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct EditOptions {
    pub id: ItemId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<Status>,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct StatusOptions {
    pub id: ItemId,
    pub status: Status,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct RmOptions {
    pub id: ItemId,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct ClearOptions {
    pub store: StoreOptions,
    pub output: OutputOptions,
}

#[derive(Serialize)]
struct TaskListOutput {
    total: usize,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct ClearedOutput {
    removed: usize,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let id = manager.create_task(Task::new(
        options.name.trim(),
        options.description,
        options.status,
    ))?;
    let task = stored_task(&manager, id)?;

    let mut human = HumanOutput::new(format!("Task #{id} created"));
    push_item_summary(&mut human, &Item::Task(task.clone()));
    human.push_next_step(format!("kanban task status {id} IN_PROGRESS"));

    emit_success(options.output, "task new", &task, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let manager = options.store.open()?;
    let mut tasks = manager.tasks();
    if let Some(status) = options.status {
        tasks.retain(|task| task.status == status);
    }

    let mut human = HumanOutput::new("Tasks");
    human.push_summary("Total", tasks.len().to_string());
    if let Some(status) = options.status {
        human.push_summary("Status", status.label());
    }
    for task in &tasks {
        human.push_detail(item_line(&Item::Task(task.clone())));
    }
    if tasks.is_empty() {
        human.push_next_step("kanban task new <name>");
    }

    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    emit_success(options.output, "task list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let task = manager.get_task(options.id)?;

    let mut human = HumanOutput::new(format!("Task #{}", options.id));
    push_item_summary(&mut human, &Item::Task(task.clone()));

    emit_success(options.output, "task show", &task, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let mut task = stored_task(&manager, options.id)?;
    if let Some(name) = options.name {
        task.name = name.trim().to_string();
    }
    if let Some(description) = options.description {
        task.description = description;
    }
    if let Some(status) = options.status {
        task.status = status;
    }
    manager.update_task(task.clone())?;

    let mut human = HumanOutput::new(format!("Task #{} updated", options.id));
    push_item_summary(&mut human, &Item::Task(task.clone()));

    emit_success(options.output, "task edit", &task, Some(&human))
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    manager.update_task_status(options.id, options.status)?;
    let task = stored_task(&manager, options.id)?;

    let mut human = HumanOutput::new(format!(
        "Task #{} is now {}",
        options.id,
        options.status.label()
    ));
    push_item_summary(&mut human, &Item::Task(task.clone()));

    emit_success(options.output, "task status", &task, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let task = manager.remove_task(options.id)?;

    let mut human = HumanOutput::new(format!("Task #{} removed", options.id));
    human.push_summary("Name", task.name.clone());

    emit_success(options.output, "task rm", &task, Some(&human))
}

pub fn run_clear(options: ClearOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let removed = manager.clear_tasks()?;

    let mut human = HumanOutput::new("Tasks cleared");
    human.push_summary("Removed", removed.to_string());

    emit_success(options.output, "task clear", &ClearedOutput { removed }, Some(&human))
}

/// Current state of a task without recording a view.
fn stored_task(manager: &FileBackedManager, id: ItemId) -> Result<Task> {
    manager
        .manager()
        .store()
        .task(id)
        .cloned()
        .ok_or_else(|| Error::not_found(ItemKind::Task, id))
}
