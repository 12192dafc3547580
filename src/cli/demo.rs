//! kanban demo command implementation.
//!
//! Walks an in-memory store through a fixed scenario: two tasks, an epic
//! with two subtasks and an epic with one, status changes checked against
//! the derived epic statuses, then removals and the surviving history.

use serde::Serialize;

use crate::cli::StoreOptions;
use crate::error::{Error, Result};
use crate::issue::{Epic, Item, ItemId, Status, Subtask, Task};
use crate::manager::TaskManager;
use crate::output::{emit_success, item_line, HumanOutput, OutputOptions};

pub struct DemoOptions {
    pub store: StoreOptions,
    pub output: OutputOptions,
}

#[derive(Debug, Serialize)]
struct Snapshot {
    stage: &'static str,
    items: Vec<Item>,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    stages: Vec<Snapshot>,
    history: Vec<Item>,
}

pub fn run(options: DemoOptions) -> Result<()> {
    let config = options.store.load_config()?;
    let mut manager = TaskManager::with_history_limit(config.history.limit);
    let report = walkthrough(&mut manager)?;

    let mut human = HumanOutput::new("kanban demo");
    for stage in &report.stages {
        human.push_detail(format!("{}:", stage.stage));
        for item in &stage.items {
            human.push_detail(format!("  {}", item_line(item)));
        }
    }
    human.push_summary("History", report.history.len().to_string());
    for item in &report.history {
        human.push_summary(item_line(item), "");
    }

    emit_success(options.output, "demo", &report, Some(&human))
}

fn walkthrough(manager: &mut TaskManager) -> Result<DemoReport> {
    let mut stages = Vec::new();

    let first = manager.create_task(Task::new("Task-1", "Task-1", Status::New))?;
    let second = manager.create_task(Task::new("Task-2", "Task-2", Status::New))?;
    let big = manager.create_epic(Epic::new("Epic-3", "Epic-3"))?;
    let big_a = manager.create_subtask(Subtask::new(big, "Subtask-4", "Subtask-4", Status::New))?;
    let big_b = manager.create_subtask(Subtask::new(big, "Subtask-5", "Subtask-5", Status::New))?;
    let small = manager.create_epic(Epic::new("Epic-6", "Epic-6"))?;
    let small_a =
        manager.create_subtask(Subtask::new(small, "Subtask-7", "Subtask-7", Status::New))?;
    stages.push(snapshot("created", manager));

    manager.update_task_status(first, Status::InProgress)?;
    manager.update_task_status(second, Status::Done)?;
    manager.update_subtask_status(big_a, Status::InProgress)?;
    manager.update_subtask_status(big_b, Status::Done)?;
    manager.update_subtask_status(small_a, Status::Done)?;
    stages.push(snapshot("statuses changed", manager));

    expect_status(first, manager.get_task(first)?.status, Status::InProgress)?;
    expect_status(second, manager.get_task(second)?.status, Status::Done)?;
    expect_status(big_a, manager.get_subtask(big_a)?.status, Status::InProgress)?;
    expect_status(big_b, manager.get_subtask(big_b)?.status, Status::Done)?;
    expect_status(small_a, manager.get_subtask(small_a)?.status, Status::Done)?;
    expect_status(big, manager.get_epic(big)?.status(), Status::InProgress)?;
    expect_status(small, manager.get_epic(small)?.status(), Status::Done)?;

    manager.remove_task(second)?;
    manager.remove_subtask(big_b)?;
    manager.remove_epic(big)?;
    stages.push(snapshot("after removals", manager));

    Ok(DemoReport {
        stages,
        history: manager.history(),
    })
}

fn snapshot(stage: &'static str, manager: &TaskManager) -> Snapshot {
    Snapshot {
        stage,
        items: manager.items(),
    }
}

fn expect_status(id: ItemId, actual: Status, expected: Status) -> Result<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(Error::ConsistencyViolation(format!(
            "item {id} is {actual}, expected {expected}"
        )))
    }
}
