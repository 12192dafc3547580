//! kanban subtask command implementations.

use serde::Serialize;

use crate::cli::{push_item_summary, stored_epic, StoreOptions};
use crate::error::{Error, Result};
use crate::issue::{Item, ItemId, ItemKind, Status, Subtask};
use crate::output::{emit_success, item_line, HumanOutput, OutputOptions};
use crate::storage::FileBackedManager;

pub struct NewOptions {
    pub epic: ItemId,
    pub name: String,
    pub description: String,
    pub status: Status,
    pub store: StoreOptions,
    pub output: OutputOptions,
}

pub struct ListOptions {
    pub epic: Option<ItemId>,
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

/// A subtask write together with the epic status it produced.
#[derive(Serialize)]
struct SubtaskChange {
    subtask: Subtask,
    epic_status: Status,
}

#[derive(Serialize)]
struct SubtaskListOutput {
    total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    epic: Option<ItemId>,
    subtasks: Vec<Subtask>,
}

#[derive(Serialize)]
struct ClearedOutput {
    removed: usize,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let id = manager.create_subtask(Subtask::new(
        options.epic,
        options.name.trim(),
        options.description,
        options.status,
    ))?;
    let change = change_report(&manager, id)?;

    let mut human = HumanOutput::new(format!("Subtask #{id} created"));
    push_change_summary(&mut human, &change);

    emit_success(options.output, "subtask new", &change, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let manager = options.store.open()?;
    let subtasks = match options.epic {
        Some(epic_id) => manager.subtasks_of_epic(epic_id)?,
        None => manager.subtasks(),
    };

    let mut human = HumanOutput::new("Subtasks");
    human.push_summary("Total", subtasks.len().to_string());
    if let Some(epic_id) = options.epic {
        human.push_summary("Epic", format!("#{epic_id}"));
    }
    for subtask in &subtasks {
        human.push_detail(item_line(&Item::Subtask(subtask.clone())));
    }

    let output = SubtaskListOutput {
        total: subtasks.len(),
        epic: options.epic,
        subtasks,
    };
    emit_success(options.output, "subtask list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let subtask = manager.get_subtask(options.id)?;

    let mut human = HumanOutput::new(format!("Subtask #{}", options.id));
    push_item_summary(&mut human, &Item::Subtask(subtask.clone()));

    emit_success(options.output, "subtask show", &subtask, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let mut subtask = stored_subtask(&manager, options.id)?;
    if let Some(name) = options.name {
        subtask.name = name.trim().to_string();
    }
    if let Some(description) = options.description {
        subtask.description = description;
    }
    if let Some(status) = options.status {
        subtask.status = status;
    }
    manager.update_subtask(subtask)?;
    let change = change_report(&manager, options.id)?;

    let mut human = HumanOutput::new(format!("Subtask #{} updated", options.id));
    push_change_summary(&mut human, &change);

    emit_success(options.output, "subtask edit", &change, Some(&human))
}

pub fn run_status(options: StatusOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    manager.update_subtask_status(options.id, options.status)?;
    let change = change_report(&manager, options.id)?;

    let mut human = HumanOutput::new(format!(
        "Subtask #{} is now {}",
        options.id,
        options.status.label()
    ));
    push_change_summary(&mut human, &change);

    emit_success(options.output, "subtask status", &change, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let subtask = manager.remove_subtask(options.id)?;
    let epic_status = stored_epic(&manager, subtask.epic_id())?.status();
    let change = SubtaskChange {
        subtask,
        epic_status,
    };

    let mut human = HumanOutput::new(format!("Subtask #{} removed", options.id));
    human.push_summary("Name", change.subtask.name.clone());
    human.push_summary(
        format!("Epic #{}", change.subtask.epic_id()),
        change.epic_status.label(),
    );

    emit_success(options.output, "subtask rm", &change, Some(&human))
}

pub fn run_clear(options: ClearOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let removed = manager.clear_subtasks()?;

    let mut human = HumanOutput::new("Subtasks cleared");
    human.push_summary("Removed", removed.to_string());
    human.push_detail("every epic is back to To Do");

    emit_success(options.output, "subtask clear", &ClearedOutput { removed }, Some(&human))
}

fn change_report(manager: &FileBackedManager, id: ItemId) -> Result<SubtaskChange> {
    let subtask = stored_subtask(manager, id)?;
    let epic_status = stored_epic(manager, subtask.epic_id())?.status();
    Ok(SubtaskChange {
        subtask,
        epic_status,
    })
}

fn push_change_summary(human: &mut HumanOutput, change: &SubtaskChange) {
    push_item_summary(human, &Item::Subtask(change.subtask.clone()));
    human.push_summary("Epic status", change.epic_status.label());
}

fn stored_subtask(manager: &FileBackedManager, id: ItemId) -> Result<Subtask> {
    manager
        .manager()
        .store()
        .subtask(id)
        .cloned()
        .ok_or_else(|| Error::not_found(ItemKind::Subtask, id))
}
