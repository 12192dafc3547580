//! kanban epic command implementations.
//!
//! Epics have no status of their own to set; every command that shows one
//! reports the status derived from its subtasks.

use serde::Serialize;

use crate::cli::{push_item_summary, stored_epic, StoreOptions};
use crate::error::Result;
use crate::issue::{Epic, Item, ItemId, Status, Subtask};
use crate::output::{emit_success, item_line, HumanOutput, OutputOptions};

pub struct NewOptions {
    pub name: String,
    pub description: String,
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
struct EpicListOutput {
    total: usize,
    epics: Vec<Epic>,
}

#[derive(Serialize)]
struct EpicDetails {
    epic: Epic,
    subtasks: Vec<Subtask>,
}

#[derive(Serialize)]
struct EpicRemovedOutput {
    epic: Epic,
    removed_subtasks: usize,
}

#[derive(Serialize)]
struct ClearedOutput {
    removed: usize,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let id = manager.create_epic(Epic::new(options.name.trim(), options.description))?;
    let epic = stored_epic(&manager, id)?;

    let mut human = HumanOutput::new(format!("Epic #{id} created"));
    push_item_summary(&mut human, &Item::Epic(epic.clone()));
    human.push_next_step(format!("kanban subtask new {id} <name>"));

    emit_success(options.output, "epic new", &epic, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let manager = options.store.open()?;
    let mut epics = manager.epics();
    if let Some(status) = options.status {
        epics.retain(|epic| epic.status() == status);
    }

    let mut human = HumanOutput::new("Epics");
    human.push_summary("Total", epics.len().to_string());
    for epic in &epics {
        human.push_detail(format!(
            "{} ({} subtasks)",
            item_line(&Item::Epic(epic.clone())),
            epic.subtask_count()
        ));
    }

    let output = EpicListOutput {
        total: epics.len(),
        epics,
    };
    emit_success(options.output, "epic list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let epic = manager.get_epic(options.id)?;
    let subtasks = manager.subtasks_of_epic(options.id)?;

    let mut human = HumanOutput::new(format!("Epic #{}", options.id));
    push_item_summary(&mut human, &Item::Epic(epic.clone()));
    human.push_summary("Subtasks", subtasks.len().to_string());
    for subtask in &subtasks {
        human.push_detail(item_line(&Item::Subtask(subtask.clone())));
    }
    if subtasks.is_empty() {
        human.push_next_step(format!("kanban subtask new {} <name>", options.id));
    }

    emit_success(
        options.output,
        "epic show",
        &EpicDetails { epic, subtasks },
        Some(&human),
    )
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let stored = stored_epic(&manager, options.id)?;
    let mut update = Epic::new(stored.name, stored.description).with_id(options.id);
    if let Some(name) = options.name {
        update.name = name.trim().to_string();
    }
    if let Some(description) = options.description {
        update.description = description;
    }
    manager.update_epic(update)?;
    let epic = stored_epic(&manager, options.id)?;

    let mut human = HumanOutput::new(format!("Epic #{} updated", options.id));
    push_item_summary(&mut human, &Item::Epic(epic.clone()));

    emit_success(options.output, "epic edit", &epic, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let epic = manager.remove_epic(options.id)?;
    let removed_subtasks = epic.subtask_count();

    let mut human = HumanOutput::new(format!("Epic #{} removed", options.id));
    human.push_summary("Name", epic.name.clone());
    human.push_summary("Subtasks removed", removed_subtasks.to_string());

    emit_success(
        options.output,
        "epic rm",
        &EpicRemovedOutput {
            epic,
            removed_subtasks,
        },
        Some(&human),
    )
}

pub fn run_clear(options: ClearOptions) -> Result<()> {
    let mut manager = options.store.open()?;
    let removed = manager.clear_epics()?;

    let mut human = HumanOutput::new("Epics cleared");
    human.push_summary("Removed (epics and subtasks)", removed.to_string());

    emit_success(options.output, "epic clear", &ClearedOutput { removed }, Some(&human))
}
