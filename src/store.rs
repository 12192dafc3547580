//! Keyed item collections.
//!
//! Plain storage with no cross-entity rules; [`crate::manager::TaskManager`]
//! enforces those. Collections are ordered by id so scans are deterministic.

use std::collections::BTreeMap;

use crate::issue::{Epic, Item, ItemId, ItemKind, Subtask, Task};

#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    tasks: BTreeMap<ItemId, Task>,
    epics: BTreeMap<ItemId, Epic>,
    subtasks: BTreeMap<ItemId, Subtask>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + self.epics.len() + self.subtasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.kind_of(id).is_some()
    }

    pub fn kind_of(&self, id: ItemId) -> Option<ItemKind> {
        if self.tasks.contains_key(&id) {
            Some(ItemKind::Task)
        } else if self.epics.contains_key(&id) {
            Some(ItemKind::Epic)
        } else if self.subtasks.contains_key(&id) {
            Some(ItemKind::Subtask)
        } else {
            None
        }
    }

    pub fn item(&self, id: ItemId) -> Option<Item> {
        self.tasks
            .get(&id)
            .cloned()
            .map(Item::Task)
            .or_else(|| self.epics.get(&id).cloned().map(Item::Epic))
            .or_else(|| self.subtasks.get(&id).cloned().map(Item::Subtask))
    }

    // =========================================================================
    // Tasks
    // =========================================================================

    pub fn task(&self, id: ItemId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    pub fn task_mut(&mut self, id: ItemId) -> Option<&mut Task> {
        self.tasks.get_mut(&id)
    }

    /// Store `task` under `id`, stamping the id onto it.
    pub fn insert_task(&mut self, id: ItemId, mut task: Task) -> Option<Task> {
        task.assign_id(id);
        self.tasks.insert(id, task)
    }

    pub fn remove_task(&mut self, id: ItemId) -> Option<Task> {
        self.tasks.remove(&id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Remove every task, returning the removed ids.
    pub fn clear_tasks(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.tasks).into_keys().collect()
    }

    // =========================================================================
    // Epics
    // =========================================================================

    pub fn epic(&self, id: ItemId) -> Option<&Epic> {
        self.epics.get(&id)
    }

    pub fn epic_mut(&mut self, id: ItemId) -> Option<&mut Epic> {
        self.epics.get_mut(&id)
    }

    pub fn insert_epic(&mut self, id: ItemId, mut epic: Epic) -> Option<Epic> {
        epic.assign_id(id);
        self.epics.insert(id, epic)
    }

    pub fn remove_epic(&mut self, id: ItemId) -> Option<Epic> {
        self.epics.remove(&id)
    }

    pub fn epics(&self) -> impl Iterator<Item = &Epic> {
        self.epics.values()
    }

    pub fn epics_mut(&mut self) -> impl Iterator<Item = &mut Epic> {
        self.epics.values_mut()
    }

    pub fn epic_ids(&self) -> Vec<ItemId> {
        self.epics.keys().copied().collect()
    }

    pub fn clear_epics(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.epics).into_keys().collect()
    }

    // =========================================================================
    // Subtasks
    // =========================================================================

    pub fn subtask(&self, id: ItemId) -> Option<&Subtask> {
        self.subtasks.get(&id)
    }

    pub fn subtask_mut(&mut self, id: ItemId) -> Option<&mut Subtask> {
        self.subtasks.get_mut(&id)
    }

    pub fn insert_subtask(&mut self, id: ItemId, mut subtask: Subtask) -> Option<Subtask> {
        subtask.assign_id(id);
        self.subtasks.insert(id, subtask)
    }

    pub fn remove_subtask(&mut self, id: ItemId) -> Option<Subtask> {
        self.subtasks.remove(&id)
    }

    pub fn subtasks(&self) -> impl Iterator<Item = &Subtask> {
        self.subtasks.values()
    }

    pub fn clear_subtasks(&mut self) -> Vec<ItemId> {
        std::mem::take(&mut self.subtasks).into_keys().collect()
    }
}
