//! Task manager facade.
//!
//! [`TaskManager`] owns the item store, the id allocator and the view
//! history, and is the only way callers mutate items. Every mutating call
//! either fully succeeds or returns an error with the store untouched;
//! subtask writes re-derive the owning epic's status before returning, and
//! deletes prune the view history.
//!
//! The manager is single-owner. [`SharedTaskManager`] puts the whole facade
//! behind one mutex for callers that need to share it across threads.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::history::{HistoryCache, DEFAULT_HISTORY_LIMIT};
use crate::id::IdAllocator;
use crate::issue::{Epic, Item, ItemId, ItemKind, Status, Subtask, Task};
use crate::status::aggregate;
use crate::store::ItemStore;

#[derive(Debug, Clone)]
pub struct TaskManager {
    store: ItemStore,
    history: HistoryCache,
    ids: IdAllocator,
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskManager {
    pub fn new() -> Self {
        Self::with_allocator(IdAllocator::new(), DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self::with_allocator(IdAllocator::new(), history_limit)
    }

    pub fn with_allocator(ids: IdAllocator, history_limit: usize) -> Self {
        Self {
            store: ItemStore::new(),
            history: HistoryCache::new(history_limit),
            ids,
        }
    }

    /// Rebuild a manager from stored items.
    ///
    /// Epic subtask sets and epic statuses are reconstructed from the
    /// subtasks' owner links; whatever the epic records carried is ignored.
    /// An item set that could not have come from a manager (missing or
    /// duplicate ids, ids out of range, orphan subtasks) is a
    /// [`Error::ConsistencyViolation`].
    pub fn restore<I>(items: I, history_limit: usize) -> Result<Self>
    where
        I: IntoIterator<Item = Item>,
    {
        let mut manager = Self::with_history_limit(history_limit);
        let mut seen = HashSet::new();
        let mut pending_subtasks = Vec::new();

        for item in items {
            let id = item
                .id()
                .ok_or_else(|| violation(format!("stored {} has no id", item.kind())))?;
            if !seen.insert(id) {
                return Err(violation(format!("duplicate item id {id}")));
            }
            manager
                .ids
                .observe(id)
                .map_err(|_| violation(format!("stored item id {id} is out of range")))?;
            match item {
                Item::Task(task) => {
                    manager.store.insert_task(id, task);
                }
                Item::Epic(mut epic) => {
                    epic.clear_subtask_ids();
                    manager.store.insert_epic(id, epic);
                }
                Item::Subtask(subtask) => pending_subtasks.push((id, subtask)),
            }
        }

        for (id, subtask) in pending_subtasks {
            let epic_id = subtask.epic_id();
            let epic = manager.store.epic_mut(epic_id).ok_or_else(|| {
                violation(format!("subtask {id} references missing epic {epic_id}"))
            })?;
            epic.add_subtask_id(id).map_err(|err| violation(err.to_string()))?;
            manager.store.insert_subtask(id, subtask);
        }

        for epic_id in manager.store.epic_ids() {
            manager.refresh_epic_status(epic_id)?;
        }

        debug!(items = manager.store.len(), "task manager restored");
        Ok(manager)
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn history_cache(&self) -> &HistoryCache {
        &self.history
    }

    /// Id the next create call will receive, unless it is already taken.
    pub fn next_id_hint(&self) -> ItemId {
        self.ids.peek()
    }

    // =========================================================================
    // Create
    // =========================================================================

    pub fn create_task(&mut self, task: Task) -> Result<ItemId> {
        ensure_unassigned(ItemKind::Task, task.id())?;
        validate_name(ItemKind::Task, &task.name)?;

        let id = self.allocate_id()?;
        self.store.insert_task(id, task);
        debug!(%id, "task created");
        Ok(id)
    }

    pub fn create_epic(&mut self, mut epic: Epic) -> Result<ItemId> {
        ensure_unassigned(ItemKind::Epic, epic.id())?;
        validate_name(ItemKind::Epic, &epic.name)?;
        if epic.subtask_count() > 0 {
            return Err(Error::InvalidArgument(
                "a new epic cannot carry subtasks; create them against the epic".to_string(),
            ));
        }

        let id = self.allocate_id()?;
        epic.set_status(Status::New);
        self.store.insert_epic(id, epic);
        debug!(%id, "epic created");
        Ok(id)
    }

    pub fn create_subtask(&mut self, subtask: Subtask) -> Result<ItemId> {
        ensure_unassigned(ItemKind::Subtask, subtask.id())?;
        validate_name(ItemKind::Subtask, &subtask.name)?;
        let epic_id = subtask.epic_id();
        if self.store.epic(epic_id).is_none() {
            return Err(Error::not_found(ItemKind::Epic, epic_id));
        }

        let id = self.allocate_id()?;
        if let Some(epic) = self.store.epic_mut(epic_id) {
            epic.add_subtask_id(id)?;
        }
        self.store.insert_subtask(id, subtask);
        self.refresh_epic_status(epic_id)?;
        debug!(%id, %epic_id, "subtask created");
        Ok(id)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Replace a stored task's fields.
    pub fn update_task(&mut self, task: Task) -> Result<()> {
        let id = ensure_assigned(ItemKind::Task, task.id())?;
        validate_name(ItemKind::Task, &task.name)?;
        let stored = self
            .store
            .task_mut(id)
            .ok_or_else(|| Error::not_found(ItemKind::Task, id))?;
        *stored = task;
        debug!(%id, "task updated");
        Ok(())
    }

    /// Replace a stored epic's name and description. Subtasks and the
    /// derived status are owned by the manager and left as they are.
    pub fn update_epic(&mut self, epic: Epic) -> Result<()> {
        let id = ensure_assigned(ItemKind::Epic, epic.id())?;
        validate_name(ItemKind::Epic, &epic.name)?;
        let stored = self
            .store
            .epic_mut(id)
            .ok_or_else(|| Error::not_found(ItemKind::Epic, id))?;
        stored.name = epic.name;
        stored.description = epic.description;
        debug!(%id, "epic updated");
        Ok(())
    }

    /// Replace a stored subtask's fields and re-derive its epic's status.
    /// The owning epic cannot change.
    pub fn update_subtask(&mut self, subtask: Subtask) -> Result<()> {
        let id = ensure_assigned(ItemKind::Subtask, subtask.id())?;
        validate_name(ItemKind::Subtask, &subtask.name)?;
        let stored_epic = self
            .store
            .subtask(id)
            .map(Subtask::epic_id)
            .ok_or_else(|| Error::not_found(ItemKind::Subtask, id))?;
        if stored_epic != subtask.epic_id() {
            return Err(Error::InvalidArgument(format!(
                "subtask {id} belongs to epic {stored_epic} and cannot move to epic {}",
                subtask.epic_id()
            )));
        }
        self.ensure_epic_links(stored_epic, id)?;

        if let Some(stored) = self.store.subtask_mut(id) {
            *stored = subtask;
        }
        self.refresh_epic_status(stored_epic)?;
        debug!(%id, epic_id = %stored_epic, "subtask updated");
        Ok(())
    }

    pub fn update_task_status(&mut self, id: ItemId, status: Status) -> Result<()> {
        let task = self
            .store
            .task_mut(id)
            .ok_or_else(|| Error::not_found(ItemKind::Task, id))?;
        task.status = status;
        debug!(%id, %status, "task status changed");
        Ok(())
    }

    pub fn update_subtask_status(&mut self, id: ItemId, status: Status) -> Result<()> {
        let epic_id = self
            .store
            .subtask(id)
            .map(Subtask::epic_id)
            .ok_or_else(|| Error::not_found(ItemKind::Subtask, id))?;
        self.ensure_epic_links(epic_id, id)?;

        if let Some(subtask) = self.store.subtask_mut(id) {
            subtask.status = status;
        }
        self.refresh_epic_status(epic_id)?;
        debug!(%id, %status, "subtask status changed");
        Ok(())
    }

    // =========================================================================
    // Remove
    // =========================================================================

    pub fn remove_task(&mut self, id: ItemId) -> Result<Task> {
        let task = self
            .store
            .remove_task(id)
            .ok_or_else(|| Error::not_found(ItemKind::Task, id))?;
        self.history.forget(id);
        debug!(%id, "task removed");
        Ok(task)
    }

    /// Remove a subtask, unlink it from its epic and re-derive the epic.
    pub fn remove_subtask(&mut self, id: ItemId) -> Result<Subtask> {
        let epic_id = self
            .store
            .subtask(id)
            .map(Subtask::epic_id)
            .ok_or_else(|| Error::not_found(ItemKind::Subtask, id))?;
        self.ensure_epic_links(epic_id, id)?;

        if let Some(epic) = self.store.epic_mut(epic_id) {
            epic.remove_subtask_id(id)?;
        }
        let subtask = self
            .store
            .remove_subtask(id)
            .ok_or_else(|| violation(format!("subtask {id} vanished during removal")))?;
        self.history.forget(id);
        self.refresh_epic_status(epic_id)?;
        debug!(%id, %epic_id, "subtask removed");
        Ok(subtask)
    }

    /// Remove an epic together with every subtask it owns.
    pub fn remove_epic(&mut self, id: ItemId) -> Result<Epic> {
        let epic = self
            .store
            .epic(id)
            .ok_or_else(|| Error::not_found(ItemKind::Epic, id))?;
        for subtask_id in epic.subtask_ids() {
            if self.store.subtask(subtask_id).is_none() {
                return Err(violation(format!(
                    "epic {id} references missing subtask {subtask_id}"
                )));
            }
        }

        let epic = self
            .store
            .remove_epic(id)
            .ok_or_else(|| Error::not_found(ItemKind::Epic, id))?;
        for subtask_id in epic.subtask_ids() {
            self.store.remove_subtask(subtask_id);
            self.history.forget(subtask_id);
        }
        self.history.forget(id);
        debug!(%id, subtasks = epic.subtask_count(), "epic removed");
        Ok(epic)
    }

    // =========================================================================
    // Read by id (records history)
    // =========================================================================

    pub fn get_task(&mut self, id: ItemId) -> Result<Task> {
        let task = self
            .store
            .task(id)
            .cloned()
            .ok_or_else(|| Error::not_found(ItemKind::Task, id))?;
        self.history.record(Item::Task(task.clone()))?;
        Ok(task)
    }

    pub fn get_epic(&mut self, id: ItemId) -> Result<Epic> {
        let epic = self
            .store
            .epic(id)
            .cloned()
            .ok_or_else(|| Error::not_found(ItemKind::Epic, id))?;
        self.history.record(Item::Epic(epic.clone()))?;
        Ok(epic)
    }

    pub fn get_subtask(&mut self, id: ItemId) -> Result<Subtask> {
        let subtask = self
            .store
            .subtask(id)
            .cloned()
            .ok_or_else(|| Error::not_found(ItemKind::Subtask, id))?;
        self.history.record(Item::Subtask(subtask.clone()))?;
        Ok(subtask)
    }

    /// Look up an item of any kind.
    pub fn get_item(&mut self, id: ItemId) -> Result<Item> {
        let item = self.store.item(id).ok_or(Error::ItemNotFound(id))?;
        self.history.record(item.clone())?;
        Ok(item)
    }

    // =========================================================================
    // Scans (no history)
    // =========================================================================

    pub fn tasks(&self) -> Vec<Task> {
        self.store.tasks().cloned().collect()
    }

    pub fn epics(&self) -> Vec<Epic> {
        self.store.epics().cloned().collect()
    }

    pub fn subtasks(&self) -> Vec<Subtask> {
        self.store.subtasks().cloned().collect()
    }

    pub fn subtasks_of_epic(&self, epic_id: ItemId) -> Result<Vec<Subtask>> {
        let epic = self
            .store
            .epic(epic_id)
            .ok_or_else(|| Error::not_found(ItemKind::Epic, epic_id))?;
        epic.subtask_ids()
            .map(|subtask_id| {
                self.store.subtask(subtask_id).cloned().ok_or_else(|| {
                    violation(format!(
                        "epic {epic_id} references missing subtask {subtask_id}"
                    ))
                })
            })
            .collect()
    }

    /// Every stored item: tasks, then epics, then subtasks, each by id.
    pub fn items(&self) -> Vec<Item> {
        self.store
            .tasks()
            .cloned()
            .map(Item::Task)
            .chain(self.store.epics().cloned().map(Item::Epic))
            .chain(self.store.subtasks().cloned().map(Item::Subtask))
            .collect()
    }

    /// Viewed snapshots, oldest first.
    pub fn history(&self) -> Vec<Item> {
        self.history.list()
    }

    // =========================================================================
    // Bulk clear
    // =========================================================================

    /// Remove every task. Returns how many were removed.
    pub fn clear_tasks(&mut self) -> usize {
        let removed = self.store.clear_tasks();
        self.forget_all(&removed);
        debug!(count = removed.len(), "tasks cleared");
        removed.len()
    }

    /// Remove every subtask; every epic drops back to `NEW`.
    pub fn clear_subtasks(&mut self) -> usize {
        let removed = self.store.clear_subtasks();
        self.forget_all(&removed);
        for epic in self.store.epics_mut() {
            epic.clear_subtask_ids();
            epic.set_status(Status::New);
        }
        debug!(count = removed.len(), "subtasks cleared");
        removed.len()
    }

    /// Remove every epic and, with them, every subtask.
    pub fn clear_epics(&mut self) -> usize {
        let subtasks = self.store.clear_subtasks();
        let epics = self.store.clear_epics();
        self.forget_all(&subtasks);
        self.forget_all(&epics);
        debug!(
            epics = epics.len(),
            subtasks = subtasks.len(),
            "epics cleared"
        );
        epics.len() + subtasks.len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn allocate_id(&mut self) -> Result<ItemId> {
        let store = &self.store;
        self.ids.allocate(|id| store.contains(id))
    }

    fn forget_all(&mut self, ids: &[ItemId]) {
        for id in ids {
            self.history.forget(*id);
        }
    }

    /// Check that `epic_id` exists and lists `subtask_id`.
    fn ensure_epic_links(&self, epic_id: ItemId, subtask_id: ItemId) -> Result<()> {
        match self.store.epic(epic_id) {
            Some(epic) if epic.contains_subtask(subtask_id) => Ok(()),
            Some(_) => Err(violation(format!(
                "epic {epic_id} does not list its subtask {subtask_id}"
            ))),
            None => Err(violation(format!(
                "subtask {subtask_id} references missing epic {epic_id}"
            ))),
        }
    }

    /// Recompute an epic's status from its current subtasks.
    fn refresh_epic_status(&mut self, epic_id: ItemId) -> Result<()> {
        let epic = self
            .store
            .epic(epic_id)
            .ok_or_else(|| violation(format!("epic {epic_id} is missing")))?;

        let mut statuses = Vec::with_capacity(epic.subtask_count());
        for subtask_id in epic.subtask_ids() {
            let subtask = self.store.subtask(subtask_id).ok_or_else(|| {
                violation(format!(
                    "epic {epic_id} references missing subtask {subtask_id}"
                ))
            })?;
            if subtask.epic_id() != epic_id {
                return Err(violation(format!(
                    "subtask {subtask_id} is listed by epic {epic_id} but owned by epic {}",
                    subtask.epic_id()
                )));
            }
            statuses.push(subtask.status);
        }

        let status = aggregate(statuses);
        if let Some(epic) = self.store.epic_mut(epic_id) {
            epic.set_status(status);
        }
        Ok(())
    }
}

fn violation(message: String) -> Error {
    error!(%message, "consistency violation");
    Error::ConsistencyViolation(message)
}

fn ensure_unassigned(kind: ItemKind, id: Option<ItemId>) -> Result<()> {
    match id {
        Some(id) => Err(Error::InvalidArgument(format!(
            "new {} already has id {id}",
            kind.to_string().to_lowercase()
        ))),
        None => Ok(()),
    }
}

fn ensure_assigned(kind: ItemKind, id: Option<ItemId>) -> Result<ItemId> {
    id.ok_or_else(|| {
        Error::InvalidArgument(format!(
            "{} has no id",
            kind.to_string().to_lowercase()
        ))
    })
}

fn validate_name(kind: ItemKind, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{} name cannot be empty",
            kind.to_string().to_lowercase()
        )));
    }
    Ok(())
}

/// A [`TaskManager`] behind a single coarse lock.
///
/// Each closure passed to [`SharedTaskManager::with`] runs with exclusive
/// access, so a subtask write and its epic refresh are observed together.
#[derive(Debug, Clone, Default)]
pub struct SharedTaskManager {
    inner: Arc<Mutex<TaskManager>>,
}

impl SharedTaskManager {
    pub fn new(manager: TaskManager) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    pub fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskManager) -> Result<T>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| Error::OperationFailed("task manager lock poisoned".to_string()))?;
        f(&mut guard)
    }
}
