//! Work item model.
//!
//! Three item kinds share a common record (id, name, description, status):
//! standalone [`Task`]s, [`Epic`]s whose status is derived from their
//! subtasks, and [`Subtask`]s owned by exactly one epic. [`Item`] is the
//! tagged union used wherever the kind is only known at runtime (history
//! snapshots, persistence, lookups by bare id).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier shared by all item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Largest id that can be stored or handed out.
    pub const MAX: ItemId = ItemId(u64::MAX - 1);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Accept only ids in `1..=ItemId::MAX`.
    pub fn checked(value: u64) -> Result<Self> {
        if value == 0 || value > Self::MAX.0 {
            return Err(Error::InvalidArgument(format!(
                "item id must be between 1 and {}, got {value}",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let raw = trimmed
            .parse::<u64>()
            .map_err(|_| Error::InvalidArgument(format!("invalid item id '{trimmed}'")))?;
        Self::checked(raw)
    }
}

/// Workflow status, ordered `New < InProgress < Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    New,
    InProgress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::New, Status::InProgress, Status::Done];

    /// Canonical record form (`NEW`, `IN_PROGRESS`, `DONE`).
    pub fn as_str(self) -> &'static str {
        match self {
            Status::New => "NEW",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }

    /// Board column label for human output.
    pub fn label(self) -> &'static str {
        match self {
            Status::New => "To Do",
            Status::InProgress => "In Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_uppercase().replace('-', "_");
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown status '{}' (expected NEW|IN_PROGRESS|DONE)",
                    value.trim()
                ))
            })
    }
}

/// Discriminator for the three item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Epic,
    Subtask,
}

impl ItemKind {
    /// Tag used in the flat record file.
    pub fn record_tag(self) -> &'static str {
        match self {
            ItemKind::Task => "TASK",
            ItemKind::Epic => "EPIC",
            ItemKind::Subtask => "SUBTASK",
        }
    }

    pub fn from_record_tag(tag: &str) -> Option<Self> {
        match tag {
            "TASK" => Some(ItemKind::Task),
            "EPIC" => Some(ItemKind::Epic),
            "SUBTASK" => Some(ItemKind::Subtask),
            _ => None,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ItemKind::Task => "Task",
            ItemKind::Epic => "Epic",
            ItemKind::Subtask => "Subtask",
        })
    }
}

/// A standalone task. Its status is set directly by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    id: Option<ItemId>,
    pub name: String,
    pub description: String,
    pub status: Status,
}

impl Task {
    /// Build a task that has not been stored yet.
    pub fn new(name: impl Into<String>, description: impl Into<String>, status: Status) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            status,
        }
    }

    /// Address an already stored task, e.g. to build an update.
    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub(crate) fn assign_id(&mut self, id: ItemId) {
        self.id = Some(id);
    }
}

/// A multi-step item whose status is derived from its subtasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Epic {
    id: Option<ItemId>,
    pub name: String,
    pub description: String,
    status: Status,
    subtask_ids: BTreeSet<ItemId>,
}

impl Epic {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            status: Status::New,
            subtask_ids: BTreeSet::new(),
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Owned subtask ids in ascending order.
    pub fn subtask_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.subtask_ids.iter().copied()
    }

    pub fn subtask_count(&self) -> usize {
        self.subtask_ids.len()
    }

    pub fn contains_subtask(&self, id: ItemId) -> bool {
        self.subtask_ids.contains(&id)
    }

    /// Link a subtask. An epic can never contain itself.
    pub fn add_subtask_id(&mut self, subtask_id: ItemId) -> Result<()> {
        if self.id == Some(subtask_id) {
            return Err(Error::InvalidArgument(format!(
                "epic {subtask_id} cannot be its own subtask"
            )));
        }
        self.subtask_ids.insert(subtask_id);
        Ok(())
    }

    pub fn remove_subtask_id(&mut self, subtask_id: ItemId) -> Result<()> {
        if self.subtask_ids.remove(&subtask_id) {
            Ok(())
        } else {
            Err(Error::not_found(ItemKind::Subtask, subtask_id))
        }
    }

    pub(crate) fn assign_id(&mut self, id: ItemId) {
        self.id = Some(id);
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub(crate) fn clear_subtask_ids(&mut self) {
        self.subtask_ids.clear();
    }
}

/// A step owned by exactly one epic. The owner is fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subtask {
    id: Option<ItemId>,
    epic_id: ItemId,
    pub name: String,
    pub description: String,
    pub status: Status,
}

impl Subtask {
    pub fn new(
        epic_id: ItemId,
        name: impl Into<String>,
        description: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            id: None,
            epic_id,
            name: name.into(),
            description: description.into(),
            status,
        }
    }

    pub fn with_id(mut self, id: ItemId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<ItemId> {
        self.id
    }

    pub fn epic_id(&self) -> ItemId {
        self.epic_id
    }

    pub(crate) fn assign_id(&mut self, id: ItemId) {
        self.id = Some(id);
    }
}

/// Any stored item, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    Task(Task),
    Epic(Epic),
    Subtask(Subtask),
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Task(_) => ItemKind::Task,
            Item::Epic(_) => ItemKind::Epic,
            Item::Subtask(_) => ItemKind::Subtask,
        }
    }

    pub fn id(&self) -> Option<ItemId> {
        match self {
            Item::Task(task) => task.id(),
            Item::Epic(epic) => epic.id(),
            Item::Subtask(subtask) => subtask.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Item::Task(task) => &task.name,
            Item::Epic(epic) => &epic.name,
            Item::Subtask(subtask) => &subtask.name,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Item::Task(task) => &task.description,
            Item::Epic(epic) => &epic.description,
            Item::Subtask(subtask) => &subtask.description,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Item::Task(task) => task.status,
            Item::Epic(epic) => epic.status(),
            Item::Subtask(subtask) => subtask.status,
        }
    }

    /// Owning epic, for subtasks only.
    pub fn epic_id(&self) -> Option<ItemId> {
        match self {
            Item::Subtask(subtask) => Some(subtask.epic_id()),
            _ => None,
        }
    }
}

impl From<Task> for Item {
    fn from(task: Task) -> Self {
        Item::Task(task)
    }
}

impl From<Epic> for Item {
    fn from(epic: Epic) -> Self {
        Item::Epic(epic)
    }
}

impl From<Subtask> for Item {
    fn from(subtask: Subtask) -> Self {
        Item::Subtask(subtask)
    }
}
