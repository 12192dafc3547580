//! Durable storage for kanban
//!
//! The whole store lives in one flat record file:
//!
//! ```text
//! id,type,name,status,description,epic
//! 1,TASK,Write docs,NEW,Cover the CLI,
//! 2,EPIC,Release,IN_PROGRESS,,
//! 3,SUBTASK,Tag build,IN_PROGRESS,Sign it,2
//! ```
//!
//! Tasks come first, then epics, then subtasks, each group by ascending id.
//! Inside a field `\` is written as `\\`, `,` as `\,`, and line breaks as
//! `\n` / `\r`, so every record is exactly one physical line.
//!
//! The epic status column is written for readers of the file but ignored on
//! load; epic statuses are always re-derived from the subtasks.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::issue::{Epic, Item, ItemId, ItemKind, Status, Subtask, Task};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};
use crate::manager::TaskManager;

/// First line of every data file.
pub const RECORD_HEADER: &str = "id,type,name,status,description,epic";

const FIELD_COUNT: usize = 6;

/// Reads and writes the data file for one store.
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
    lock_timeout_ms: u64,
}

impl Storage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Path to the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read every stored item. A missing file is an empty store.
    pub fn read_items(&self) -> Result<Vec<Item>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let contents = lock::read_locked_str(&self.path, self.lock_timeout_ms)?;
        decode_items(&contents)
    }

    /// Rebuild a manager from the data file.
    pub fn load(&self, history_limit: usize) -> Result<TaskManager> {
        let items = self.read_items()?;
        let count = items.len();
        let manager = TaskManager::restore(items, history_limit)?;
        debug!(path = %self.path.display(), items = count, "store loaded");
        Ok(manager)
    }

    /// Replace the data file with the manager's current items.
    pub fn save(&self, manager: &TaskManager) -> Result<()> {
        self.write_items(&manager.items())
    }

    pub fn write_items(&self, items: &[Item]) -> Result<()> {
        let encoded = encode_items(items)?;
        lock::write_atomic_locked(&self.path, encoded.as_bytes(), self.lock_timeout_ms)?;
        debug!(path = %self.path.display(), items = items.len(), "store saved");
        Ok(())
    }
}

// =============================================================================
// Record codec
// =============================================================================

/// Encode items as a complete data file, header included.
///
/// Items are grouped by kind and sorted by id regardless of input order.
pub fn encode_items(items: &[Item]) -> Result<String> {
    let mut ordered: Vec<&Item> = items.iter().collect();
    ordered.sort_by_key(|item| (kind_rank(item.kind()), item.id()));

    let mut out = String::with_capacity(RECORD_HEADER.len() + 1 + items.len() * 48);
    out.push_str(RECORD_HEADER);
    out.push('\n');
    for item in ordered {
        out.push_str(&encode_item(item)?);
        out.push('\n');
    }
    Ok(out)
}

/// Encode one item as a record line without the trailing newline.
pub fn encode_item(item: &Item) -> Result<String> {
    let id = item.id().ok_or_else(|| {
        Error::InvalidArgument(format!(
            "cannot store a {} without an id",
            item.kind().to_string().to_lowercase()
        ))
    })?;
    let epic = item.epic_id().map(|id| id.to_string()).unwrap_or_default();
    let fields = [
        id.to_string(),
        item.kind().record_tag().to_string(),
        escape_field(item.name()),
        item.status().as_str().to_string(),
        escape_field(item.description()),
        epic,
    ];
    Ok(fields.join(","))
}

/// Parse a data file into items.
///
/// Besides per-line syntax this rejects duplicate ids and subtasks whose
/// epic is not in the file, so a successful decode always restores.
pub fn decode_items(contents: &str) -> Result<Vec<Item>> {
    let mut items = Vec::new();
    let mut lines_by_id: HashMap<ItemId, usize> = HashMap::new();
    let mut epic_ids = HashSet::new();
    let mut subtask_links = Vec::new();
    let mut header_checked = false;

    for (idx, raw) in contents.split('\n').enumerate() {
        let line_no = idx + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        if line.trim().is_empty() {
            continue;
        }
        if !header_checked {
            header_checked = true;
            if line.trim() == RECORD_HEADER {
                continue;
            }
        }

        let item = decode_line(line, line_no)?;
        let Some(id) = item.id() else {
            return Err(corrupt(line_no, "record has no id"));
        };
        if let Some(first) = lines_by_id.insert(id, line_no) {
            return Err(corrupt(
                line_no,
                format!("duplicate id {id} (first used on line {first})"),
            ));
        }
        match &item {
            Item::Epic(_) => {
                epic_ids.insert(id);
            }
            Item::Subtask(subtask) => subtask_links.push((line_no, id, subtask.epic_id())),
            Item::Task(_) => {}
        }
        items.push(item);
    }

    for (line_no, id, epic_id) in subtask_links {
        if !epic_ids.contains(&epic_id) {
            return Err(corrupt(
                line_no,
                format!("subtask {id} references missing epic {epic_id}"),
            ));
        }
    }

    Ok(items)
}

fn decode_line(line: &str, line_no: usize) -> Result<Item> {
    let fields = split_fields(line).map_err(|reason| corrupt(line_no, reason))?;
    if fields.len() != FIELD_COUNT {
        return Err(corrupt(
            line_no,
            format!("expected {FIELD_COUNT} fields, found {}", fields.len()),
        ));
    }

    let id = parse_id(&fields[0]).map_err(|reason| corrupt(line_no, reason))?;
    let kind = ItemKind::from_record_tag(fields[1].trim())
        .ok_or_else(|| corrupt(line_no, format!("unknown item type '{}'", fields[1])))?;
    let name = fields[2].clone();
    let status: Status = fields[3]
        .trim()
        .parse()
        .map_err(|_| corrupt(line_no, format!("unknown status '{}'", fields[3])))?;
    let description = fields[4].clone();
    let epic_field = fields[5].trim();

    let item = match kind {
        ItemKind::Subtask => {
            if epic_field.is_empty() {
                return Err(corrupt(line_no, "subtask has no epic id"));
            }
            let epic_id = parse_id(epic_field).map_err(|reason| corrupt(line_no, reason))?;
            Item::Subtask(Subtask::new(epic_id, name, description, status).with_id(id))
        }
        ItemKind::Task | ItemKind::Epic if !epic_field.is_empty() => {
            return Err(corrupt(
                line_no,
                format!("{} record cannot carry an epic id", kind.to_string().to_lowercase()),
            ));
        }
        ItemKind::Task => Item::Task(Task::new(name, description, status).with_id(id)),
        // Stored epic status is not trusted; it is re-derived on restore.
        ItemKind::Epic => Item::Epic(Epic::new(name, description).with_id(id)),
    };
    Ok(item)
}

fn parse_id(field: &str) -> std::result::Result<ItemId, String> {
    let trimmed = field.trim();
    match trimmed.parse::<u64>() {
        Ok(0) => Err("id must be positive".to_string()),
        Ok(value) if value > ItemId::MAX.get() => {
            Err(format!("id {value} is out of range"))
        }
        Ok(value) => Ok(ItemId::new(value)),
        Err(_) => Err(format!("invalid id '{trimmed}'")),
    }
}

fn kind_rank(kind: ItemKind) -> u8 {
    match kind {
        ItemKind::Task => 0,
        ItemKind::Epic => 1,
        ItemKind::Subtask => 2,
    }
}

fn corrupt(line: usize, reason: impl Into<String>) -> Error {
    Error::CorruptRecord {
        line,
        reason: reason.into(),
    }
}

fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

/// Split a record on unescaped commas, unescaping each field.
fn split_fields(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => match chars.next() {
                Some('\\') => current.push('\\'),
                Some(',') => current.push(','),
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => return Err(format!("invalid escape '\\{other}'")),
                None => return Err("dangling escape at end of record".to_string()),
            },
            ',' => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    Ok(fields)
}

// =============================================================================
// File-backed manager
// =============================================================================

/// A [`TaskManager`] that rewrites its data file after every mutation.
///
/// Reads and scans go straight to the in-memory manager. View history is
/// per-process and never written to disk.
#[derive(Debug)]
pub struct FileBackedManager {
    manager: TaskManager,
    storage: Storage,
}

impl FileBackedManager {
    /// Load the store behind `storage`, starting empty if the file is absent.
    pub fn open(storage: Storage, history_limit: usize) -> Result<Self> {
        let manager = storage.load(history_limit)?;
        Ok(Self { manager, storage })
    }

    pub fn manager(&self) -> &TaskManager {
        &self.manager
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Write the current state to disk.
    pub fn flush(&self) -> Result<()> {
        self.storage.save(&self.manager)
    }

    fn mutate<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut TaskManager) -> Result<T>,
    {
        let out = op(&mut self.manager)?;
        self.flush()?;
        Ok(out)
    }

    pub fn create_task(&mut self, task: Task) -> Result<ItemId> {
        self.mutate(|manager| manager.create_task(task))
    }

    pub fn create_epic(&mut self, epic: Epic) -> Result<ItemId> {
        self.mutate(|manager| manager.create_epic(epic))
    }

    pub fn create_subtask(&mut self, subtask: Subtask) -> Result<ItemId> {
        self.mutate(|manager| manager.create_subtask(subtask))
    }

    pub fn update_task(&mut self, task: Task) -> Result<()> {
        self.mutate(|manager| manager.update_task(task))
    }

    pub fn update_epic(&mut self, epic: Epic) -> Result<()> {
        self.mutate(|manager| manager.update_epic(epic))
    }

    pub fn update_subtask(&mut self, subtask: Subtask) -> Result<()> {
        self.mutate(|manager| manager.update_subtask(subtask))
    }

    pub fn update_task_status(&mut self, id: ItemId, status: Status) -> Result<()> {
        self.mutate(|manager| manager.update_task_status(id, status))
    }

    pub fn update_subtask_status(&mut self, id: ItemId, status: Status) -> Result<()> {
        self.mutate(|manager| manager.update_subtask_status(id, status))
    }

    pub fn remove_task(&mut self, id: ItemId) -> Result<Task> {
        self.mutate(|manager| manager.remove_task(id))
    }

    pub fn remove_epic(&mut self, id: ItemId) -> Result<Epic> {
        self.mutate(|manager| manager.remove_epic(id))
    }

    pub fn remove_subtask(&mut self, id: ItemId) -> Result<Subtask> {
        self.mutate(|manager| manager.remove_subtask(id))
    }

    pub fn clear_tasks(&mut self) -> Result<usize> {
        self.mutate(|manager| Ok(manager.clear_tasks()))
    }

    pub fn clear_epics(&mut self) -> Result<usize> {
        self.mutate(|manager| Ok(manager.clear_epics()))
    }

    pub fn clear_subtasks(&mut self) -> Result<usize> {
        self.mutate(|manager| Ok(manager.clear_subtasks()))
    }

    pub fn get_task(&mut self, id: ItemId) -> Result<Task> {
        self.manager.get_task(id)
    }

    pub fn get_epic(&mut self, id: ItemId) -> Result<Epic> {
        self.manager.get_epic(id)
    }

    pub fn get_subtask(&mut self, id: ItemId) -> Result<Subtask> {
        self.manager.get_subtask(id)
    }

    pub fn get_item(&mut self, id: ItemId) -> Result<Item> {
        self.manager.get_item(id)
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.manager.tasks()
    }

    pub fn epics(&self) -> Vec<Epic> {
        self.manager.epics()
    }

    pub fn subtasks(&self) -> Vec<Subtask> {
        self.manager.subtasks()
    }

    pub fn subtasks_of_epic(&self, epic_id: ItemId) -> Result<Vec<Subtask>> {
        self.manager.subtasks_of_epic(epic_id)
    }

    pub fn history(&self) -> Vec<Item> {
        self.manager.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn storage(temp: &TempDir) -> Storage {
        Storage::new(temp.path().join("tasks.csv"))
    }

    fn corrupt_line(contents: &str) -> usize {
        match decode_items(contents) {
            Err(Error::CorruptRecord { line, .. }) => line,
            other => panic!("expected corrupt record, got {other:?}"),
        }
    }

    #[test]
    fn escaping_survives_awkward_text() {
        let name = "a,b\\c\nd\re";
        let escaped = escape_field(name);
        assert!(!escaped.contains('\n'));
        assert_eq!(escaped, "a\\,b\\\\c\\nd\\re");
        let fields = split_fields(&format!("{escaped},tail")).expect("split");
        assert_eq!(fields, vec![name.to_string(), "tail".to_string()]);
    }

    #[test]
    fn split_rejects_bad_escapes() {
        assert!(split_fields("a\\x,b").is_err());
        assert!(split_fields("abc\\").is_err());
    }

    #[test]
    fn encode_orders_by_kind_then_id() {
        let items = vec![
            Item::Subtask(
                Subtask::new(ItemId::new(2), "s", "", Status::New).with_id(ItemId::new(3)),
            ),
            Item::Epic(Epic::new("e", "").with_id(ItemId::new(2))),
            Item::Task(Task::new("t5", "", Status::Done).with_id(ItemId::new(5))),
            Item::Task(Task::new("t1", "", Status::New).with_id(ItemId::new(1))),
        ];
        let encoded = encode_items(&items).expect("encode");
        let lines: Vec<&str> = encoded.lines().collect();
        assert_eq!(
            lines,
            vec![
                RECORD_HEADER,
                "1,TASK,t1,NEW,,",
                "5,TASK,t5,DONE,,",
                "2,EPIC,e,NEW,,",
                "3,SUBTASK,s,NEW,,2",
            ]
        );
    }

    #[test]
    fn encode_requires_ids() {
        let err = encode_item(&Item::Task(Task::new("draft", "", Status::New)))
            .expect_err("no id");
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn decode_skips_header_and_blank_lines() {
        let contents = format!("{RECORD_HEADER}\r\n\n1,TASK,Write,NEW,,\r\n   \n");
        let items = decode_items(&contents).expect("decode");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name(), "Write");
    }

    #[test]
    fn decode_accepts_files_without_header() {
        let items = decode_items("4,EPIC,Release,DONE,notes,\n").expect("decode");
        assert_eq!(items[0].kind(), ItemKind::Epic);
        // Stored epic status is ignored.
        assert_eq!(items[0].status(), Status::New);
    }

    #[test]
    fn decode_reports_the_offending_line() {
        let header = RECORD_HEADER;
        assert_eq!(corrupt_line(&format!("{header}\n1,TASK,a,NEW,\n")), 2);
        assert_eq!(corrupt_line(&format!("{header}\nx,TASK,a,NEW,,\n")), 2);
        assert_eq!(corrupt_line(&format!("{header}\n0,TASK,a,NEW,,\n")), 2);
        assert_eq!(corrupt_line(&format!("{header}\n1,STORY,a,NEW,,\n")), 2);
        assert_eq!(corrupt_line(&format!("{header}\n1,TASK,a,CLOSED,,\n")), 2);
        assert_eq!(corrupt_line(&format!("{header}\n\n1,SUBTASK,a,NEW,,\n")), 3);
        assert_eq!(corrupt_line(&format!("{header}\n1,TASK,a,NEW,,2\n")), 2);
        assert_eq!(
            corrupt_line(&format!("{header}\n1,TASK,a,NEW,,\n1,EPIC,b,NEW,,\n")),
            3
        );
        assert_eq!(
            corrupt_line(&format!("{header}\n1,EPIC,a,NEW,,\n2,SUBTASK,b,NEW,,9\n")),
            3
        );
    }

    #[test]
    fn decode_rejects_ids_past_the_allocatable_range() {
        let header = RECORD_HEADER;
        assert_eq!(
            corrupt_line(&format!("{header}\n18446744073709551615,TASK,a,NEW,,\n")),
            2
        );
        assert_eq!(
            corrupt_line(&format!(
                "{header}\n1,EPIC,a,NEW,,\n2,SUBTASK,b,NEW,,18446744073709551615\n"
            )),
            3
        );
    }

    #[test]
    fn store_at_the_largest_id_refuses_new_items() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.csv");
        let last = ItemId::MAX.get();
        fs::write(&path, format!("{RECORD_HEADER}\n{last},TASK,last,NEW,,\n")).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let mut backed = FileBackedManager::open(Storage::new(&path), 10).expect("open");
        let err = backed
            .create_task(Task::new("overflow", "", Status::New))
            .expect_err("ids exhausted");
        assert!(matches!(err, Error::OperationFailed(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);

        let reopened = FileBackedManager::open(Storage::new(&path), 10).expect("reopen");
        assert_eq!(reopened.tasks().len(), 1);
    }

    #[test]
    fn missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let manager = storage(&temp).load(10).expect("load");
        assert!(manager.items().is_empty());
    }

    #[test]
    fn save_then_load_round_trips_items_and_statuses() {
        let temp = TempDir::new().unwrap();
        let storage = storage(&temp);

        let mut manager = TaskManager::new();
        manager
            .create_task(Task::new("Pack, label", "fragile\nhandle with care", Status::InProgress))
            .expect("task");
        let epic = manager
            .create_epic(Epic::new("Move", "C:\\new\\home"))
            .expect("epic");
        for (name, status) in [("Boxes", Status::Done), ("Van", Status::InProgress)] {
            manager
                .create_subtask(Subtask::new(epic, name, "", status))
                .expect("subtask");
        }
        storage.save(&manager).expect("save");

        let loaded = storage.load(10).expect("load");
        assert_eq!(loaded.items(), manager.items());
        assert_eq!(
            loaded.store().epic(epic).map(Epic::status),
            Some(Status::InProgress)
        );
        assert_eq!(loaded.next_id_hint(), manager.next_id_hint());
    }

    #[test]
    fn file_backed_manager_flushes_each_mutation() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("tasks.csv");

        let mut backed = FileBackedManager::open(Storage::new(&path), 10).expect("open");
        let epic = backed.create_epic(Epic::new("Epic", "")).expect("epic");
        let subtask = backed
            .create_subtask(Subtask::new(epic, "Step", "", Status::New))
            .expect("subtask");
        backed
            .update_subtask_status(subtask, Status::Done)
            .expect("status");

        let reopened = FileBackedManager::open(Storage::new(&path), 10).expect("reopen");
        assert_eq!(
            reopened.manager().store().epic(epic).map(Epic::status),
            Some(Status::Done)
        );

        backed.remove_epic(epic).expect("remove");
        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, format!("{RECORD_HEADER}\n"));
    }

    #[test]
    fn failed_mutation_leaves_file_alone() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.csv");
        let mut backed = FileBackedManager::open(Storage::new(&path), 10).expect("open");
        backed
            .create_task(Task::new("Keep", "", Status::New))
            .expect("task");
        let before = fs::read_to_string(&path).expect("read");

        assert!(backed.remove_task(ItemId::new(99)).is_err());
        assert_eq!(fs::read_to_string(&path).expect("read"), before);
    }

    #[test]
    fn reads_do_not_persist_history() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.csv");
        let mut backed = FileBackedManager::open(Storage::new(&path), 10).expect("open");
        let id = backed
            .create_task(Task::new("Task", "", Status::New))
            .expect("task");
        backed.get_task(id).expect("view");
        assert_eq!(backed.history().len(), 1);

        let reopened = FileBackedManager::open(Storage::new(&path), 10).expect("reopen");
        assert!(reopened.history().is_empty());
    }

    #[test]
    fn corrupt_file_fails_to_open() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tasks.csv");
        fs::write(&path, format!("{RECORD_HEADER}\n1,TASK,ok,NEW,,\n2,TASK,bad\n")).unwrap();

        let err = FileBackedManager::open(Storage::new(&path), 10).expect_err("corrupt");
        assert!(matches!(err, Error::CorruptRecord { line: 3, .. }));
    }
}
