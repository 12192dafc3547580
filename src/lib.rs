//! kanban - Task Tracker Library
//!
//! This library provides the core functionality for the kanban CLI tool:
//! an in-process tracker for tasks, epics and subtasks.
//!
//! # Core Concepts
//!
//! - **Tasks**: Standalone items whose status is set directly
//! - **Epics**: Items whose status is derived from their subtasks
//! - **Subtasks**: Items owned by exactly one epic for their whole life
//! - **View History**: Bounded, most-recent-last record of items read by id
//!
//! # Module Organization
//!
//! - `issue`: Item model (ids, statuses, tasks, epics, subtasks)
//! - `id`: Identifier allocation
//! - `status`: Epic status aggregation
//! - `history`: Bounded view history cache
//! - `store`: Keyed item collections
//! - `manager`: The task manager facade and its shared wrapper
//! - `storage`: Flat record file format and the file-backed manager
//! - `lock`: File locking and atomic writes
//! - `config`: Configuration loading from `kanban.toml`
//! - `output`: Human and JSON output for the CLI
//! - `cli`: Command-line interface using clap
//! - `error`: Error types and result aliases

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod id;
pub mod issue;
pub mod lock;
pub mod manager;
pub mod output;
pub mod status;
pub mod storage;
pub mod store;

pub use error::{Error, Result};
pub use issue::{Epic, Item, ItemId, ItemKind, Status, Subtask, Task};
pub use manager::{SharedTaskManager, TaskManager};
pub use storage::{FileBackedManager, Storage};
