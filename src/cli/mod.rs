//! Command-line interface for kanban
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::issue::{Epic, Item, ItemId, ItemKind, Status};
use crate::output::{HumanOutput, OutputOptions};
use crate::storage::{FileBackedManager, Storage};

mod demo;
mod epic;
mod subtask;
mod task;
mod view;

/// kanban - tasks, epics and subtasks
///
/// Tracks standalone tasks and epics split into subtasks. An epic's status
/// is derived from its subtasks; every item read by id lands in a bounded
/// view history.
#[derive(Parser, Debug)]
#[command(name = "kanban")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data file (defaults to storage.file from the config, then the
    /// platform data directory)
    #[arg(long, global = true, env = "KANBAN_FILE")]
    pub file: Option<PathBuf>,

    /// Config file (defaults to ./kanban.toml when present)
    #[arg(long, global = true, env = "KANBAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Standalone tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Epics and their derived status
    #[command(subcommand)]
    Epic(EpicCommands),

    /// Subtasks owned by an epic
    #[command(subcommand)]
    Subtask(SubtaskCommands),

    /// Read items by id and print the resulting view history
    View {
        /// Item ids, read in order
        #[arg(required = true)]
        ids: Vec<ItemId>,
    },

    /// Run a scripted walkthrough against an in-memory store
    Demo,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task
    New {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// NEW, IN_PROGRESS or DONE
        #[arg(long, default_value = "NEW")]
        status: Status,
    },

    /// List tasks
    List {
        /// Only tasks with this status
        #[arg(long)]
        status: Option<Status>,
    },

    /// Show a task (recorded in view history)
    Show { id: ItemId },

    /// Change a task's fields
    Edit {
        id: ItemId,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<Status>,
    },

    /// Set a task's status
    Status { id: ItemId, status: Status },

    /// Remove a task
    Rm { id: ItemId },

    /// Remove every task
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum EpicCommands {
    /// Create an epic
    New {
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List epics
    List {
        /// Only epics with this derived status
        #[arg(long)]
        status: Option<Status>,
    },

    /// Show an epic and its subtasks
    Show { id: ItemId },

    /// Change an epic's name or description
    Edit {
        id: ItemId,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Remove an epic and all of its subtasks
    Rm { id: ItemId },

    /// Remove every epic and every subtask
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum SubtaskCommands {
    /// Create a subtask under an epic
    New {
        epic: ItemId,

        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long, default_value = "NEW")]
        status: Status,
    },

    /// List subtasks
    List {
        /// Only subtasks of this epic
        #[arg(long)]
        epic: Option<ItemId>,
    },

    /// Show a subtask (recorded in view history)
    Show { id: ItemId },

    /// Change a subtask's fields
    Edit {
        id: ItemId,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        status: Option<Status>,
    },

    /// Set a subtask's status
    Status { id: ItemId, status: Status },

    /// Remove a subtask
    Rm { id: ItemId },

    /// Remove every subtask
    Clear,
}

/// Where a command finds its config and data file.
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub file: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

impl StoreOptions {
    pub fn load_config(&self) -> Result<Config> {
        let cwd = std::env::current_dir()?;
        Config::load_or_default(self.config.as_deref(), &cwd)
    }

    /// Load the configured data file behind a flushing manager.
    pub fn open(&self) -> Result<FileBackedManager> {
        let config = self.load_config()?;
        let path = config.resolve_data_file(self.file.as_deref())?;
        tracing::debug!(path = %path.display(), "opening data file");
        let storage = Storage::new(path).with_lock_timeout(config.storage.lock_timeout_ms);
        FileBackedManager::open(storage, config.history.limit)
    }
}

/// Common summary block for a single item.
pub(crate) fn push_item_summary(human: &mut HumanOutput, item: &Item) {
    if let Some(id) = item.id() {
        human.push_summary("ID", id.to_string());
    }
    human.push_summary("Name", item.name());
    human.push_summary("Status", item.status().label());
    if let Some(epic_id) = item.epic_id() {
        human.push_summary("Epic", format!("#{epic_id}"));
    }
    if !item.description().is_empty() {
        human.push_summary("Description", item.description());
    }
}

/// Current state of an epic without recording a view.
pub(crate) fn stored_epic(manager: &FileBackedManager, id: ItemId) -> Result<Epic> {
    manager
        .manager()
        .store()
        .epic(id)
        .cloned()
        .ok_or_else(|| Error::not_found(ItemKind::Epic, id))
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let store = StoreOptions {
            file: self.file,
            config: self.config,
        };
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Task(cmd) => match cmd {
                TaskCommands::New {
                    name,
                    description,
                    status,
                } => task::run_new(task::NewOptions {
                    name,
                    description,
                    status,
                    store,
                    output,
                }),
                TaskCommands::List { status } => task::run_list(task::ListOptions {
                    status,
                    store,
                    output,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions { id, store, output }),
                TaskCommands::Edit {
                    id,
                    name,
                    description,
                    status,
                } => task::run_edit(task::EditOptions {
                    id,
                    name,
                    description,
                    status,
                    store,
                    output,
                }),
                TaskCommands::Status { id, status } => task::run_status(task::StatusOptions {
                    id,
                    status,
                    store,
                    output,
                }),
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions { id, store, output }),
                TaskCommands::Clear => task::run_clear(task::ClearOptions { store, output }),
            },
            Commands::Epic(cmd) => match cmd {
                EpicCommands::New { name, description } => epic::run_new(epic::NewOptions {
                    name,
                    description,
                    store,
                    output,
                }),
                EpicCommands::List { status } => epic::run_list(epic::ListOptions {
                    status,
                    store,
                    output,
                }),
                EpicCommands::Show { id } => epic::run_show(epic::ShowOptions { id, store, output }),
                EpicCommands::Edit {
                    id,
                    name,
                    description,
                } => epic::run_edit(epic::EditOptions {
                    id,
                    name,
                    description,
                    store,
                    output,
                }),
                EpicCommands::Rm { id } => epic::run_rm(epic::RmOptions { id, store, output }),
                EpicCommands::Clear => epic::run_clear(epic::ClearOptions { store, output }),
            },
            Commands::Subtask(cmd) => match cmd {
                SubtaskCommands::New {
                    epic,
                    name,
                    description,
                    status,
                } => subtask::run_new(subtask::NewOptions {
                    epic,
                    name,
                    description,
                    status,
                    store,
                    output,
                }),
                SubtaskCommands::List { epic } => subtask::run_list(subtask::ListOptions {
                    epic,
                    store,
                    output,
                }),
                SubtaskCommands::Show { id } => {
                    subtask::run_show(subtask::ShowOptions { id, store, output })
                }
                SubtaskCommands::Edit {
                    id,
                    name,
                    description,
                    status,
                } => subtask::run_edit(subtask::EditOptions {
                    id,
                    name,
                    description,
                    status,
                    store,
                    output,
                }),
                SubtaskCommands::Status { id, status } => {
                    subtask::run_status(subtask::StatusOptions {
                        id,
                        status,
                        store,
                        output,
                    })
                }
                SubtaskCommands::Rm { id } => subtask::run_rm(subtask::RmOptions { id, store, output }),
                SubtaskCommands::Clear => subtask::run_clear(subtask::ClearOptions { store, output }),
            },
            Commands::View { ids } => view::run(view::ViewOptions { ids, store, output }),
            Commands::Demo => demo::run(demo::DemoOptions { store, output }),
        }
    }
}
