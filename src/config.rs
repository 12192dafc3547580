//! Configuration loading and management
//!
//! Handles parsing of `kanban.toml` configuration files and resolving which
//! data file a command should operate on.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "kanban.toml";

/// Data file name used under the platform data directory
pub const DEFAULT_DATA_FILE_NAME: &str = "tasks.csv";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// View history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Data file configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// View history configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Number of distinct items remembered
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data file; relative paths are resolved against the config file's
    /// directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// How long a command waits for another process's lock on the data file
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            file: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a `kanban.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.validate()?;
        config.anchor_storage_path(path);
        Ok(config)
    }

    /// Load an explicitly named config, or `kanban.toml` under `dir` when
    /// present, or defaults.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = dir.join(CONFIG_FILE_NAME);
        if default_path.is_file() {
            Self::load(&default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.history.limit == 0 {
            return Err(Error::InvalidConfig(
                "history.limit must be at least 1".to_string(),
            ));
        }
        if let Some(file) = &self.storage.file {
            if file.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(
                    "storage.file cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Pick the data file: an explicit path wins, then `storage.file`, then
    /// the platform data directory.
    pub fn resolve_data_file(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.storage.file {
            return Ok(path.clone());
        }
        default_data_file()
    }

    fn anchor_storage_path(&mut self, config_path: &Path) {
        let Some(file) = self.storage.file.as_mut() else {
            return;
        };
        if file.is_relative() {
            if let Some(dir) = config_path.parent() {
                *file = dir.join(&*file);
            }
        }
    }
}

/// `<data_dir>/kanban/tasks.csv` for the current platform.
pub fn default_data_file() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "kanban").ok_or_else(|| {
        Error::InvalidConfig(
            "no home directory found; pass --file or set KANBAN_FILE".to_string(),
        )
    })?;
    Ok(dirs.data_dir().join(DEFAULT_DATA_FILE_NAME))
}
