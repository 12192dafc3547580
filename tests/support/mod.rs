#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch directory holding one data file and, optionally, a config.
pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("tasks.csv")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file("kanban.toml", contents)
    }

    pub fn read_data(&self) -> String {
        fs::read_to_string(self.data_file()).expect("read data file")
    }

    /// `kanban` running inside the board directory against its data file.
    pub fn cmd(&self) -> Command {
        let mut cmd = kanban_cmd();
        cmd.current_dir(self.path());
        cmd.env("KANBAN_FILE", self.data_file());
        cmd
    }

    /// `kanban` inside the board directory with no data file override.
    /// The platform data directory is redirected into the board.
    pub fn bare_cmd(&self) -> Command {
        let mut cmd = kanban_cmd();
        cmd.current_dir(self.path());
        cmd.env("HOME", self.path());
        cmd.env("XDG_DATA_HOME", self.path().join("xdg-data"));
        cmd
    }

    /// Run with `--json` and return the `data` member of the envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: Value = serde_json::from_slice(&output).expect("json envelope");
        assert_eq!(value["schema_version"], "kanban.v1");
        assert_eq!(value["status"], "success");
        value["data"].clone()
    }

    /// Create an item through the CLI and return its id.
    pub fn create(&self, args: &[&str]) -> u64 {
        let data = self.json(args);
        data["id"]
            .as_u64()
            .or_else(|| data["subtask"]["id"].as_u64())
            .expect("created id")
    }
}

pub fn kanban_cmd() -> Command {
    let mut cmd = Command::cargo_bin("kanban").expect("binary");
    cmd.env_remove("KANBAN_FILE");
    cmd.env_remove("KANBAN_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}
