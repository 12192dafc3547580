//! Error types for kanban
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, unknown id, bad config)
//! - 3: Consistency violation (an invariant the store should uphold was broken)
//! - 4: Operation failed (I/O, lock contention, corrupt data file)

use std::path::PathBuf;
use thiserror::Error;

use crate::issue::{ItemId, ItemKind};

/// Exit codes for the kanban CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const CONSISTENCY_VIOLATION: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for kanban operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: ItemKind, id: ItemId },

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Internal invariant breaks (exit code 3)
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),

    // Operation failures (exit code 4)
    #[error("Corrupt record at line {line}: {reason}")]
    CorruptRecord { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    pub(crate) fn not_found(kind: ItemKind, id: ItemId) -> Self {
        Error::NotFound { kind, id }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidArgument(_)
            | Error::NotFound { .. }
            | Error::ItemNotFound(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::ConsistencyViolation(_) => exit_codes::CONSISTENCY_VIOLATION,

            // Operation failures
            Error::CorruptRecord { .. }
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error output
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "kind": kind,
                "id": id,
            })),
            Error::ItemNotFound(id) => Some(serde_json::json!({ "id": id })),
            Error::CorruptRecord { line, .. } => Some(serde_json::json!({ "line": line })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "path": path.to_string_lossy(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for kanban operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
