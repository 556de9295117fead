//! Engine-level error type

use crate::apply::OperationError;
use crate::backup::{BackupError, RestoreError};
use crate::diff::PlanError;
use crate::merge::MergeError;
use crate::profile::{SnapshotError, StorageError};
use crate::storage::DatabaseError;
use crate::util::PathError;
use rigger_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced by [`crate::Engine`]
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {name}")]
    AlreadyExists { entity: &'static str, name: String },

    #[error("Invalid name: {0}")]
    InvalidName(#[from] PathError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Import error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    #[error("Restore error: {0}")]
    Restore(#[from] RestoreError),

    #[error("Apply aborted after {} failed operation(s); changes were rolled back", errors.len())]
    ApplyAborted { errors: Vec<OperationError> },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl EngineError {
    /// Shorthand for a missing entity
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::InvalidName(_) => "INVALID_NAME",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Io { .. } => "IO_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Scan(_) => "SCAN_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Snapshot(_) => "IMPORT_ERROR",
            Self::Merge(_) => "MERGE_ERROR",
            Self::Plan(_) => "PLAN_ERROR",
            Self::Backup(_) => "BACKUP_ERROR",
            Self::Restore(_) => "RESTORE_ERROR",
            Self::ApplyAborted { .. } => "APPLY_ABORTED",
            Self::Task(_) => "TASK_FAILED",
        }
    }
}
