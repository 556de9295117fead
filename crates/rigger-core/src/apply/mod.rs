//! Applying diff plans to projects

mod write;

pub use write::{execute, ApplyError};

use crate::backup::BackupRecord;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do when some operations of an apply fail
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Keep what succeeded and report the rest
    #[default]
    BestEffort,
    /// Roll the whole apply back if anything failed
    AllOrNothing,
}

/// Result of applying a profile to a project
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    /// Backup that undoes this apply
    pub backup: BackupRecord,
    /// Number of operations carried out
    pub applied: usize,
    /// Operations that failed
    pub errors: Vec<OperationError>,
}

impl ApplyOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A single failed file operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// Project-relative path
    pub path: PathBuf,
    pub message: String,
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}
