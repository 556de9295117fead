//! Diff plan types

use crate::merge::EntryKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A plan of file operations bringing a project in line with a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffPlan {
    /// Project being modified
    pub project_path: PathBuf,
    /// Profile being applied
    pub profile_id: Uuid,
    /// Creates and modifies sorted by path, then deletes sorted by path
    pub operations: Vec<FileOperation>,
    /// Warnings generated
    pub warnings: Vec<Warning>,
    /// Profile-managed files and JSON slots once the plan is applied
    pub managed: ManagedState,
}

impl DiffPlan {
    /// Create a new empty diff plan
    #[must_use]
    pub fn new(project_path: PathBuf, profile_id: Uuid) -> Self {
        Self {
            project_path,
            profile_id,
            operations: Vec::new(),
            warnings: Vec::new(),
            managed: ManagedState::default(),
        }
    }

    /// Check if there are any operations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Warnings of one kind
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &Warning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }
}

/// A file operation in the diff plan; paths are project-relative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FileOperation {
    /// Create a new file
    Create { path: PathBuf, content: Vec<u8> },
    /// Replace an existing file
    Modify {
        path: PathBuf,
        diff: String,
        new_content: Vec<u8>,
    },
    /// Remove a file an earlier apply created
    Delete { path: PathBuf },
}

impl FileOperation {
    /// Get the path affected by this operation
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Create { path, .. } | Self::Modify { path, .. } | Self::Delete { path } => path,
        }
    }

    /// Bytes this operation writes, if any
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        match self {
            Self::Create { content, .. } => Some(content),
            Self::Modify { new_content, .. } => Some(new_content),
            Self::Delete { .. } => None,
        }
    }

    pub(crate) fn is_delete(&self) -> bool {
        matches!(self, Self::Delete { .. })
    }
}

/// Files and JSON slots owned by a profile in one project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedState {
    /// Files an apply created; only these are ever deleted
    #[serde(default)]
    pub files: BTreeSet<PathBuf>,
    /// Slots an apply wrote, per JSON file
    #[serde(default)]
    pub entries: BTreeMap<PathBuf, BTreeSet<EntryKey>>,
}

impl ManagedState {
    #[must_use]
    pub fn entries_for(&self, file: &Path) -> BTreeSet<EntryKey> {
        self.entries.get(file).cloned().unwrap_or_default()
    }
}

/// A non-fatal finding while planning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub severity: WarningSeverity,
    pub kind: WarningKind,
    /// Project-relative file the warning is about
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn info(kind: WarningKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: WarningSeverity::Info,
            kind,
            path,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(kind: WarningKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            severity: WarningSeverity::Warning,
            kind,
            path,
            message: message.into(),
        }
    }
}

/// What a warning is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A file changed since the last apply wrote it
    ConcurrentModification,
    /// A higher-precedence scope shadows a profile tool
    Collision,
    /// A tool reference has no stored content
    MissingContent,
    /// An existing file could not be parsed and was left alone
    Parse,
}

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    /// Informational
    Info,
    /// Warning (proceed with caution)
    Warning,
}
