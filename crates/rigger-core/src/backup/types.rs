//! Backup record types

use crate::diff::ManagedState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Name of the record copy kept next to the blobs
pub const RECORD_FILE: &str = "record.json";

/// Directory under a backup holding pre-apply file copies
pub const FILES_DIR: &str = "files";

/// Everything needed to undo one apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Unique identifier
    pub id: Uuid,
    /// Project this backup is for
    pub project_id: Uuid,
    /// Profile that was applied, cleared if the profile is deleted
    pub profile_id: Option<Uuid>,
    /// Description of what triggered this backup
    pub description: Option<String>,
    /// `<data_dir>/backups/<id>`
    pub backup_dir: PathBuf,
    /// Every file the apply wrote or removed
    pub files: Vec<BackupFile>,
    /// Profile-managed state after the apply
    #[serde(default)]
    pub managed: ManagedState,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When the record was rolled back, if it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolled_back_at: Option<DateTime<Utc>>,
}

impl BackupRecord {
    /// Create an empty record whose directory lives under `backups_root`
    #[must_use]
    pub fn new(project_id: Uuid, profile_id: Option<Uuid>, backups_root: impl AsRef<Path>) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            project_id,
            profile_id,
            description: None,
            backup_dir: backups_root.as_ref().join(id.to_string()),
            files: Vec::new(),
            managed: ManagedState::default(),
            created_at: Utc::now(),
            rolled_back_at: None,
        }
    }

    /// Set a description for this backup
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Entry for a project-relative path
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&BackupFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Absolute location of a blob
    #[must_use]
    pub fn blob_path(&self, blob: &Path) -> PathBuf {
        self.backup_dir.join(blob)
    }
}

/// One file touched by an apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupFile {
    /// Path to the file (relative to project root)
    pub path: PathBuf,
    /// SHA256 of the content before the apply, absent if the file was new
    pub original_sha256: Option<String>,
    /// Copy of the original content, relative to the backup directory
    pub blob: Option<PathBuf>,
    /// SHA256 of the content the apply wrote, absent for deletions
    pub written_sha256: Option<String>,
}

impl BackupFile {
    /// Create a backup entry for an existing file
    #[must_use]
    pub fn existing(path: PathBuf, sha256: String, blob: PathBuf) -> Self {
        Self {
            path,
            original_sha256: Some(sha256),
            blob: Some(blob),
            written_sha256: None,
        }
    }

    /// Create a backup entry for a file that didn't exist
    #[must_use]
    pub fn new_file(path: PathBuf) -> Self {
        Self {
            path,
            original_sha256: None,
            blob: None,
            written_sha256: None,
        }
    }

    #[must_use]
    pub fn with_written(mut self, sha256: String) -> Self {
        self.written_sha256 = Some(sha256);
        self
    }

    /// Check if this was a new file (didn't exist before)
    #[must_use]
    pub fn was_new(&self) -> bool {
        self.original_sha256.is_none()
    }
}
