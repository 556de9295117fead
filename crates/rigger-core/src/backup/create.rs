//! Backup creation for rollback support

use crate::backup::{BackupFile, BackupRecord, FILES_DIR, RECORD_FILE};
use crate::util::{safe_join, sha256_hex, write_atomic, PathError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors during backup creation
#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize backup record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),
}

impl BackupError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Copy the current content of a project file into the backup
///
/// A file that does not exist yet is recorded as new.
///
/// # Errors
/// Returns an error if the file cannot be read or the copy cannot be written
pub fn backup_file(
    record: &BackupRecord,
    project_root: &Path,
    relative: &Path,
) -> Result<BackupFile, BackupError> {
    let source = safe_join(project_root, relative)?;
    let content = match fs::read(&source) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Ok(BackupFile::new_file(relative.to_path_buf()));
        }
        Err(e) => return Err(BackupError::io(&source, e)),
    };

    let blob = Path::new(FILES_DIR).join(relative);
    let dest = safe_join(&record.backup_dir, &blob)?;
    write_atomic(&dest, &content).map_err(|e| BackupError::io(&dest, e))?;

    tracing::debug!(path = %relative.display(), bytes = content.len(), "backed up file");
    Ok(BackupFile::existing(
        relative.to_path_buf(),
        sha256_hex(&content),
        blob,
    ))
}

/// Write `record.json` into the backup directory
///
/// # Errors
/// Returns an error if the record cannot be serialized or written
pub fn write_record(record: &BackupRecord) -> Result<PathBuf, BackupError> {
    let path = record.backup_dir.join(RECORD_FILE);
    let mut json = serde_json::to_vec_pretty(record)?;
    json.push(b'\n');
    write_atomic(&path, &json).map_err(|e| BackupError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn test_backup_existing_file() {
        let project = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        fs::create_dir_all(project.path().join(".claude")).unwrap();
        fs::write(project.path().join(".claude/settings.json"), "{}\n").unwrap();

        let record = BackupRecord::new(Uuid::new_v4(), None, backups.path());
        let file = backup_file(&record, project.path(), Path::new(".claude/settings.json")).unwrap();

        assert!(!file.was_new());
        assert_eq!(file.original_sha256.as_deref(), Some(sha256_hex(b"{}\n").as_str()));
        let blob = record.blob_path(file.blob.as_deref().unwrap());
        assert_eq!(fs::read(blob).unwrap(), b"{}\n");
    }

    #[test]
    fn test_backup_missing_file_is_new() {
        let project = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let record = BackupRecord::new(Uuid::new_v4(), None, backups.path());

        let file = backup_file(&record, project.path(), Path::new(".mcp.json")).unwrap();
        assert!(file.was_new());
        assert!(file.blob.is_none());
        assert!(!record.backup_dir.exists());
    }

    #[test]
    fn test_backup_rejects_traversal() {
        let project = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        let record = BackupRecord::new(Uuid::new_v4(), None, backups.path());

        let result = backup_file(&record, project.path(), Path::new("../outside"));
        assert!(matches!(result, Err(BackupError::InvalidPath(_))));
    }

    #[test]
    fn test_write_record() {
        let backups = TempDir::new().unwrap();
        let record = BackupRecord::new(Uuid::new_v4(), Some(Uuid::new_v4()), backups.path())
            .with_description("Apply profile team");

        let path = write_record(&record).unwrap();
        let loaded: BackupRecord = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(loaded, record);
    }
}
