//! Rollback restore functionality

use crate::backup::{BackupFile, BackupRecord};
use crate::util::{remove_empty_dirs, safe_join, sha256_hex, write_atomic, PathError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors during restore
#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Backup copy of {path} is missing")]
    MissingBlob { path: PathBuf },

    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Path security error: {0}")]
    PathSecurity(#[from] PathError),
}

impl RestoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Verify backup integrity using SHA256 hashes
///
/// # Errors
/// Returns an error for the first blob that is missing or does not match
/// its recorded hash
pub fn verify(record: &BackupRecord) -> Result<(), RestoreError> {
    for file in &record.files {
        read_blob(record, file)?;
    }
    Ok(())
}

/// Restore a project to its state before the apply that made `record`
///
/// Files the apply overwrote or removed get their original bytes back and
/// files it created are removed. Running it again changes nothing.
///
/// Returns the number of files changed.
///
/// # Errors
/// Returns an error if verification fails or a file cannot be restored
pub fn restore(record: &BackupRecord, project_root: &Path) -> Result<usize, RestoreError> {
    // Nothing is touched unless every blob checks out
    verify(record)?;

    let mut changed = 0;
    for file in &record.files {
        let target = safe_join(project_root, &file.path)?;

        if let Some(original) = read_blob(record, file)? {
            if fs::read(&target).is_ok_and(|current| current == original) {
                continue;
            }
            write_atomic(&target, &original).map_err(|e| RestoreError::io(&target, e))?;
            changed += 1;
            tracing::debug!(path = %file.path.display(), "restored file");
        } else if file.was_new() && file.written_sha256.is_some() {
            match fs::remove_file(&target) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(RestoreError::io(&target, e)),
            }
            if let Some(parent) = target.parent() {
                remove_empty_dirs(parent, project_root);
            }
            changed += 1;
            tracing::debug!(path = %file.path.display(), "removed created file");
        }
    }

    tracing::info!(
        backup = %record.id,
        project = %project_root.display(),
        changed,
        "rolled back apply"
    );
    Ok(changed)
}

/// Read and check the original content of a file, if the backup holds one
fn read_blob(record: &BackupRecord, file: &BackupFile) -> Result<Option<Vec<u8>>, RestoreError> {
    let (Some(blob), Some(expected)) = (&file.blob, &file.original_sha256) else {
        return Ok(None);
    };

    let path = safe_join(&record.backup_dir, blob)?;
    let content = match fs::read(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(RestoreError::MissingBlob {
                path: file.path.clone(),
            });
        }
        Err(e) => return Err(RestoreError::io(&path, e)),
    };

    let actual = sha256_hex(&content);
    if &actual != expected {
        return Err(RestoreError::HashMismatch {
            path: file.path.clone(),
            expected: expected.clone(),
            actual,
        });
    }
    Ok(Some(content))
}
