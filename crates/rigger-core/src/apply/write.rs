//! File write operations

use super::OperationError;
use crate::backup::{backup_file, BackupError, BackupRecord};
use crate::diff::{DiffPlan, FileOperation, ManagedState};
use crate::util::{remove_empty_dirs, safe_join, sha256_hex, write_atomic, PathError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur for one operation during apply
#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Backup failed: {0}")]
    Backup(#[from] BackupError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Path security error: {0}")]
    PathSecurity(#[from] PathError),
}

/// Carry out a plan, recording every touched file in `record`
///
/// Each operation is backed up before it runs. An operation whose backup
/// fails is skipped; a failing operation does not stop the others. The
/// record's managed state is taken from the plan, with failed paths reverted
/// to `previous`.
///
/// Returns the number of operations applied and the failures.
pub fn execute(
    plan: &DiffPlan,
    project_root: &Path,
    record: &mut BackupRecord,
    previous: &ManagedState,
) -> (usize, Vec<OperationError>) {
    record.managed = plan.managed.clone();

    let mut applied = 0;
    let mut errors = Vec::new();
    for operation in &plan.operations {
        let path = operation.path();
        match apply_operation(operation, project_root, record) {
            Ok(()) => {
                applied += 1;
                tracing::debug!(path = %path.display(), delete = operation.is_delete(), "applied");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "operation failed");
                revert_managed(&mut record.managed, previous, path);
                errors.push(OperationError {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }
    (applied, errors)
}

fn apply_operation(
    operation: &FileOperation,
    project_root: &Path,
    record: &mut BackupRecord,
) -> Result<(), ApplyError> {
    let relative = operation.path();
    let full_path = safe_join(project_root, relative)?;
    let entry = backup_file(record, project_root, relative)?;

    match operation.content() {
        Some(content) => {
            write_atomic(&full_path, content)?;
            record.files.push(entry.with_written(sha256_hex(content)));
        }
        None => {
            match fs::remove_file(&full_path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            if let Some(parent) = full_path.parent() {
                remove_empty_dirs(parent, project_root);
            }
            record.files.push(entry);
        }
    }
    Ok(())
}

/// Ownership of a path whose operation failed stays as it was
fn revert_managed(managed: &mut ManagedState, previous: &ManagedState, path: &Path) {
    let path: PathBuf = path.to_path_buf();
    if previous.files.contains(&path) {
        managed.files.insert(path.clone());
    } else {
        managed.files.remove(&path);
    }
    match previous.entries.get(&path) {
        Some(keys) => {
            managed.entries.insert(path, keys.clone());
        }
        None => {
            managed.entries.remove(&path);
        }
    }
}
