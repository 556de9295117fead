//! Backup and rollback functionality

pub mod create;
pub mod restore;
mod types;

pub use create::{backup_file, write_record, BackupError};
pub use restore::{restore, verify, RestoreError};
pub use types::*;
