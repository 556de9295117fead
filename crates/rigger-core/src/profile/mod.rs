//! Profile types and operations

pub mod snapshot;
pub mod storage;
pub mod sync;
mod types;

pub use snapshot::SnapshotError;
pub use storage::{StorageError, StoredHook, ToolStore};
pub use sync::{effective_tools, ConvertResult, UpdateResult};
pub use types::*;
