//! Per-project locks
//!
//! Applies, rollbacks and profile mutations that touch a project run while
//! holding that project's lock. Projects are keyed by canonical path so two
//! spellings of the same directory share a lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registry of per-project mutexes
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<PathBuf, ProjectLock>>,
}

/// Handle to one project's mutex
#[derive(Debug, Clone)]
pub struct ProjectLock {
    path: PathBuf,
    mutex: Arc<Mutex<()>>,
}

impl ProjectLock {
    /// Block until the project is free
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Canonical project path this lock guards
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProjectLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for a project
    pub fn handle(&self, project: &Path) -> ProjectLock {
        let key = canonical_key(project);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key.clone())
            .or_insert_with(|| ProjectLock {
                path: key,
                mutex: Arc::default(),
            })
            .clone()
    }

    /// Lock handles for several projects, deduplicated and in path order
    ///
    /// Taking them in the returned order keeps two multi-project operations
    /// from deadlocking each other.
    pub fn handles<'a>(&self, projects: impl IntoIterator<Item = &'a Path>) -> Vec<ProjectLock> {
        let mut handles: Vec<ProjectLock> = projects.into_iter().map(|p| self.handle(p)).collect();
        handles.sort_by(|a, b| a.path.cmp(&b.path));
        handles.dedup_by(|a, b| a.path == b.path);
        handles
    }
}

/// Lock all handles in order
pub fn lock_all(handles: &[ProjectLock]) -> Vec<MutexGuard<'_, ()>> {
    handles.iter().map(ProjectLock::lock).collect()
}

fn canonical_key(project: &Path) -> PathBuf {
    project
        .canonicalize()
        .unwrap_or_else(|_| project.to_path_buf())
}
