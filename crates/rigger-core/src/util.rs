//! Path safety and small filesystem helpers

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

pub use rigger_scanner::types::sha256_hex;

/// Errors related to path validation
#[derive(Error, Debug)]
pub enum PathError {
    #[error("Path traversal attempt detected: {0}")]
    TraversalAttempt(String),

    #[error("Path escapes root directory: {0}")]
    EscapesRoot(String),

    #[error("Invalid path component: {0}")]
    InvalidComponent(String),
}

/// Join an untrusted relative path onto `root`, rejecting anything that
/// would land outside it
///
/// # Errors
/// Returns an error for absolute paths, `..` escapes, or symlinked escapes
pub fn safe_join(root: &Path, untrusted_path: &Path) -> Result<PathBuf, PathError> {
    let normalized = normalize_path(untrusted_path)?;
    let joined = root.join(&normalized);
    verify_under_root(root, &joined)?;
    Ok(joined)
}

/// Drop `.` components and resolve `..` without leaving the start
fn normalize_path(path: &Path) -> Result<PathBuf, PathError> {
    let mut normalized = PathBuf::new();
    let mut depth: usize = 0;

    for component in path.components() {
        match component {
            Component::Normal(c) => {
                if c.to_string_lossy().contains('\0') {
                    return Err(PathError::InvalidComponent("Null byte in path".to_string()));
                }
                normalized.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(PathError::TraversalAttempt(path.display().to_string()));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(PathError::InvalidComponent(format!(
                    "Absolute path not allowed: {}",
                    path.display()
                )));
            }
        }
    }

    Ok(normalized)
}

/// Existing paths are compared canonically so symlinks cannot smuggle a
/// write outside the root; new paths are checked logically.
fn verify_under_root(root: &Path, path: &Path) -> Result<(), PathError> {
    let escapes = || PathError::EscapesRoot(path.display().to_string());

    if root.exists() && path.exists() {
        let canonical_root = root.canonicalize().map_err(|_| escapes())?;
        let canonical_path = path.canonicalize().map_err(|_| escapes())?;
        if !canonical_path.starts_with(&canonical_root) {
            return Err(escapes());
        }
    } else if !path.starts_with(root) {
        return Err(escapes());
    }

    Ok(())
}

/// Validate a name (profile, skill, command, agent, hook, server) for use as
/// a single path component
///
/// # Errors
/// Returns an error if the name is empty, too long, hidden, or contains
/// separators, `..`, or NUL
pub fn validate_name(name: &str) -> Result<(), PathError> {
    if name.trim().is_empty() {
        return Err(PathError::InvalidComponent("Empty name".to_string()));
    }

    if name.len() > 255 {
        return Err(PathError::InvalidComponent(format!(
            "Name longer than 255 bytes: {name}"
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains path separator: {name}"
        )));
    }

    if name.contains("..") {
        return Err(PathError::TraversalAttempt(format!(
            "Name contains parent directory reference: {name}"
        )));
    }

    if name.starts_with('.') {
        return Err(PathError::InvalidComponent(format!(
            "Name cannot start with dot: {name}"
        )));
    }

    if name.contains('\0') {
        return Err(PathError::InvalidComponent("Name contains null byte".to_string()));
    }

    Ok(())
}

/// Write a file by renaming a fully written temporary file over it.
///
/// Parent directories are created as needed.
///
/// # Errors
/// Returns an IO error if any step fails
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Remove empty directories from `start` upwards, stopping at `stop_at`
pub fn remove_empty_dirs(start: &Path, stop_at: &Path) {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir == stop_at || !dir.starts_with(stop_at) {
            break;
        }
        // Fails on non-empty directories, which ends the walk
        if fs::remove_dir(dir).is_err() {
            break;
        }
        current = dir.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_safe_join_normal() {
        let root = PathBuf::from("/tmp/project");
        let result = safe_join(&root, Path::new("file.txt")).unwrap();
        assert_eq!(result, PathBuf::from("/tmp/project/file.txt"));
    }

    #[test]
    fn test_safe_join_nested() {
        let root = PathBuf::from("/tmp/project");
        let result = safe_join(&root, Path::new("dir/./subdir/file.txt")).unwrap();
        assert_eq!(result, PathBuf::from("/tmp/project/dir/subdir/file.txt"));
    }

    #[test]
    fn test_safe_join_rejects_traversal() {
        let root = PathBuf::from("/tmp/project");
        assert!(safe_join(&root, Path::new("../etc/passwd")).is_err());
        assert!(safe_join(&root, Path::new("a/../../etc")).is_err());
    }

    #[test]
    fn test_safe_join_rejects_absolute() {
        let root = PathBuf::from("/tmp/project");
        assert!(safe_join(&root, Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("my-skill").is_ok());
        assert!(validate_name("pretooluse-bash").is_ok());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("foo/bar").is_err());
        assert!(validate_name(".hidden").is_err());
        assert!(validate_name("  ").is_err());
    }

    #[test]
    fn test_write_atomic_creates_parents_and_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/file.txt");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
    }

    #[test]
    fn test_remove_empty_dirs_stops_at_root_and_content() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("keep/empty/deeper")).unwrap();
        fs::write(root.join("keep/file"), "x").unwrap();

        remove_empty_dirs(&root.join("keep/empty/deeper"), root);

        assert!(!root.join("keep/empty").exists());
        assert!(root.join("keep/file").exists());
        assert!(root.exists());
    }
}
