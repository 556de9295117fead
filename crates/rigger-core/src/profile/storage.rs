//! Tool content storage
//!
//! Every profile (and every project with local overrides) owns a directory
//! holding the content its [`ToolRef`]s point at:
//!
//! ```text
//! <root>/skills/<name>/SKILL.md   (plus any supporting files)
//! <root>/commands/<name>.md
//! <root>/agents/<name>.md
//! <root>/mcp/<name>.json          (the server's JSON config)
//! <root>/hooks/<name>.json        (event, matcher, and the raw matcher group)
//! ```

use crate::profile::{ToolRef, ToolType};
use crate::util::{safe_join, validate_name, write_atomic, PathError};
use rigger_scanner::inventory::EntityRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Maximum directory depth when copying a skill
const MAX_DEPTH: usize = 50;

/// Maximum number of files in one skill directory
const MAX_FILES: usize = 10_000;

/// Maximum size of a single stored file (10 MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Errors from the tool content store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid tool name: {0}")]
    InvalidName(#[from] PathError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A hook rule as stored in a tool store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHook {
    /// Hook event (`PreToolUse`, `Stop`, ...)
    pub event: String,
    /// Matcher of the group, absent for event-wide rules
    #[serde(default)]
    pub matcher: Option<String>,
    /// The matcher group exactly as it appears in a settings file
    pub entry: Value,
}

/// Directory of tool content owned by one profile or project
#[derive(Debug, Clone)]
pub struct ToolStore {
    root: PathBuf,
}

impl ToolStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a tool's content (directory for skills, file otherwise)
    pub fn tool_path(&self, tool_type: ToolType, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        let relative = match tool_type {
            ToolType::Skill => PathBuf::from("skills").join(name),
            ToolType::Command => PathBuf::from("commands").join(format!("{name}.md")),
            ToolType::Agent => PathBuf::from("agents").join(format!("{name}.md")),
            ToolType::Mcp => PathBuf::from("mcp").join(format!("{name}.json")),
            ToolType::Hook => PathBuf::from("hooks").join(format!("{name}.json")),
        };
        Ok(safe_join(&self.root, &relative)?)
    }

    /// Check whether content exists for a tool
    #[must_use]
    pub fn contains(&self, tool_type: ToolType, name: &str) -> bool {
        self.tool_path(tool_type, name)
            .is_ok_and(|path| match tool_type {
                ToolType::Skill => path.join("SKILL.md").is_file(),
                _ => path.is_file(),
            })
    }

    /// Copy a scanned entity into the store and return a reference to it
    pub fn import_entity(&self, entity: EntityRef<'_>) -> Result<ToolRef, StorageError> {
        let tool_ref = match entity {
            EntityRef::Skill(skill) => {
                self.store_skill(&skill.name, skill.dir())?;
                ToolRef::new(&skill.name, ToolType::Skill)
            }
            EntityRef::Command(command) => {
                self.store_file(ToolType::Command, &command.name, &command.path)?;
                ToolRef::new(&command.name, ToolType::Command)
            }
            EntityRef::Agent(agent) => {
                self.store_file(ToolType::Agent, &agent.name, &agent.path)?;
                ToolRef::new(&agent.name, ToolType::Agent)
            }
            EntityRef::Hook(hook) => {
                let stored = StoredHook {
                    event: hook.trigger.clone(),
                    matcher: hook.matcher.clone(),
                    entry: hook.entry.clone(),
                };
                self.store_hook(&hook.name, &stored)?;
                ToolRef::new(&hook.name, ToolType::Hook)
            }
            EntityRef::Mcp(server) => {
                self.store_mcp(&server.name, &server.raw)?;
                ToolRef::new(&server.name, ToolType::Mcp)
            }
        };

        Ok(tool_ref.with_source_scope(entity.scope().clone()))
    }

    /// Copy a skill directory, replacing any previous copy
    pub fn store_skill(&self, name: &str, source_dir: &Path) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(ToolType::Skill, name)?;
        if dest.exists() {
            fs::remove_dir_all(&dest).map_err(|e| StorageError::io(&dest, e))?;
        }
        copy_dir_limited(source_dir, &dest)?;
        Ok(dest)
    }

    /// Copy a single-file tool (command or agent)
    pub fn store_file(
        &self,
        tool_type: ToolType,
        name: &str,
        source: &Path,
    ) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(tool_type, name)?;
        let content = read_limited(source)?;
        write_atomic(&dest, &content).map_err(|e| StorageError::io(&dest, e))?;
        Ok(dest)
    }

    /// Store an MCP server configuration
    pub fn store_mcp(&self, name: &str, config: &Value) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(ToolType::Mcp, name)?;
        self.write_json(&dest, config)?;
        Ok(dest)
    }

    /// Store a hook rule
    pub fn store_hook(&self, name: &str, hook: &StoredHook) -> Result<PathBuf, StorageError> {
        let dest = self.tool_path(ToolType::Hook, name)?;
        let value = serde_json::to_value(hook).map_err(|source| StorageError::Json {
            path: dest.clone(),
            source,
        })?;
        self.write_json(&dest, &value)?;
        Ok(dest)
    }

    /// Load a stored MCP server configuration
    pub fn load_mcp(&self, name: &str) -> Result<Option<Value>, StorageError> {
        let path = self.tool_path(ToolType::Mcp, name)?;
        read_json(&path)
    }

    /// Load a stored hook rule
    pub fn load_hook(&self, name: &str) -> Result<Option<StoredHook>, StorageError> {
        let path = self.tool_path(ToolType::Hook, name)?;
        read_json::<Value>(&path)?
            .map(|value| {
                serde_json::from_value(value).map_err(|source| StorageError::Json { path, source })
            })
            .transpose()
    }

    /// Read a stored command or agent file
    pub fn load_file(&self, tool_type: ToolType, name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.tool_path(tool_type, name)?;
        if !path.is_file() {
            return Ok(None);
        }
        read_limited(&path).map(Some)
    }

    /// All files of a stored skill as `(relative path, bytes)`, sorted by path
    pub fn skill_files(&self, name: &str) -> Result<Vec<(PathBuf, Vec<u8>)>, StorageError> {
        let dir = self.tool_path(ToolType::Skill, name)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir)
            .max_depth(MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
        {
            let Ok(relative) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            files.push((relative.to_path_buf(), read_limited(entry.path())?));
        }
        Ok(files)
    }

    /// Copy a tool's content into another store
    ///
    /// Returns `false` when this store has no content for the tool.
    pub fn copy_tool_to(
        &self,
        tool_type: ToolType,
        name: &str,
        other: &ToolStore,
    ) -> Result<bool, StorageError> {
        if !self.contains(tool_type, name) {
            return Ok(false);
        }

        let source = self.tool_path(tool_type, name)?;
        match tool_type {
            ToolType::Skill => {
                other.store_skill(name, &source)?;
            }
            _ => {
                other.store_file(tool_type, name, &source)?;
            }
        }
        Ok(true)
    }

    /// Remove a tool's content
    pub fn remove(&self, tool_type: ToolType, name: &str) -> Result<bool, StorageError> {
        let path = self.tool_path(tool_type, name)?;
        let result = if tool_type == ToolType::Skill {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    /// Remove the whole store directory
    pub fn destroy(&self) -> Result<(), StorageError> {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(&self.root, e)),
        }
    }

    fn write_json(&self, dest: &Path, value: &Value) -> Result<(), StorageError> {
        let mut content = serde_json::to_vec_pretty(value).map_err(|source| StorageError::Json {
            path: dest.to_path_buf(),
            source,
        })?;
        content.push(b'\n');
        write_atomic(dest, &content).map_err(|e| StorageError::io(dest, e))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = read_limited(path)?;
    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn read_limited(path: &Path) -> Result<Vec<u8>, StorageError> {
    let metadata = fs::metadata(path).map_err(|e| StorageError::io(path, e))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(StorageError::LimitExceeded(format!(
            "{} exceeds maximum size of {MAX_FILE_SIZE} bytes",
            path.display()
        )));
    }
    fs::read(path).map_err(|e| StorageError::io(path, e))
}

/// Copy a directory tree, skipping symlinks and enforcing depth, count, and
/// size limits
fn copy_dir_limited(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if !src.is_dir() {
        return Err(StorageError::NotFound(format!(
            "skill directory {}",
            src.display()
        )));
    }

    let mut file_count = 0usize;
    fs::create_dir_all(dst).map_err(|e| StorageError::io(dst, e))?;

    for entry in WalkDir::new(src).min_depth(1).max_depth(MAX_DEPTH + 1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            StorageError::Io {
                path,
                source: e.into(),
            }
        })?;

        if entry.depth() > MAX_DEPTH {
            return Err(StorageError::LimitExceeded(format!(
                "directory depth exceeds maximum of {MAX_DEPTH}: {}",
                src.display()
            )));
        }

        // Symlinks could point outside the skill or loop back into it
        if entry.path_is_symlink() {
            tracing::debug!(path = %entry.path().display(), "skipping symlink");
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = safe_join(dst, relative)?;

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| StorageError::io(&target, e))?;
            continue;
        }

        file_count += 1;
        if file_count > MAX_FILES {
            return Err(StorageError::LimitExceeded(format!(
                "file count exceeds maximum of {MAX_FILES}: {}",
                src.display()
            )));
        }

        let content = read_limited(entry.path())?;
        write_atomic(&target, &content).map_err(|e| StorageError::io(&target, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_skill(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("scripts")).expect("Failed to create skill dir");
        fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: test\n---\n\nBody\n"),
        )
        .expect("Failed to write SKILL.md");
        fs::write(dir.join("scripts/run.sh"), "echo hi\n").expect("Failed to write script");
        dir
    }

    #[test]
    fn test_store_and_list_skill_files() {
        let src = TempDir::new().unwrap();
        let store_dir = TempDir::new().unwrap();
        let store = ToolStore::new(store_dir.path());

        let skill = make_skill(src.path(), "lint");
        store.store_skill("lint", &skill).unwrap();

        assert!(store.contains(ToolType::Skill, "lint"));
        let files = store.skill_files("lint").unwrap();
        let names: Vec<_> = files.iter().map(|(p, _)| p.clone()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("SKILL.md"), PathBuf::from("scripts/run.sh")]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_store_skill_skips_symlinks() {
        let src = TempDir::new().unwrap();
        let store_dir = TempDir::new().unwrap();
        let store = ToolStore::new(store_dir.path());

        let skill = make_skill(src.path(), "lint");
        fs::write(src.path().join("secret"), "nope").unwrap();
        std::os::unix::fs::symlink(src.path().join("secret"), skill.join("link")).unwrap();

        store.store_skill("lint", &skill).unwrap();
        assert!(!store_dir.path().join("skills/lint/link").exists());
    }

    #[test]
    fn test_rejects_traversal_names() {
        let store_dir = TempDir::new().unwrap();
        let store = ToolStore::new(store_dir.path());
        assert!(store.tool_path(ToolType::Agent, "../escape").is_err());
        assert!(store
            .store_mcp("../../etc", &serde_json::json!({"command": "x"}))
            .is_err());
    }

    #[test]
    fn test_hook_and_mcp_roundtrip_and_remove() {
        let store_dir = TempDir::new().unwrap();
        let store = ToolStore::new(store_dir.path());

        let hook = StoredHook {
            event: "PreToolUse".into(),
            matcher: Some("Bash".into()),
            entry: serde_json::json!({"matcher": "Bash", "hooks": [{"type": "command", "command": "check"}]}),
        };
        store.store_hook("pretooluse-bash", &hook).unwrap();
        store
            .store_mcp("search", &serde_json::json!({"command": "npx"}))
            .unwrap();

        assert_eq!(store.load_hook("pretooluse-bash").unwrap(), Some(hook));
        assert!(store.load_mcp("missing").unwrap().is_none());

        assert!(store.remove(ToolType::Mcp, "search").unwrap());
        assert!(!store.remove(ToolType::Mcp, "search").unwrap());
    }

    #[test]
    fn test_copy_tool_to_other_store() {
        let a_dir = TempDir::new().unwrap();
        let b_dir = TempDir::new().unwrap();
        let a = ToolStore::new(a_dir.path());
        let b = ToolStore::new(b_dir.path());

        let src = TempDir::new().unwrap();
        let agent = src.path().join("reviewer.md");
        fs::write(&agent, "---\nname: reviewer\ndescription: r\n---\n").unwrap();
        a.store_file(ToolType::Agent, "reviewer", &agent).unwrap();

        assert!(a.copy_tool_to(ToolType::Agent, "reviewer", &b).unwrap());
        assert!(!a.copy_tool_to(ToolType::Command, "absent", &b).unwrap());
        assert_eq!(
            b.load_file(ToolType::Agent, "reviewer").unwrap(),
            a.load_file(ToolType::Agent, "reviewer").unwrap()
        );
    }
}
