//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use rigger_core::plugins::PluginInstaller;
use rigger_core::storage::Database;
use rigger_core::{Engine, EngineConfig, PluginRef};
use rigger_scanner::ScanRoots;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Installer that records requests instead of running the host CLI
#[derive(Clone, Default)]
pub struct RecordingInstaller {
    pub installed: Arc<Mutex<Vec<String>>>,
    pub failing: Arc<Vec<String>>,
}

impl PluginInstaller for RecordingInstaller {
    fn install(&self, _project: &Path, plugin: &PluginRef) -> Result<(), String> {
        let key = plugin.key();
        if self.failing.contains(&key) {
            return Err(format!("marketplace unavailable for {key}"));
        }
        self.installed.lock().unwrap().push(key);
        Ok(())
    }
}

/// A fake home, a data directory and a work area for projects
pub struct Fixture {
    _dir: TempDir,
    pub home: PathBuf,
    pub data: PathBuf,
    pub work: PathBuf,
    pub engine: Engine,
    pub installer: RecordingInstaller,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_installer(RecordingInstaller::default())
    }

    pub fn with_installer(installer: RecordingInstaller) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let root = dir.path().canonicalize().expect("Failed to canonicalize temp dir");
        let home = root.join("home");
        let data = root.join("data");
        let work = root.join("work");
        for path in [&home, &data, &work] {
            fs::create_dir_all(path).expect("Failed to create fixture directory");
        }

        let config = EngineConfig::new(&data, ScanRoots::with_home(&home));
        let db = Database::in_memory().expect("Failed to create in-memory database");
        let engine = Engine::with_installer(config, db, Box::new(installer.clone()));

        Self {
            _dir: dir,
            home,
            data,
            work,
            engine,
            installer,
        }
    }

    /// Create an empty project directory
    pub fn project(&self, name: &str) -> PathBuf {
        let path = self.work.join(name);
        fs::create_dir_all(&path).expect("Failed to create project");
        path
    }

    pub fn write(&self, path: &Path, content: &str) {
        fs::create_dir_all(path.parent().expect("fixture path has a parent"))
            .expect("Failed to create parent directory");
        fs::write(path, content).expect("Failed to write fixture file");
    }

    pub fn agent(&self, project: &Path, name: &str, body: &str) {
        self.write(
            &project.join(".claude/agents").join(format!("{name}.md")),
            &format!("---\nname: {name}\ndescription: {name} agent\ntools: Read, Grep\n---\n\n{body}\n"),
        );
    }

    /// A project holding one of every kind of tool
    pub fn source_project(&self) -> PathBuf {
        let source = self.project("source");
        self.agent(&source, "reviewer", "Review the diff.");
        self.write(
            &source.join(".claude/skills/lint/SKILL.md"),
            "---\nname: lint\ndescription: Lint the code\nallowed-tools: Bash, Read\n---\n\nRun the linter.\n",
        );
        self.write(&source.join(".claude/skills/lint/rules.txt"), "no-unused\n");
        self.write(
            &source.join(".claude/commands/deploy.md"),
            "---\ndescription: Deploy\n---\n\nDeploy it.\n",
        );
        self.write(
            &source.join(".mcp.json"),
            r#"{"mcpServers": {"search": {"command": "npx", "args": ["search-server"]}}}"#,
        );
        self.write(
            &source.join(".claude/settings.json"),
            r#"{"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "notify"}]}]}}"#,
        );
        source
    }
}

/// Path → sha256 of every file under a directory
pub fn snapshot_directory(dir: &Path) -> BTreeMap<PathBuf, String> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let content = fs::read(entry.path()).expect("Failed to read file");
            let relative = entry.path().strip_prefix(dir).expect("entry under dir").to_path_buf();
            (relative, hex::encode(Sha256::digest(&content)))
        })
        .collect()
}
