//! Non-destructive guarantee tests
//!
//! The scanner must never create, modify, or delete files.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use rigger_scanner::{ScanRoots, Scanner};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Compute SHA256 hash of a file
fn hash_file(path: &Path) -> Option<String> {
    let content = fs::read(path).ok()?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Some(hex::encode(hasher.finalize()))
}

/// Create a snapshot of every file and directory under a path
fn snapshot_directory(path: &Path) -> BTreeMap<String, Option<String>> {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(path)
                .unwrap()
                .to_string_lossy()
                .to_string();
            let hash = entry
                .file_type()
                .is_file()
                .then(|| hash_file(entry.path()))
                .flatten();
            (relative, hash)
        })
        .collect()
}

#[test]
fn test_scan_does_not_touch_anything() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let home = temp_dir.path().join("home");
    let project = temp_dir.path().join("project");

    fs::create_dir_all(home.join(".claude/skills/my-skill")).unwrap();
    fs::write(
        home.join(".claude/skills/my-skill/SKILL.md"),
        "---\nname: my-skill\ndescription: Test skill\n---\n\nInstructions here.\n",
    )
    .unwrap();
    fs::write(home.join(".claude.json"), r#"{"mcpServers": {"x": {"command": "x"}}}"#).unwrap();

    fs::create_dir_all(project.join(".claude/agents")).unwrap();
    fs::write(
        project.join(".claude/agents/broken.md"),
        "definitely not an agent\n",
    )
    .unwrap();
    fs::write(
        project.join(".claude/settings.json"),
        r#"{"permissions": {"allow": ["Bash(*)"]}, "hooks": {}}"#,
    )
    .unwrap();
    fs::write(project.join(".claude/settings.local.json"), r#"{"env": {"DEBUG": "true"}}"#)
        .unwrap();

    let before = snapshot_directory(temp_dir.path());

    let scanner = Scanner::new(ScanRoots::with_home(&home));
    let inventory = scanner.scan(&project).expect("scan should succeed");
    assert_eq!(inventory.warnings.len(), 1);
    let _ = scanner.scan_user_scope();

    let after = snapshot_directory(temp_dir.path());
    assert_eq!(before, after, "scanner modified the filesystem");
}
