//! CLI integration tests using assert_cmd
//!
//! Every test runs against a private home and data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Env {
    _dir: TempDir,
    home: PathBuf,
    data: PathBuf,
    work: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let home = dir.path().join("home");
        let data = dir.path().join("data");
        let work = dir.path().join("work");
        for path in [&home, &data, &work] {
            fs::create_dir_all(path).unwrap();
        }
        Self {
            _dir: dir,
            home,
            data,
            work,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("rigger").expect("Failed to find rigger binary");
        cmd.env("HOME", &self.home)
            .env("RIGGER_DATA_DIR", &self.data)
            .env("RIGGER_MANAGED_DIR", self.home.join("managed"))
            .env_remove("RUST_LOG");
        cmd
    }

    fn project(&self, name: &str) -> PathBuf {
        let path = self.work.join(name);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

fn write_agent(project: &Path, name: &str) {
    let dir = project.join(".claude/agents");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("{name}.md")),
        format!("---\nname: {name}\ndescription: Reviews code\ntools: Read, Grep\n---\nReview the diff.\n"),
    )
    .unwrap();
}

fn backup_id(stdout: &[u8]) -> String {
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|line| line.strip_prefix("Backup created: "))
        .expect("no backup id in output")
        .trim()
        .to_string()
}

#[test]
fn test_help_command() {
    Env::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rigger - Claude Code profile manager"));
}

#[test]
fn test_version_command() {
    Env::new()
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rigger"));
}

#[test]
fn test_subcommand_help() {
    let env = Env::new();
    env.cmd()
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scan Claude Code configuration"));
    env.cmd()
        .args(["profile", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage profiles"));
    env.cmd()
        .args(["project", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage registered projects"));
}

#[test]
fn test_profile_list_empty() {
    Env::new()
        .cmd()
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles found."));
}

#[test]
fn test_scan_user_scope_summary() {
    let env = Env::new();
    env.cmd()
        .arg("scan")
        .assert()
        .success()
        .stdout(predicate::str::contains("User scope:"))
        .stdout(predicate::str::contains("User: 0 skills"));
}

#[test]
fn test_scan_project_json() {
    let env = Env::new();
    let project = env.project("app");
    write_agent(&project, "reviewer");

    let output = env
        .cmd()
        .args(["scan", "--format", "json"])
        .arg(&project)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let json: serde_json::Value = serde_json::from_slice(&output).expect("scan output is JSON");
    assert!(json.to_string().contains("reviewer"));
}

#[test]
fn test_scan_writes_output_file() {
    let env = Env::new();
    let project = env.project("app");
    write_agent(&project, "reviewer");
    let report = env.work.join("inventory.md");

    env.cmd()
        .args(["scan", "--format", "markdown", "--output"])
        .arg(&report)
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote report to:"));

    let content = fs::read_to_string(report).unwrap();
    assert!(content.contains("# Rigger Inventory Report"));
}

#[test]
fn test_scan_missing_project_fails() {
    let env = Env::new();
    env.cmd()
        .arg("scan")
        .arg(env.work.join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to scan"));
}

#[test]
fn test_show_missing_profile() {
    Env::new()
        .cmd()
        .args(["profile", "show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile not found: nope"));
}

#[test]
fn test_create_rejects_invalid_name() {
    Env::new()
        .cmd()
        .args(["profile", "create", "../escape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("INVALID_NAME"));
}

#[test]
fn test_apply_and_rollback_flow() {
    let env = Env::new();
    let source = env.project("source");
    write_agent(&source, "reviewer");
    let target = env.project("target");

    env.cmd()
        .args(["profile", "create", "team", "--source"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created profile:"));

    env.cmd()
        .args(["profile", "show", "team"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reviewer"));

    env.cmd()
        .args(["profile", "apply", "team", "--dry-run"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run - no changes made."));
    assert!(!target.join(".claude/agents/reviewer.md").exists());

    let output = env
        .cmd()
        .args(["profile", "apply", "team"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 1 operations."))
        .get_output()
        .stdout
        .clone();
    assert!(target.join(".claude/agents/reviewer.md").exists());

    env.cmd()
        .args(["profile", "preview", "team"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 create(s)"));

    env.cmd()
        .args(["profile", "backups"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Apply profile 'team'"));

    let id = backup_id(&output);
    env.cmd()
        .args(["profile", "rollback", &id])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled back 1 files."));
    assert!(!target.join(".claude/agents/reviewer.md").exists());

    env.cmd()
        .args(["profile", "backups"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("[rolled back "));
}

#[test]
fn test_rollback_unknown_backup() {
    let env = Env::new();
    let target = env.project("target");

    env.cmd()
        .args(["profile", "rollback", "00000000-0000-0000-0000-000000000000"])
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT_FOUND"));
}

#[test]
fn test_delete_profile_keeps_tools_local() {
    let env = Env::new();
    let source = env.project("source");
    write_agent(&source, "reviewer");
    let target = env.project("target");

    env.cmd()
        .args(["profile", "create", "team", "--source"])
        .arg(&source)
        .assert()
        .success();
    env.cmd()
        .args(["profile", "assign", "team"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Assigned 'team'"));

    env.cmd()
        .args(["profile", "delete", "team", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 project(s) kept its tools"));

    env.cmd()
        .args(["project", "show"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile: none"))
        .stdout(predicate::str::contains("agent reviewer [local]"));
}
