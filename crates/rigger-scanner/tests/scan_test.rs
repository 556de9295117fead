//! Scanner integration tests
//!
//! Tests the full scanning pipeline against fixture directories.

use std::fs;
use std::path::{Path, PathBuf};
use rigger_scanner::{ScanRoots, ScanWarningKind, Scanner, Scope};
use tempfile::TempDir;

/// A fake home directory with a project inside it
struct Fixture {
    _dir: TempDir,
    home: PathBuf,
    project: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let home = dir.path().join("home");
        let project = dir.path().join("work").join("app");
        fs::create_dir_all(home.join(".claude")).expect("Failed to create ~/.claude");
        fs::create_dir_all(project.join(".claude")).expect("Failed to create project .claude");
        Self {
            home: home.canonicalize().expect("Failed to canonicalize home"),
            project: project.canonicalize().expect("Failed to canonicalize project"),
            _dir: dir,
        }
    }

    fn scanner(&self) -> Scanner {
        Scanner::new(ScanRoots::with_home(&self.home))
    }

    fn write(&self, path: &Path, content: &str) {
        fs::create_dir_all(path.parent().expect("fixture path has a parent"))
            .expect("Failed to create parent directory");
        fs::write(path, content).expect("Failed to write fixture file");
    }

    fn skill(&self, root: &Path, name: &str) {
        self.write(
            &root.join("skills").join(name).join("SKILL.md"),
            &format!("---\nname: {name}\ndescription: {name} skill\n---\n\nDo {name}.\n"),
        );
    }

    fn agent(&self, root: &Path, name: &str) {
        self.write(
            &root.join("agents").join(format!("{name}.md")),
            &format!("---\nname: {name}\ndescription: {name} agent\ntools: Read, Grep\n---\n\nBody\n"),
        );
    }

    fn install_plugins(&self, plugins: &[(&str, PathBuf)]) {
        let entries: Vec<String> = plugins
            .iter()
            .map(|(key, path)| {
                format!(
                    r#""{key}": [{{"scope": "user", "installPath": "{}", "version": "1.0.0"}}]"#,
                    path.display()
                )
            })
            .collect();
        self.write(
            &self.home.join(".claude/plugins/installed_plugins.json"),
            &format!(r#"{{"version": 2, "plugins": {{{}}}}}"#, entries.join(",")),
        );
    }
}

#[test]
fn test_full_scan_collects_every_scope() {
    let fx = Fixture::new();
    let user_claude = fx.home.join(".claude");
    let project_claude = fx.project.join(".claude");

    fx.skill(&user_claude, "explain");
    fx.skill(&project_claude, "deploy");
    fx.agent(&project_claude, "reviewer");
    fx.write(
        &project_claude.join("commands/test-cmd.md"),
        "---\ndescription: A test command\n---\n\nRun $ARGUMENTS\n",
    );
    fx.write(
        &project_claude.join("settings.json"),
        r#"{"hooks": {"PreToolUse": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "check.sh"}]}]}}"#,
    );
    fx.write(
        &fx.project.join(".mcp.json"),
        r#"{"mcpServers": {"db": {"command": "db-server"}}}"#,
    );

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");

    assert_eq!(inventory.user_scope.artifacts.skills.len(), 1);
    let project = inventory.project.as_ref().expect("project scope");
    assert_eq!(project.name, "app");
    assert_eq!(project.artifacts.skills[0].name, "deploy");
    assert_eq!(project.artifacts.agents[0].tools, vec!["Read", "Grep"]);
    assert_eq!(project.artifacts.commands[0].name, "test-cmd");
    assert_eq!(project.artifacts.hooks[0].name, "pretooluse-bash");
    assert_eq!(project.artifacts.mcp_servers[0].name, "db");
    assert_eq!(project.artifacts.mcp_servers[0].scope, Scope::Project);

    assert_eq!(inventory.effective.skills.len(), 2);
    assert!(!inventory.collisions.has_collisions());
    assert!(inventory.warnings.is_empty());
}

#[test]
fn test_missing_directories_are_empty() {
    let fx = Fixture::new();
    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");

    assert!(inventory.effective.is_empty());
    assert!(inventory.managed_scope.is_none());
    assert!(inventory.plugins.installed.is_empty());
    assert!(inventory.warnings.is_empty());
}

#[test]
fn test_nonexistent_project_is_an_error() {
    let fx = Fixture::new();
    let result = fx.scanner().scan(&fx.project.join("missing"));
    assert!(result.is_err());
}

#[test]
fn test_broken_agent_is_skipped_with_warning() {
    let fx = Fixture::new();
    let agents = fx.project.join(".claude");
    fx.agent(&agents, "reviewer");
    fx.agent(&agents, "tester");
    fx.write(&agents.join("agents/broken.md"), "no frontmatter here\n");

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");
    let project = inventory.project.as_ref().expect("project scope");

    let names: Vec<&str> = project.artifacts.agents.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["reviewer", "tester"]);
    assert_eq!(inventory.warnings.len(), 1);
    assert_eq!(inventory.warnings[0].kind, ScanWarningKind::Agent);
    assert!(inventory.warnings[0].path.ends_with("agents/broken.md"));
}

#[test]
fn test_invalid_settings_json_is_a_warning() {
    let fx = Fixture::new();
    fx.write(&fx.project.join(".claude/settings.json"), "{ not json");
    fx.skill(&fx.project.join(".claude"), "still-here");

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");
    assert_eq!(inventory.effective.skills.len(), 1);
    assert_eq!(inventory.warnings.len(), 1);
    assert_eq!(inventory.warnings[0].kind, ScanWarningKind::Settings);
}

#[test]
fn test_plugin_tie_resolves_to_first_plugin_id() {
    let fx = Fixture::new();
    let plugin_a = fx.home.join(".claude/plugins/cache/a");
    let plugin_b = fx.home.join(".claude/plugins/cache/b");
    fx.skill(&plugin_a, "lint");
    fx.skill(&plugin_b, "lint");
    fx.install_plugins(&[("b@mkt", plugin_b.clone()), ("a@mkt", plugin_a.clone())]);

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");

    assert_eq!(inventory.plugins.installed.len(), 2);
    assert_eq!(inventory.collisions.skills.len(), 1);
    let collision = &inventory.collisions.skills[0];
    assert_eq!(collision.name, "lint");
    assert_eq!(collision.winner_scope, Scope::Plugin("a@mkt".into()));
    assert_eq!(collision.occurrences.len(), 2);
    assert_eq!(inventory.effective.skills.len(), 1);
    assert_eq!(inventory.effective.skills[0].scope, Scope::Plugin("a@mkt".into()));
}

#[test]
fn test_disabled_plugin_contributes_nothing() {
    let fx = Fixture::new();
    let plugin = fx.home.join(".claude/plugins/cache/fmt");
    fx.skill(&plugin, "format");
    fx.install_plugins(&[("fmt@mkt", plugin)]);
    fx.write(
        &fx.home.join(".claude/settings.json"),
        r#"{"enabledPlugins": {"fmt@mkt": false}}"#,
    );

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");
    assert_eq!(inventory.plugins.installed.len(), 1);
    assert!(!inventory.plugins.installed[0].enabled);
    assert!(inventory.effective.skills.is_empty());
}

#[test]
fn test_managed_scope_outranks_project() {
    let fx = Fixture::new();
    let managed = fx.home.join("managed");
    fx.agent(&managed, "reviewer");
    fx.agent(&fx.project.join(".claude"), "reviewer");
    fx.write(
        &managed.join("managed-mcp.json"),
        r#"{"mcpServers": {"db": {"command": "corp-db"}}}"#,
    );
    fx.write(
        &fx.project.join(".mcp.json"),
        r#"{"mcpServers": {"db": {"command": "db-server"}}}"#,
    );

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");

    assert!(inventory.managed_scope.is_some());
    assert_eq!(inventory.collisions.agents[0].winner_scope, Scope::Managed);
    assert_eq!(inventory.collisions.mcp_servers[0].winner_scope, Scope::Managed);
    assert_eq!(
        inventory.effective.mcp_servers[0].command.as_deref(),
        Some("corp-db")
    );
}

#[test]
fn test_managed_scope_can_be_excluded() {
    let fx = Fixture::new();
    fx.agent(&fx.home.join("managed"), "reviewer");

    let inventory = fx
        .scanner()
        .with_managed(false)
        .scan(&fx.project)
        .expect("scan should succeed");
    assert!(inventory.managed_scope.is_none());
    assert!(inventory.effective.agents.is_empty());
}

#[test]
fn test_local_scope_from_settings_local_and_user_config() {
    let fx = Fixture::new();
    fx.write(
        &fx.project.join(".claude/settings.local.json"),
        r#"{"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "say done"}]}]}}"#,
    );
    fx.write(
        &fx.home.join(".claude.json"),
        &format!(
            r#"{{"mcpServers": {{"search": {{"command": "user-search"}}}},
                "projects": {{"{}": {{"mcpServers": {{"search": {{"command": "local-search"}}}}}}}}}}"#,
            fx.project.display()
        ),
    );

    let inventory = fx.scanner().scan(&fx.project).expect("scan should succeed");
    let project = inventory.project.as_ref().expect("project scope");

    assert_eq!(project.local.hooks.len(), 1);
    assert_eq!(project.local.hooks[0].scope, Scope::Local);
    assert_eq!(project.local.mcp_servers.len(), 1);
    assert_eq!(inventory.collisions.mcp_servers[0].winner_scope, Scope::Local);
    assert_eq!(
        inventory.effective.mcp_servers[0].command.as_deref(),
        Some("local-search")
    );
}

#[test]
fn test_invalid_user_config_is_a_warning() {
    let fx = Fixture::new();
    fx.write(&fx.home.join(".claude.json"), r#"{"projects": {"#);
    fx.agent(&fx.project.join(".claude"), "reviewer");

    let inventory = fx
        .scanner()
        .with_managed(false)
        .scan(&fx.project)
        .expect("scan should succeed");

    assert_eq!(inventory.effective.agents.len(), 1);
    assert_eq!(inventory.warnings.len(), 1);
    assert_eq!(inventory.warnings[0].kind, ScanWarningKind::Mcp);
    assert!(inventory.warnings[0].path.ends_with(".claude.json"));

    let user_only = fx.scanner().with_managed(false).scan_user_scope();
    assert_eq!(user_only.warnings.len(), 1);
}

#[test]
fn test_project_plugin_only_visible_in_its_project() {
    let fx = Fixture::new();
    let plugin = fx.home.join(".claude/plugins/cache/proj");
    fx.skill(&plugin, "scoped");
    let other = fx.project.parent().expect("project parent").join("other");
    fs::create_dir_all(&other).expect("Failed to create other project");
    fx.write(
        &fx.home.join(".claude/plugins/installed_plugins.json"),
        &format!(
            r#"{{"plugins": {{"proj@mkt": [{{"scope": "project", "projectPath": "{}", "installPath": "{}", "version": "0.1.0"}}]}}}}"#,
            fx.project.display(),
            plugin.display()
        ),
    );

    let scanner = fx.scanner();
    let here = scanner.scan(&fx.project).expect("scan should succeed");
    let there = scanner.scan(&other).expect("scan should succeed");
    assert_eq!(here.effective.skills.len(), 1);
    assert!(there.effective.skills.is_empty());
}

#[test]
fn test_scan_many_returns_one_inventory_per_project() {
    let fx = Fixture::new();
    let second = fx.project.parent().expect("project parent").join("second");
    fs::create_dir_all(second.join(".claude")).expect("Failed to create second project");
    fx.skill(&second.join(".claude"), "only-here");

    let missing = fx.project.join("nope");
    let results = fx
        .scanner()
        .scan_many(&[fx.project.as_path(), second.as_path(), missing.as_path()]);

    assert_eq!(results.len(), 3);
    assert!(results[0].as_ref().expect("first scan").effective.skills.is_empty());
    assert_eq!(results[1].as_ref().expect("second scan").effective.skills.len(), 1);
    assert!(results[2].is_err());
}

#[test]
fn test_repeated_scans_are_equal() {
    let fx = Fixture::new();
    fx.skill(&fx.project.join(".claude"), "a");
    fx.skill(&fx.project.join(".claude"), "b");
    fx.skill(&fx.home.join(".claude"), "a");

    let scanner = fx.scanner();
    let first = scanner.scan(&fx.project).expect("scan should succeed");
    let second = scanner.scan(&fx.project).expect("scan should succeed");
    assert_eq!(first.project, second.project);
    assert_eq!(first.effective, second.effective);
    assert_eq!(first.collisions, second.collisions);
}

#[test]
fn test_user_scope_scan_has_no_project() {
    let fx = Fixture::new();
    fx.skill(&fx.home.join(".claude"), "explain");

    let inventory = fx.scanner().scan_user_scope();
    assert!(inventory.project.is_none());
    assert_eq!(inventory.effective.skills.len(), 1);
}
