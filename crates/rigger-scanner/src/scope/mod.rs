//! Scope scanners for user, project, local, and managed scopes
//!
//! Missing directories and files are treated as empty. Files that exist but
//! cannot be read or parsed are skipped and recorded as [`ScanWarning`]s.

pub mod managed;
pub mod project;
pub mod user;

pub use managed::scan_managed_scope;
pub use project::scan_project;
pub use user::scan_user_scope;

use crate::artifacts::{AgentInfo, CommandInfo, HookInfo, SkillInfo};
use crate::error::{ScanWarning, ScanWarningKind};
use crate::inventory::ScopeArtifacts;
use crate::parser::{parse_agent, parse_command, parse_hooks, parse_mcp_config, parse_settings, parse_skill};
use crate::settings::{McpServer, SettingsFile};
use crate::types::Scope;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Immediate children of a directory, sorted by file name
fn children(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn is_markdown(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|e| e == "md")
}

/// Scan `<root>/skills`, `<root>/commands`, and `<root>/agents`
pub fn scan_artifact_dirs(
    root: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> ScopeArtifacts {
    ScopeArtifacts {
        skills: scan_skills_directory(&root.join("skills"), scope, warnings),
        commands: scan_commands_directory(&root.join("commands"), scope, warnings),
        agents: scan_agents_directory(&root.join("agents"), scope, warnings),
        ..ScopeArtifacts::default()
    }
}

/// Scan a directory for skill folders (each containing SKILL.md)
pub fn scan_skills_directory(
    dir: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<SkillInfo> {
    children(dir)
        .into_iter()
        .filter(|path| path.is_dir())
        .map(|path| path.join("SKILL.md"))
        .filter(|skill_file| skill_file.is_file())
        .filter_map(|skill_file| {
            read_entity(&skill_file, ScanWarningKind::Skill, warnings, |content| {
                parse_skill(&skill_file, content, scope.clone())
            })
        })
        .collect()
}

/// Scan a directory for command files (.md files)
pub fn scan_commands_directory(
    dir: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<CommandInfo> {
    children(dir)
        .into_iter()
        .filter(|path| is_markdown(path))
        .filter_map(|path| {
            read_entity(&path, ScanWarningKind::Command, warnings, |content| {
                parse_command(&path, content, scope.clone())
            })
        })
        .collect()
}

/// Scan a directory for agent files (.md files)
pub fn scan_agents_directory(
    dir: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<AgentInfo> {
    children(dir)
        .into_iter()
        .filter(|path| is_markdown(path))
        .filter_map(|path| {
            read_entity(&path, ScanWarningKind::Agent, warnings, |content| {
                parse_agent(&path, content, scope.clone())
            })
        })
        .collect()
}

/// Read and parse one file, turning any failure into a warning
fn read_entity<T, E: std::fmt::Display>(
    path: &Path,
    kind: ScanWarningKind,
    warnings: &mut Vec<ScanWarning>,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warnings.push(ScanWarning::new(path, kind, &e));
            return None;
        }
    };
    match parse(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warnings.push(ScanWarning::new(path, kind, &e));
            None
        }
    }
}

/// Read a settings file and its hook rules
pub fn scan_settings_file(
    path: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> (Option<SettingsFile>, Vec<HookInfo>) {
    if !path.is_file() {
        return (None, Vec::new());
    }
    read_entity(path, ScanWarningKind::Settings, warnings, |content| {
        let settings = parse_settings(path, content)?;
        let hooks = parse_hooks(path, content, scope)?;
        Ok::<_, crate::error::ScanError>((Some(settings), hooks))
    })
    .unwrap_or_default()
}

/// Read an MCP configuration file
pub fn scan_mcp_file(
    path: &Path,
    scope: &Scope,
    warnings: &mut Vec<ScanWarning>,
) -> Vec<McpServer> {
    if !path.is_file() {
        return Vec::new();
    }
    read_entity(path, ScanWarningKind::Mcp, warnings, |content| {
        parse_mcp_config(path, content, scope.clone())
    })
    .unwrap_or_default()
}

/// Pick the first existing file among candidates
fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|n| dir.join(n)).find(|p| p.is_file())
}
