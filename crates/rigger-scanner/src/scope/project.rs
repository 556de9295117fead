//! Project scope scanner
//!
//! Scans a project directory for Claude Code configuration including:
//! - CLAUDE.md file
//! - .claude/ directory with settings, skills, commands, agents
//! - .mcp.json MCP configuration
//! - local overrides from .claude/settings.local.json and ~/.claude.json

use super::{scan_artifact_dirs, scan_mcp_file, scan_settings_file};
use crate::error::{ScanError, ScanResult, ScanWarning, ScanWarningKind};
use crate::inventory::{ProjectScope, ProjectSettings, ScopeArtifacts};
use crate::parser::parse_user_mcp;
use crate::roots::ScanRoots;
use crate::settings::McpServer;
use crate::types::{sha256_hex, FileInfo, Scope};
use std::fs;
use std::path::Path;

/// Scan a project directory for Claude Code configuration
///
/// The project path must already be canonical; it is used as the key into
/// `~/.claude.json` for local MCP servers.
///
/// # Errors
/// Returns an error if the path does not exist or is not a directory
pub fn scan_project(
    path: &Path,
    roots: &ScanRoots,
    warnings: &mut Vec<ScanWarning>,
) -> ScanResult<ProjectScope> {
    if !path.exists() {
        return Err(ScanError::InvalidPath(format!(
            "Project path does not exist: {}",
            path.display()
        )));
    }

    if !path.is_dir() {
        return Err(ScanError::InvalidPath(format!(
            "Project path is not a directory: {}",
            path.display()
        )));
    }

    let name = path.file_name().map_or_else(
        || "unnamed".to_string(),
        |n| n.to_string_lossy().to_string(),
    );

    let claude_dir = path.join(".claude");
    let claude_dir_exists = claude_dir.is_dir();

    let mut artifacts = scan_artifact_dirs(&claude_dir, &Scope::Project, warnings);
    let (shared, shared_hooks) =
        scan_settings_file(&claude_dir.join("settings.json"), &Scope::Project, warnings);
    artifacts.hooks = shared_hooks;
    artifacts.mcp_servers = scan_mcp_file(&path.join(".mcp.json"), &Scope::Project, warnings);
    artifacts.sort();

    let mut local = ScopeArtifacts::default();
    let (local_settings, local_hooks) =
        scan_settings_file(&claude_dir.join("settings.local.json"), &Scope::Local, warnings);
    local.hooks = local_hooks;
    local.mcp_servers = scan_local_mcp(path, roots);
    local.sort();

    Ok(ProjectScope {
        path: path.to_path_buf(),
        name,
        claude_md: scan_claude_md(path, warnings),
        claude_dir: claude_dir_exists.then_some(claude_dir),
        settings: ProjectSettings {
            shared,
            local: local_settings,
        },
        artifacts,
        local,
    })
}

fn scan_claude_md(project_path: &Path, warnings: &mut Vec<ScanWarning>) -> Option<FileInfo> {
    let claude_md_path = project_path.join("CLAUDE.md");
    if !claude_md_path.is_file() {
        return None;
    }
    match fs::read(&claude_md_path) {
        Ok(content) => Some(FileInfo {
            sha256: sha256_hex(&content),
            path: claude_md_path,
        }),
        Err(e) => {
            warnings.push(ScanWarning::new(&claude_md_path, ScanWarningKind::Settings, &e));
            None
        }
    }
}

/// Per-project servers stored in `~/.claude.json` under `projects.<path>`
fn scan_local_mcp(project_path: &Path, roots: &ScanRoots) -> Vec<McpServer> {
    let mcp_path = roots.user_mcp_path();
    if !mcp_path.is_file() {
        return Vec::new();
    }
    // The user scope scan records the warning for this file
    let parsed = fs::read_to_string(&mcp_path)
        .map_err(ScanError::from)
        .and_then(|content| parse_user_mcp(&mcp_path, &content, Some(project_path)));
    match parsed {
        Ok((_, local)) => local,
        Err(e) => {
            tracing::debug!(path = %mcp_path.display(), error = %e, "no local MCP servers read");
            Vec::new()
        }
    }
}
