//! User scope scanner

use super::{scan_artifact_dirs, scan_settings_file};
use crate::error::{ScanWarning, ScanWarningKind};
use crate::inventory::UserScope;
use crate::parser::parse_user_mcp;
use crate::roots::ScanRoots;
use crate::types::Scope;
use std::fs;

/// Scan user-level Claude Code configuration
///
/// Reads `~/.claude/{skills,commands,agents}`, hook rules from
/// `~/.claude/settings.json`, and the top-level `mcpServers` of `~/.claude.json`.
pub fn scan_user_scope(roots: &ScanRoots, warnings: &mut Vec<ScanWarning>) -> UserScope {
    let claude_dir = roots.user_claude_dir();

    let mut artifacts = scan_artifact_dirs(&claude_dir, &Scope::User, warnings);
    let (settings, hooks) = scan_settings_file(&claude_dir.join("settings.json"), &Scope::User, warnings);
    artifacts.hooks = hooks;

    let mcp_path = roots.user_mcp_path();
    if mcp_path.is_file() {
        match fs::read_to_string(&mcp_path)
            .map_err(crate::error::ScanError::from)
            .and_then(|content| parse_user_mcp(&mcp_path, &content, None))
        {
            Ok((servers, _)) => artifacts.mcp_servers = servers,
            Err(e) => warnings.push(ScanWarning::new(&mcp_path, ScanWarningKind::Mcp, &e)),
        }
    }

    artifacts.sort();
    UserScope { settings, artifacts }
}
