//! Managed scope scanner
//!
//! Scans IT-deployed (managed) configuration. It takes the highest
//! precedence in the scope hierarchy.

use super::{first_existing, scan_artifact_dirs, scan_mcp_file, scan_settings_file};
use crate::error::ScanWarning;
use crate::inventory::ManagedScope;
use crate::roots::ScanRoots;
use crate::types::Scope;

/// Scan managed (IT-deployed) Claude Code configuration
///
/// Returns `None` when the managed directory does not exist.
pub fn scan_managed_scope(
    roots: &ScanRoots,
    warnings: &mut Vec<ScanWarning>,
) -> Option<ManagedScope> {
    let dir = &roots.managed_dir;
    if !dir.is_dir() {
        return None;
    }

    let mut artifacts = scan_artifact_dirs(dir, &Scope::Managed, warnings);

    let settings = match first_existing(dir, &["managed-settings.json", "settings.json"]) {
        Some(path) => {
            let (settings, hooks) = scan_settings_file(&path, &Scope::Managed, warnings);
            artifacts.hooks = hooks;
            settings
        }
        None => None,
    };
    if let Some(path) = first_existing(dir, &["managed-mcp.json", "mcp.json"]) {
        artifacts.mcp_servers = scan_mcp_file(&path, &Scope::Managed, warnings);
    }

    artifacts.sort();
    Some(ManagedScope {
        dir: dir.clone(),
        settings,
        artifacts,
    })
}
