//! Installed plugin discovery
//!
//! Reads `~/.claude/plugins/installed_plugins.json` and scans the install
//! directory of every enabled plugin visible to the project being scanned.

use crate::error::{ScanWarning, ScanWarningKind};
use crate::inventory::ScopeArtifacts;
use crate::roots::ScanRoots;
use crate::scope::{scan_artifact_dirs, scan_mcp_file, scan_settings_file};
use crate::types::Scope;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// Plugin inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PluginInventory {
    /// Installed plugins
    #[serde(default)]
    pub installed: Vec<InstalledPlugin>,
}

/// Installed plugin information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledPlugin {
    /// Plugin name
    pub id: String,
    /// Marketplace it came from
    pub marketplace: Option<String>,
    /// Plugin version
    pub version: String,
    /// Installation scope
    pub scope: Scope,
    /// Whether the plugin is enabled
    pub enabled: bool,
    /// Path to plugin directory
    pub path: PathBuf,
    /// When the plugin was first installed (ISO 8601)
    pub installed_at: Option<String>,
    /// When the plugin was last updated (ISO 8601)
    pub last_updated: Option<String>,
    /// Project path (for project-scoped plugins)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    /// Artifacts supplied by the plugin, scoped `Plugin(key)`
    pub artifacts: ScopeArtifacts,
}

impl InstalledPlugin {
    /// Identifier in `name@marketplace` form
    #[must_use]
    pub fn key(&self) -> String {
        plugin_key(&self.id, self.marketplace.as_deref())
    }

    /// User installs are visible everywhere, project and local installs only
    /// in their own project
    #[must_use]
    pub fn visible_to(&self, project: Option<&Path>) -> bool {
        match (&self.scope, &self.project_path) {
            (Scope::User | Scope::Managed, _) => true,
            (_, Some(installed_for)) => {
                project.is_some_and(|p| Path::new(installed_for) == p)
            }
            (_, None) => false,
        }
    }
}

/// Build a `name@marketplace` key
#[must_use]
pub fn plugin_key(name: &str, marketplace: Option<&str>) -> String {
    match marketplace {
        Some(m) if !m.is_empty() => format!("{name}@{m}"),
        _ => name.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct RawInstalledPlugins {
    #[serde(default)]
    plugins: HashMap<String, Vec<RawPluginInstall>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPluginInstall {
    #[serde(default = "default_install_scope")]
    scope: String,
    project_path: Option<String>,
    install_path: String,
    #[serde(default)]
    version: String,
    installed_at: Option<String>,
    last_updated: Option<String>,
}

fn default_install_scope() -> String {
    "user".to_string()
}

impl PluginInventory {
    /// Scan installed plugins visible to `project`.
    ///
    /// `enabled` maps plugin keys to their `enabledPlugins` state, merged
    /// across settings files by the caller. Plugins not listed default to
    /// enabled. Disabled plugins are listed without artifacts.
    pub fn scan(
        roots: &ScanRoots,
        project: Option<&Path>,
        enabled: &BTreeMap<String, bool>,
        warnings: &mut Vec<ScanWarning>,
    ) -> Self {
        let installed_file = roots.plugins_dir().join("installed_plugins.json");
        if !installed_file.is_file() {
            return Self::default();
        }

        let raw: RawInstalledPlugins = match fs::read_to_string(&installed_file)
            .map_err(crate::error::ScanError::from)
            .and_then(|c| serde_json::from_str(&c).map_err(Into::into))
        {
            Ok(raw) => raw,
            Err(e) => {
                warnings.push(ScanWarning::new(&installed_file, ScanWarningKind::Plugins, &e));
                return Self::default();
            }
        };

        let mut installed = Vec::new();
        for (key, installs) in raw.plugins {
            // Plugin key format: "plugin-name@marketplace"
            let (name, marketplace) = match key.split_once('@') {
                Some((name, marketplace)) => (name.to_string(), Some(marketplace.to_string())),
                None => (key.clone(), None),
            };

            for install in installs {
                let scope = install.scope.parse::<Scope>().unwrap_or(Scope::User);
                let mut plugin = InstalledPlugin {
                    id: name.clone(),
                    marketplace: marketplace.clone(),
                    version: install.version,
                    scope,
                    enabled: enabled.get(&key).copied().unwrap_or(true),
                    path: PathBuf::from(install.install_path),
                    installed_at: install.installed_at,
                    last_updated: install.last_updated,
                    project_path: install.project_path,
                    artifacts: ScopeArtifacts::default(),
                };
                if !plugin.visible_to(project) {
                    continue;
                }
                if plugin.enabled {
                    let plugin_scope = Scope::Plugin(key.clone());
                    plugin.artifacts = scan_plugin_dir(&plugin.path, &plugin_scope, warnings);
                }
                installed.push(plugin);
            }
        }

        installed.sort_by(|a, b| a.key().cmp(&b.key()).then_with(|| a.path.cmp(&b.path)));
        Self { installed }
    }

    /// Artifacts of every enabled plugin
    pub fn artifacts(&self) -> impl Iterator<Item = &ScopeArtifacts> {
        self.installed
            .iter()
            .filter(|p| p.enabled)
            .map(|p| &p.artifacts)
    }
}

fn scan_plugin_dir(dir: &Path, scope: &Scope, warnings: &mut Vec<ScanWarning>) -> ScopeArtifacts {
    let mut artifacts = scan_artifact_dirs(dir, scope, warnings);
    let (_, hooks) = scan_settings_file(&dir.join("hooks").join("hooks.json"), scope, warnings);
    artifacts.hooks = hooks;
    artifacts.mcp_servers = scan_mcp_file(&dir.join(".mcp.json"), scope, warnings);
    artifacts.sort();
    artifacts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plugin(scope: Scope, project_path: Option<&str>) -> InstalledPlugin {
        InstalledPlugin {
            id: "lint".into(),
            marketplace: Some("tools".into()),
            version: "1.0.0".into(),
            scope,
            enabled: true,
            path: PathBuf::from("/plugins/lint"),
            installed_at: None,
            last_updated: None,
            project_path: project_path.map(String::from),
            artifacts: ScopeArtifacts::default(),
        }
    }

    #[test]
    fn test_plugin_key() {
        assert_eq!(plugin(Scope::User, None).key(), "lint@tools");
        assert_eq!(plugin_key("solo", None), "solo");
    }

    #[test]
    fn test_visibility() {
        let project = Path::new("/work/app");
        assert!(plugin(Scope::User, None).visible_to(Some(project)));
        assert!(plugin(Scope::User, None).visible_to(None));
        assert!(plugin(Scope::Project, Some("/work/app")).visible_to(Some(project)));
        assert!(!plugin(Scope::Project, Some("/work/other")).visible_to(Some(project)));
        assert!(!plugin(Scope::Local, Some("/work/app")).visible_to(None));
    }
}
