//! Inventory types for scan results

use crate::artifacts::{AgentInfo, CommandInfo, HookInfo, ScopedEntity, SkillInfo};
use crate::collision::{CollisionReport, EffectiveView};
use crate::error::ScanWarning;
use crate::plugins::PluginInventory;
use crate::settings::{McpServer, SettingsFile};
use crate::types::{EntityKind, FileInfo, HostInfo, Scope};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete inventory from a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    /// Host system information
    pub host: HostInfo,
    /// User-level scope inventory
    pub user_scope: UserScope,
    /// Managed scope inventory (if present)
    pub managed_scope: Option<ManagedScope>,
    /// Project scope inventory, absent for user-only scans
    pub project: Option<ProjectScope>,
    /// Installed plugins visible to the project
    pub plugins: PluginInventory,
    /// Precedence-resolved view across every scope
    pub effective: EffectiveView,
    /// Collision report
    pub collisions: CollisionReport,
    /// Files skipped because they could not be parsed
    #[serde(default)]
    pub warnings: Vec<ScanWarning>,
    /// When the scan was performed
    pub scanned_at: DateTime<Utc>,
}

/// Skills, commands, agents, hook rules, and MCP servers of one scope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeArtifacts {
    #[serde(default)]
    pub skills: Vec<SkillInfo>,
    #[serde(default)]
    pub commands: Vec<CommandInfo>,
    #[serde(default)]
    pub agents: Vec<AgentInfo>,
    #[serde(default)]
    pub hooks: Vec<HookInfo>,
    #[serde(default)]
    pub mcp_servers: Vec<McpServer>,
}

impl ScopeArtifacts {
    /// Merge another set of artifacts into this one
    pub fn extend(&mut self, other: ScopeArtifacts) {
        self.skills.extend(other.skills);
        self.commands.extend(other.commands);
        self.agents.extend(other.agents);
        self.hooks.extend(other.hooks);
        self.mcp_servers.extend(other.mcp_servers);
    }

    /// Sort every list by name, then path, so results do not depend on
    /// directory traversal order
    pub fn sort(&mut self) {
        sort_entities(&mut self.skills);
        sort_entities(&mut self.commands);
        sort_entities(&mut self.agents);
        sort_entities(&mut self.hooks);
        sort_entities(&mut self.mcp_servers);
    }

    /// Check whether the scope defines nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
            && self.commands.is_empty()
            && self.agents.is_empty()
            && self.hooks.is_empty()
            && self.mcp_servers.is_empty()
    }

    /// Look up an entity of the given kind by name
    #[must_use]
    pub fn find(&self, kind: EntityKind, name: &str) -> Option<EntityRef<'_>> {
        fn by_name<'a, T: ScopedEntity>(items: &'a [T], name: &str) -> Option<&'a T> {
            items.iter().find(|item| item.name() == name)
        }
        match kind {
            EntityKind::Skill => by_name(&self.skills, name).map(EntityRef::Skill),
            EntityKind::Command => by_name(&self.commands, name).map(EntityRef::Command),
            EntityKind::Agent => by_name(&self.agents, name).map(EntityRef::Agent),
            EntityKind::Hook => by_name(&self.hooks, name).map(EntityRef::Hook),
            EntityKind::Mcp => by_name(&self.mcp_servers, name).map(EntityRef::Mcp),
        }
    }
}

fn sort_entities<T: ScopedEntity>(items: &mut [T]) {
    items.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.path().cmp(b.path())));
}

/// Borrowed reference to an entity of any kind
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Skill(&'a SkillInfo),
    Command(&'a CommandInfo),
    Agent(&'a AgentInfo),
    Hook(&'a HookInfo),
    Mcp(&'a McpServer),
}

impl EntityRef<'_> {
    /// Scope the entity was read from
    #[must_use]
    pub fn scope(&self) -> &Scope {
        match self {
            Self::Skill(e) => e.scope(),
            Self::Command(e) => e.scope(),
            Self::Agent(e) => e.scope(),
            Self::Hook(e) => e.scope(),
            Self::Mcp(e) => e.scope(),
        }
    }

    /// Source file of the entity
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Skill(e) => e.path(),
            Self::Command(e) => e.path(),
            Self::Agent(e) => e.path(),
            Self::Hook(e) => e.path(),
            Self::Mcp(e) => e.path(),
        }
    }
}

/// User-level scope inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserScope {
    /// User settings file
    pub settings: Option<SettingsFile>,
    /// Artifacts from ~/.claude and ~/.claude.json
    #[serde(flatten)]
    pub artifacts: ScopeArtifacts,
}

/// Managed (IT-deployed) scope inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagedScope {
    /// Managed configuration directory
    pub dir: PathBuf,
    /// Managed settings file
    pub settings: Option<SettingsFile>,
    /// Managed artifacts
    #[serde(flatten)]
    pub artifacts: ScopeArtifacts,
}

/// Project-level scope inventory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectScope {
    /// Project directory path
    pub path: PathBuf,
    /// Project name
    pub name: String,
    /// CLAUDE.md file info
    pub claude_md: Option<FileInfo>,
    /// .claude directory path
    pub claude_dir: Option<PathBuf>,
    /// Project settings
    pub settings: ProjectSettings,
    /// Shared project artifacts (.claude/, .mcp.json)
    pub artifacts: ScopeArtifacts,
    /// Local overrides (.claude/settings.local.json, per-project servers in ~/.claude.json)
    pub local: ScopeArtifacts,
}

/// Project settings (shared and local)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Shared settings (.claude/settings.json)
    pub shared: Option<SettingsFile>,
    /// Local settings (.claude/settings.local.json)
    pub local: Option<SettingsFile>,
}

impl Inventory {
    /// The highest-precedence definition of an entity across all scopes
    #[must_use]
    pub fn winner(&self, kind: EntityKind, name: &str) -> Option<EntityRef<'_>> {
        self.effective.find(kind, name)
    }

    /// The definition of an entity in one particular scope
    #[must_use]
    pub fn find_in(&self, scope: &Scope, kind: EntityKind, name: &str) -> Option<EntityRef<'_>> {
        match scope {
            Scope::User => self.user_scope.artifacts.find(kind, name),
            Scope::Managed => self.managed_scope.as_ref()?.artifacts.find(kind, name),
            Scope::Project => self.project.as_ref()?.artifacts.find(kind, name),
            Scope::Local => self.project.as_ref()?.local.find(kind, name),
            Scope::Plugin(key) => self
                .plugins
                .installed
                .iter()
                .filter(|plugin| plugin.key() == *key)
                .find_map(|plugin| plugin.artifacts.find(kind, name)),
        }
    }

    /// Check whether a plugin is installed and visible to the scanned project
    #[must_use]
    pub fn has_plugin(&self, key: &str) -> bool {
        self.plugins.installed.iter().any(|p| p.key() == key)
    }
}
