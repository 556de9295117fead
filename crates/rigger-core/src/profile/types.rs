//! Profile data types

use chrono::{DateTime, Utc};
use rigger_scanner::types::{EntityKind, Scope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Type of tool that can be referenced in a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    /// Skill directory
    Skill,
    /// Slash command
    Command,
    /// Subagent
    Agent,
    /// Hook rule
    Hook,
    /// MCP server
    Mcp,
}

impl ToolType {
    /// All tool types, in rendering order
    pub const ALL: [ToolType; 5] = [
        ToolType::Skill,
        ToolType::Command,
        ToolType::Agent,
        ToolType::Hook,
        ToolType::Mcp,
    ];
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&EntityKind::from(*self), f)
    }
}

impl FromStr for ToolType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::from_str(s).map(Self::from)
    }
}

impl From<EntityKind> for ToolType {
    fn from(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Skill => ToolType::Skill,
            EntityKind::Command => ToolType::Command,
            EntityKind::Agent => ToolType::Agent,
            EntityKind::Hook => ToolType::Hook,
            EntityKind::Mcp => ToolType::Mcp,
        }
    }
}

impl From<ToolType> for EntityKind {
    fn from(tool_type: ToolType) -> Self {
        match tool_type {
            ToolType::Skill => EntityKind::Skill,
            ToolType::Command => EntityKind::Command,
            ToolType::Agent => EntityKind::Agent,
            ToolType::Hook => EntityKind::Hook,
            ToolType::Mcp => EntityKind::Mcp,
        }
    }
}

/// Permission restrictions applied when a tool is written to a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPermissions {
    /// Replaces the tool list when non-empty
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Removed from the tool list
    #[serde(default)]
    pub disallowed_tools: Vec<String>,
}

impl ToolPermissions {
    /// Whether these permissions change anything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed_tools.is_empty() && self.disallowed_tools.is_empty()
    }

    /// Apply the restrictions to an existing tool list
    #[must_use]
    pub fn restrict(&self, current: &[String]) -> Vec<String> {
        let base = if self.allowed_tools.is_empty() {
            current
        } else {
            &self.allowed_tools
        };

        base.iter()
            .filter(|tool| !self.disallowed_tools.contains(tool))
            .cloned()
            .collect()
    }
}

/// A reference to a tool whose content lives in a [`super::ToolStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRef {
    /// Tool name, also its file name in the store
    pub name: String,
    /// Type of tool
    pub tool_type: ToolType,
    /// Scope the tool was captured from
    #[serde(default)]
    pub source_scope: Option<Scope>,
    /// Optional permission restrictions
    #[serde(default)]
    pub permissions: Option<ToolPermissions>,
}

impl ToolRef {
    #[must_use]
    pub fn new(name: impl Into<String>, tool_type: ToolType) -> Self {
        Self {
            name: name.into(),
            tool_type,
            source_scope: None,
            permissions: None,
        }
    }

    #[must_use]
    pub fn with_source_scope(mut self, scope: Scope) -> Self {
        self.source_scope = Some(scope);
        self
    }

    #[must_use]
    pub fn with_permissions(mut self, permissions: ToolPermissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Identity used for override resolution
    #[must_use]
    pub fn key(&self) -> (ToolType, &str) {
        (self.tool_type, self.name.as_str())
    }
}

/// Reference to a plugin the profile enables or disables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRef {
    /// Plugin identifier
    pub id: String,
    /// Marketplace it comes from
    pub marketplace: Option<String>,
    /// Installation scope
    pub scope: Scope,
    /// Whether to enable
    pub enabled: bool,
}

impl PluginRef {
    /// `name@marketplace` key as used by `enabledPlugins`
    #[must_use]
    pub fn key(&self) -> String {
        rigger_scanner::plugins::plugin_key(&self.id, self.marketplace.as_deref())
    }
}

impl FromStr for PluginRef {
    type Err = String;

    /// Parses `name[@marketplace][:disabled]`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reference, enabled) = match s.strip_suffix(":disabled") {
            Some(reference) => (reference, false),
            None => (s, true),
        };
        let (id, marketplace) = match reference.split_once('@') {
            Some((id, mkt)) => (id, Some(mkt.to_string())),
            None => (reference, None),
        };
        if id.is_empty() || marketplace.as_deref() == Some("") {
            return Err(format!("invalid plugin reference: {s}"));
        }
        Ok(Self {
            id: id.to_string(),
            marketplace,
            scope: Scope::Project,
            enabled,
        })
    }
}

/// A named bundle of tools and plugins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Unique identifier
    pub id: Uuid,
    /// Profile name (unique)
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Tool references for this profile
    #[serde(default)]
    pub tool_refs: Vec<ToolRef>,
    /// Plugins to enable in assigned projects
    #[serde(default)]
    pub plugin_refs: Vec<PluginRef>,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create an empty profile with the given name
    #[must_use]
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            description: None,
            tool_refs: Vec::new(),
            plugin_refs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Look up a tool reference by type and name
    #[must_use]
    pub fn tool(&self, tool_type: ToolType, name: &str) -> Option<&ToolRef> {
        self.tool_refs.iter().find(|t| t.key() == (tool_type, name))
    }

    /// Insert or replace a tool reference by identity
    pub fn upsert_tool(&mut self, tool: ToolRef) {
        match self.tool_refs.iter_mut().find(|t| t.key() == tool.key()) {
            Some(existing) => *existing = tool,
            None => self.tool_refs.push(tool),
        }
    }
}
