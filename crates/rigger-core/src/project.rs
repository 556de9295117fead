//! Project management

use crate::profile::{ToolRef, ToolType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A registered project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier
    pub id: Uuid,
    /// Canonical project path
    pub path: PathBuf,
    /// Project name
    pub name: String,
    /// Assigned profile ID
    pub assigned_profile_id: Option<Uuid>,
    /// Tools owned by this project alone
    #[serde(default)]
    pub local_overrides: LocalOverrides,
    /// Profile tools merged with local overrides
    #[serde(default)]
    pub effective_tools: Vec<EffectiveTool>,
    /// When registered
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project from a path
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            path,
            name,
            assigned_profile_id: None,
            local_overrides: LocalOverrides::default(),
            effective_tools: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the project name
    #[must_use]
    pub fn with_name(mut self, name: String) -> Self {
        self.name = name;
        self
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Tool references a project keeps regardless of its profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalOverrides {
    #[serde(default)]
    pub skills: Vec<ToolRef>,
    #[serde(default)]
    pub commands: Vec<ToolRef>,
    #[serde(default)]
    pub agents: Vec<ToolRef>,
    #[serde(default)]
    pub hooks: Vec<ToolRef>,
    #[serde(default)]
    pub mcp_servers: Vec<ToolRef>,
}

impl LocalOverrides {
    fn list(&self, tool_type: ToolType) -> &Vec<ToolRef> {
        match tool_type {
            ToolType::Skill => &self.skills,
            ToolType::Command => &self.commands,
            ToolType::Agent => &self.agents,
            ToolType::Hook => &self.hooks,
            ToolType::Mcp => &self.mcp_servers,
        }
    }

    fn list_mut(&mut self, tool_type: ToolType) -> &mut Vec<ToolRef> {
        match tool_type {
            ToolType::Skill => &mut self.skills,
            ToolType::Command => &mut self.commands,
            ToolType::Agent => &mut self.agents,
            ToolType::Hook => &mut self.hooks,
            ToolType::Mcp => &mut self.mcp_servers,
        }
    }

    /// Iterate every override
    pub fn iter(&self) -> impl Iterator<Item = &ToolRef> {
        ToolType::ALL.into_iter().flat_map(|t| self.list(t).iter())
    }

    #[must_use]
    pub fn contains(&self, tool_type: ToolType, name: &str) -> bool {
        self.list(tool_type).iter().any(|t| t.name == name)
    }

    /// Add or replace an override, filed under its own tool type
    pub fn push(&mut self, tool: ToolRef) {
        let list = self.list_mut(tool.tool_type);
        match list.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => list.push(tool),
        }
    }

    /// Remove an override, returning it if present
    pub fn remove(&mut self, tool_type: ToolType, name: &str) -> Option<ToolRef> {
        let list = self.list_mut(tool_type);
        let index = list.iter().position(|t| t.name == name)?;
        Some(list.remove(index))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

/// Where an effective tool comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolOrigin {
    /// Provided by the assigned profile
    Profile { profile_id: Uuid },
    /// A project-local override
    Local,
}

/// A tool that is in force for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveTool {
    pub tool: ToolRef,
    pub origin: ToolOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_name_from_path() {
        let project = Project::new(PathBuf::from("/work/service-api"));
        assert_eq!(project.name, "service-api");
        assert!(project.assigned_profile_id.is_none());
    }

    #[test]
    fn test_local_overrides_push_remove() {
        let mut overrides = LocalOverrides::default();
        overrides.push(ToolRef::new("lint", ToolType::Skill));
        overrides.push(ToolRef::new("search", ToolType::Mcp));
        overrides.push(ToolRef::new("lint", ToolType::Skill));

        assert_eq!(overrides.len(), 2);
        assert!(overrides.contains(ToolType::Mcp, "search"));
        assert!(!overrides.contains(ToolType::Agent, "lint"));

        assert!(overrides.remove(ToolType::Skill, "lint").is_some());
        assert!(overrides.remove(ToolType::Skill, "lint").is_none());
        assert_eq!(overrides.len(), 1);
    }
}
