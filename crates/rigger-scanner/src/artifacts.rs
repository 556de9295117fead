//! Artifact types: Skills, Commands, Agents, Hooks

use crate::types::{EntityKind, Scope};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Common view over every named, scoped configuration entity
pub trait ScopedEntity {
    /// Entity kind shared by every value of this type
    const KIND: EntityKind;

    /// Entity name, unique per kind within one scope
    fn name(&self) -> &str;
    /// Scope the entity was read from
    fn scope(&self) -> &Scope;
    /// Source file
    fn path(&self) -> &Path;
    /// Content hash
    fn sha256(&self) -> &str;
}

macro_rules! scoped_entity {
    ($ty:ty, $kind:expr) => {
        impl ScopedEntity for $ty {
            const KIND: EntityKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn scope(&self) -> &Scope {
                &self.scope
            }

            fn path(&self) -> &Path {
                &self.path
            }

            fn sha256(&self) -> &str {
                &self.sha256
            }
        }
    };
}

/// Skill information parsed from SKILL.md
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillInfo {
    /// Path to the SKILL.md file
    pub path: PathBuf,
    /// Skill name
    pub name: String,
    /// Skill description
    pub description: String,
    /// Whether the skill can be invoked by users
    #[serde(default)]
    pub user_invocable: bool,
    /// Whether model invocation is disabled
    #[serde(default)]
    pub disable_model_invocation: bool,
    /// Allowed tools
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Model override
    pub model: Option<String>,
    /// Context setting
    pub context: Option<String>,
    /// Agent to use
    pub agent: Option<String>,
    /// SHA256 hash of SKILL.md content
    pub sha256: String,
    /// Scope where found
    pub scope: Scope,
}

impl SkillInfo {
    /// Directory holding SKILL.md and any supporting files
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(&self.path)
    }
}

/// Command information parsed from .md file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Path to the command file
    pub path: PathBuf,
    /// Command name (derived from filename)
    pub name: String,
    /// Command description
    pub description: Option<String>,
    /// Allowed tools
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Whether extended thinking is enabled
    #[serde(default)]
    pub thinking: bool,
    /// Command body (template)
    pub body: String,
    /// SHA256 hash of file content
    pub sha256: String,
    /// Scope where found
    pub scope: Scope,
}

/// Agent information parsed from .md file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Path to the agent file
    pub path: PathBuf,
    /// Agent name
    pub name: String,
    /// Agent description
    pub description: String,
    /// Allowed tools
    #[serde(default)]
    pub tools: Vec<String>,
    /// Model override
    pub model: Option<String>,
    /// Permission mode
    #[serde(default = "default_permission_mode")]
    pub permission_mode: String,
    /// Skills this agent can use
    #[serde(default)]
    pub skills: Vec<String>,
    /// SHA256 hash of file content
    pub sha256: String,
    /// Scope where found
    pub scope: Scope,
}

pub(crate) fn default_permission_mode() -> String {
    "default".to_string()
}

/// One matcher group of a settings file's `hooks` table.
///
/// `{"hooks": {"PreToolUse": [{"matcher": "Bash", "hooks": [...]}]}}` yields
/// one `HookInfo` per array element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookInfo {
    /// Derived rule name, `<event>-<matcher>`
    pub name: String,
    /// File the rule was read from
    pub path: PathBuf,
    /// Scope where found
    pub scope: Scope,
    /// Trigger event, e.g. `PreToolUse`
    pub trigger: String,
    /// Optional matcher pattern
    pub matcher: Option<String>,
    /// Parsed hook actions
    pub definitions: Vec<HookDefinition>,
    /// The array element exactly as written
    pub entry: serde_json::Value,
    /// SHA256 of the serialized entry
    pub sha256: String,
}

/// Hook action definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HookDefinition {
    /// Run a shell command
    #[serde(rename = "command")]
    Command { command: String },
    /// Send a prompt
    #[serde(rename = "prompt")]
    Prompt { prompt: String },
    /// Invoke an agent
    #[serde(rename = "agent")]
    Agent { agent: String },
}

/// Build the rule name for a hook matcher group.
///
/// The matcher is reduced to a lowercase slug; a missing or wildcard matcher
/// becomes `all`.
#[must_use]
pub fn hook_rule_name(event: &str, matcher: Option<&str>) -> String {
    let slug = matcher
        .map(|m| {
            m.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
                .collect::<String>()
                .split('-')
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join("-")
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "all".to_string());
    format!("{}-{slug}", event.to_ascii_lowercase())
}

scoped_entity!(SkillInfo, EntityKind::Skill);
scoped_entity!(CommandInfo, EntityKind::Command);
scoped_entity!(AgentInfo, EntityKind::Agent);
scoped_entity!(HookInfo, EntityKind::Hook);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_rule_name() {
        assert_eq!(hook_rule_name("PreToolUse", Some("Bash")), "pretooluse-bash");
        assert_eq!(hook_rule_name("PostToolUse", Some("Edit|Write")), "posttooluse-edit-write");
        assert_eq!(hook_rule_name("Stop", None), "stop-all");
        assert_eq!(hook_rule_name("Stop", Some("*")), "stop-all");
    }
}
