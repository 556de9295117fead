//! YAML frontmatter parser for skills, commands, and agents

use crate::artifacts::{default_permission_mode, AgentInfo, CommandInfo, SkillInfo};
use crate::error::{ScanError, ScanResult};
use crate::types::{sha256_hex, Scope};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Skill frontmatter structure
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SkillFrontmatter {
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    user_invocable: bool,
    #[serde(default)]
    disable_model_invocation: bool,
    #[serde(default, deserialize_with = "string_or_list")]
    allowed_tools: Vec<String>,
    model: Option<String>,
    context: Option<String>,
    agent: Option<String>,
}

/// Agent frontmatter structure
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AgentFrontmatter {
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default, deserialize_with = "string_or_list")]
    tools: Vec<String>,
    model: Option<String>,
    #[serde(default = "default_permission_mode", alias = "permissionMode")]
    permission_mode: String,
    #[serde(default, deserialize_with = "string_or_list")]
    skills: Vec<String>,
}

/// Command frontmatter structure
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CommandFrontmatter {
    description: Option<String>,
    #[serde(default, deserialize_with = "string_or_list")]
    allowed_tools: Vec<String>,
    #[serde(default)]
    thinking: bool,
}

/// Accept `tools: Read, Grep` as well as a YAML list
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        String(String),
        List(Vec<String>),
    }

    Ok(match Option::<StringOrList>::deserialize(deserializer)? {
        Some(StringOrList::String(s)) => split_tool_list(&s),
        Some(StringOrList::List(list)) => list,
        None => Vec::new(),
    })
}

/// Split a comma separated tool list
#[must_use]
pub fn split_tool_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Parse a SKILL.md file
///
/// The skill name falls back to the containing directory name.
///
/// # Errors
/// Returns an error if the file has no frontmatter or it cannot be parsed
pub fn parse_skill(path: &Path, content: &str, scope: Scope) -> ScanResult<SkillInfo> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let data = result
        .data
        .ok_or(ScanError::NoFrontmatter)?
        .deserialize::<SkillFrontmatter>()
        .map_err(|e| ScanError::FrontmatterParse(e.to_string()))?;

    let name = data.name.unwrap_or_else(|| {
        path.parent()
            .map_or_else(|| file_stem(path), file_stem)
    });

    Ok(SkillInfo {
        path: path.to_path_buf(),
        name,
        description: data.description,
        user_invocable: data.user_invocable,
        disable_model_invocation: data.disable_model_invocation,
        allowed_tools: data.allowed_tools,
        model: data.model,
        context: data.context,
        agent: data.agent,
        sha256: sha256_hex(content.as_bytes()),
        scope,
    })
}

/// Parse an agent definition file
///
/// # Errors
/// Returns an error if the file has no frontmatter or it cannot be parsed
pub fn parse_agent(path: &Path, content: &str, scope: Scope) -> ScanResult<AgentInfo> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let data = result
        .data
        .ok_or(ScanError::NoFrontmatter)?
        .deserialize::<AgentFrontmatter>()
        .map_err(|e| ScanError::FrontmatterParse(e.to_string()))?;

    Ok(AgentInfo {
        path: path.to_path_buf(),
        name: data.name.unwrap_or_else(|| file_stem(path)),
        description: data.description,
        tools: data.tools,
        model: data.model,
        permission_mode: data.permission_mode,
        skills: data.skills,
        sha256: sha256_hex(content.as_bytes()),
        scope,
    })
}

/// Parse a command file
///
/// Frontmatter is optional for commands; the name is the file stem.
///
/// # Errors
/// Returns an error if frontmatter is present but malformed
pub fn parse_command(path: &Path, content: &str, scope: Scope) -> ScanResult<CommandInfo> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let fm = match result.data {
        Some(data) => data
            .deserialize::<CommandFrontmatter>()
            .map_err(|e| ScanError::FrontmatterParse(e.to_string()))?,
        None => CommandFrontmatter::default(),
    };

    Ok(CommandInfo {
        path: path.to_path_buf(),
        name: file_stem(path),
        description: fm.description,
        allowed_tools: fm.allowed_tools,
        thinking: fm.thinking,
        body: result.content,
        sha256: sha256_hex(content.as_bytes()),
        scope,
    })
}
