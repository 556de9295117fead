//! Rendering profile tools into project files and JSON slots

use crate::diff::{PlanError, Warning, WarningKind};
use crate::merge::{EntryKey, MergeEntry};
use crate::profile::{PluginRef, ToolPermissions, ToolRef, ToolStore, ToolType};
use rigger_scanner::parser::split_tool_list;
use serde_json::Value;
use serde_yml::{Mapping, Value as Yaml};
use std::path::{Path, PathBuf};

/// Project-relative location of MCP server slots
pub const MCP_FILE: &str = ".mcp.json";

/// Project-relative location of hook and plugin slots
pub const SETTINGS_FILE: &str = ".claude/settings.json";

/// What one tool contributes to the target state
#[derive(Debug)]
pub(crate) enum Rendered {
    /// Whole files, project-relative
    Files(Vec<(PathBuf, Vec<u8>)>),
    /// A slot in a shared JSON file
    Entry { file: PathBuf, entry: MergeEntry },
}

/// Render one tool from its store
///
/// Returns `None` when the store holds no content for the tool.
pub(crate) fn render_tool(
    tool: &ToolRef,
    store: &ToolStore,
    warnings: &mut Vec<Warning>,
) -> Result<Option<Rendered>, PlanError> {
    let permissions = tool.permissions.as_ref().filter(|p| !p.is_empty());

    let rendered = match tool.tool_type {
        ToolType::Skill => {
            let base = Path::new(".claude/skills").join(&tool.name);
            let files = store.skill_files(&tool.name)?;
            if files.is_empty() {
                return Ok(None);
            }
            let files = files
                .into_iter()
                .map(|(relative, content)| {
                    let path = base.join(&relative);
                    let content = if relative == Path::new("SKILL.md") {
                        restrict_front_matter(&path, content, "allowed-tools", permissions, warnings)
                    } else {
                        content
                    };
                    (path, content)
                })
                .collect();
            Rendered::Files(files)
        }
        ToolType::Command | ToolType::Agent => {
            let Some(content) = store.load_file(tool.tool_type, &tool.name)? else {
                return Ok(None);
            };
            let (dir, key) = if tool.tool_type == ToolType::Command {
                (".claude/commands", "allowed-tools")
            } else {
                (".claude/agents", "tools")
            };
            let path = Path::new(dir).join(format!("{}.md", tool.name));
            let content = restrict_front_matter(&path, content, key, permissions, warnings);
            Rendered::Files(vec![(path, content)])
        }
        ToolType::Mcp => {
            let Some(config) = store.load_mcp(&tool.name)? else {
                return Ok(None);
            };
            Rendered::Entry {
                file: PathBuf::from(MCP_FILE),
                entry: MergeEntry {
                    key: EntryKey::McpServer {
                        name: tool.name.clone(),
                    },
                    value: config,
                },
            }
        }
        ToolType::Hook => {
            let Some(hook) = store.load_hook(&tool.name)? else {
                return Ok(None);
            };
            Rendered::Entry {
                file: PathBuf::from(SETTINGS_FILE),
                entry: MergeEntry {
                    key: EntryKey::Hook {
                        event: hook.event,
                        matcher: hook.matcher,
                    },
                    value: hook.entry,
                },
            }
        }
    };

    Ok(Some(rendered))
}

/// `enabledPlugins` slot for a plugin reference
pub(crate) fn render_plugin(plugin: &PluginRef) -> MergeEntry {
    MergeEntry {
        key: EntryKey::Plugin { key: plugin.key() },
        value: Value::Bool(plugin.enabled),
    }
}

/// Apply permission restrictions to the tool list in a markdown file's
/// front matter. The bytes are returned untouched when the list does not
/// change or the front matter cannot be rewritten.
fn restrict_front_matter(
    path: &Path,
    content: Vec<u8>,
    key: &str,
    permissions: Option<&ToolPermissions>,
    warnings: &mut Vec<Warning>,
) -> Vec<u8> {
    let Some(permissions) = permissions else {
        return content;
    };
    let Ok(text) = std::str::from_utf8(&content) else {
        return content;
    };

    match rewrite_tool_list(text, key, permissions) {
        Ok(Some(rewritten)) => rewritten.into_bytes(),
        Ok(None) => content,
        Err(message) => {
            warnings.push(Warning::warning(
                WarningKind::Parse,
                Some(path.to_path_buf()),
                format!("Cannot apply tool permissions: {message}"),
            ));
            content
        }
    }
}

fn rewrite_tool_list(
    text: &str,
    key: &str,
    permissions: &ToolPermissions,
) -> Result<Option<String>, String> {
    let (yaml, body) = split_front_matter(text).unwrap_or(("", text));

    let mut mapping: Mapping = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        serde_yml::from_str(yaml).map_err(|e| e.to_string())?
    };

    let current = match mapping.get(key) {
        Some(Yaml::String(s)) => split_tool_list(s),
        Some(Yaml::Sequence(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        Some(Yaml::Null) | None => Vec::new(),
        Some(_) => return Err(format!("'{key}' is not a list")),
    };

    let restricted = permissions.restrict(&current);
    if restricted == current {
        return Ok(None);
    }

    mapping.insert(
        Yaml::String(key.to_string()),
        Yaml::Sequence(restricted.into_iter().map(Yaml::String).collect()),
    );
    let yaml = serde_yml::to_string(&mapping).map_err(|e| e.to_string())?;

    Ok(Some(format!("---\n{yaml}---\n{body}")))
}

/// Split `---` delimited front matter from the body
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn perms(allowed: &[&str], disallowed: &[&str]) -> ToolPermissions {
        ToolPermissions {
            allowed_tools: allowed.iter().map(|s| (*s).to_string()).collect(),
            disallowed_tools: disallowed.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_split_front_matter() {
        let (yaml, body) = split_front_matter("---\nname: a\n---\nBody\n").unwrap();
        assert_eq!(yaml, "name: a\n");
        assert_eq!(body, "Body\n");
        assert!(split_front_matter("No front matter").is_none());
    }

    #[test]
    fn test_rewrite_comma_list() {
        let text = "---\nname: reviewer\ntools: Read, Grep, Bash\n---\nReview code.\n";
        let rewritten = rewrite_tool_list(text, "tools", &perms(&[], &["Bash"]))
            .unwrap()
            .unwrap();

        assert!(rewritten.ends_with("---\nReview code.\n"));
        let (yaml, _) = split_front_matter(&rewritten).unwrap();
        let mapping: Mapping = serde_yml::from_str(yaml).unwrap();
        let tools: Vec<&str> = mapping
            .get("tools")
            .and_then(Yaml::as_sequence)
            .unwrap()
            .iter()
            .filter_map(Yaml::as_str)
            .collect();
        assert_eq!(tools, vec!["Read", "Grep"]);
        assert_eq!(mapping.get("name").and_then(Yaml::as_str), Some("reviewer"));
    }

    #[test]
    fn test_unchanged_list_keeps_bytes() {
        let text = "---\nallowed-tools: [Read]\n---\nbody";
        assert!(rewrite_tool_list(text, "allowed-tools", &perms(&["Read"], &[]))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_adds_front_matter_when_missing() {
        let rewritten = rewrite_tool_list("Do it.\n", "allowed-tools", &perms(&["Bash"], &[]))
            .unwrap()
            .unwrap();
        assert!(rewritten.starts_with("---\n"));
        assert!(rewritten.contains("Bash"));
        assert!(rewritten.ends_with("---\nDo it.\n"));
    }
}
