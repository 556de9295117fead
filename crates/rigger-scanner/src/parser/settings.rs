//! Settings.json parser, including hook rules

use crate::artifacts::{hook_rule_name, HookDefinition, HookInfo};
use crate::error::{ScanError, ScanResult};
use crate::settings::{Permissions, SettingsFile};
use crate::types::{sha256_hex, Scope};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Raw settings.json structure for parsing
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    #[serde(default)]
    env: BTreeMap<String, String>,
    permissions: Option<RawPermissions>,
    #[serde(default)]
    hooks: BTreeMap<String, Value>,
    model: Option<String>,
    #[serde(default)]
    enabled_plugins: BTreeMap<String, bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPermissions {
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    deny: Vec<String>,
    default_mode: Option<String>,
}

/// Parse a settings.json file
///
/// # Errors
/// Returns an error if parsing fails
pub fn parse_settings(path: &Path, content: &str) -> ScanResult<SettingsFile> {
    let raw: RawSettings = serde_json::from_str(content).map_err(ScanError::JsonParse)?;

    let hooks_count = raw
        .hooks
        .values()
        .filter_map(Value::as_array)
        .map(Vec::len)
        .sum();

    let permissions = raw.permissions.map(|p| Permissions {
        allow: p.allow,
        deny: p.deny,
        default_mode: p.default_mode,
    });

    Ok(SettingsFile {
        path: path.to_path_buf(),
        sha256: sha256_hex(content.as_bytes()),
        hooks_count,
        permissions,
        enabled_plugins: raw.enabled_plugins,
        env: raw.env,
        model: raw.model,
    })
}

/// Parse the hook rules of a settings file (or a plugin's `hooks/hooks.json`).
///
/// Each element of `hooks.<Event>` becomes one [`HookInfo`]. Both the
/// matcher-group form `{"matcher": "...", "hooks": [...]}` and a bare
/// action `{"type": "command", "command": "..."}` are accepted.
///
/// # Errors
/// Returns an error if the file is not valid JSON
pub fn parse_hooks(path: &Path, content: &str, scope: &Scope) -> ScanResult<Vec<HookInfo>> {
    let value: Value = serde_json::from_str(content)?;
    let Some(events) = value.get("hooks").and_then(Value::as_object) else {
        return Ok(Vec::new());
    };

    let mut rules = Vec::new();
    for (event, entries) in events {
        let Some(entries) = entries.as_array() else {
            tracing::debug!(path = %path.display(), event, "hook event is not an array");
            continue;
        };
        for entry in entries {
            if !entry.is_object() {
                continue;
            }
            let matcher = entry
                .get("matcher")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(String::from);
            let definitions = match entry.get("hooks").and_then(Value::as_array) {
                Some(actions) => actions.iter().filter_map(parse_definition).collect(),
                None => parse_definition(entry).into_iter().collect(),
            };

            rules.push(HookInfo {
                name: hook_rule_name(event, matcher.as_deref()),
                path: path.to_path_buf(),
                scope: scope.clone(),
                trigger: event.clone(),
                matcher,
                definitions,
                entry: entry.clone(),
                sha256: sha256_hex(entry.to_string().as_bytes()),
            });
        }
    }
    Ok(rules)
}

fn parse_definition(action: &Value) -> Option<HookDefinition> {
    if let Ok(def) = serde_json::from_value::<HookDefinition>(action.clone()) {
        return Some(def);
    }
    // `{"command": "..."}` without an explicit type
    action
        .get("command")
        .and_then(Value::as_str)
        .map(|command| HookDefinition::Command {
            command: command.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_settings() {
        let content = r#"{
            "env": { "FOO": "bar" },
            "permissions": {
                "allow": ["Bash(npm:*)"],
                "deny": ["Read(.env)"],
                "defaultMode": "acceptEdits"
            },
            "enabledPlugins": { "lint@tools": true },
            "hooks": {
                "PreToolUse": [
                    { "matcher": "Bash", "hooks": [{ "type": "command", "command": "echo pre" }] }
                ]
            }
        }"#;

        let settings = parse_settings(&PathBuf::from("settings.json"), content).unwrap();
        assert_eq!(settings.hooks_count, 1);
        assert_eq!(settings.env.get("FOO").map(String::as_str), Some("bar"));
        assert_eq!(settings.enabled_plugins.get("lint@tools"), Some(&true));
        let perms = settings.permissions.unwrap();
        assert_eq!(perms.allow, vec!["Bash(npm:*)"]);
        assert_eq!(perms.default_mode.as_deref(), Some("acceptEdits"));
    }

    #[test]
    fn test_parse_hooks_matcher_groups() {
        let content = r#"{
            "hooks": {
                "PreToolUse": [
                    { "matcher": "Bash", "hooks": [{ "type": "command", "command": "check.sh" }] },
                    { "matcher": "Edit|Write", "hooks": [{ "type": "prompt", "prompt": "Sure?" }] }
                ],
                "Stop": [ { "command": "notify.sh" } ]
            }
        }"#;

        let hooks = parse_hooks(&PathBuf::from("settings.json"), content, &Scope::Project).unwrap();
        assert_eq!(hooks.len(), 3);

        let bash = hooks.iter().find(|h| h.name == "pretooluse-bash").unwrap();
        assert_eq!(bash.matcher.as_deref(), Some("Bash"));
        assert_eq!(
            bash.definitions,
            vec![HookDefinition::Command {
                command: "check.sh".into()
            }]
        );

        let stop = hooks.iter().find(|h| h.trigger == "Stop").unwrap();
        assert_eq!(stop.name, "stop-all");
        assert_eq!(stop.definitions.len(), 1);
    }

    #[test]
    fn test_settings_without_hooks() {
        let hooks = parse_hooks(&PathBuf::from("settings.json"), "{}", &Scope::User).unwrap();
        assert!(hooks.is_empty());
    }
}
