//! Structural merge of profile entries into JSON configuration files
//!
//! Profile-managed content in `.mcp.json` and `.claude/settings.json` is a
//! set of keyed slots inside a document the user also edits. Merging touches
//! only those slots: unrelated keys keep their values and their order, and a
//! slot is only removed if an earlier apply put it there.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

const MCP_SERVERS: &str = "mcpServers";
const ENABLED_PLUGINS: &str = "enabledPlugins";
const HOOKS: &str = "hooks";

/// Errors while merging into an existing document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Expected {expected} at '{location}'")]
    UnexpectedType {
        location: String,
        expected: &'static str,
    },
}

/// Identity of one profile-managed slot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum EntryKey {
    /// `mcpServers.<name>`
    McpServer { name: String },
    /// `enabledPlugins.<name@marketplace>`
    Plugin { key: String },
    /// The matcher group of `hooks.<event>[]` whose `matcher` equals this one
    Hook {
        event: String,
        matcher: Option<String>,
    },
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::McpServer { name } => write!(f, "{MCP_SERVERS}.{name}"),
            Self::Plugin { key } => write!(f, "{ENABLED_PLUGINS}.{key}"),
            Self::Hook { event, matcher } => {
                write!(f, "{HOOKS}.{event}[{}]", matcher.as_deref().unwrap_or("*"))
            }
        }
    }
}

/// A slot and the value the profile wants in it
#[derive(Debug, Clone, PartialEq)]
pub struct MergeEntry {
    pub key: EntryKey,
    pub value: Value,
}

/// Result of a merge
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// The merged document
    pub document: Value,
    pub inserted: Vec<EntryKey>,
    pub updated: Vec<EntryKey>,
    pub removed: Vec<EntryKey>,
}

impl MergeOutcome {
    /// Whether the merge left the document semantically unchanged
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Whether the merged document has no keys at all
    #[must_use]
    pub fn is_empty_document(&self) -> bool {
        self.document.as_object().is_some_and(Map::is_empty)
    }
}

/// Merge `targets` into `existing`
///
/// * a target whose slot exists with an equal value is left alone
/// * a target whose slot exists with a different value is replaced in place
/// * a target whose slot is missing is appended
/// * a key in `previously_managed` but not in `targets` is removed, and any
///   container that removal empties is dropped
///
/// # Errors
/// Returns an error if the document or one of the containers has an
/// unexpected JSON type
pub fn merge_document(
    existing: Option<&Value>,
    targets: &[MergeEntry],
    previously_managed: &BTreeSet<EntryKey>,
) -> Result<MergeOutcome, MergeError> {
    let mut document = existing.cloned().unwrap_or_else(|| Value::Object(Map::new()));
    let root = document.as_object_mut().ok_or(MergeError::UnexpectedType {
        location: "$".to_string(),
        expected: "an object",
    })?;

    let mut outcome = MergeOutcome {
        document: Value::Null,
        inserted: Vec::new(),
        updated: Vec::new(),
        removed: Vec::new(),
    };

    for target in targets {
        match upsert(root, &target.key, &target.value)? {
            Upsert::Unchanged => {}
            Upsert::Inserted => outcome.inserted.push(target.key.clone()),
            Upsert::Updated => outcome.updated.push(target.key.clone()),
        }
    }

    let wanted: BTreeSet<&EntryKey> = targets.iter().map(|t| &t.key).collect();
    for key in previously_managed {
        if !wanted.contains(key) && remove(root, key)? {
            outcome.removed.push(key.clone());
        }
    }

    outcome.document = document;
    Ok(outcome)
}

enum Upsert {
    Unchanged,
    Inserted,
    Updated,
}

fn upsert(root: &mut Map<String, Value>, key: &EntryKey, value: &Value) -> Result<Upsert, MergeError> {
    match key {
        EntryKey::McpServer { name } => upsert_keyed(root, MCP_SERVERS, name, value),
        EntryKey::Plugin { key } => upsert_keyed(root, ENABLED_PLUGINS, key, value),
        EntryKey::Hook { event, matcher } => {
            let hooks = object_entry(root, HOOKS)?;
            let rules = array_entry(hooks, event)?;
            match rules.iter_mut().find(|rule| same_matcher(rule, matcher.as_deref())) {
                Some(rule) if rule == value => Ok(Upsert::Unchanged),
                Some(rule) => {
                    *rule = value.clone();
                    Ok(Upsert::Updated)
                }
                None => {
                    rules.push(value.clone());
                    Ok(Upsert::Inserted)
                }
            }
        }
    }
}

fn upsert_keyed(
    root: &mut Map<String, Value>,
    container: &str,
    name: &str,
    value: &Value,
) -> Result<Upsert, MergeError> {
    let map = object_entry(root, container)?;
    match map.get_mut(name) {
        Some(current) if current == value => Ok(Upsert::Unchanged),
        Some(current) => {
            *current = value.clone();
            Ok(Upsert::Updated)
        }
        None => {
            map.insert(name.to_string(), value.clone());
            Ok(Upsert::Inserted)
        }
    }
}

fn remove(root: &mut Map<String, Value>, key: &EntryKey) -> Result<bool, MergeError> {
    match key {
        EntryKey::McpServer { name } => remove_keyed(root, MCP_SERVERS, name),
        EntryKey::Plugin { key } => remove_keyed(root, ENABLED_PLUGINS, key),
        EntryKey::Hook { event, matcher } => {
            let Some(hooks) = existing_object(root, HOOKS)? else {
                return Ok(false);
            };
            let Some(rules) = hooks.get_mut(event.as_str()) else {
                return Ok(false);
            };
            let rules = rules.as_array_mut().ok_or_else(|| MergeError::UnexpectedType {
                location: format!("{HOOKS}.{event}"),
                expected: "an array",
            })?;

            let before = rules.len();
            rules.retain(|rule| !same_matcher(rule, matcher.as_deref()));
            let removed = rules.len() != before;

            if removed && rules.is_empty() {
                hooks.shift_remove(event.as_str());
                if hooks.is_empty() {
                    root.shift_remove(HOOKS);
                }
            }
            Ok(removed)
        }
    }
}

fn remove_keyed(root: &mut Map<String, Value>, container: &str, name: &str) -> Result<bool, MergeError> {
    let Some(map) = existing_object(root, container)? else {
        return Ok(false);
    };
    let removed = map.shift_remove(name).is_some();
    if removed && map.is_empty() {
        root.shift_remove(container);
    }
    Ok(removed)
}

/// A missing or empty matcher matches every tool, so the two are the same slot
fn same_matcher(rule: &Value, matcher: Option<&str>) -> bool {
    let current = rule
        .get("matcher")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty());
    current == matcher.filter(|m| !m.is_empty())
}

fn object_entry<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> Result<&'a mut Map<String, Value>, MergeError> {
    parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| MergeError::UnexpectedType {
            location: key.to_string(),
            expected: "an object",
        })
}

fn array_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> Result<&'a mut Vec<Value>, MergeError> {
    parent
        .entry(key.to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| MergeError::UnexpectedType {
            location: format!("{HOOKS}.{key}"),
            expected: "an array",
        })
}

fn existing_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> Result<Option<&'a mut Map<String, Value>>, MergeError> {
    match parent.get_mut(key) {
        None => Ok(None),
        Some(value) => value
            .as_object_mut()
            .map(Some)
            .ok_or_else(|| MergeError::UnexpectedType {
                location: key.to_string(),
                expected: "an object",
            }),
    }
}
