//! Diff plan generation for profile application

use crate::backup::BackupRecord;
use crate::diff::render::{render_plugin, render_tool, Rendered, SETTINGS_FILE};
use crate::diff::{DiffPlan, FileOperation, ManagedState, Warning, WarningKind};
use crate::merge::{merge_document, EntryKey, MergeEntry};
use crate::profile::{Profile, StorageError, ToolRef, ToolStore, ToolType};
use crate::project::LocalOverrides;
use crate::util::{safe_join, sha256_hex, PathError};
use rigger_scanner::artifacts::hook_rule_name;
use rigger_scanner::{Inventory, Scope};
use serde_json::Value;
use similar::TextDiff;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors during diff plan generation
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a plan is computed from
pub struct PlanInput<'a> {
    /// Canonical project directory
    pub project_root: &'a Path,
    pub profile: &'a Profile,
    /// Content of the profile's tools
    pub profile_store: &'a ToolStore,
    /// Local overrides of a registered project and their content
    pub local: Option<(&'a LocalOverrides, &'a ToolStore)>,
    /// Latest backup of this project made while applying this profile
    pub previous: Option<&'a BackupRecord>,
    /// Every backup of this project, any profile, newest first
    pub history: &'a [BackupRecord],
    /// Fresh scan of the project, for shadowing checks
    pub inventory: Option<&'a Inventory>,
}

/// Target state rendered from profile and overrides
#[derive(Default)]
struct Targets<'a> {
    files: BTreeMap<PathBuf, Vec<u8>>,
    entries: BTreeMap<PathBuf, Vec<MergeEntry>>,
    /// Tools without content; whatever they wrote before is left alone
    skipped: Vec<&'a ToolRef>,
}

/// Generate a diff plan for applying a profile to a project
///
/// # Errors
/// Returns an error if stored content or project files cannot be read
pub fn generate_plan(input: &PlanInput<'_>) -> Result<DiffPlan, PlanError> {
    let root = input.project_root;
    let mut plan = DiffPlan::new(root.to_path_buf(), input.profile.id);
    let previous = input
        .previous
        .map(|record| record.managed.clone())
        .unwrap_or_default();

    let targets = collect_targets(input, &mut plan.warnings)?;

    let mut planner = Planner {
        root,
        previous: &previous,
        managed: ManagedState::default(),
        changes: Vec::new(),
        deletes: Vec::new(),
        current_hashes: BTreeMap::new(),
        warnings: &mut plan.warnings,
    };
    planner.plan_files(&targets)?;
    planner.plan_json(&targets)?;
    planner.plan_stale(&targets)?;

    let Planner {
        managed,
        mut changes,
        mut deletes,
        current_hashes,
        ..
    } = planner;

    check_concurrent(
        input.history,
        changes.iter().chain(&deletes),
        &current_hashes,
        &mut plan.warnings,
    );

    changes.sort_by(|a, b| a.path().cmp(b.path()));
    deletes.sort_by(|a, b| a.path().cmp(b.path()));
    plan.operations = changes;
    plan.operations.extend(deletes);
    plan.managed = managed;

    tracing::debug!(
        project = %root.display(),
        profile = %input.profile.name,
        operations = plan.operations.len(),
        warnings = plan.warnings.len(),
        "generated diff plan"
    );
    Ok(plan)
}

fn collect_targets<'a>(
    input: &PlanInput<'a>,
    warnings: &mut Vec<Warning>,
) -> Result<Targets<'a>, PlanError> {
    let profile: &'a Profile = input.profile;
    let mut tools: BTreeMap<(ToolType, &str), (&'a ToolRef, &'a ToolStore)> = BTreeMap::new();
    for tool in &profile.tool_refs {
        tools.insert(tool.key(), (tool, input.profile_store));
    }
    if let Some((overrides, store)) = input.local {
        for tool in overrides.iter() {
            tools.insert(tool.key(), (tool, store));
        }
    }

    let mut targets = Targets::default();
    for (tool, store) in tools.into_values() {
        if let Some(inventory) = input.inventory {
            warnings.extend(shadow_warning(inventory, tool));
        }

        let rendered = match (render_tool(tool, store, warnings)?, input.inventory) {
            (None, Some(inventory)) => render_scanned(inventory, tool, warnings)?,
            (rendered, _) => rendered,
        };
        match rendered {
            Some(Rendered::Files(files)) => targets.files.extend(files),
            Some(Rendered::Entry { file, entry }) => {
                targets.entries.entry(file).or_default().push(entry);
            }
            None => {
                warnings.push(Warning::warning(
                    WarningKind::MissingContent,
                    None,
                    format!("No stored content for {} '{}'; skipped", tool.tool_type, tool.name),
                ));
                targets.skipped.push(tool);
            }
        }
    }

    if !profile.plugin_refs.is_empty() {
        let settings = targets.entries.entry(PathBuf::from(SETTINGS_FILE)).or_default();
        settings.extend(profile.plugin_refs.iter().map(render_plugin));
    }

    Ok(targets)
}

/// Render a tool the store holds no content for from its scanned definition,
/// looked up in the scope it was captured from or else the winning one
fn render_scanned(
    inventory: &Inventory,
    tool: &ToolRef,
    warnings: &mut Vec<Warning>,
) -> Result<Option<Rendered>, PlanError> {
    let kind = tool.tool_type.into();
    let entity = match &tool.source_scope {
        Some(scope) => inventory.find_in(scope, kind, &tool.name),
        None => inventory.winner(kind, &tool.name),
    };
    let Some(entity) = entity else {
        return Ok(None);
    };

    let staging = tempfile::tempdir().map_err(|source| PlanError::Io {
        path: std::env::temp_dir(),
        source,
    })?;
    let store = ToolStore::new(staging.path());
    store.import_entity(entity)?;
    tracing::debug!(
        tool = %tool.name,
        source = %entity.path().display(),
        "rendering tool from scanned definition"
    );
    render_tool(tool, &store, warnings)
}

/// A tool written at project scope is shadowed when the scan found a
/// higher-precedence definition with the same name
fn shadow_warning(inventory: &Inventory, tool: &ToolRef) -> Option<Warning> {
    // Hook rules all fire; nothing shadows them
    if tool.tool_type == ToolType::Hook {
        return None;
    }

    let winner = inventory.winner(tool.tool_type.into(), &tool.name)?;
    let scope = winner.scope();
    if !scope.outranks(&Scope::Project) {
        return None;
    }

    let message = format!(
        "{} '{}' is shadowed by the {} definition at {}",
        tool.tool_type,
        tool.name,
        scope,
        winner.path().display()
    );
    Some(match scope {
        Scope::Managed => Warning::warning(WarningKind::Collision, None, message),
        _ => Warning::info(WarningKind::Collision, None, message),
    })
}

struct Planner<'p> {
    root: &'p Path,
    previous: &'p ManagedState,
    managed: ManagedState,
    changes: Vec<FileOperation>,
    deletes: Vec<FileOperation>,
    current_hashes: BTreeMap<PathBuf, String>,
    warnings: &'p mut Vec<Warning>,
}

impl Planner<'_> {
    fn plan_files(&mut self, targets: &Targets<'_>) -> Result<(), PlanError> {
        for (rel, content) in &targets.files {
            match self.read_existing(rel)? {
                None => {
                    self.managed.files.insert(rel.clone());
                    self.changes.push(FileOperation::Create {
                        path: rel.clone(),
                        content: content.clone(),
                    });
                }
                Some(current) => {
                    if self.previous.files.contains(rel) {
                        self.managed.files.insert(rel.clone());
                    }
                    if current != *content {
                        self.changes.push(FileOperation::Modify {
                            path: rel.clone(),
                            diff: unified_diff(rel, &current, content),
                            new_content: content.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn plan_json(&mut self, targets: &Targets<'_>) -> Result<(), PlanError> {
        let files: BTreeSet<PathBuf> = targets
            .entries
            .keys()
            .chain(self.previous.entries.keys())
            .cloned()
            .collect();

        for rel in files {
            let wanted = targets.entries.get(&rel).map_or(&[][..], Vec::as_slice);
            let (protected, removable): (BTreeSet<EntryKey>, BTreeSet<EntryKey>) = self
                .previous
                .entries_for(&rel)
                .into_iter()
                .partition(|key| key_protected(&targets.skipped, key));

            let existing = self.read_existing(&rel)?;
            let document = match existing.as_deref().map(serde_json::from_slice::<Value>) {
                None => None,
                Some(Ok(value)) => Some(value),
                Some(Err(e)) => {
                    self.skip_unparseable(&rel, &e.to_string());
                    continue;
                }
            };

            let outcome = match merge_document(document.as_ref(), wanted, &removable) {
                Ok(outcome) => outcome,
                Err(e) => {
                    self.skip_unparseable(&rel, &e.to_string());
                    continue;
                }
            };

            let keys: BTreeSet<EntryKey> = wanted
                .iter()
                .map(|entry| entry.key.clone())
                .chain(protected)
                .collect();
            if !keys.is_empty() {
                self.managed.entries.insert(rel.clone(), keys);
            }

            let created_by_apply = self.previous.files.contains(&rel);
            let Some(current) = existing else {
                if !outcome.is_empty_document() {
                    self.managed.files.insert(rel.clone());
                    self.changes.push(FileOperation::Create {
                        content: render_json(&rel, &outcome.document)?,
                        path: rel,
                    });
                }
                continue;
            };

            if outcome.is_unchanged() {
                if created_by_apply {
                    self.managed.files.insert(rel);
                }
                continue;
            }

            if outcome.is_empty_document() && created_by_apply {
                self.deletes.push(FileOperation::Delete { path: rel });
                continue;
            }

            let new_content = render_json(&rel, &outcome.document)?;
            if created_by_apply {
                self.managed.files.insert(rel.clone());
            }
            self.changes.push(FileOperation::Modify {
                diff: unified_diff(&rel, &current, &new_content),
                path: rel,
                new_content,
            });
        }
        Ok(())
    }

    /// Files an earlier apply created that the profile no longer provides
    fn plan_stale(&mut self, targets: &Targets<'_>) -> Result<(), PlanError> {
        for rel in &self.previous.files {
            if targets.files.contains_key(rel)
                || targets.entries.contains_key(rel)
                || self.previous.entries.contains_key(rel)
            {
                continue;
            }
            if path_protected(&targets.skipped, rel) {
                self.managed.files.insert(rel.clone());
                continue;
            }

            let path = safe_join(self.root, rel)?;
            if path.is_file() {
                let current = fs::read(&path).map_err(|source| PlanError::Io {
                    path: path.clone(),
                    source,
                })?;
                self.current_hashes.insert(rel.clone(), sha256_hex(&current));
                self.deletes.push(FileOperation::Delete { path: rel.clone() });
            }
        }
        Ok(())
    }

    fn read_existing(&mut self, rel: &Path) -> Result<Option<Vec<u8>>, PlanError> {
        let path = safe_join(self.root, rel)?;
        match fs::read(&path) {
            Ok(bytes) => {
                self.current_hashes.insert(rel.to_path_buf(), sha256_hex(&bytes));
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PlanError::Io { path, source }),
        }
    }

    /// Leave an unreadable JSON file alone and keep tracking what we own in it
    fn skip_unparseable(&mut self, rel: &Path, error: &str) {
        tracing::warn!(path = %rel.display(), %error, "skipping unparseable configuration file");
        self.warnings.push(Warning::warning(
            WarningKind::Parse,
            Some(rel.to_path_buf()),
            format!("Cannot merge into {}: {error}; file left unchanged", rel.display()),
        ));

        if let Some(keys) = self.previous.entries.get(rel) {
            self.managed.entries.insert(rel.to_path_buf(), keys.clone());
        }
        if self.previous.files.contains(rel) {
            self.managed.files.insert(rel.to_path_buf());
        }
    }
}

fn path_protected(skipped: &[&ToolRef], rel: &Path) -> bool {
    skipped.iter().any(|tool| match tool.tool_type {
        ToolType::Skill => rel.starts_with(Path::new(".claude/skills").join(&tool.name)),
        ToolType::Command => rel == Path::new(".claude/commands").join(format!("{}.md", tool.name)),
        ToolType::Agent => rel == Path::new(".claude/agents").join(format!("{}.md", tool.name)),
        ToolType::Hook | ToolType::Mcp => false,
    })
}

fn key_protected(skipped: &[&ToolRef], key: &EntryKey) -> bool {
    skipped.iter().any(|tool| match (tool.tool_type, key) {
        (ToolType::Mcp, EntryKey::McpServer { name }) => *name == tool.name,
        (ToolType::Hook, EntryKey::Hook { event, matcher }) => {
            hook_rule_name(event, matcher.as_deref()) == tool.name
        }
        _ => false,
    })
}

/// Flag files whose current content matches neither what the last apply
/// touching them wrote nor what was there before it
fn check_concurrent<'a>(
    history: &[BackupRecord],
    operations: impl Iterator<Item = &'a FileOperation>,
    current_hashes: &BTreeMap<PathBuf, String>,
    warnings: &mut Vec<Warning>,
) {
    for op in operations {
        if matches!(op, FileOperation::Create { .. }) {
            continue;
        }
        let Some(current) = current_hashes.get(op.path()) else {
            continue;
        };
        // Applies that left this path alone say nothing about it
        let Some(entry) = history.iter().find_map(|record| record.file(op.path())) else {
            continue;
        };

        let known = [&entry.written_sha256, &entry.original_sha256]
            .into_iter()
            .any(|hash| hash.as_deref() == Some(current.as_str()));
        if !known {
            warnings.push(Warning::warning(
                WarningKind::ConcurrentModification,
                Some(op.path().to_path_buf()),
                format!(
                    "{} changed since the last apply; local edits will be overwritten",
                    op.path().display()
                ),
            ));
        }
    }
}

fn render_json(rel: &Path, document: &Value) -> Result<Vec<u8>, PlanError> {
    let mut content = serde_json::to_vec_pretty(document).map_err(|source| PlanError::Serialize {
        path: rel.to_path_buf(),
        source,
    })?;
    content.push(b'\n');
    Ok(content)
}

/// Unified diff between two versions of a file
#[must_use]
pub fn unified_diff(rel: &Path, old: &[u8], new: &[u8]) -> String {
    match (std::str::from_utf8(old), std::str::from_utf8(new)) {
        (Ok(old), Ok(new)) => {
            let diff = TextDiff::from_lines(old, new);
            diff.unified_diff()
                .context_radius(3)
                .header(
                    &format!("a/{}", rel.display()),
                    &format!("b/{}", rel.display()),
                )
                .to_string()
        }
        _ => format!(
            "Binary file {} differs ({} -> {} bytes)\n",
            rel.display(),
            old.len(),
            new.len()
        ),
    }
}
