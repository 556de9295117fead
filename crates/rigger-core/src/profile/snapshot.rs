//! Capturing tools from scanned configuration into a tool store

use crate::profile::{StorageError, ToolRef, ToolStore, ToolType};
use rigger_scanner::inventory::{EntityRef, ScopeArtifacts};
use rigger_scanner::parser::{parse_agent, parse_command, parse_hooks, parse_mcp_config, parse_skill};
use rigger_scanner::{Inventory, ScanError, Scope};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors during snapshot creation
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse source: {0}")]
    Parse(#[from] ScanError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Nothing to import from {0}")]
    Empty(String),
}

/// Copy every project-scope entity of a scan into `store`
///
/// Local-scope entities stay behind; they belong to the machine, not the
/// project's shared configuration.
pub fn snapshot_project(inventory: &Inventory, store: &ToolStore) -> Result<Vec<ToolRef>, StorageError> {
    let Some(project) = &inventory.project else {
        return Ok(Vec::new());
    };

    let refs = import_all(&project.artifacts, store)?;
    tracing::debug!(
        project = %project.path.display(),
        tools = refs.len(),
        "captured project tools"
    );
    Ok(refs)
}

fn import_all(artifacts: &ScopeArtifacts, store: &ToolStore) -> Result<Vec<ToolRef>, StorageError> {
    let entities = artifacts
        .skills
        .iter()
        .map(EntityRef::Skill)
        .chain(artifacts.commands.iter().map(EntityRef::Command))
        .chain(artifacts.agents.iter().map(EntityRef::Agent))
        .chain(artifacts.hooks.iter().map(EntityRef::Hook))
        .chain(artifacts.mcp_servers.iter().map(EntityRef::Mcp));

    entities.map(|entity| store.import_entity(entity)).collect()
}

/// Import tools of one kind from an arbitrary source path
///
/// * skill: a skill directory or its `SKILL.md`
/// * command, agent: a markdown file
/// * mcp: a JSON file with `mcpServers` (every server is imported)
/// * hook: a settings file with `hooks` (every rule is imported)
pub fn import_from_path(
    tool_type: ToolType,
    source: &Path,
    store: &ToolStore,
) -> Result<Vec<ToolRef>, SnapshotError> {
    let file = match tool_type {
        ToolType::Skill if source.is_dir() => source.join("SKILL.md"),
        _ => source.to_path_buf(),
    };
    let content = fs::read_to_string(&file).map_err(|source| SnapshotError::Io {
        path: file.display().to_string(),
        source,
    })?;

    // The scope only labels parsed entities; imported refs carry none
    let scope = Scope::Project;
    let mut artifacts = ScopeArtifacts::default();
    match tool_type {
        ToolType::Skill => artifacts.skills.push(parse_skill(&file, &content, scope)?),
        ToolType::Command => artifacts.commands.push(parse_command(&file, &content, scope)?),
        ToolType::Agent => artifacts.agents.push(parse_agent(&file, &content, scope)?),
        ToolType::Mcp => artifacts.mcp_servers = parse_mcp_config(&file, &content, scope)?,
        ToolType::Hook => artifacts.hooks = parse_hooks(&file, &content, &scope)?,
    }

    if artifacts.is_empty() {
        return Err(SnapshotError::Empty(file.display().to_string()));
    }

    let refs = import_all(&artifacts, store)?
        .into_iter()
        .map(|mut tool| {
            tool.source_scope = None;
            tool
        })
        .collect();
    Ok(refs)
}
