//! CLI command handlers
//!
//! One module per top-level subcommand, plus lookups shared between them.

pub mod profile;
pub mod project;
pub mod scan;

use anyhow::{anyhow, Result};
use rigger_core::{Engine, Profile, Project};
use std::path::Path;
use uuid::Uuid;

/// Look up a profile by name or UUID
pub async fn find_profile(engine: &Engine, identifier: &str) -> Result<Profile> {
    if let Ok(id) = Uuid::parse_str(identifier) {
        return Ok(engine.get_profile(id).await?);
    }

    let summary = engine
        .list_profiles()
        .await?
        .into_iter()
        .find(|p| p.name == identifier)
        .ok_or_else(|| anyhow!("Profile not found: {identifier}"))?;
    Ok(engine.get_profile(summary.id).await?)
}

/// Look up a registered project by directory
pub async fn find_project(engine: &Engine, path: &Path) -> Result<Project> {
    let canonical = path
        .canonicalize()
        .map_err(|e| anyhow!("{}: {e}", path.display()))?;

    engine
        .list_projects()
        .await?
        .into_iter()
        .find(|p| p.path == canonical)
        .ok_or_else(|| {
            anyhow!(
                "Project not registered: {} (run `rigger project add` first)",
                path.display()
            )
        })
}
