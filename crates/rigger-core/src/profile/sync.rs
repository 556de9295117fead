//! Keeping assigned projects consistent with their profile
//!
//! A project's effective tools are derived from its profile and its local
//! overrides. Whenever either side changes, the affected projects are
//! recomputed inside the same transaction as the change.

use crate::profile::{Profile, StorageError, ToolRef, ToolStore, ToolType};
use crate::project::{EffectiveTool, Project, ToolOrigin};
use crate::storage::{DatabaseError, ProfileStore, ProjectStore};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;

/// Result of updating a profile
#[derive(Debug, Clone, Serialize)]
pub struct UpdateResult {
    pub profile: Profile,
    /// Assigned projects whose effective tools were recomputed
    pub affected_project_count: usize,
}

/// Result of deleting a profile
#[derive(Debug, Clone, Serialize)]
pub struct ConvertResult {
    pub deleted: bool,
    /// Projects whose profile tools became local overrides
    pub converted_project_count: usize,
}

/// Profile tools merged with local overrides; a local override replaces a
/// profile tool of the same type and name
#[must_use]
pub fn effective_tools(profile: Option<&Profile>, project: &Project) -> Vec<EffectiveTool> {
    let mut tools: BTreeMap<(ToolType, String), EffectiveTool> = BTreeMap::new();

    if let Some(profile) = profile {
        for tool in &profile.tool_refs {
            tools.insert(
                (tool.tool_type, tool.name.clone()),
                EffectiveTool {
                    tool: tool.clone(),
                    origin: ToolOrigin::Profile {
                        profile_id: profile.id,
                    },
                },
            );
        }
    }

    for tool in project.local_overrides.iter() {
        tools.insert(
            (tool.tool_type, tool.name.clone()),
            EffectiveTool {
                tool: tool.clone(),
                origin: ToolOrigin::Local,
            },
        );
    }

    tools.into_values().collect()
}

/// Local overrides that shadow a tool of the profile
#[must_use]
pub fn override_collisions(profile: &Profile, project: &Project) -> Vec<ToolRef> {
    project
        .local_overrides
        .iter()
        .filter(|local| profile.tool(local.tool_type, &local.name).is_some())
        .cloned()
        .collect()
}

/// Recompute a project's effective tools against its (possibly absent) profile
pub fn refresh_project(project: &mut Project, profile: Option<&Profile>) {
    project.effective_tools = effective_tools(profile, project);
    project.touch();
}

/// Write a profile and recompute every assigned project atomically
///
/// # Errors
/// Returns an error if any write fails; nothing is committed in that case
pub fn update_profile(conn: &Connection, profile: &Profile) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    ProfileStore::new(&tx).update(profile)?;

    let projects = ProjectStore::new(&tx);
    let assigned = projects.list_by_profile(profile.id)?;
    for mut project in assigned.iter().cloned() {
        refresh_project(&mut project, Some(profile));
        projects.update(&project)?;
    }

    tx.commit()?;
    Ok(assigned.len())
}

/// Move a profile's tools into the local overrides of every assigned
/// project, then delete the profile, atomically
///
/// Tool content must already have been copied with [`copy_profile_content`].
/// Existing local overrides keep precedence over the profile's tools.
///
/// # Errors
/// Returns an error if any write fails; nothing is committed in that case
pub fn convert_and_delete(conn: &Connection, profile: &Profile) -> Result<ConvertResult, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let projects = ProjectStore::new(&tx);

    let assigned = projects.list_by_profile(profile.id)?;
    for mut project in assigned.iter().cloned() {
        for tool in &profile.tool_refs {
            if !project.local_overrides.contains(tool.tool_type, &tool.name) {
                project.local_overrides.push(tool.clone());
            }
        }
        project.assigned_profile_id = None;
        refresh_project(&mut project, None);
        projects.update(&project)?;
    }

    let deleted = ProfileStore::new(&tx).delete(profile.id)?;
    tx.commit()?;

    Ok(ConvertResult {
        deleted,
        converted_project_count: assigned.len(),
    })
}

/// Copy the content of profile tools a project does not already override
/// into the project's local store
///
/// # Errors
/// Returns an error if content cannot be copied
pub fn copy_profile_content(
    profile: &Profile,
    profile_store: &ToolStore,
    project: &Project,
    project_store: &ToolStore,
) -> Result<(), StorageError> {
    for tool in &profile.tool_refs {
        if project.local_overrides.contains(tool.tool_type, &tool.name) {
            continue;
        }
        if !profile_store.copy_tool_to(tool.tool_type, &tool.name, project_store)? {
            tracing::warn!(
                profile = %profile.name,
                tool = %tool.name,
                kind = %tool.tool_type,
                "profile tool has no stored content"
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use std::path::PathBuf;

    fn names(tools: &[EffectiveTool]) -> Vec<(ToolType, &str, bool)> {
        tools
            .iter()
            .map(|t| {
                (
                    t.tool.tool_type,
                    t.tool.name.as_str(),
                    t.origin == ToolOrigin::Local,
                )
            })
            .collect()
    }

    #[test]
    fn test_local_override_wins() {
        let mut profile = Profile::new("p".into());
        profile.tool_refs.push(ToolRef::new("lint", ToolType::Skill));
        profile.tool_refs.push(ToolRef::new("search", ToolType::Mcp));

        let mut project = Project::new(PathBuf::from("/w/a"));
        project.local_overrides.push(ToolRef::new("lint", ToolType::Skill));

        let tools = effective_tools(Some(&profile), &project);
        assert_eq!(
            names(&tools),
            vec![(ToolType::Skill, "lint", true), (ToolType::Mcp, "search", false)]
        );
        assert_eq!(override_collisions(&profile, &project).len(), 1);
    }

    #[test]
    fn test_update_recomputes_assigned_projects() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let mut profile = Profile::new("p".into());
        ProfileStore::new(conn).create(&profile).unwrap();

        for path in ["/w/a", "/w/b"] {
            let mut project = Project::new(PathBuf::from(path));
            project.assigned_profile_id = Some(profile.id);
            ProjectStore::new(conn).create(&project).unwrap();
        }
        ProjectStore::new(conn)
            .create(&Project::new(PathBuf::from("/w/unassigned")))
            .unwrap();

        profile.tool_refs.push(ToolRef::new("reviewer", ToolType::Agent));
        assert_eq!(update_profile(conn, &profile).unwrap(), 2);

        for project in ProjectStore::new(conn).list_by_profile(profile.id).unwrap() {
            assert_eq!(project.effective_tools.len(), 1);
        }
    }

    #[test]
    fn test_convert_keeps_effective_set() {
        let db = Database::in_memory().unwrap();
        let conn = db.connection();

        let mut profile = Profile::new("p".into());
        profile.tool_refs.push(ToolRef::new("lint", ToolType::Skill));
        profile.tool_refs.push(ToolRef::new("reviewer", ToolType::Agent));
        ProfileStore::new(conn).create(&profile).unwrap();

        let mut project = Project::new(PathBuf::from("/w/a"));
        project.assigned_profile_id = Some(profile.id);
        project
            .local_overrides
            .push(ToolRef::new("lint", ToolType::Skill).with_source_scope(rigger_scanner::Scope::Local));
        refresh_project(&mut project, Some(&profile));
        ProjectStore::new(conn).create(&project).unwrap();
        let before: Vec<ToolRef> = project.effective_tools.iter().map(|t| t.tool.clone()).collect();

        let result = convert_and_delete(conn, &profile).unwrap();
        assert!(result.deleted);
        assert_eq!(result.converted_project_count, 1);

        let after = ProjectStore::new(conn).get(project.id).unwrap().unwrap();
        assert!(after.assigned_profile_id.is_none());
        let after_tools: Vec<ToolRef> = after.effective_tools.iter().map(|t| t.tool.clone()).collect();
        assert_eq!(before, after_tools);
        assert!(ProfileStore::new(conn).get(profile.id).unwrap().is_none());
    }
}
