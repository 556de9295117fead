//! Project storage operations

use crate::project::Project;
use crate::storage::db::{format_timestamp, query_all_data, query_data, DatabaseError};
use rusqlite::{params, Connection};
use std::path::Path;
use uuid::Uuid;

/// Project storage operations
pub struct ProjectStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProjectStore<'a> {
    /// Create a new project store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a new project
    ///
    /// # Errors
    /// Returns an error if the project cannot be created (including a duplicate path)
    pub fn create(&self, project: &Project) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(project)?;

        self.conn.execute(
            r"
            INSERT INTO projects (id, name, path, assigned_profile_id, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
            params![
                project.id.to_string(),
                project.name,
                project.path.display().to_string(),
                project.assigned_profile_id.map(|id| id.to_string()),
                json,
                format_timestamp(&project.created_at),
                format_timestamp(&project.updated_at),
            ],
        )?;

        Ok(())
    }

    /// Get a project by ID
    ///
    /// # Errors
    /// Returns an error if the project cannot be retrieved
    pub fn get(&self, id: Uuid) -> Result<Option<Project>, DatabaseError> {
        query_data(
            self.conn,
            "SELECT data FROM projects WHERE id = ?1",
            &id.to_string(),
        )
    }

    /// Get a project by its canonical path
    ///
    /// # Errors
    /// Returns an error if the project cannot be retrieved
    pub fn get_by_path(&self, path: &Path) -> Result<Option<Project>, DatabaseError> {
        query_data(
            self.conn,
            "SELECT data FROM projects WHERE path = ?1",
            &path.display().to_string(),
        )
    }

    /// List all projects ordered by name
    ///
    /// # Errors
    /// Returns an error if the projects cannot be listed
    pub fn list(&self) -> Result<Vec<Project>, DatabaseError> {
        query_all_data(self.conn, "SELECT data FROM projects ORDER BY name, path", [])
    }

    /// Update a project
    ///
    /// # Errors
    /// Returns an error if the project does not exist or cannot be written
    pub fn update(&self, project: &Project) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(project)?;

        let updated = self.conn.execute(
            r"
            UPDATE projects
            SET name = ?1, path = ?2, assigned_profile_id = ?3, data = ?4, updated_at = ?5
            WHERE id = ?6
            ",
            params![
                project.name,
                project.path.display().to_string(),
                project.assigned_profile_id.map(|id| id.to_string()),
                json,
                format_timestamp(&project.updated_at),
                project.id.to_string(),
            ],
        )?;

        if updated == 0 {
            return Err(DatabaseError::Corrupt(format!(
                "Project not found: {}",
                project.id
            )));
        }

        Ok(())
    }

    /// List all projects with a specific profile assigned
    ///
    /// # Errors
    /// Returns an error if the projects cannot be listed
    pub fn list_by_profile(&self, profile_id: Uuid) -> Result<Vec<Project>, DatabaseError> {
        query_all_data(
            self.conn,
            "SELECT data FROM projects WHERE assigned_profile_id = ?1 ORDER BY path",
            params![profile_id.to_string()],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::storage::{Database, ProfileStore};
    use std::path::PathBuf;

    #[test]
    fn test_project_crud_and_lookup_by_profile() {
        let db = Database::in_memory().unwrap();
        let profiles = ProfileStore::new(db.connection());
        let projects = ProjectStore::new(db.connection());

        let profile = Profile::new("web".into());
        profiles.create(&profile).unwrap();

        let mut project = Project::new(PathBuf::from("/work/site"));
        projects.create(&project).unwrap();
        assert!(projects.list_by_profile(profile.id).unwrap().is_empty());

        project.assigned_profile_id = Some(profile.id);
        projects.update(&project).unwrap();

        assert_eq!(
            projects.get_by_path(Path::new("/work/site")).unwrap(),
            Some(project.clone())
        );
        assert_eq!(projects.list_by_profile(profile.id).unwrap(), vec![project]);
    }

    #[test]
    fn test_assignment_requires_existing_profile() {
        let db = Database::in_memory().unwrap();
        let projects = ProjectStore::new(db.connection());

        let mut project = Project::new(PathBuf::from("/work/api"));
        project.assigned_profile_id = Some(Uuid::new_v4());
        assert!(projects.create(&project).is_err());
    }

    #[test]
    fn test_assigned_profile_cannot_be_deleted() {
        let db = Database::in_memory().unwrap();
        let profiles = ProfileStore::new(db.connection());
        let projects = ProjectStore::new(db.connection());

        let profile = Profile::new("locked".into());
        profiles.create(&profile).unwrap();
        let mut project = Project::new(PathBuf::from("/work/lib"));
        project.assigned_profile_id = Some(profile.id);
        projects.create(&project).unwrap();

        assert!(profiles.delete(profile.id).is_err());
    }
}
