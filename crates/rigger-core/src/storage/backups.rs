//! Backup record storage operations

use crate::backup::BackupRecord;
use crate::storage::db::{format_timestamp, parse_timestamp, parse_uuid, DatabaseError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Backup record storage operations
pub struct BackupStore<'a> {
    conn: &'a Connection,
}

impl<'a> BackupStore<'a> {
    /// Create a new backup store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Persist a backup record
    ///
    /// # Errors
    /// Returns an error if the record cannot be written
    pub fn create(&self, record: &BackupRecord) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(record)?;

        self.conn.execute(
            r"
            INSERT INTO backups
                (id, project_id, profile_id, description, backup_dir, data, created_at, rolled_back_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                record.id.to_string(),
                record.project_id.to_string(),
                record.profile_id.map(|id| id.to_string()),
                record.description,
                record.backup_dir.display().to_string(),
                json,
                format_timestamp(&record.created_at),
                record.rolled_back_at.as_ref().map(format_timestamp),
            ],
        )?;

        Ok(())
    }

    /// Get a backup record by ID
    ///
    /// # Errors
    /// Returns an error if the record cannot be retrieved
    pub fn get(&self, id: Uuid) -> Result<Option<BackupRecord>, DatabaseError> {
        self.conn
            .query_row(
                "SELECT data, profile_id, rolled_back_at FROM backups WHERE id = ?1",
                params![id.to_string()],
                read_row,
            )
            .optional()?
            .map(decode)
            .transpose()
    }

    /// Backup records of a project, newest first
    ///
    /// # Errors
    /// Returns an error if the records cannot be listed
    pub fn list_for_project(&self, project_id: Uuid) -> Result<Vec<BackupRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT data, profile_id, rolled_back_at FROM backups
            WHERE project_id = ?1
            ORDER BY created_at DESC, rowid DESC
            ",
        )?;

        let rows = stmt.query_map(params![project_id.to_string()], read_row)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(decode(row?)?);
        }
        Ok(records)
    }

    /// Most recent record of a project that was not rolled back, optionally
    /// restricted to one profile
    ///
    /// # Errors
    /// Returns an error if the record cannot be retrieved
    pub fn latest_for(
        &self,
        project_id: Uuid,
        profile_id: Option<Uuid>,
    ) -> Result<Option<BackupRecord>, DatabaseError> {
        let row = match profile_id {
            Some(profile_id) => self
                .conn
                .query_row(
                    r"
                    SELECT data, profile_id, rolled_back_at FROM backups
                    WHERE project_id = ?1 AND profile_id = ?2 AND rolled_back_at IS NULL
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT 1
                    ",
                    params![project_id.to_string(), profile_id.to_string()],
                    read_row,
                )
                .optional()?,
            None => self
                .conn
                .query_row(
                    r"
                    SELECT data, profile_id, rolled_back_at FROM backups
                    WHERE project_id = ?1 AND rolled_back_at IS NULL
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT 1
                    ",
                    params![project_id.to_string()],
                    read_row,
                )
                .optional()?,
        };

        row.map(decode).transpose()
    }

    /// Record that a backup was restored; returns false for an unknown ID
    ///
    /// # Errors
    /// Returns an error if the record cannot be updated
    pub fn mark_rolled_back(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let updated = self.conn.execute(
            "UPDATE backups SET rolled_back_at = ?2 WHERE id = ?1",
            params![id.to_string(), format_timestamp(&at)],
        )?;
        Ok(updated > 0)
    }
}

type RawRow = (String, Option<String>, Option<String>);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

/// The `profile_id` and `rolled_back_at` columns are authoritative: they
/// change after the record is written while the JSON copy does not.
fn decode((json, profile_id, rolled_back_at): RawRow) -> Result<BackupRecord, DatabaseError> {
    let mut record: BackupRecord = serde_json::from_str(&json)?;
    record.profile_id = profile_id.as_deref().map(parse_uuid).transpose()?;
    record.rolled_back_at = rolled_back_at.as_deref().map(parse_timestamp).transpose()?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use crate::project::Project;
    use crate::storage::{Database, ProfileStore, ProjectStore};
    use std::path::PathBuf;

    fn setup(db: &Database) -> (Project, Profile) {
        let profile = Profile::new("p".into());
        ProfileStore::new(db.connection()).create(&profile).unwrap();
        let project = Project::new(PathBuf::from("/work/app"));
        ProjectStore::new(db.connection()).create(&project).unwrap();
        (project, profile)
    }

    #[test]
    fn test_list_newest_first_and_latest_for_profile() {
        let db = Database::in_memory().unwrap();
        let (project, profile) = setup(&db);
        let store = BackupStore::new(db.connection());

        let first = BackupRecord::new(project.id, Some(profile.id), PathBuf::from("/b/1"));
        let second = BackupRecord::new(project.id, None, PathBuf::from("/b/2"));
        store.create(&first).unwrap();
        store.create(&second).unwrap();

        let listed: Vec<_> = store
            .list_for_project(project.id)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(listed, vec![second.id, first.id]);

        assert_eq!(
            store.latest_for(project.id, Some(profile.id)).unwrap().map(|r| r.id),
            Some(first.id)
        );
        assert_eq!(
            store.latest_for(project.id, None).unwrap().map(|r| r.id),
            Some(second.id)
        );
    }

    #[test]
    fn test_rolled_back_record_is_not_latest() {
        let db = Database::in_memory().unwrap();
        let (project, profile) = setup(&db);
        let store = BackupStore::new(db.connection());

        let first = BackupRecord::new(project.id, Some(profile.id), PathBuf::from("/b/1"));
        let second = BackupRecord::new(project.id, Some(profile.id), PathBuf::from("/b/2"));
        store.create(&first).unwrap();
        store.create(&second).unwrap();

        assert!(store.mark_rolled_back(second.id, Utc::now()).unwrap());
        assert!(!store.mark_rolled_back(Uuid::new_v4(), Utc::now()).unwrap());

        assert_eq!(
            store.latest_for(project.id, Some(profile.id)).unwrap().map(|r| r.id),
            Some(first.id)
        );
        assert_eq!(
            store.latest_for(project.id, None).unwrap().map(|r| r.id),
            Some(first.id)
        );
        assert!(store.get(second.id).unwrap().unwrap().rolled_back_at.is_some());
        assert_eq!(store.list_for_project(project.id).unwrap().len(), 2);
    }

    #[test]
    fn test_profile_deletion_clears_backup_profile() {
        let db = Database::in_memory().unwrap();
        let (project, profile) = setup(&db);
        let store = BackupStore::new(db.connection());

        let record = BackupRecord::new(project.id, Some(profile.id), PathBuf::from("/b/1"));
        store.create(&record).unwrap();
        ProfileStore::new(db.connection()).delete(profile.id).unwrap();

        let loaded = store.get(record.id).unwrap().unwrap();
        assert!(loaded.profile_id.is_none());
    }
}
