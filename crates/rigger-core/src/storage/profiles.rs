//! Profile storage operations (CRUD)

use crate::profile::Profile;
use crate::storage::db::{
    format_timestamp, parse_timestamp, parse_uuid, query_all_data, query_data, DatabaseError,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;
use uuid::Uuid;

/// Profile storage operations
pub struct ProfileStore<'a> {
    conn: &'a Connection,
}

impl<'a> ProfileStore<'a> {
    /// Create a new profile store
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new profile
    ///
    /// # Errors
    /// Returns an error if the profile cannot be created (including a duplicate name)
    pub fn create(&self, profile: &Profile) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(profile)?;

        self.conn.execute(
            r"
            INSERT INTO profiles (id, name, description, data, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                profile.id.to_string(),
                profile.name,
                profile.description,
                json,
                format_timestamp(&profile.created_at),
                format_timestamp(&profile.updated_at),
            ],
        )?;

        Ok(())
    }

    /// Get a profile by ID
    ///
    /// # Errors
    /// Returns an error if the profile cannot be retrieved
    pub fn get(&self, id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        query_data(
            self.conn,
            "SELECT data FROM profiles WHERE id = ?1",
            &id.to_string(),
        )
    }

    /// Get a profile by name
    ///
    /// # Errors
    /// Returns an error if the profile cannot be retrieved
    pub fn get_by_name(&self, name: &str) -> Result<Option<Profile>, DatabaseError> {
        query_data(self.conn, "SELECT data FROM profiles WHERE name = ?1", name)
    }

    /// List all profiles ordered by name
    ///
    /// # Errors
    /// Returns an error if the profiles cannot be listed
    pub fn list(&self) -> Result<Vec<ProfileSummary>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, name, description, created_at, updated_at,
                   COALESCE(json_array_length(data, '$.tool_refs'), 0),
                   COALESCE(json_array_length(data, '$.plugin_refs'), 0)
            FROM profiles
            ORDER BY name
            ",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
            ))
        })?;

        let mut profiles = Vec::new();
        for row in rows {
            let (id, name, description, created_at, updated_at, tool_count, plugin_count) = row?;
            profiles.push(ProfileSummary {
                id: parse_uuid(&id)?,
                name,
                description,
                tool_count: usize::try_from(tool_count).unwrap_or(0),
                plugin_count: usize::try_from(plugin_count).unwrap_or(0),
                created_at: parse_timestamp(&created_at)?,
                updated_at: parse_timestamp(&updated_at)?,
            });
        }

        Ok(profiles)
    }

    /// Every stored profile with its full data
    ///
    /// # Errors
    /// Returns an error if the profiles cannot be loaded
    pub fn list_full(&self) -> Result<Vec<Profile>, DatabaseError> {
        query_all_data(self.conn, "SELECT data FROM profiles ORDER BY name", [])
    }

    /// Update a profile
    ///
    /// # Errors
    /// Returns an error if the profile does not exist or cannot be written
    pub fn update(&self, profile: &Profile) -> Result<(), DatabaseError> {
        let json = serde_json::to_string(profile)?;

        let updated = self.conn.execute(
            r"
            UPDATE profiles
            SET name = ?1, description = ?2, data = ?3, updated_at = ?4
            WHERE id = ?5
            ",
            params![
                profile.name,
                profile.description,
                json,
                format_timestamp(&profile.updated_at),
                profile.id.to_string(),
            ],
        )?;

        if updated == 0 {
            return Err(DatabaseError::Corrupt(format!(
                "Profile not found: {}",
                profile.id
            )));
        }

        Ok(())
    }

    /// Delete a profile
    ///
    /// # Errors
    /// Returns an error if the profile cannot be deleted, for example while a
    /// project is still assigned to it
    pub fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1", params![id.to_string()])?;

        Ok(deleted > 0)
    }
}

/// Profile summary (without full data)
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    /// Unique identifier
    pub id: Uuid,
    /// Profile name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Number of tool references
    pub tool_count: usize,
    /// Number of plugin references
    pub plugin_count: usize,
    /// When created
    pub created_at: DateTime<Utc>,
    /// When last updated
    pub updated_at: DateTime<Utc>,
}
