//! Database connection management

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use super::migrations;

/// Database errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Database wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", "-10000")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;

        migrations::run_migrations(&conn)?;

        tracing::debug!(path = %path.display(), "database opened");
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing)
    ///
    /// # Errors
    /// Returns an error if the database cannot be created
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Get a reference to the connection
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Fetch the JSON `data` column of a single row and deserialize it
pub(crate) fn query_data<T: DeserializeOwned>(
    conn: &Connection,
    sql: &str,
    key: &str,
) -> Result<Option<T>, DatabaseError> {
    let json: Option<String> = conn
        .query_row(sql, params![key], |row| row.get(0))
        .optional()?;

    json.map(|json| serde_json::from_str(&json).map_err(DatabaseError::from))
        .transpose()
}

/// Fetch and deserialize every `data` column returned by `sql`
pub(crate) fn query_all_data<T: DeserializeOwned>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<T>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| row.get::<_, String>(0))?;

    let mut items = Vec::new();
    for row in rows {
        items.push(serde_json::from_str(&row?)?);
    }
    Ok(items)
}

/// Timestamps are stored with microsecond precision so `ORDER BY` on the
/// text column matches chronological order.
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::Corrupt(format!("Invalid datetime '{value}': {e}")))
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::Corrupt(format!("Invalid UUID '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_and_migrates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/rigger.db");

        let db = Database::open(&path).unwrap();
        let version: i32 = db
            .connection()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();

        assert!(path.exists());
        assert_eq!(version, migrations::CURRENT_VERSION);
    }

    #[test]
    fn test_reopen_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rigger.db");
        drop(Database::open(&path).unwrap());
        assert!(Database::open(&path).is_ok());
    }

    #[test]
    fn test_timestamp_ordering_is_lexical() {
        // Stored timestamps keep microseconds
        let earlier = Utc::now().trunc_subsecs(6);
        let later = earlier + chrono::Duration::microseconds(1);
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
        assert_eq!(parse_timestamp(&format_timestamp(&earlier)).unwrap(), earlier);
    }
}
