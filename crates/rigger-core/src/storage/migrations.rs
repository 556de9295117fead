//! Database migrations

use rusqlite::Connection;

use super::db::DatabaseError;

pub(crate) const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
///
/// # Errors
/// Returns an error if migrations fail
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > CURRENT_VERSION {
        return Err(DatabaseError::Migration(format!(
            "database schema version {version} is newer than supported version {CURRENT_VERSION}"
        )));
    }

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS profiles (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        -- A profile cannot be deleted while a project still points at it
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            path TEXT NOT NULL UNIQUE,
            assigned_profile_id TEXT REFERENCES profiles(id),
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS backups (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            profile_id TEXT REFERENCES profiles(id) ON DELETE SET NULL,
            description TEXT,
            backup_dir TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_projects_path ON projects(path);
        CREATE INDEX IF NOT EXISTS idx_projects_profile ON projects(assigned_profile_id);
        CREATE INDEX IF NOT EXISTS idx_profiles_name ON profiles(name);
        CREATE INDEX IF NOT EXISTS idx_backups_project ON backups(project_id, created_at);
        ",
    )?;

    Ok(())
}

/// Rolled-back applies stop counting as the project's managed state
fn migrate_v2(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch("ALTER TABLE backups ADD COLUMN rolled_back_at TEXT;")?;
    Ok(())
}
