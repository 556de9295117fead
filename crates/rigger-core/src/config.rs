//! Engine configuration
//!
//! Everything the engine touches outside a project lives under one data
//! directory:
//!
//! ```text
//! <data_dir>/rigger.db
//! <data_dir>/profiles/<profile-id>/   tool content of a profile
//! <data_dir>/projects/<project-id>/   tool content of local overrides
//! <data_dir>/backups/<backup-id>/     pre-apply copies and record.json
//! ```

use rigger_scanner::{ScanResult, ScanRoots};
use std::path::PathBuf;
use uuid::Uuid;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "RIGGER_DATA_DIR";

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Root of the engine's own state
    pub data_dir: PathBuf,
    /// Where scans read from
    pub roots: ScanRoots,
    /// Whether scans include the managed scope
    pub include_managed: bool,
}

impl EngineConfig {
    /// Configuration for the current user, honoring `RIGGER_DATA_DIR` and
    /// `RIGGER_MANAGED_DIR`
    ///
    /// # Errors
    /// Returns an error if the home directory cannot be determined
    pub fn from_env() -> ScanResult<Self> {
        let roots = ScanRoots::from_env()?;
        let data_dir = std::env::var_os(DATA_DIR_ENV)
            .map_or_else(|| roots.home.join(".rigger"), PathBuf::from);

        Ok(Self {
            data_dir,
            roots,
            include_managed: true,
        })
    }

    /// Configuration with explicit roots
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>, roots: ScanRoots) -> Self {
        Self {
            data_dir: data_dir.into(),
            roots,
            include_managed: true,
        }
    }

    #[must_use]
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    #[must_use]
    pub fn with_managed(mut self, include: bool) -> Self {
        self.include_managed = include;
        self
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("rigger.db")
    }

    #[must_use]
    pub fn profiles_dir(&self) -> PathBuf {
        self.data_dir.join("profiles")
    }

    #[must_use]
    pub fn projects_dir(&self) -> PathBuf {
        self.data_dir.join("projects")
    }

    #[must_use]
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    /// Tool content directory of a profile
    #[must_use]
    pub fn profile_store_dir(&self, profile_id: Uuid) -> PathBuf {
        self.profiles_dir().join(profile_id.to_string())
    }

    /// Tool content directory of a project's local overrides
    #[must_use]
    pub fn project_store_dir(&self, project_id: Uuid) -> PathBuf {
        self.projects_dir().join(project_id.to_string())
    }
}
