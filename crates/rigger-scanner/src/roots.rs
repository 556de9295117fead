//! Filesystem roots a scan reads from
//!
//! Every location is explicit so that scans are reproducible and tests can
//! point the scanner at a temporary home directory.

use crate::error::{ScanError, ScanResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the managed configuration directory
pub const MANAGED_DIR_ENV: &str = "RIGGER_MANAGED_DIR";

/// Directories consulted by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRoots {
    /// Home directory; user scope lives in `<home>/.claude` and `<home>/.claude.json`
    pub home: PathBuf,
    /// IT-managed configuration directory
    pub managed_dir: PathBuf,
}

impl ScanRoots {
    /// Roots for the current user.
    ///
    /// # Errors
    /// Returns `HomeNotFound` if the home directory cannot be determined
    pub fn from_env() -> ScanResult<Self> {
        let home = dirs::home_dir().ok_or(ScanError::HomeNotFound)?;
        let managed_dir = std::env::var_os(MANAGED_DIR_ENV)
            .map_or_else(default_managed_dir, PathBuf::from);
        Ok(Self { home, managed_dir })
    }

    /// Roots rooted at an arbitrary home directory, with the managed
    /// directory placed inside it.
    #[must_use]
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let managed_dir = home.join("managed");
        Self { home, managed_dir }
    }

    /// Override the managed directory
    #[must_use]
    pub fn with_managed_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.managed_dir = dir.into();
        self
    }

    /// `<home>/.claude`
    #[must_use]
    pub fn user_claude_dir(&self) -> PathBuf {
        self.home.join(".claude")
    }

    /// `<home>/.claude.json`, holding user and per-project local MCP servers
    #[must_use]
    pub fn user_mcp_path(&self) -> PathBuf {
        self.home.join(".claude.json")
    }

    /// `<home>/.claude/plugins`
    #[must_use]
    pub fn plugins_dir(&self) -> PathBuf {
        self.user_claude_dir().join("plugins")
    }
}

/// Platform default for IT-managed configuration
#[must_use]
pub fn default_managed_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/ClaudeCode")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\ProgramData\ClaudeCode")
    } else {
        PathBuf::from("/etc/claude")
    }
}
