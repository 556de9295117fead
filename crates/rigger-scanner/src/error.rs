//! Error types for the Rigger scanner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for scanner operations
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors that can occur during scanning
#[derive(Error, Debug)]
pub enum ScanError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse frontmatter
    #[error("Failed to parse frontmatter: {0}")]
    FrontmatterParse(String),

    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// No frontmatter found in file
    #[error("No frontmatter found in file")]
    NoFrontmatter,

    /// Invalid path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Home directory not found
    #[error("Home directory not found")]
    HomeNotFound,
}

/// What kind of file a [`ScanWarning`] is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanWarningKind {
    Skill,
    Command,
    Agent,
    Settings,
    Mcp,
    Plugins,
}

impl fmt::Display for ScanWarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Skill => "skill",
            Self::Command => "command",
            Self::Agent => "agent",
            Self::Settings => "settings",
            Self::Mcp => "mcp",
            Self::Plugins => "plugins",
        };
        f.write_str(label)
    }
}

/// A file that was skipped during a scan.
///
/// Malformed entities never abort a scan; they are reported here instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWarning {
    /// File that could not be read or parsed
    pub path: PathBuf,
    /// Kind of file
    pub kind: ScanWarningKind,
    /// Human readable reason
    pub message: String,
}

impl ScanWarning {
    /// Record a skipped file and emit it on the log
    pub fn new(path: &Path, kind: ScanWarningKind, error: &dyn fmt::Display) -> Self {
        tracing::warn!(path = %path.display(), %kind, error = %error, "skipping unreadable file");
        Self {
            path: path.to_path_buf(),
            kind,
            message: error.to_string(),
        }
    }
}
