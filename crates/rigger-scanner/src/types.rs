//! Shared types for the Rigger scanner

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Scope where an artifact was found
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "plugin_id")]
pub enum Scope {
    /// User-level (~/.claude/)
    User,
    /// Project-level (.claude/)
    Project,
    /// Local project overrides (.claude/settings.local.json)
    Local,
    /// IT-managed (/Library/Application Support/ClaudeCode/)
    Managed,
    /// From a plugin, identified as `name@marketplace`
    Plugin(String),
}

impl Scope {
    /// Precedence rank: Managed > Local > Project > User > Plugin
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Managed => 4,
            Self::Local => 3,
            Self::Project => 2,
            Self::User => 1,
            Self::Plugin(_) => 0,
        }
    }

    /// Plugin identifier for plugin scopes
    #[must_use]
    pub fn plugin_id(&self) -> Option<&str> {
        match self {
            Self::Plugin(id) => Some(id),
            _ => None,
        }
    }

    /// Whether this scope outranks `other`
    #[must_use]
    pub fn outranks(&self, other: &Scope) -> bool {
        self.precedence() > other.precedence()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Project => f.write_str("project"),
            Self::Local => f.write_str("local"),
            Self::Managed => f.write_str("managed"),
            Self::Plugin(id) => write!(f, "plugin:{id}"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        if let Some(id) = lower.strip_prefix("plugin:") {
            return Ok(Scope::Plugin(id.to_string()));
        }
        match lower.as_str() {
            "user" => Ok(Scope::User),
            "project" => Ok(Scope::Project),
            "local" => Ok(Scope::Local),
            "managed" => Ok(Scope::Managed),
            _ => Err(format!("Invalid scope: {s}")),
        }
    }
}

/// Kind of configuration entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Skill,
    Command,
    Agent,
    Hook,
    Mcp,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Skill => "skill",
            Self::Command => "command",
            Self::Agent => "agent",
            Self::Hook => "hook",
            Self::Mcp => "mcp",
        };
        f.write_str(label)
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skill" | "skills" => Ok(Self::Skill),
            "command" | "commands" => Ok(Self::Command),
            "agent" | "agents" => Ok(Self::Agent),
            "hook" | "hooks" => Ok(Self::Hook),
            "mcp" | "mcp-server" | "mcp_server" => Ok(Self::Mcp),
            _ => Err(format!("Invalid entity kind: {s}")),
        }
    }
}

/// Information about a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path to the file
    pub path: PathBuf,
    /// SHA256 hash of the file contents
    pub sha256: String,
}

/// Host system information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostInfo {
    /// Operating system
    pub os: String,
    /// Current username
    pub username: String,
    /// Home directory path
    pub home_dir: PathBuf,
}

impl HostInfo {
    /// Create `HostInfo` for the scanned home directory
    #[must_use]
    pub fn for_home(home_dir: PathBuf) -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            username: whoami_username(),
            home_dir,
        }
    }
}

fn whoami_username() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Hex encoded SHA-256 of a byte slice
#[must_use]
pub fn sha256_hex(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
