//! Settings and MCP configuration types

use crate::artifacts::ScopedEntity;
use crate::types::{EntityKind, Scope};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Parsed settings.json content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsFile {
    /// Path to the settings file
    pub path: PathBuf,
    /// SHA256 hash of file content
    pub sha256: String,
    /// Number of hook rules defined
    pub hooks_count: usize,
    /// Permissions configuration
    pub permissions: Option<Permissions>,
    /// Enabled plugins map
    #[serde(default)]
    pub enabled_plugins: BTreeMap<String, bool>,
    /// Environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Model override
    pub model: Option<String>,
}

/// Permissions configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Allowed patterns
    #[serde(default)]
    pub allow: Vec<String>,
    /// Denied patterns
    #[serde(default)]
    pub deny: Vec<String>,
    /// Default permission mode
    pub default_mode: Option<String>,
}

/// MCP (Model Context Protocol) server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServer {
    /// Server name
    pub name: String,
    /// Transport type
    pub transport: McpTransport,
    /// Command to run (for stdio)
    pub command: Option<String>,
    /// Command arguments
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// URL (for http/sse)
    pub url: Option<String>,
    /// The server entry exactly as written
    pub raw: serde_json::Value,
    /// File the server was read from
    pub path: PathBuf,
    /// Scope where found
    pub scope: Scope,
    /// SHA256 of the serialized entry
    pub sha256: String,
}

/// MCP transport types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum McpTransport {
    Stdio,
    Http,
    Sse,
}

impl ScopedEntity for McpServer {
    const KIND: EntityKind = EntityKind::Mcp;

    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn sha256(&self) -> &str {
        &self.sha256
    }
}
