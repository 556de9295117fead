//! MCP configuration parser

use crate::error::ScanResult;
use crate::settings::{McpServer, McpTransport};
use crate::types::{sha256_hex, Scope};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMcpServer {
    #[serde(rename = "type")]
    transport_type: Option<String>,
    command: Option<String>,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    url: Option<String>,
}

fn looks_like_server(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key("command") || o.contains_key("url"))
}

/// Convert a name -> entry map into servers, skipping entries that are not objects
fn convert_servers(path: &Path, servers: &Map<String, Value>, scope: &Scope) -> Vec<McpServer> {
    servers
        .iter()
        .filter(|(_, raw)| raw.is_object())
        .map(|(name, raw)| {
            let server: RawMcpServer = serde_json::from_value(raw.clone()).unwrap_or_default();
            let transport = match server.transport_type.as_deref() {
                Some("http") => McpTransport::Http,
                Some("sse") => McpTransport::Sse,
                _ => McpTransport::Stdio,
            };
            let sha256 = sha256_hex(raw.to_string().as_bytes());

            McpServer {
                name: name.clone(),
                transport,
                command: server.command,
                args: server.args,
                env: server.env,
                url: server.url,
                raw: raw.clone(),
                path: path.to_path_buf(),
                scope: scope.clone(),
                sha256,
            }
        })
        .collect()
}

/// Parse an MCP configuration file
///
/// Supports two formats:
/// 1. Claude Code format: `{"mcpServers": {"name": {...}}}`
/// 2. Plugin format: `{"name": {...}}`, where every entry with a `command`
///    or `url` is a server
///
/// # Errors
/// Returns an error if the file is not valid JSON
pub fn parse_mcp_config(path: &Path, content: &str, scope: Scope) -> ScanResult<Vec<McpServer>> {
    let value: Value = serde_json::from_str(content)?;

    if let Some(wrapped) = value.get("mcpServers").and_then(Value::as_object) {
        return Ok(convert_servers(path, wrapped, &scope));
    }

    let flat: Map<String, Value> = value
        .as_object()
        .map(|o| {
            o.iter()
                .filter(|(_, v)| looks_like_server(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();
    Ok(convert_servers(path, &flat, &scope))
}

/// Parse `~/.claude.json`.
///
/// Returns the user-scoped servers (top-level `mcpServers`) and, when a
/// project is given, the servers stored for it under
/// `projects.<absolute path>.mcpServers`, which are local scope.
///
/// # Errors
/// Returns an error if the file is not valid JSON
pub fn parse_user_mcp(
    path: &Path,
    content: &str,
    project: Option<&Path>,
) -> ScanResult<(Vec<McpServer>, Vec<McpServer>)> {
    let value: Value = serde_json::from_str(content)?;

    let user = value
        .get("mcpServers")
        .and_then(Value::as_object)
        .map(|servers| convert_servers(path, servers, &Scope::User))
        .unwrap_or_default();

    let local = project
        .and_then(|p| {
            value
                .get("projects")?
                .get(p.to_string_lossy().as_ref())?
                .get("mcpServers")?
                .as_object()
                .map(|servers| convert_servers(path, servers, &Scope::Local))
        })
        .unwrap_or_default();

    Ok((user, local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_mcp_config_claude_code_format() {
        let content = r#"{
            "mcpServers": {
                "test-server": {
                    "type": "stdio",
                    "command": "/usr/bin/test",
                    "args": ["--flag"],
                    "env": { "KEY": "value" }
                }
            }
        }"#;

        let servers =
            parse_mcp_config(&PathBuf::from(".mcp.json"), content, Scope::Project).unwrap();
        assert_eq!(servers.len(), 1);
        let server = &servers[0];
        assert_eq!(server.name, "test-server");
        assert_eq!(server.transport, McpTransport::Stdio);
        assert_eq!(server.command.as_deref(), Some("/usr/bin/test"));
        assert_eq!(server.args, vec!["--flag"]);
        assert_eq!(server.env.get("KEY").map(String::as_str), Some("value"));
        assert_eq!(server.scope, Scope::Project);
    }

    #[test]
    fn test_parse_mcp_config_plugin_format() {
        let content = r#"{
            "docs": { "type": "http", "url": "https://example.com/mcp" },
            "description": "not a server"
        }"#;
        let servers = parse_mcp_config(
            &PathBuf::from(".mcp.json"),
            content,
            Scope::Plugin("docs@tools".into()),
        )
        .unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].transport, McpTransport::Http);
    }

    #[test]
    fn test_parse_user_mcp_splits_local_servers() {
        let content = r#"{
            "numStartups": 12,
            "mcpServers": { "global": { "command": "g" } },
            "projects": {
                "/work/app": { "mcpServers": { "app-db": { "command": "db" } } }
            }
        }"#;
        let (user, local) = parse_user_mcp(
            &PathBuf::from(".claude.json"),
            content,
            Some(Path::new("/work/app")),
        )
        .unwrap();
        assert_eq!(user.len(), 1);
        assert_eq!(user[0].scope, Scope::User);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].name, "app-db");
        assert_eq!(local[0].scope, Scope::Local);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_mcp_config(&PathBuf::from(".mcp.json"), "{", Scope::Project).is_err());
    }
}
