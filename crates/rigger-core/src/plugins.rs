//! Installing profile plugins through the host CLI

use crate::profile::PluginRef;
use rigger_scanner::Scope;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Installs plugins into a project
///
/// Failures are reported as messages; the caller collects them.
pub trait PluginInstaller: Send + Sync {
    fn install(&self, project: &Path, plugin: &PluginRef) -> Result<(), String>;
}

/// Installer driving `claude plugin install`
#[derive(Debug, Default, Clone)]
pub struct ClaudeCliInstaller {
    binary: Option<PathBuf>,
}

impl ClaudeCliInstaller {
    /// Use the `claude` found on `PATH` at install time
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific binary
    #[must_use]
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: Some(binary.into()),
        }
    }

    fn binary(&self) -> Result<PathBuf, String> {
        match &self.binary {
            Some(binary) => Ok(binary.clone()),
            None => which::which("claude").map_err(|e| format!("Claude CLI not found: {e}")),
        }
    }
}

impl PluginInstaller for ClaudeCliInstaller {
    fn install(&self, project: &Path, plugin: &PluginRef) -> Result<(), String> {
        let binary = self.binary()?;
        let scope = format!("--scope={}", install_scope(&plugin.scope));
        let key = plugin.key();

        let output = Command::new(&binary)
            .args(["plugin", "install", &scope, &key])
            .current_dir(project)
            .output()
            .map_err(|e| format!("Failed to run claude CLI: {e}"))?;

        if output.status.success() {
            tracing::info!(plugin = %key, project = %project.display(), "installed plugin");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = if !stderr.trim().is_empty() {
            stderr.trim().to_string()
        } else if !stdout.trim().is_empty() {
            stdout.trim().to_string()
        } else {
            "Unknown error".to_string()
        };

        if message.contains("already installed") {
            tracing::debug!(plugin = %key, "plugin already installed");
            Ok(())
        } else {
            Err(message)
        }
    }
}

fn install_scope(scope: &Scope) -> &'static str {
    match scope {
        Scope::User => "user",
        Scope::Local => "local",
        _ => "project",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_scope() {
        assert_eq!(install_scope(&Scope::User), "user");
        assert_eq!(install_scope(&Scope::Local), "local");
        assert_eq!(install_scope(&Scope::Project), "project");
    }

    #[test]
    fn test_missing_binary_is_an_error() {
        let installer = ClaudeCliInstaller::with_binary("/nonexistent/claude-binary");
        let plugin: PluginRef = "fmt@tools".parse().unwrap();
        let err = installer.install(Path::new("."), &plugin).unwrap_err();
        assert!(err.contains("Failed to run claude CLI"));
    }
}
