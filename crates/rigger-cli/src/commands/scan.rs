//! `rigger scan`

use anyhow::{bail, Result};
use clap::ValueEnum;
use rigger_core::EngineConfig;
use rigger_scanner::inventory::ScopeArtifacts;
use rigger_scanner::output::{to_json, to_markdown};
use rigger_scanner::{Inventory, Scanner};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanFormat {
    /// Short per-scope counts
    Summary,
    Json,
    Markdown,
}

pub fn execute(
    config: &EngineConfig,
    projects: &[PathBuf],
    format: ScanFormat,
    output: Option<&Path>,
) -> Result<()> {
    let scanner = Scanner::new(config.roots.clone()).with_managed(config.include_managed);

    let inventories = if projects.is_empty() {
        vec![scanner.scan_user_scope()]
    } else {
        let refs: Vec<&Path> = projects.iter().map(PathBuf::as_path).collect();
        let mut inventories = Vec::with_capacity(refs.len());
        let mut failed = 0;
        for (path, result) in refs.iter().zip(scanner.scan_many(&refs)) {
            match result {
                Ok(inventory) => inventories.push(inventory),
                Err(e) => {
                    eprintln!("Failed to scan {}: {e}", path.display());
                    failed += 1;
                }
            }
        }
        if inventories.is_empty() {
            bail!("no project could be scanned");
        }
        if failed > 0 {
            tracing::warn!(failed, "some projects were skipped");
        }
        inventories
    };

    let report = match format {
        ScanFormat::Json => to_json(&inventories)?,
        ScanFormat::Markdown => inventories
            .iter()
            .map(to_markdown)
            .collect::<Vec<_>>()
            .join("\n---\n\n"),
        ScanFormat::Summary => summary(&inventories),
    };

    match output {
        Some(path) => {
            std::fs::write(path, report)?;
            println!("Wrote report to: {}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

fn summary(inventories: &[Inventory]) -> String {
    let mut out = String::new();
    for inventory in inventories {
        // Writing to a String cannot fail
        let _ = write_summary(&mut out, inventory);
    }
    out
}

fn write_summary(out: &mut String, inventory: &Inventory) -> std::fmt::Result {
    match &inventory.project {
        Some(project) => writeln!(out, "Project: {}", project.path.display())?,
        None => writeln!(out, "User scope: {}", inventory.host.home_dir.display())?,
    }

    write_counts(out, "User", &inventory.user_scope.artifacts)?;
    if let Some(managed) = &inventory.managed_scope {
        write_counts(out, "Managed", &managed.artifacts)?;
    }
    if let Some(project) = &inventory.project {
        write_counts(out, "Project", &project.artifacts)?;
        write_counts(out, "Local", &project.local)?;
    }
    writeln!(out, "  Plugins: {}", inventory.plugins.installed.len())?;
    write_counts(out, "Effective", &inventory.effective)?;

    if inventory.collisions.has_collisions() {
        writeln!(out, "  Collisions detected: {}", inventory.collisions.total_count())?;
    }
    for warning in &inventory.warnings {
        writeln!(out, "  Skipped {}: {}", warning.path.display(), warning.message)?;
    }
    writeln!(out)
}

fn write_counts(out: &mut String, label: &str, artifacts: &ScopeArtifacts) -> std::fmt::Result {
    writeln!(
        out,
        "  {label}: {} skills, {} commands, {} agents, {} hooks, {} MCP servers",
        artifacts.skills.len(),
        artifacts.commands.len(),
        artifacts.agents.len(),
        artifacts.hooks.len(),
        artifacts.mcp_servers.len()
    )
}
