//! Markdown output formatter

use crate::collision::Collision;
use crate::inventory::{Inventory, ScopeArtifacts};
use std::fmt::Write;

/// Convert an inventory to a Markdown report
#[must_use]
pub fn to_markdown(inventory: &Inventory) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_report(&mut out, inventory);
    out
}

fn write_report(out: &mut String, inventory: &Inventory) -> std::fmt::Result {
    writeln!(out, "# Rigger Inventory Report\n")?;
    writeln!(
        out,
        "**Scanned at:** {}\n",
        inventory.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    writeln!(out, "## Host\n")?;
    writeln!(out, "- **OS:** {}", inventory.host.os)?;
    writeln!(out, "- **User:** {}", inventory.host.username)?;
    writeln!(out, "- **Home:** {}\n", inventory.host.home_dir.display())?;

    writeln!(out, "## User Scope\n")?;
    write_counts(out, &inventory.user_scope.artifacts)?;

    if let Some(managed) = &inventory.managed_scope {
        writeln!(out, "## Managed Scope\n")?;
        writeln!(out, "- **Directory:** {}", managed.dir.display())?;
        write_counts(out, &managed.artifacts)?;
    }

    writeln!(out, "## Project\n")?;
    match &inventory.project {
        Some(project) => {
            writeln!(out, "### {}\n", project.name)?;
            writeln!(out, "- **Path:** {}", project.path.display())?;
            write_counts(out, &project.artifacts)?;
            if !project.local.is_empty() {
                writeln!(out, "#### Local overrides\n")?;
                write_counts(out, &project.local)?;
            }
        }
        None => writeln!(out, "_No project scanned_\n")?,
    }

    writeln!(out, "## Plugins\n")?;
    if inventory.plugins.installed.is_empty() {
        writeln!(out, "_No plugins installed_\n")?;
    } else {
        for plugin in &inventory.plugins.installed {
            let state = if plugin.enabled { "enabled" } else { "disabled" };
            writeln!(out, "- **{}** {} ({state}, {})", plugin.key(), plugin.version, plugin.scope)?;
        }
        out.push('\n');
    }

    writeln!(out, "## Effective\n")?;
    write_counts(out, &inventory.effective)?;

    writeln!(out, "## Collisions\n")?;
    if inventory.collisions.has_collisions() {
        writeln!(
            out,
            "**Total:** {} collisions detected\n",
            inventory.collisions.total_count()
        )?;
        write_collisions(out, "Skill", &inventory.collisions.skills)?;
        write_collisions(out, "Command", &inventory.collisions.commands)?;
        write_collisions(out, "Agent", &inventory.collisions.agents)?;
        write_collisions(out, "MCP Server", &inventory.collisions.mcp_servers)?;
    } else {
        writeln!(out, "_No collisions detected_\n")?;
    }

    if !inventory.warnings.is_empty() {
        writeln!(out, "## Warnings\n")?;
        for warning in &inventory.warnings {
            writeln!(
                out,
                "- `{}` ({}): {}",
                warning.path.display(),
                warning.kind,
                warning.message
            )?;
        }
        out.push('\n');
    }
    Ok(())
}

fn write_counts(out: &mut String, artifacts: &ScopeArtifacts) -> std::fmt::Result {
    writeln!(out, "- **Skills:** {}", artifacts.skills.len())?;
    writeln!(out, "- **Commands:** {}", artifacts.commands.len())?;
    writeln!(out, "- **Agents:** {}", artifacts.agents.len())?;
    writeln!(out, "- **Hooks:** {}", artifacts.hooks.len())?;
    writeln!(out, "- **MCP servers:** {}\n", artifacts.mcp_servers.len())
}

fn write_collisions(out: &mut String, label: &str, collisions: &[Collision]) -> std::fmt::Result {
    if collisions.is_empty() {
        return Ok(());
    }
    writeln!(out, "### {label} Collisions\n")?;
    for collision in collisions {
        let scopes: Vec<String> = collision.occurrences.iter().map(|o| o.scope.to_string()).collect();
        writeln!(
            out,
            "- **{}** (winner: {}; found in {})",
            collision.name,
            collision.winner_scope,
            scopes.join(", ")
        )?;
    }
    out.push('\n');
    Ok(())
}
