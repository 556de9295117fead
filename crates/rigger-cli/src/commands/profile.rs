//! `rigger profile`

use super::{find_profile, find_project};
use anyhow::{bail, Result};
use clap::{Subcommand, ValueEnum};
use rigger_core::diff::{format_plan_markdown, format_plan_terminal, DiffSummary};
use rigger_core::{ApplyMode, Engine, PluginRef, ToolType};
use std::io::{self, Write};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// List all profiles
    List,
    /// Create a new profile, optionally from a project's tools
    Create {
        /// Profile name
        name: String,
        /// Project whose project-scope tools are captured
        #[arg(short, long)]
        source: Option<PathBuf>,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show profile details
    Show {
        /// Profile name or ID
        profile: String,
    },
    /// Add tools from a file or directory to a profile
    Import {
        /// Profile name or ID
        profile: String,
        /// Tool type (skill, command, agent, hook, mcp)
        #[arg(value_name = "TYPE")]
        tool_type: ToolType,
        /// File or directory holding the tool
        source: PathBuf,
    },
    /// Remove a tool from a profile
    RemoveTool {
        /// Profile name or ID
        profile: String,
        #[arg(value_name = "TYPE")]
        tool_type: ToolType,
        /// Tool name
        name: String,
    },
    /// Replace the plugins a profile enables
    Plugins {
        /// Profile name or ID
        profile: String,
        /// `name[@marketplace][:disabled]`; none clears the list
        #[arg(value_name = "PLUGIN")]
        plugins: Vec<PluginRef>,
    },
    /// Delete a profile; assigned projects keep its tools as local overrides
    Delete {
        /// Profile name or ID
        profile: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Assign a profile to a project
    Assign {
        /// Profile name or ID
        profile: String,
        /// Project directory
        project: PathBuf,
    },
    /// Clear a project's profile assignment
    Unassign {
        /// Project directory
        project: PathBuf,
    },
    /// Show what applying a profile would change
    Preview {
        /// Profile name or ID
        profile: String,
        /// Target project path
        target: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: PlanFormat,
    },
    /// Apply a profile to a project
    Apply {
        /// Profile name or ID
        profile: String,
        /// Target project path
        target: PathBuf,
        /// Preview changes without applying
        #[arg(long)]
        dry_run: bool,
        /// Undo everything if any file operation fails
        #[arg(long)]
        all_or_nothing: bool,
    },
    /// List backups of a project
    Backups {
        /// Project directory
        project: PathBuf,
    },
    /// Undo the apply that created a backup
    Rollback {
        /// Backup ID to restore
        backup_id: Uuid,
        /// Target project path
        target: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanFormat {
    Terminal,
    Markdown,
    Json,
}

pub async fn execute(engine: &Engine, action: ProfileCommands) -> Result<()> {
    match action {
        ProfileCommands::List => {
            let profiles = engine.list_profiles().await?;
            if profiles.is_empty() {
                println!("No profiles found.");
            } else {
                println!("Profiles:");
                for p in profiles {
                    let desc = p.description.as_deref().unwrap_or("No description");
                    println!(
                        "  {} - {} ({}) [{} tools, {} plugins]",
                        p.id, p.name, desc, p.tool_count, p.plugin_count
                    );
                }
            }
        }
        ProfileCommands::Create {
            name,
            source,
            description,
        } => {
            if let Some(source) = &source {
                if !source.exists() {
                    bail!("Source path does not exist: {}", source.display());
                }
                println!("Creating profile '{name}' from: {}", source.display());
            }
            let profile = engine.create_profile(name, source, description).await?;
            println!("Created profile: {} ({} tools)", profile.id, profile.tool_refs.len());
        }
        ProfileCommands::Show { profile } => {
            let prof = find_profile(engine, &profile).await?;

            println!("Profile: {}", prof.name);
            println!("ID: {}", prof.id);
            if let Some(desc) = &prof.description {
                println!("Description: {desc}");
            }
            println!("Created: {}", prof.created_at);
            println!("Updated: {}", prof.updated_at);

            for tool_type in ToolType::ALL {
                let names: Vec<&str> = prof
                    .tool_refs
                    .iter()
                    .filter(|t| t.tool_type == tool_type)
                    .map(|t| t.name.as_str())
                    .collect();
                if !names.is_empty() {
                    println!("\n{tool_type}: {}", names.join(", "));
                }
            }
            if !prof.plugin_refs.is_empty() {
                println!("\nPlugins:");
                for plugin in &prof.plugin_refs {
                    let state = if plugin.enabled { "enabled" } else { "disabled" };
                    println!("  {} ({state})", plugin.key());
                }
            }
        }
        ProfileCommands::Import {
            profile,
            tool_type,
            source,
        } => {
            let prof = find_profile(engine, &profile).await?;
            let result = engine.import_tool(prof.id, tool_type, source).await?;
            println!(
                "Profile '{}' now has {} tools; {} assigned project(s) updated.",
                result.profile.name,
                result.profile.tool_refs.len(),
                result.affected_project_count
            );
        }
        ProfileCommands::RemoveTool {
            profile,
            tool_type,
            name,
        } => {
            let prof = find_profile(engine, &profile).await?;
            if prof.tool(tool_type, &name).is_none() {
                bail!("Profile '{}' has no {tool_type} named '{name}'", prof.name);
            }
            let tools = prof
                .tool_refs
                .iter()
                .filter(|t| !(t.tool_type == tool_type && t.name == name))
                .cloned()
                .collect();
            let result = engine.update_profile(prof.id, Some(tools), None).await?;
            println!(
                "Removed {tool_type} '{name}'; {} assigned project(s) updated.",
                result.affected_project_count
            );
        }
        ProfileCommands::Plugins { profile, plugins } => {
            let prof = find_profile(engine, &profile).await?;
            let count = plugins.len();
            let result = engine.update_profile(prof.id, None, Some(plugins)).await?;
            println!(
                "Profile '{}' now references {count} plugin(s); {} assigned project(s) updated.",
                result.profile.name, result.affected_project_count
            );
        }
        ProfileCommands::Delete { profile, force } => {
            let prof = find_profile(engine, &profile).await?;

            if !force {
                print!("Delete profile '{}' (ID: {})? [y/N] ", prof.name, prof.id);
                io::stdout().flush()?;
                let mut input = String::new();
                io::stdin().read_line(&mut input)?;
                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let result = engine.delete_profile(prof.id).await?;
            println!("Deleted profile: {}", prof.name);
            if result.converted_project_count > 0 {
                println!(
                    "{} project(s) kept its tools as local overrides.",
                    result.converted_project_count
                );
            }
        }
        ProfileCommands::Assign { profile, project } => {
            let prof = find_profile(engine, &profile).await?;
            let proj = engine.register_project(project).await?;
            let result = engine.assign_profile(proj.id, prof.id).await?;

            println!("Assigned '{}' to {}", prof.name, proj.path.display());
            if result.plugins_installed > 0 {
                println!("Installed {} plugin(s).", result.plugins_installed);
            }
            for error in &result.plugin_errors {
                eprintln!("Plugin {} failed to install: {}", error.plugin, error.message);
            }
            for tool in &result.override_collisions {
                println!(
                    "Local override {} '{}' takes precedence over the profile.",
                    tool.tool_type, tool.name
                );
            }
        }
        ProfileCommands::Unassign { project } => {
            let proj = find_project(engine, &project).await?;
            engine.unassign_profile(proj.id).await?;
            println!("Unassigned profile from {}", proj.path.display());
        }
        ProfileCommands::Preview {
            profile,
            target,
            format,
        } => {
            let prof = find_profile(engine, &profile).await?;
            let plan = engine.preview_apply(prof.id, target).await?;
            match format {
                PlanFormat::Terminal => {
                    println!("{}", format_plan_terminal(&plan));
                    println!("Summary: {}", DiffSummary::from_plan(&plan).one_line());
                }
                PlanFormat::Markdown => print!("{}", format_plan_markdown(&plan)),
                PlanFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            }
        }
        ProfileCommands::Apply {
            profile,
            target,
            dry_run,
            all_or_nothing,
        } => {
            let prof = find_profile(engine, &profile).await?;
            let plan = engine.preview_apply(prof.id, target.clone()).await?;

            if plan.is_empty() {
                println!("No changes needed - project already matches profile.");
                if dry_run {
                    return Ok(());
                }
            } else {
                println!("{}", format_plan_terminal(&plan));
                println!("Summary: {}", DiffSummary::from_plan(&plan).one_line());
            }

            if dry_run {
                println!("\nDry run - no changes made.");
                return Ok(());
            }

            let mode = if all_or_nothing {
                ApplyMode::AllOrNothing
            } else {
                ApplyMode::BestEffort
            };
            let outcome = engine.apply(prof.id, target, mode).await?;

            println!("\nApplied {} operations.", outcome.applied);
            println!("Backup created: {}", outcome.backup.id);
            if !outcome.is_complete() {
                eprintln!("\n{} operation(s) failed:", outcome.errors.len());
                for error in &outcome.errors {
                    eprintln!("  {error}");
                }
                bail!("apply finished with errors; roll back with the backup above if needed");
            }
        }
        ProfileCommands::Backups { project } => {
            let proj = find_project(engine, &project).await?;
            let backups = engine.list_backups(proj.id).await?;

            if backups.is_empty() {
                println!("No backups found.");
            } else {
                println!("Backups:");
                for b in backups {
                    let desc = b.description.as_deref().unwrap_or("No description");
                    let status = b
                        .rolled_back_at
                        .map(|at| format!(" [rolled back {}]", at.format("%Y-%m-%d %H:%M:%S")))
                        .unwrap_or_default();
                    println!(
                        "  {} - {} ({}, {} files){status}",
                        b.id,
                        b.created_at.format("%Y-%m-%d %H:%M:%S"),
                        desc,
                        b.files.len()
                    );
                }
            }
        }
        ProfileCommands::Rollback { backup_id, target } => {
            let changed = engine.rollback(backup_id, target).await?;
            println!("Rolled back {changed} files.");
        }
    }

    Ok(())
}
