//! `rigger project`

use super::find_project;
use anyhow::Result;
use clap::Subcommand;
use rigger_core::project::ToolOrigin;
use rigger_core::{Engine, ToolType};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List registered projects
    List,
    /// Register a project directory
    Add {
        /// Project directory
        path: PathBuf,
    },
    /// Show a project's profile and effective tools
    Show {
        /// Project directory
        path: PathBuf,
    },
    /// Copy tools into a project's local overrides
    AddLocal {
        /// Project directory
        path: PathBuf,
        /// Tool type (skill, command, agent, hook, mcp)
        #[arg(value_name = "TYPE")]
        tool_type: ToolType,
        /// File or directory holding the tool
        source: PathBuf,
    },
    /// Remove a local override
    RemoveLocal {
        /// Project directory
        path: PathBuf,
        #[arg(value_name = "TYPE")]
        tool_type: ToolType,
        /// Tool name
        name: String,
    },
}

pub async fn execute(engine: &Engine, action: ProjectCommands) -> Result<()> {
    match action {
        ProjectCommands::List => {
            let projects = engine.list_projects().await?;
            if projects.is_empty() {
                println!("No projects registered.");
            } else {
                println!("Projects:");
                for p in projects {
                    let profile = p
                        .assigned_profile_id
                        .map_or_else(|| "no profile".to_string(), |id| format!("profile {id}"));
                    println!("  {} - {} ({profile})", p.id, p.path.display());
                }
            }
        }
        ProjectCommands::Add { path } => {
            let project = engine.register_project(path).await?;
            println!("Registered project: {} ({})", project.name, project.id);
        }
        ProjectCommands::Show { path } => {
            let project = find_project(engine, &path).await?;
            let tools = engine.list_for_project(project.id).await?;

            println!("Project: {}", tools.project.name);
            println!("ID: {}", tools.project.id);
            println!("Path: {}", tools.project.path.display());
            match &tools.profile {
                Some(profile) => println!("Profile: {} ({})", profile.name, profile.id),
                None => println!("Profile: none"),
            }

            if tools.effective.is_empty() {
                println!("\nNo effective tools.");
            } else {
                println!("\nEffective tools:");
                for effective in &tools.effective {
                    let origin = match effective.origin {
                        ToolOrigin::Profile { .. } => "profile",
                        ToolOrigin::Local => "local",
                    };
                    println!(
                        "  {} {} [{origin}]",
                        effective.tool.tool_type, effective.tool.name
                    );
                }
            }
        }
        ProjectCommands::AddLocal {
            path,
            tool_type,
            source,
        } => {
            let project = engine.register_project(path).await?;
            let before = project.local_overrides.len();
            let project = engine
                .add_local_override(project.id, tool_type, source)
                .await?;
            println!(
                "Added {} local override(s) to {}.",
                project.local_overrides.len().saturating_sub(before),
                project.name
            );
        }
        ProjectCommands::RemoveLocal {
            path,
            tool_type,
            name,
        } => {
            let project = find_project(engine, &path).await?;
            engine
                .remove_local_override(project.id, tool_type, name.clone())
                .await?;
            println!("Removed local {tool_type} '{name}'.");
        }
    }

    Ok(())
}
