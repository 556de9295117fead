//! Rigger CLI - Command-line interface for Rigger
//!
//! Provides `rigger scan`, `rigger profile`, and `rigger project`.

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use rigger_core::{Engine, EngineConfig, EngineError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::profile::ProfileCommands;
use commands::project::ProjectCommands;
use commands::scan::ScanFormat;

#[derive(Parser)]
#[command(name = "rigger")]
#[command(about = "Rigger - Claude Code profile manager")]
#[command(version)]
struct Cli {
    /// Directory holding the database, profile content, and backups
    /// [default: $RIGGER_DATA_DIR or ~/.rigger]
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Leave the managed scope out of scans
    #[arg(long, global = true)]
    no_managed: bool,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan Claude Code configuration
    Scan {
        /// Project directories to scan (user scope only when omitted)
        #[arg(value_name = "PROJECT")]
        projects: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        format: ScanFormat,

        /// Write the report to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },
    /// Manage registered projects
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<EngineError>() {
            Some(engine) => eprintln!("Error [{}]: {e:#}", engine.code()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr so that reports on stdout stay machine-readable
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("rigger={level},rigger_core={level},rigger_scanner={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn engine_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = EngineConfig::from_env()?.with_managed(!cli.no_managed);
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    let config = engine_config(&cli)?;

    match cli.command {
        Commands::Scan {
            projects,
            format,
            output,
        } => commands::scan::execute(&config, &projects, format, output.as_deref()),
        Commands::Profile { action } => {
            let engine = Engine::open(config)?;
            commands::profile::execute(&engine, action).await
        }
        Commands::Project { action } => {
            let engine = Engine::open(config)?;
            commands::project::execute(&engine, action).await
        }
    }
}
