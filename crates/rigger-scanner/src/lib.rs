//! Rigger Scanner - Claude Code configuration discovery
//!
//! This crate provides read-only scanning of Claude Code configuration
//! across user, project, local, managed, and plugin scopes, and resolves
//! same-named artifacts into a single effective view.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::items_after_statements,
    clippy::single_match_else,
    clippy::match_same_arms,
    clippy::unnecessary_debug_formatting,
    clippy::option_if_let_else,
    clippy::needless_pass_by_value,
    clippy::map_unwrap_or,
    clippy::manual_let_else
)]

pub mod artifacts;
pub mod collision;
pub mod error;
pub mod inventory;
pub mod output;
pub mod parser;
pub mod plugins;
pub mod roots;
pub mod scan;
pub mod scope;
pub mod settings;
pub mod types;

pub use artifacts::{AgentInfo, CommandInfo, HookDefinition, HookInfo, ScopedEntity, SkillInfo};
pub use collision::{Collision, CollisionOccurrence, CollisionReport, EffectiveView};
pub use error::{ScanError, ScanResult, ScanWarning, ScanWarningKind};
pub use inventory::Inventory;
pub use roots::ScanRoots;
pub use scan::Scanner;
pub use settings::{McpServer, McpTransport};
pub use types::{EntityKind, Scope};
