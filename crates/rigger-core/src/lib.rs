//! Rigger Core - profile engine, storage, and rollback
//!
//! This crate turns scanned configuration into reusable profiles, computes
//! the file changes needed to bring a project in line with a profile, applies
//! them with a backup, and rolls them back on request. [`Engine`] is the
//! async entry point used by front ends.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value
)]

pub mod apply;
pub mod backup;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod locks;
pub mod merge;
pub mod plugins;
pub mod profile;
pub mod project;
pub mod storage;
pub mod util;

pub use rigger_scanner;

pub use apply::{ApplyMode, ApplyOutcome};
pub use backup::BackupRecord;
pub use config::EngineConfig;
pub use diff::{DiffPlan, FileOperation, Warning, WarningKind};
pub use engine::{AssignmentResult, Engine, PluginError, ProjectTools};
pub use error::{EngineError, EngineResult};
pub use profile::{PluginRef, Profile, ToolPermissions, ToolRef, ToolType};
pub use project::Project;
