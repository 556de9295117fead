//! Diff generation for profile application

pub mod display;
pub mod plan;
pub mod render;
mod types;

pub use display::{format_plan_markdown, format_plan_terminal, DiffSummary};
pub use plan::{generate_plan, PlanError, PlanInput};
pub use types::*;
