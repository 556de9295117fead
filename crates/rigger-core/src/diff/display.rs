//! Diff display formatting for user review

use crate::diff::{DiffPlan, FileOperation, Warning, WarningSeverity};
use serde::Serialize;
use std::fmt::{self, Write};

/// Format a diff plan for terminal display
pub fn format_plan_terminal(plan: &DiffPlan) -> String {
    let mut output = String::new();
    // Writing into a String cannot fail
    let _ = write_terminal(&mut output, plan);
    output
}

/// Format a diff plan as markdown for documentation/export
pub fn format_plan_markdown(plan: &DiffPlan) -> String {
    let mut output = String::new();
    let _ = write_markdown(&mut output, plan);
    output
}

fn write_terminal(out: &mut String, plan: &DiffPlan) -> fmt::Result {
    writeln!(out, "=== Diff Plan: {} ===", plan.project_path.display())?;
    writeln!(out, "{}", DiffSummary::from_plan(plan).one_line())?;
    writeln!(out)?;

    if !plan.warnings.is_empty() {
        writeln!(out, "Warnings:")?;
        for warning in &plan.warnings {
            let prefix = match warning.severity {
                WarningSeverity::Info => "[INFO]",
                WarningSeverity::Warning => "[WARN]",
            };
            writeln!(out, "  {prefix} {}", describe(warning))?;
        }
        writeln!(out)?;
    }

    if plan.is_empty() {
        writeln!(out, "Project already matches the profile.")?;
        return Ok(());
    }

    for op in &plan.operations {
        match op {
            FileOperation::Create { path, content } => {
                writeln!(out, "CREATE: {}", path.display())?;
                writeln!(out, "  Size: {} bytes", content.len())?;
            }
            FileOperation::Modify { path, diff, .. } => {
                writeln!(out, "MODIFY: {}", path.display())?;
                for line in diff.lines() {
                    writeln!(out, "  {line}")?;
                }
            }
            FileOperation::Delete { path } => {
                writeln!(out, "DELETE: {}", path.display())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_markdown(out: &mut String, plan: &DiffPlan) -> fmt::Result {
    writeln!(out, "# Diff Plan")?;
    writeln!(out)?;
    writeln!(out, "**Project:** `{}`", plan.project_path.display())?;
    writeln!(out, "**Summary:** {}", DiffSummary::from_plan(plan).one_line())?;
    writeln!(out)?;

    if !plan.warnings.is_empty() {
        writeln!(out, "## Warnings")?;
        writeln!(out)?;
        for warning in &plan.warnings {
            let label = match warning.severity {
                WarningSeverity::Info => "ℹ️",
                WarningSeverity::Warning => "⚠️",
            };
            writeln!(out, "- {label} {}", describe(warning))?;
        }
        writeln!(out)?;
    }

    writeln!(out, "## Changes")?;
    writeln!(out)?;
    if plan.is_empty() {
        writeln!(out, "_No changes._")?;
        return Ok(());
    }

    for op in &plan.operations {
        match op {
            FileOperation::Create { path, content } => {
                writeln!(out, "### ➕ Create `{}`", path.display())?;
                writeln!(out)?;
                writeln!(out, "New file ({} bytes)", content.len())?;
            }
            FileOperation::Modify { path, diff, .. } => {
                writeln!(out, "### ✏️ Modify `{}`", path.display())?;
                writeln!(out)?;
                writeln!(out, "```diff")?;
                write!(out, "{diff}")?;
                if !diff.ends_with('\n') {
                    writeln!(out)?;
                }
                writeln!(out, "```")?;
            }
            FileOperation::Delete { path } => {
                writeln!(out, "### ➖ Delete `{}`", path.display())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn describe(warning: &Warning) -> String {
    match &warning.path {
        Some(path) if !warning.message.contains(&*path.to_string_lossy()) => {
            format!("{}: {}", path.display(), warning.message)
        }
        _ => warning.message.clone(),
    }
}

/// Summary statistics for a diff plan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Files to create
    pub creates: usize,
    /// Files to modify
    pub modifies: usize,
    /// Files to delete
    pub deletes: usize,
    /// Total bytes to be written
    pub total_bytes: usize,
}

impl DiffSummary {
    /// Generate summary from a diff plan
    pub fn from_plan(plan: &DiffPlan) -> Self {
        let mut summary = Self::default();

        for op in &plan.operations {
            match op {
                FileOperation::Create { content, .. } => {
                    summary.creates += 1;
                    summary.total_bytes += content.len();
                }
                FileOperation::Modify { new_content, .. } => {
                    summary.modifies += 1;
                    summary.total_bytes += new_content.len();
                }
                FileOperation::Delete { .. } => summary.deletes += 1,
            }
        }

        summary
    }

    /// Format as a one-line summary
    pub fn one_line(&self) -> String {
        format!(
            "{} create(s), {} modify(s), {} delete(s) - {} bytes total",
            self.creates, self.modifies, self.deletes, self.total_bytes
        )
    }
}
