//! Output formatting for CLI commands.
//!
//! Commands print either human-readable text or JSON for programmatic use.
//! Colors follow the `colored` crate's handling of `NO_COLOR`.

use crate::domain::{ConfigName, ContentReference};
use crate::manager::UninstallReport;
use crate::resolver::PlanSummary;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

/// Print any serializable value as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}

fn print_section<W: Write>(
    w: &mut W,
    title: &str,
    names: &[ConfigName],
    paint: fn(&str) -> colored::ColoredString,
) -> io::Result<()> {
    if names.is_empty() {
        return Ok(());
    }
    writeln!(w, "{} ({})", title.bold(), names.len())?;
    for name in names {
        writeln!(w, "  {}", paint(name.as_str()))?;
    }
    Ok(())
}

/// Print a removal plan.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_plan(summary: &PlanSummary) -> io::Result<()> {
    let mut w = io::stdout().lock();
    if summary.update.is_empty() && summary.delete.is_empty() && summary.unchanged.is_empty() {
        writeln!(w, "{}", "Nothing depends on the removed dependencies".dimmed())?;
        return Ok(());
    }
    print_section(&mut w, "Update", &summary.update, |s| s.yellow())?;
    print_section(&mut w, "Delete", &summary.delete, |s| s.red())?;
    print_section(&mut w, "Unchanged", &summary.unchanged, |s| s.dimmed())?;
    Ok(())
}

/// Print the result of an uninstall.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_uninstall(report: &UninstallReport) -> io::Result<()> {
    let mut w = io::stdout().lock();
    print_section(&mut w, "Updated", &report.updated, |s| s.yellow())?;
    print_section(&mut w, "Deleted", &report.deleted, |s| s.red())?;
    print_section(&mut w, "Removed configuration", &report.removed_config, |s| s.red())?;
    writeln!(
        w,
        "{} {} updated, {} deleted, {} removed",
        "✓".green(),
        report.updated.len(),
        report.deleted.len(),
        report.removed_config.len()
    )
}

/// Print names in dependency order.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_dependents(names: &[ConfigName]) -> io::Result<()> {
    let mut w = io::stdout().lock();
    if names.is_empty() {
        return writeln!(w, "{}", "No dependents".dimmed());
    }
    for name in names {
        writeln!(w, "{}", name.as_str().cyan())?;
    }
    Ok(())
}

/// Print unresolved content references.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn print_missing_content(missing: &BTreeMap<String, ContentReference>) -> io::Result<()> {
    let mut w = io::stdout().lock();
    if missing.is_empty() {
        return writeln!(w, "{}", "All content dependencies resolve".dimmed());
    }
    for reference in missing.values() {
        writeln!(w, "{}", reference.to_string().red())?;
    }
    Ok(())
}
