//! Command execution logic.

use anyhow::Result;
use std::path::Path;

use super::args::{DependentsArgs, InitArgs, PlanArgs, UninstallArgs};
use crate::app::App;
use crate::config::UnwireConfig;
use crate::domain::DependencyKind;
use crate::output::{self, OutputMode};

/// Execute the init command
pub async fn execute_init(config_path: &Path, args: &InitArgs, output_mode: OutputMode) -> Result<()> {
    let config = UnwireConfig::init(config_path, args.force).await?;

    match output_mode {
        OutputMode::Json => output::print_json(&config)?,
        OutputMode::Text => {
            println!("Wrote {}", config_path.display());
            println!("  Data file: {}", config.data_path(config_path).display());
            println!("  Entity types: {}", config.entity_types.len());
        }
    }
    Ok(())
}

/// Execute the plan command (always a dry run)
pub fn execute_plan(app: &App, args: &PlanArgs, output_mode: OutputMode) -> Result<()> {
    let kind = DependencyKind::from(args.kind);
    let plan = app.manager().plan_removal(kind, &args.names, true)?;
    let summary = plan.summary();

    match output_mode {
        OutputMode::Json => output::print_json(&summary)?,
        OutputMode::Text => output::print_plan(&summary)?,
    }
    Ok(())
}

/// Execute the uninstall command and write the result back to the corpus
pub async fn execute_uninstall(
    app: &mut App,
    args: &UninstallArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let kind = DependencyKind::from(args.kind);
    let report = app.manager_mut().uninstall(kind, &args.name)?;
    app.save().await?;
    tracing::debug!(path = %app.data_path().display(), "Saved corpus");

    match output_mode {
        OutputMode::Json => output::print_json(&report)?,
        OutputMode::Text => output::print_uninstall(&report)?,
    }
    Ok(())
}

/// Execute the dependents command
pub fn execute_dependents(app: &App, args: &DependentsArgs, output_mode: OutputMode) -> Result<()> {
    let kind = DependencyKind::from(args.kind);
    let dependents = app.manager().find_dependents(kind, &args.names);

    match output_mode {
        OutputMode::Json => output::print_json(&dependents)?,
        OutputMode::Text => output::print_dependents(&dependents)?,
    }
    Ok(())
}

/// Execute the missing-content command
pub fn execute_missing_content(app: &App, output_mode: OutputMode) -> Result<()> {
    let missing = app.manager().find_missing_content_dependencies();

    match output_mode {
        OutputMode::Json => output::print_json(&missing)?,
        OutputMode::Text => output::print_missing_content(&missing)?,
    }
    Ok(())
}
