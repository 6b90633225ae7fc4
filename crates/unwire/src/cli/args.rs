//! CLI argument structs for all commands.

use clap::Parser;

use super::types::{DependencyKindArg, ExtensionKindArg};

/// Validate a dependency name given on the command line.
pub fn validate_name(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty".to_string());
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(format!("Name '{trimmed}' cannot contain whitespace"));
    }
    Ok(trimmed.to_string())
}

/// Arguments for the `plan` command
#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    /// Kind of dependency being removed
    #[arg(short, long, value_enum, default_value = "module")]
    pub kind: DependencyKindArg,

    /// Names being removed (extension names, config names, or content references)
    #[arg(required = true, value_parser = validate_name)]
    pub names: Vec<String>,
}

/// Arguments for the `uninstall` command
#[derive(Parser, Debug, Clone)]
pub struct UninstallArgs {
    /// Kind of extension being uninstalled
    #[arg(short, long, value_enum, default_value = "module")]
    pub kind: ExtensionKindArg,

    /// Extension name
    #[arg(value_parser = validate_name)]
    pub name: String,
}

/// Arguments for the `dependents` command
#[derive(Parser, Debug, Clone)]
pub struct DependentsArgs {
    /// Kind of dependency to look up
    #[arg(short, long, value_enum, default_value = "module")]
    pub kind: DependencyKindArg,

    /// Dependency names
    #[arg(required = true, value_parser = validate_name)]
    pub names: Vec<String>,
}

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}
