//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `init`: Write a default `unwire.yaml`
//! - `plan`: Show what removing dependencies would update and delete
//! - `uninstall`: Remove a module or theme and apply the plan to the corpus
//! - `dependents`: List everything depending on some dependencies
//! - `missing-content`: List content dependencies that do not resolve
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format
//! - `--config`: Path to `unwire.yaml`
//! - `--data`: Corpus file, overriding the configured one
//!
//! # Example
//!
//! ```bash
//! unwire init
//! unwire plan --kind module node
//! unwire dependents --kind config field.storage.node.body
//! unwire --json uninstall --kind theme olivero
//! ```

mod args;
mod execute;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use args::{validate_name, DependentsArgs, InitArgs, PlanArgs, UninstallArgs};
pub use types::{DependencyKindArg, ExtensionKindArg};

use crate::config::CONFIG_FILE_NAME;

/// Unwire - plan the fallout of removing configuration dependencies
///
/// Reads a configuration corpus from JSONL and works out which entities
/// repair themselves and which are deleted when a module, theme, config
/// entity or content record goes away.
#[derive(Parser, Debug)]
#[command(name = "unwire")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Corpus file, overriding `data-file` from the configuration
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a default configuration file
    Init(InitArgs),

    /// Show what a removal would do, without changing anything
    ///
    /// Lists dependents that would be updated, deleted (in deletion order),
    /// or left unchanged.
    Plan(PlanArgs),

    /// Uninstall a module or theme
    ///
    /// Saves repaired entities, deletes the rest, removes the extension's own
    /// configuration, and writes the corpus back.
    Uninstall(UninstallArgs),

    /// List entities depending on the given dependencies
    ///
    /// Output is in dependency order, dependencies before their dependents.
    Dependents(DependentsArgs),

    /// List content dependencies that do not resolve to a content record
    MissingContent,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    async fn load_app(&self) -> Result<crate::app::App> {
        Ok(crate::app::App::load(&self.config, self.data.as_deref()).await?)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        let Some(command) = &self.command else {
            println!("Unwire dependency removal planner");
            println!("Use --help for more information");
            return Ok(());
        };

        match command {
            Commands::Init(args) => execute::execute_init(&self.config, args, output_mode).await,
            Commands::Plan(args) => execute::execute_plan(&self.load_app().await?, args, output_mode),
            Commands::Uninstall(args) => {
                execute::execute_uninstall(&mut self.load_app().await?, args, output_mode).await
            }
            Commands::Dependents(args) => {
                execute::execute_dependents(&self.load_app().await?, args, output_mode)
            }
            Commands::MissingContent => {
                execute::execute_missing_content(&self.load_app().await?, output_mode)
            }
        }
    }
}
