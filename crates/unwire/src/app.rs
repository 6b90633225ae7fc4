//! Application context for CLI command execution.
//!
//! Loads configuration and the JSONL corpus, and wraps them in a
//! [`ConfigManager`] that commands run against.

use crate::config::UnwireConfig;
use crate::error::Result;
use crate::manager::ConfigManager;
use crate::storage::jsonl::{load_from_jsonl, save_to_jsonl, LoadWarning};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
#[derive(Debug)]
pub struct App {
    manager: ConfigManager,
    data_path: PathBuf,
}

impl App {
    /// Load configuration from `config_path` (defaults if absent) and the
    /// corpus from `data_override` or the configured data file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the corpus file
    /// cannot be read.
    pub async fn load(config_path: &Path, data_override: Option<&Path>) -> Result<Self> {
        let config = UnwireConfig::load_or_default(config_path).await?;
        let data_path = data_override.map_or_else(|| config.data_path(config_path), Path::to_path_buf);

        let (store, warnings) = load_from_jsonl(&data_path, config.registry()?).await?;
        for warning in &warnings {
            match warning {
                LoadWarning::MalformedJson { line_number, error } => {
                    tracing::warn!(line_number, %error, "Skipped malformed line");
                }
                LoadWarning::InvalidConfigData { name, line_number } => {
                    tracing::warn!(%name, line_number, "Skipped config with non-object data");
                }
                LoadWarning::DuplicateConfig { name, line_number } => {
                    tracing::warn!(%name, line_number, "Duplicate config name, later record wins");
                }
            }
        }

        Ok(Self {
            manager: ConfigManager::new(store, config.marker()),
            data_path,
        })
    }

    /// The configuration manager.
    #[must_use]
    pub fn manager(&self) -> &ConfigManager {
        &self.manager
    }

    /// The configuration manager, mutably.
    pub fn manager_mut(&mut self) -> &mut ConfigManager {
        &mut self.manager
    }

    /// Path of the loaded corpus.
    #[must_use]
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Write the store back to the corpus file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self) -> Result<()> {
        save_to_jsonl(self.manager.store(), &self.data_path).await
    }
}
