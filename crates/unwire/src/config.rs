//! Configuration management for unwire.
//!
//! Settings live in a YAML file (`unwire.yaml` by default):
//!
//! ```yaml
//! entity-marker: uuid
//! data-file: config.jsonl
//! entity-types:
//!   - id: view
//!     prefix: views.view
//! ```
//!
//! A missing file means defaults. Omitted keys take their default values.

use crate::error::{Error, Result};
use crate::storage::registry::EntityTypeRegistry;
use crate::storage::MarkerField;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "unwire.yaml";

/// Default corpus file name
pub const DEFAULT_DATA_FILE: &str = "config.jsonl";

/// Default field marking a configuration object as an entity
pub const DEFAULT_ENTITY_MARKER: &str = "uuid";

/// Entity types registered when the configuration names none.
const DEFAULT_ENTITY_TYPES: &[(&str, &str)] = &[
    ("block", "block.block"),
    ("entity_form_display", "core.entity_form_display"),
    ("entity_view_display", "core.entity_view_display"),
    ("field_config", "field.field"),
    ("field_storage_config", "field.storage"),
    ("filter_format", "filter.format"),
    ("image_style", "image.style"),
    ("menu", "system.menu"),
    ("node_type", "node.type"),
    ("taxonomy_vocabulary", "taxonomy.vocabulary"),
    ("user_role", "user.role"),
    ("view", "views.view"),
];

/// Configuration file structure for unwire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct UnwireConfig {
    /// Top-level field whose presence marks raw data as an entity
    #[serde(default = "default_entity_marker")]
    pub entity_marker: String,

    /// Path to the JSONL corpus, relative to the config file
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// Config-name prefixes of entity types
    #[serde(default = "default_entity_types")]
    pub entity_types: Vec<EntityTypeConfig>,
}

/// One entity type entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntityTypeConfig {
    /// Entity type id
    pub id: String,

    /// Config name prefix, without trailing `.`
    pub prefix: String,
}

fn default_entity_marker() -> String {
    DEFAULT_ENTITY_MARKER.to_string()
}

fn default_data_file() -> String {
    DEFAULT_DATA_FILE.to_string()
}

fn default_entity_types() -> Vec<EntityTypeConfig> {
    DEFAULT_ENTITY_TYPES
        .iter()
        .map(|(id, prefix)| EntityTypeConfig {
            id: (*id).to_string(),
            prefix: (*prefix).to_string(),
        })
        .collect()
}

impl Default for UnwireConfig {
    fn default() -> Self {
        Self {
            entity_marker: default_entity_marker(),
            data_file: default_data_file(),
            entity_types: default_entity_types(),
        }
    }
}

impl UnwireConfig {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it is not valid YAML or fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file does not exist
    ///
    /// # Errors
    ///
    /// See [`UnwireConfig::load`].
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on serialization failure and `Error::Io` on
    /// write failure.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Write a default configuration file to `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists and `force` is not set, and
    /// any error from [`UnwireConfig::save`].
    pub async fn init(path: &Path, force: bool) -> Result<Self> {
        if !force && fs::try_exists(path).await? {
            return Err(Error::Config(format!(
                "'{}' already exists, use --force to overwrite it",
                path.display()
            )));
        }
        let config = Self::default();
        config.save(path).await?;
        tracing::info!(path = %path.display(), "Wrote default configuration");
        Ok(config)
    }

    /// Check the configuration for obvious mistakes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty marker or data file, or invalid
    /// or duplicate entity types.
    pub fn validate(&self) -> Result<()> {
        if self.entity_marker.trim().is_empty() {
            return Err(Error::Config("entity-marker cannot be empty".to_string()));
        }
        if self.data_file.trim().is_empty() {
            return Err(Error::Config("data-file cannot be empty".to_string()));
        }
        self.registry().map(|_| ())
    }

    /// Build the entity type registry. Every type uses the generic record entity.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for invalid or duplicate entity types.
    pub fn registry(&self) -> Result<EntityTypeRegistry> {
        let mut registry = EntityTypeRegistry::new();
        let mut seen = HashSet::new();
        for entity_type in &self.entity_types {
            if !seen.insert(entity_type.id.as_str()) {
                return Err(Error::Config(format!(
                    "Entity type '{}' listed twice",
                    entity_type.id
                )));
            }
            registry.register_record(entity_type.id.clone(), entity_type.prefix.clone())?;
        }
        Ok(registry)
    }

    /// The entity marker predicate.
    #[must_use]
    pub fn marker(&self) -> MarkerField {
        MarkerField::new(self.entity_marker.clone())
    }

    /// Corpus path, resolved against the directory holding the config file.
    #[must_use]
    pub fn data_path(&self, config_path: &Path) -> PathBuf {
        let data_file = Path::new(&self.data_file);
        if data_file.is_absolute() {
            return data_file.to_path_buf();
        }
        config_path
            .parent()
            .map_or_else(|| data_file.to_path_buf(), |dir| dir.join(data_file))
    }
}
