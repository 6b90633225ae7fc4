//! Error types for unwire operations.

use crate::domain::ConfigName;
use std::io;
use thiserror::Error;

/// The error type for unwire operations.
///
/// Unresolvable dependency references and repairs that leave an entity
/// dependent are not errors: the resolver drops or demotes them and logs.
#[derive(Debug, Error)]
pub enum Error {
    /// A removal was requested without any names to remove.
    #[error("Removal request must name at least one dependency")]
    EmptyRemovalSet,

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Raw configuration data could not be turned into an entity.
    #[error("Invalid data for entity {name}: {reason}")]
    InvalidEntityData {
        /// Name of the offending configuration object
        name: ConfigName,
        /// What was wrong with it
        reason: String,
    },

    /// A content dependency was not of the form `entity_type:bundle:uuid`.
    #[error("Invalid content reference: {0}")]
    InvalidContentReference(String),

    /// A dependency kind string did not name a known kind.
    #[error("Unknown dependency kind: {0}")]
    UnknownDependencyKind(String),
}

/// A specialized Result type for unwire operations.
pub type Result<T> = std::result::Result<T, Error>;
