//! Mapping from config-name prefixes to entity types.
//!
//! A configuration object is an entity of type `T` when its name starts with
//! `T`'s prefix followed by `.`. Each type carries the factory that builds its
//! entities from raw data.

use crate::domain::ConfigName;
use crate::entity::{ConfigEntity, ConfigRecord};
use crate::error::{Error, Result};
use serde_json::Value;
use std::fmt;

/// Builds an entity from its name and raw data.
pub type EntityFactory = fn(ConfigName, &Value) -> Result<Box<dyn ConfigEntity>>;

/// A registered configuration entity type.
#[derive(Clone)]
pub struct EntityType {
    /// Entity type id (e.g. `field_storage_config`)
    pub id: String,

    /// Config name prefix without the trailing `.` (e.g. `field.storage`)
    pub prefix: String,

    factory: EntityFactory,
}

impl EntityType {
    /// Build an entity of this type.
    ///
    /// # Errors
    ///
    /// Propagates factory errors for malformed data.
    pub fn create(&self, name: ConfigName, data: &Value) -> Result<Box<dyn ConfigEntity>> {
        (self.factory)(name, data)
    }

    fn matches(&self, name: &ConfigName) -> bool {
        name.is_owned_by(&self.prefix)
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("id", &self.id)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Registered entity types.
#[derive(Debug, Clone, Default)]
pub struct EntityTypeRegistry {
    types: Vec<EntityType>,
}

impl EntityTypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity type with a custom factory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the id or prefix is empty, the prefix ends
    /// with `.`, or either is already registered.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        prefix: impl Into<String>,
        factory: EntityFactory,
    ) -> Result<()> {
        let id = id.into();
        let prefix = prefix.into();

        if id.is_empty() {
            return Err(Error::Config("Entity type id cannot be empty".to_string()));
        }
        if prefix.is_empty() || prefix.ends_with('.') {
            return Err(Error::Config(format!(
                "Invalid prefix '{prefix}' for entity type '{id}'"
            )));
        }
        if self.types.iter().any(|t| t.id == id) {
            return Err(Error::Config(format!("Duplicate entity type '{id}'")));
        }
        if self.types.iter().any(|t| t.prefix == prefix) {
            return Err(Error::Config(format!("Duplicate prefix '{prefix}'")));
        }

        self.types.push(EntityType {
            id,
            prefix,
            factory,
        });
        Ok(())
    }

    /// Register an entity type backed by [`ConfigRecord`].
    ///
    /// # Errors
    ///
    /// See [`EntityTypeRegistry::register`].
    pub fn register_record(
        &mut self,
        id: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Result<()> {
        self.register(id, prefix, ConfigRecord::boxed)
    }

    /// The entity type owning `name`.
    ///
    /// When several prefixes match, the longest wins, so `field.storage`
    /// takes precedence over `field`.
    #[must_use]
    pub fn type_for(&self, name: &ConfigName) -> Option<&EntityType> {
        self.types
            .iter()
            .filter(|t| t.matches(name))
            .max_by_key(|t| t.prefix.len())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn registry() -> EntityTypeRegistry {
        let mut registry = EntityTypeRegistry::new();
        registry.register_record("field_config", "field.field").unwrap();
        registry.register_record("field_storage_config", "field.storage").unwrap();
        registry.register_record("view", "views.view").unwrap();
        registry
    }

    #[rstest]
    #[case("field.storage.node.body", Some("field_storage_config"))]
    #[case("field.field.node.article.body", Some("field_config"))]
    #[case("views.view.frontpage", Some("view"))]
    #[case("views.settings", None)]
    #[case("system.site", None)]
    fn test_type_for(#[case] name: &str, #[case] expected: Option<&str>) {
        let registry = registry();
        let found = registry.type_for(&ConfigName::new(name)).map(|t| t.id.as_str());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut registry = EntityTypeRegistry::new();
        registry.register_record("generic", "field").unwrap();
        registry.register_record("storage", "field.storage").unwrap();

        let found = registry.type_for(&ConfigName::new("field.storage.node.body")).unwrap();
        assert_eq!(found.id, "storage");
    }

    #[rstest]
    #[case("", "x")]
    #[case("x", "")]
    #[case("x", "views.")]
    #[case("view", "y")]
    #[case("y", "views.view")]
    fn test_register_rejects_invalid(#[case] id: &str, #[case] prefix: &str) {
        let mut registry = registry();
        assert!(matches!(registry.register_record(id, prefix), Err(Error::Config(_))));
    }
}
