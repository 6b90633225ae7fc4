//! Storage abstraction layer for unwire.
//!
//! The resolver reads the corpus and loads entities through two traits:
//!
//! - [`ConfigSource`]: lists every raw configuration object, used once per
//!   resolution to build the dependency graph
//! - [`EntityRepository`]: loads entities by config name and content records
//!   by type and uuid
//!
//! [`in_memory::InMemoryConfigStore`] implements both, with JSONL
//! persistence in [`jsonl`].
//!
//! # Example
//!
//! ```
//! use unwire::storage::in_memory::InMemoryConfigStore;
//! use unwire::storage::registry::EntityTypeRegistry;
//! use unwire::storage::{ConfigSource, EntityRepository};
//! use unwire::domain::ConfigName;
//! use serde_json::json;
//!
//! let mut registry = EntityTypeRegistry::new();
//! registry.register_record("view", "views.view").unwrap();
//!
//! let mut store = InMemoryConfigStore::new(registry);
//! store.insert_config(
//!     ConfigName::new("views.view.frontpage"),
//!     json!({"uuid": "f1", "dependencies": {"module": ["node"]}}),
//! );
//!
//! assert_eq!(store.list_all().len(), 1);
//! assert!(store.load(&ConfigName::new("views.view.frontpage")).is_some());
//! ```

use crate::domain::{ConfigName, ContentEntity};
use crate::entity::EntityRef;
use serde_json::Value;

pub mod in_memory;
pub mod jsonl;
pub mod registry;

/// Source of the raw configuration corpus.
pub trait ConfigSource {
    /// Every configuration object, as `(name, raw data)` pairs, in name order.
    fn list_all(&self) -> Vec<(ConfigName, Value)>;
}

/// Loads entities that the resolver materializes or hands to repairs.
pub trait EntityRepository {
    /// Load a configuration entity by name.
    ///
    /// Returns `None` if no such object exists or it is not an entity.
    fn load(&self, name: &ConfigName) -> Option<EntityRef>;

    /// Load a content record by entity type and uuid.
    fn load_content(&self, entity_type: &str, uuid: &str) -> Option<ContentEntity>;
}

/// Decides which raw configuration objects are entities.
///
/// Only entities take part in the dependency graph; plain configuration is
/// skipped entirely.
pub trait EntityMarker {
    /// Whether the object named `name` with raw `data` is an entity.
    fn is_entity(&self, name: &ConfigName, data: &Value) -> bool;
}

/// Treats any object carrying the given top-level field as an entity.
///
/// A plain configuration object that happens to carry the same field is
/// misclassified as an entity. It still never materializes unless its name
/// matches a registered entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerField(pub String);

impl MarkerField {
    /// Marker on the given field name.
    pub fn new(field: impl Into<String>) -> Self {
        Self(field.into())
    }
}

impl Default for MarkerField {
    fn default() -> Self {
        Self::new("uuid")
    }
}

impl EntityMarker for MarkerField {
    fn is_entity(&self, _name: &ConfigName, data: &Value) -> bool {
        data.get(&self.0).is_some_and(|v| !v.is_null())
    }
}

impl<F> EntityMarker for F
where
    F: Fn(&ConfigName, &Value) -> bool,
{
    fn is_entity(&self, name: &ConfigName, data: &Value) -> bool {
        self(name, data)
    }
}
