//! In-memory configuration store.
//!
//! Holds the raw configuration objects (the active storage), content records,
//! the entity type registry, and a static cache of loaded entities.
//!
//! # Entity cache
//!
//! [`EntityRepository::load`] builds an entity on first use and returns the
//! same [`EntityRef`] on every later call until the object is saved or
//! deleted. Mutating a loaded entity therefore changes what later loads see,
//! while the raw data only changes on [`InMemoryConfigStore::save`]. The
//! resolver clones entities in dry-run mode so this cache stays untouched.
//!
//! # Thread Safety
//!
//! The store is single-threaded. Callers that might plan or apply removals
//! concurrently must serialize access themselves.

use super::registry::EntityTypeRegistry;
use super::{ConfigSource, EntityRepository};
use crate::domain::{ConfigName, ContentEntity};
use crate::entity::{ConfigEntity, EntityRef};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// In-memory configuration store with an entity cache.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    /// Raw configuration objects by name
    objects: BTreeMap<ConfigName, Value>,

    /// Content records keyed by `(entity_type, uuid)`
    content: BTreeMap<(String, String), ContentEntity>,

    /// Entity types used to materialize config objects
    registry: EntityTypeRegistry,

    /// Entities loaded so far
    cache: RefCell<HashMap<ConfigName, EntityRef>>,
}

impl InMemoryConfigStore {
    /// Create an empty store using the given entity types.
    #[must_use]
    pub fn new(registry: EntityTypeRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// The entity type registry.
    #[must_use]
    pub fn registry(&self) -> &EntityTypeRegistry {
        &self.registry
    }

    /// Insert or replace a raw configuration object, dropping any cached entity.
    pub fn insert_config(&mut self, name: ConfigName, data: Value) {
        self.cache.get_mut().remove(&name);
        self.objects.insert(name, data);
    }

    /// Insert or replace a content record.
    pub fn insert_content(&mut self, content: ContentEntity) {
        self.content
            .insert((content.entity_type.clone(), content.uuid.clone()), content);
    }

    /// Raw data of a configuration object.
    #[must_use]
    pub fn read(&self, name: &ConfigName) -> Option<&Value> {
        self.objects.get(name)
    }

    /// Whether a configuration object exists.
    #[must_use]
    pub fn contains(&self, name: &ConfigName) -> bool {
        self.objects.contains_key(name)
    }

    /// Number of configuration objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no configuration objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All content records, ordered by type and uuid.
    pub fn content_records(&self) -> impl Iterator<Item = &ContentEntity> {
        self.content.values()
    }

    /// Persist an entity's current state and make it the cached instance.
    pub fn save(&mut self, entity: &EntityRef) {
        let data = entity.borrow().to_data();
        tracing::debug!(name = %entity.name(), "Saving entity");
        self.objects.insert(entity.name().clone(), data);
        self.cache
            .get_mut()
            .insert(entity.name().clone(), entity.clone());
    }

    /// Delete a configuration object. Returns `true` if it existed.
    pub fn delete(&mut self, name: &ConfigName) -> bool {
        self.cache.get_mut().remove(name);
        self.objects.remove(name).is_some()
    }

    /// Delete every configuration object named `<provider>.*`.
    ///
    /// Returns the deleted names in order.
    pub fn delete_owned_by(&mut self, provider: &str) -> Vec<ConfigName> {
        let names: Vec<ConfigName> = self
            .objects
            .keys()
            .filter(|name| name.is_owned_by(provider))
            .cloned()
            .collect();
        for name in &names {
            self.delete(name);
        }
        names
    }

    fn materialize(&self, name: &ConfigName) -> Option<Box<dyn ConfigEntity>> {
        let entity_type = self.registry.type_for(name)?;
        let data = self.objects.get(name)?;
        match entity_type.create(name.clone(), data) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(%name, entity_type = %entity_type.id, error = %e, "Skipping invalid entity");
                None
            }
        }
    }
}

impl ConfigSource for InMemoryConfigStore {
    fn list_all(&self) -> Vec<(ConfigName, Value)> {
        self.objects
            .iter()
            .map(|(name, data)| (name.clone(), data.clone()))
            .collect()
    }
}

impl EntityRepository for InMemoryConfigStore {
    fn load(&self, name: &ConfigName) -> Option<EntityRef> {
        if let Some(entity) = self.cache.borrow().get(name) {
            return Some(entity.clone());
        }
        let entity = EntityRef::new(self.materialize(name)?);
        self.cache
            .borrow_mut()
            .insert(name.clone(), entity.clone());
        Some(entity)
    }

    fn load_content(&self, entity_type: &str, uuid: &str) -> Option<ContentEntity> {
        self.content
            .get(&(entity_type.to_string(), uuid.to_string()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DependencyKind;
    use crate::entity::AffectedDependencies;
    use serde_json::json;

    fn store() -> InMemoryConfigStore {
        let mut registry = EntityTypeRegistry::new();
        registry.register_record("view", "views.view").unwrap();
        let mut store = InMemoryConfigStore::new(registry);
        store.insert_config(
            ConfigName::new("views.view.frontpage"),
            json!({"uuid": "f1", "dependencies": {"module": ["node", "views"]}}),
        );
        store.insert_config(ConfigName::new("views.settings"), json!({"ui": true}));
        store.insert_config(ConfigName::new("system.site"), json!({"uuid": "s1"}));
        store
    }

    #[test]
    fn test_load_returns_cached_instance() {
        let store = store();
        let name = ConfigName::new("views.view.frontpage");
        let first = store.load(&name).unwrap();
        let second = store.load(&name).unwrap();
        assert!(first.ptr_eq(&second));
    }

    #[test]
    fn test_load_skips_non_entities() {
        let store = store();
        assert!(store.load(&ConfigName::new("views.settings")).is_none());
        // Has the marker, but no registered entity type.
        assert!(store.load(&ConfigName::new("system.site")).is_none());
        assert!(store.load(&ConfigName::new("views.view.missing")).is_none());
    }

    #[test]
    fn test_load_skips_invalid_entity_data() {
        let mut store = store();
        store.insert_config(ConfigName::new("views.view.broken"), json!({"label": "x"}));
        assert!(store.load(&ConfigName::new("views.view.broken")).is_none());
    }

    #[test]
    fn test_save_writes_raw_data() {
        let mut store = store();
        let name = ConfigName::new("views.view.frontpage");
        let entity = store.load(&name).unwrap();
        let affected = AffectedDependencies {
            module: vec!["node".to_string()],
            ..Default::default()
        };
        entity.borrow_mut().on_dependency_removal(&affected);

        // Raw data is unchanged until saved.
        assert_eq!(store.read(&name).unwrap()["dependencies"]["module"], json!(["node", "views"]));

        store.save(&entity);
        assert_eq!(store.read(&name).unwrap()["dependencies"]["module"], json!(["views"]));
        let reloaded = store.load(&name).unwrap();
        reloaded.borrow_mut().calculate_dependencies();
        assert!(!reloaded.borrow().dependencies().contains(DependencyKind::Module, "node"));
    }

    #[test]
    fn test_delete_owned_by() {
        let mut store = store();
        let deleted = store.delete_owned_by("views");
        assert_eq!(deleted, vec![ConfigName::new("views.settings"), ConfigName::new("views.view.frontpage")]);
        assert!(!store.contains(&ConfigName::new("views.view.frontpage")));
        assert!(store.contains(&ConfigName::new("system.site")));
        assert!(store.load(&ConfigName::new("views.view.frontpage")).is_none());
    }

    #[test]
    fn test_load_content() {
        let mut store = store();
        store.insert_content(ContentEntity {
            entity_type: "node".to_string(),
            bundle: "page".to_string(),
            uuid: "c1".to_string(),
            label: None,
        });
        assert!(store.load_content("node", "c1").is_some());
        assert!(store.load_content("node", "c2").is_none());
        assert!(store.load_content("user", "c1").is_none());
    }
}
