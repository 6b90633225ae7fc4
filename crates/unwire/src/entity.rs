//! Configuration entities and the capability set the resolver relies on.
//!
//! The resolver never looks at entity-specific fields. Everything it needs
//! goes through [`ConfigEntity`], and the only place entity-specific logic
//! runs is [`ConfigEntity::on_dependency_removal`].
//!
//! Entities are shared through [`EntityRef`] handles. Handles handed out by a
//! repository alias the repository's cached object, so mutating through one
//! is visible to every other holder. [`EntityRef::deep_clone`] produces an
//! independent copy for dry runs.

use crate::domain::{
    ConfigName, ContentEntity, DeclaredDependencies, DependencyKind, DependencySet, EntityUuid,
};
use crate::error::{Error, Result};
use serde_json::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Capability set of a configuration entity.
pub trait ConfigEntity: fmt::Debug {
    /// Name other entities use to depend on this one.
    fn config_name(&self) -> &ConfigName;

    /// Surrogate key, stable for the lifetime of a resolution pass.
    fn uuid(&self) -> &EntityUuid;

    /// Dependencies as last calculated.
    fn dependencies(&self) -> &DependencySet;

    /// Recompute [`ConfigEntity::dependencies`] from the entity's current state.
    fn calculate_dependencies(&mut self);

    /// Let the entity repair itself after some of its dependencies are removed.
    ///
    /// Returns `true` if the entity's stored dependency declarations changed.
    fn on_dependency_removal(&mut self, affected: &AffectedDependencies) -> bool;

    /// Flag the entity as being removed as part of an uninstall.
    fn set_uninstalling(&mut self, uninstalling: bool);

    /// Whether the entity is being removed as part of an uninstall.
    fn is_uninstalling(&self) -> bool;

    /// Deep, independent copy of this entity.
    fn clone_entity(&self) -> Box<dyn ConfigEntity>;

    /// Raw configuration data to persist for this entity.
    fn to_data(&self) -> Value;
}

/// Shared handle to a configuration entity.
///
/// Name and uuid are captured when the handle is created so they can be read
/// without borrowing the entity.
#[derive(Clone)]
pub struct EntityRef {
    name: ConfigName,
    uuid: EntityUuid,
    inner: Rc<RefCell<Box<dyn ConfigEntity>>>,
}

impl EntityRef {
    /// Wrap an entity in a new handle.
    #[must_use]
    pub fn new(entity: Box<dyn ConfigEntity>) -> Self {
        Self {
            name: entity.config_name().clone(),
            uuid: entity.uuid().clone(),
            inner: Rc::new(RefCell::new(entity)),
        }
    }

    /// The entity's config name.
    #[must_use]
    pub fn name(&self) -> &ConfigName {
        &self.name
    }

    /// The entity's uuid.
    #[must_use]
    pub fn uuid(&self) -> &EntityUuid {
        &self.uuid
    }

    /// Borrow the entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Box<dyn ConfigEntity>> {
        self.inner.borrow()
    }

    /// Mutably borrow the entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, Box<dyn ConfigEntity>> {
        self.inner.borrow_mut()
    }

    /// A new handle to an independent copy of the entity.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self::new(self.inner.borrow().clone_entity())
    }

    /// Whether both handles point at the same entity object.
    #[must_use]
    pub fn ptr_eq(&self, other: &EntityRef) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRef")
            .field("name", &self.name)
            .field("uuid", &self.uuid)
            .finish_non_exhaustive()
    }
}

/// The subset of an entity's dependencies touched by a removal.
///
/// Config and content slots hold resolved objects keyed by dependency name;
/// module and theme slots are plain names.
#[derive(Debug, Clone, Default)]
pub struct AffectedDependencies {
    /// Affected configuration entities, keyed by config name
    pub config: BTreeMap<ConfigName, EntityRef>,

    /// Affected content records, keyed by `entity_type:bundle:uuid`
    pub content: BTreeMap<String, ContentEntity>,

    /// Affected modules
    pub module: Vec<String>,

    /// Affected themes
    pub theme: Vec<String>,
}

impl AffectedDependencies {
    /// Names in the slot for `kind`.
    #[must_use]
    pub fn names(&self, kind: DependencyKind) -> Vec<String> {
        match kind {
            DependencyKind::Module => self.module.clone(),
            DependencyKind::Theme => self.theme.clone(),
            DependencyKind::Config => self.config.keys().map(|n| n.0.clone()).collect(),
            DependencyKind::Content => self.content.keys().cloned().collect(),
        }
    }

    /// Whether every slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.config.is_empty()
            && self.content.is_empty()
            && self.module.is_empty()
            && self.theme.is_empty()
    }
}

/// Generic configuration entity backed by raw data.
///
/// Repair drops affected references from the declared dependencies. Enforced
/// dependencies cannot be dropped, so an entity that enforces a removed
/// dependency stays dependent on it.
#[derive(Debug, Clone)]
pub struct ConfigRecord {
    name: ConfigName,
    uuid: EntityUuid,
    declared: DeclaredDependencies,
    dependencies: DependencySet,
    data: Value,
    uninstalling: bool,
}

impl ConfigRecord {
    /// Build a record from raw configuration data.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidEntityData` if the data is not an object or has
    /// no string `uuid`.
    pub fn from_data(name: ConfigName, data: &Value) -> Result<Self> {
        if !data.is_object() {
            return Err(Error::InvalidEntityData {
                name,
                reason: "data is not an object".to_string(),
            });
        }
        let Some(uuid) = data.get("uuid").and_then(Value::as_str) else {
            return Err(Error::InvalidEntityData {
                name,
                reason: "missing string uuid".to_string(),
            });
        };
        let declared = DeclaredDependencies::from_config_data(data);

        Ok(Self {
            uuid: EntityUuid::new(uuid),
            dependencies: declared.merged(),
            declared,
            name,
            data: data.clone(),
            uninstalling: false,
        })
    }

    /// Factory suitable for registering with an entity type registry.
    ///
    /// # Errors
    ///
    /// See [`ConfigRecord::from_data`].
    pub fn boxed(name: ConfigName, data: &Value) -> Result<Box<dyn ConfigEntity>> {
        Ok(Box::new(Self::from_data(name, data)?))
    }

}

impl ConfigEntity for ConfigRecord {
    fn config_name(&self) -> &ConfigName {
        &self.name
    }

    fn uuid(&self) -> &EntityUuid {
        &self.uuid
    }

    fn dependencies(&self) -> &DependencySet {
        &self.dependencies
    }

    fn calculate_dependencies(&mut self) {
        self.dependencies = self.declared.merged();
    }

    fn on_dependency_removal(&mut self, affected: &AffectedDependencies) -> bool {
        let declared = &mut self.declared.declared;
        let mut changed = false;
        for kind in [DependencyKind::Module, DependencyKind::Theme, DependencyKind::Config] {
            for name in affected.names(kind) {
                changed |= declared.remove(kind, &name);
            }
        }
        // Content is matched by type and uuid, since a declared bundle may be stale.
        for content in affected.content.values() {
            changed |= declared.remove_where(DependencyKind::Content, |r| content.is_referenced_by(r));
        }
        changed
    }

    fn set_uninstalling(&mut self, uninstalling: bool) {
        self.uninstalling = uninstalling;
    }

    fn is_uninstalling(&self) -> bool {
        self.uninstalling
    }

    fn clone_entity(&self) -> Box<dyn ConfigEntity> {
        Box::new(self.clone())
    }

    fn to_data(&self) -> Value {
        let mut data = self.data.clone();
        if let Some(object) = data.as_object_mut() {
            if self.declared.merged().is_empty() {
                object.remove("dependencies");
            } else {
                object.insert("dependencies".to_string(), self.declared.to_value());
            }
        }
        data
    }
}
