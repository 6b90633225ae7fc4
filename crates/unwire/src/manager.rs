//! High-level configuration operations built on the resolver.
//!
//! [`ConfigManager`] owns a store and applies removal plans to it: saving
//! repaired entities, deleting the rest, and clearing out the simple
//! configuration a removed extension owned.

use crate::domain::{ConfigName, ContentReference, DeclaredDependencies, DependencyKind};
use crate::entity::EntityRef;
use crate::error::Result;
use crate::resolver::{RemovalResolver, ResolutionPlan};
use crate::storage::in_memory::InMemoryConfigStore;
use crate::storage::{ConfigSource, EntityMarker, EntityRepository};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// What an uninstall changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    /// Entities saved after repairing themselves
    pub updated: Vec<ConfigName>,

    /// Entities deleted, in deletion order
    pub deleted: Vec<ConfigName>,

    /// Simple configuration owned by the removed extension
    pub removed_config: Vec<ConfigName>,
}

/// Applies dependency removals to an in-memory store.
pub struct ConfigManager {
    store: InMemoryConfigStore,
    marker: Box<dyn EntityMarker>,
}

impl fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigManager")
            .field("store", &self.store)
            .field("marker", &"<dyn EntityMarker>")
            .finish()
    }
}

impl ConfigManager {
    /// Create a manager over `store`.
    pub fn new(store: InMemoryConfigStore, marker: impl EntityMarker + 'static) -> Self {
        Self {
            store,
            marker: Box::new(marker),
        }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &InMemoryConfigStore {
        &self.store
    }

    /// The underlying store, mutably.
    pub fn store_mut(&mut self) -> &mut InMemoryConfigStore {
        &mut self.store
    }

    /// A resolver over the store.
    #[must_use]
    pub fn resolver(&self) -> RemovalResolver<'_, InMemoryConfigStore> {
        RemovalResolver::new(&self.store, self.marker.as_ref())
    }

    /// Entity type id owning `name`, if any.
    #[must_use]
    pub fn entity_type_id_by_name(&self, name: &ConfigName) -> Option<&str> {
        self.store.registry().type_for(name).map(|t| t.id.as_str())
    }

    /// Load the entity stored under `name`.
    #[must_use]
    pub fn load_config_entity_by_name(&self, name: &ConfigName) -> Option<EntityRef> {
        self.store.load(name)
    }

    /// See [`RemovalResolver::find_dependents`].
    #[must_use]
    pub fn find_dependents(&self, kind: DependencyKind, names: &[String]) -> Vec<ConfigName> {
        self.resolver().find_dependents(kind, names)
    }

    /// See [`RemovalResolver::plan_removal`].
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyRemovalSet` if `names` is empty.
    pub fn plan_removal(
        &self,
        kind: DependencyKind,
        names: &[String],
        dry_run: bool,
    ) -> Result<ResolutionPlan> {
        self.resolver().plan_removal(kind, names, dry_run)
    }

    /// Remove an extension and everything that cannot survive without it.
    ///
    /// Dependents that repair themselves are saved, the others are flagged as
    /// uninstalling and deleted dependents first. Finally every config
    /// object named `<name>.*` is deleted.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyRemovalSet` if `name` is empty.
    pub fn uninstall(&mut self, kind: DependencyKind, name: &str) -> Result<UninstallReport> {
        let names = if name.is_empty() {
            Vec::new()
        } else {
            vec![name.to_string()]
        };
        let plan = self.plan_removal(kind, &names, false)?;

        let mut report = UninstallReport::default();
        for entity in &plan.update {
            self.store.save(entity);
            report.updated.push(entity.name().clone());
        }
        for entity in &plan.delete {
            entity.borrow_mut().set_uninstalling(true);
            self.store.delete(entity.name());
            report.deleted.push(entity.name().clone());
        }
        report.removed_config = self.store.delete_owned_by(name);

        tracing::info!(
            %kind,
            name,
            updated = report.updated.len(),
            deleted = report.deleted.len(),
            removed_config = report.removed_config.len(),
            "Uninstalled"
        );

        Ok(report)
    }

    /// Content dependencies, declared or enforced anywhere in the corpus,
    /// that do not resolve to a content record. Keyed by content uuid.
    #[must_use]
    pub fn find_missing_content_dependencies(&self) -> BTreeMap<String, ContentReference> {
        let references: BTreeSet<String> = self
            .store
            .list_all()
            .iter()
            .flat_map(|(_, data)| {
                DeclaredDependencies::from_config_data(data)
                    .merged()
                    .get(DependencyKind::Content)
                    .to_vec()
            })
            .collect();

        let mut missing = BTreeMap::new();
        for reference in references {
            let Ok(parsed) = ContentReference::parse(&reference) else {
                tracing::debug!(%reference, "Ignoring malformed content reference");
                continue;
            };
            if self
                .store
                .load_content(&parsed.entity_type, &parsed.uuid)
                .is_none()
            {
                missing.insert(parsed.uuid.clone(), parsed);
            }
        }
        missing
    }
}
