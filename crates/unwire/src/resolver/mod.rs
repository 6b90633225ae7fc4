//! Dependency-removal resolution.
//!
//! Given a set of modules, themes, config entities or content records about
//! to be removed, [`RemovalResolver::plan_removal`] works out which dependent
//! entities can repair themselves (update), which must go (delete), and which
//! turn out to be unaffected (unchanged).
//!
//! # Algorithm
//!
//! Dependents are processed most-dependent first, popped off the end of the
//! dependency-ordered list. Each one is offered a repair. A successful repair
//! updates the graph and the list of current dependents is recomputed, which
//! may drop entities further down that no longer depend on the removal. If
//! the repaired entity is still a dependent after that, the repair was only
//! partial and it is deleted instead. Deletions keep processing order, so an
//! entity is always deleted before anything it depends on (a field before
//! its field storage).
//!
//! Every processed entity is recorded by uuid and never processed again, so
//! the loop makes at most one repair attempt per original dependent.
//!
//! # Dry Runs
//!
//! With `dry_run` set, each entity is deep-cloned before it is touched, so
//! the repository's cached entities stay as they were. The graph is private
//! to the call and is mutated either way.

mod classify;

pub use classify::classify;

use crate::domain::{ConfigName, DependencyKind, EntityUuid};
use crate::entity::EntityRef;
use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::storage::{ConfigSource, EntityMarker, EntityRepository};
use serde::Serialize;
use std::collections::HashSet;

/// Outcome of a removal plan.
///
/// Every entity that depended on the removal when planning started is in
/// exactly one of the three lists.
#[derive(Debug, Default)]
pub struct ResolutionPlan {
    /// Entities that repaired themselves and must be saved, in repair order.
    pub update: Vec<EntityRef>,

    /// Entities that must be deleted, dependents before their dependencies.
    pub delete: Vec<EntityRef>,

    /// Entities that turned out not to be affected, in dependency order.
    pub unchanged: Vec<EntityRef>,

    /// Number of repairs attempted.
    pub repair_attempts: usize,
}

impl ResolutionPlan {
    /// Names of entities to update.
    #[must_use]
    pub fn update_names(&self) -> Vec<ConfigName> {
        names_of(&self.update)
    }

    /// Names of entities to delete, dependents before their dependencies.
    #[must_use]
    pub fn delete_names(&self) -> Vec<ConfigName> {
        names_of(&self.delete)
    }

    /// Names of unaffected entities.
    #[must_use]
    pub fn unchanged_names(&self) -> Vec<ConfigName> {
        names_of(&self.unchanged)
    }

    /// Whether nothing needs to be updated or deleted.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.update.is_empty() && self.delete.is_empty()
    }

    /// Serializable view of the plan.
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            update: self.update_names(),
            delete: self.delete_names(),
            unchanged: self.unchanged_names(),
        }
    }
}

fn names_of(entities: &[EntityRef]) -> Vec<ConfigName> {
    entities.iter().map(|e| e.name().clone()).collect()
}

/// Names in a [`ResolutionPlan`], for output and comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    /// Entities to update
    pub update: Vec<ConfigName>,
    /// Entities to delete, dependents before their dependencies
    pub delete: Vec<ConfigName>,
    /// Entities left unchanged
    pub unchanged: Vec<ConfigName>,
}

/// Plans the consequences of removing dependencies.
///
/// The resolver is single-threaded and assumes nothing else touches the
/// repository while a plan is computed.
pub struct RemovalResolver<'a, R: ?Sized> {
    repository: &'a R,
    marker: &'a dyn EntityMarker,
}

impl<'a, R> RemovalResolver<'a, R>
where
    R: ConfigSource + EntityRepository + ?Sized,
{
    /// Create a resolver over `repository`, using `marker` to tell entities
    /// from plain configuration.
    pub fn new(repository: &'a R, marker: &'a dyn EntityMarker) -> Self {
        Self { repository, marker }
    }

    /// Build a dependency graph from the repository's current contents.
    #[must_use]
    pub fn dependency_graph(&self) -> DependencyGraph {
        DependencyGraph::build(self.repository.list_all(), self.marker)
    }

    /// Names of all entities depending on `names`, in dependency order.
    #[must_use]
    pub fn find_dependents(&self, kind: DependencyKind, names: &[String]) -> Vec<ConfigName> {
        self.dependency_graph().dependents_of(kind, names)
    }

    /// Entities depending on `names` according to `graph`, in dependency order.
    ///
    /// Names that do not load as entities (plain configuration carrying the
    /// marker, or invalid data) are left out.
    #[must_use]
    pub fn find_dependents_as_entities(
        &self,
        graph: &DependencyGraph,
        kind: DependencyKind,
        names: &[String],
    ) -> Vec<EntityRef> {
        graph
            .dependents_of(kind, names)
            .iter()
            .filter_map(|name| self.repository.load(name))
            .collect()
    }

    /// Work out which dependents of `names` to update, delete, or leave alone.
    ///
    /// In a real run, repairs mutate the repository's cached entities and the
    /// caller is expected to save `update` and delete `delete` in the given
    /// order. In a dry run, nothing outside the returned plan is mutated.
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
        if names.is_empty() {
            return Err(Error::EmptyRemovalSet);
        }

        let mut graph = self.dependency_graph();

        let original_dependents = self.find_dependents_as_entities(&graph, kind, names);
        let mut current_dependents = original_dependents.clone();
        let mut to_process = original_dependents.clone();

        let mut affected: HashSet<EntityUuid> = HashSet::new();
        let mut plan = ResolutionPlan::default();

        tracing::debug!(
            %kind,
            ?names,
            dry_run,
            dependents = original_dependents.len(),
            "Planning dependency removal"
        );

        while let Some(popped) = to_process.pop() {
            let dependent = if dry_run { popped.deep_clone() } else { popped };

            let mut fixed = false;
            if self.try_repair(&dependent, &current_dependents, kind, names, &mut plan) {
                dependent.borrow_mut().calculate_dependencies();
                let dependencies = dependent.borrow().dependencies().clone();
                graph.update(dependent.name(), dependencies);

                current_dependents = self.find_dependents_as_entities(&graph, kind, names);
                to_process = current_dependents
                    .iter()
                    .filter(|e| !affected.contains(e.uuid()))
                    .cloned()
                    .collect();

                // Still a dependent: something else keeps it tied to the removal.
                match to_process.iter().position(|e| e.uuid() == dependent.uuid()) {
                    Some(index) => {
                        to_process.remove(index);
                        tracing::warn!(
                            name = %dependent.name(),
                            "Repair left entity dependent on removal; deleting it"
                        );
                    }
                    None => fixed = true,
                }
            }

            affected.insert(dependent.uuid().clone());
            if fixed {
                tracing::debug!(name = %dependent.name(), "Entity repaired");
                plan.update.push(dependent);
            } else {
                tracing::debug!(name = %dependent.name(), "Entity will be deleted");
                plan.delete.push(dependent);
            }
        }

        plan.unchanged = original_dependents
            .into_iter()
            .filter(|e| !affected.contains(e.uuid()))
            .collect();

        tracing::info!(
            update = plan.update.len(),
            delete = plan.delete.len(),
            unchanged = plan.unchanged.len(),
            dry_run,
            "Dependency removal planned"
        );

        Ok(plan)
    }

    /// Offer `entity` a repair. Returns `true` if it changed.
    fn try_repair(
        &self,
        entity: &EntityRef,
        current_dependents: &[EntityRef],
        kind: DependencyKind,
        names: &[String],
        plan: &mut ResolutionPlan,
    ) -> bool {
        let affected = {
            let entity = entity.borrow();
            // Nothing recorded, nothing to repair.
            if entity.dependencies().is_empty() {
                return false;
            }
            classify(&**entity, current_dependents, kind, names, self.repository)
        };

        plan.repair_attempts += 1;
        entity.borrow_mut().on_dependency_removal(&affected)
    }
}
