//! Work out which of an entity's dependencies a removal touches.

use crate::domain::{ConfigName, ContentReference, DependencyKind};
use crate::entity::{AffectedDependencies, ConfigEntity, EntityRef};
use crate::storage::EntityRepository;

/// Build the [`AffectedDependencies`] handed to `entity`'s repair.
///
/// Only references the entity declares under `kind` that are also in `names`
/// are affected. Config and content references are resolved to objects;
/// ones that no longer resolve are left out. On top of that, every entity in
/// `current_dependents` that `entity` config-depends on is reported in the
/// config slot, whatever `kind` is, since it is itself about to be fixed or
/// removed.
pub fn classify<R>(
    entity: &dyn ConfigEntity,
    current_dependents: &[EntityRef],
    kind: DependencyKind,
    names: &[String],
    repository: &R,
) -> AffectedDependencies
where
    R: EntityRepository + ?Sized,
{
    let own_name = entity.config_name();
    let dependencies = entity.dependencies();
    let mut affected = AffectedDependencies::default();

    let overlap = dependencies
        .get(kind)
        .iter()
        .filter(|reference| names.contains(reference));

    match kind {
        DependencyKind::Module => affected.module = overlap.cloned().collect(),
        DependencyKind::Theme => affected.theme = overlap.cloned().collect(),
        DependencyKind::Config => {
            for reference in overlap {
                let name = ConfigName::new(reference.as_str());
                if &name == own_name {
                    continue;
                }
                match repository.load(&name) {
                    Some(target) => {
                        affected.config.insert(name, target);
                    }
                    None => tracing::debug!(
                        entity = %own_name,
                        reference = %name,
                        "Dropping unresolvable config reference"
                    ),
                }
            }
        }
        DependencyKind::Content => {
            for reference in overlap {
                let content = ContentReference::parse(reference)
                    .ok()
                    .and_then(|r| repository.load_content(&r.entity_type, &r.uuid));
                match content {
                    Some(content) => {
                        affected.content.insert(content.dependency_name(), content);
                    }
                    None => tracing::debug!(
                        entity = %own_name,
                        reference = %reference,
                        "Dropping unresolvable content reference"
                    ),
                }
            }
        }
    }

    if !dependencies.get(DependencyKind::Config).is_empty() {
        for dependent in current_dependents {
            if dependent.name() != own_name
                && dependencies.contains(DependencyKind::Config, dependent.name().as_str())
            {
                affected
                    .config
                    .insert(dependent.name().clone(), dependent.clone());
            }
        }
    }

    affected
}
