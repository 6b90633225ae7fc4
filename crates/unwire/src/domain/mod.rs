//! Domain types for dependency removal.
//!
//! This module contains the identifiers, dependency kinds and dependency
//! sets shared by the graph, the resolver and the storage layer.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Stable, globally unique name of a configuration object (e.g. `field.storage.node.body`).
///
/// This is the unit of dependency-edge addressing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigName(pub String);

impl ConfigName {
    /// Create a new config name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name belongs to the given provider (`<provider>.<rest>`).
    #[must_use]
    pub fn is_owned_by(&self, provider: &str) -> bool {
        self.0
            .strip_prefix(provider)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for ConfigName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConfigName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConfigName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Surrogate key of an entity, used to track which entities a resolution pass
/// has already finalized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityUuid(pub String);

impl EntityUuid {
    /// Create a new entity uuid
    pub fn new(uuid: impl Into<String>) -> Self {
        Self(uuid.into())
    }

    /// Get the uuid as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Category of a declared dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// An installable module (provider)
    Module,

    /// An installable theme
    Theme,

    /// Another configuration entity, referenced by [`ConfigName`]
    Config,

    /// A content record, referenced as `entity_type:bundle:uuid`
    Content,
}

impl DependencyKind {
    /// Key used for this kind in raw configuration data.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::Module => "module",
            DependencyKind::Theme => "theme",
            DependencyKind::Config => "config",
            DependencyKind::Content => "content",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "module" | "provider" => Ok(DependencyKind::Module),
            "theme" => Ok(DependencyKind::Theme),
            // Named configuration objects share the config path.
            "config" | "config_object" => Ok(DependencyKind::Config),
            "content" => Ok(DependencyKind::Content),
            other => Err(Error::UnknownDependencyKind(other.to_string())),
        }
    }
}

/// Key under which enforced dependencies are nested in raw data.
pub const ENFORCED_KEY: &str = "enforced";

/// Ordered, duplicate-free references declared by one entity, per kind.
///
/// An empty set is valid and means the entity has no dependencies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet(BTreeMap<DependencyKind, Vec<String>>);

impl DependencySet {
    /// Create an empty dependency set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// References declared under `kind`, in declaration order.
    #[must_use]
    pub fn get(&self, kind: DependencyKind) -> &[String] {
        self.0.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Whether `reference` is declared under `kind`.
    #[must_use]
    pub fn contains(&self, kind: DependencyKind, reference: &str) -> bool {
        self.get(kind).iter().any(|r| r == reference)
    }

    /// Whether any reference under `kind` is one of `names`.
    #[must_use]
    pub fn intersects(&self, kind: DependencyKind, names: &[String]) -> bool {
        self.get(kind).iter().any(|r| names.contains(r))
    }

    /// Add a reference. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: DependencyKind, reference: impl Into<String>) -> bool {
        let reference = reference.into();
        let refs = self.0.entry(kind).or_default();
        if refs.contains(&reference) {
            return false;
        }
        refs.push(reference);
        true
    }

    /// Remove a reference. Returns `true` if it was present.
    pub fn remove(&mut self, kind: DependencyKind, reference: &str) -> bool {
        self.remove_where(kind, |r| r == reference)
    }

    /// Remove every reference under `kind` matching `predicate`. Returns
    /// `true` if any was removed.
    pub fn remove_where(&mut self, kind: DependencyKind, predicate: impl Fn(&str) -> bool) -> bool {
        let Some(refs) = self.0.get_mut(&kind) else {
            return false;
        };
        let before = refs.len();
        refs.retain(|r| !predicate(r));
        let removed = refs.len() != before;
        if refs.is_empty() {
            self.0.remove(&kind);
        }
        removed
    }

    /// Add every reference of `other` that is not already present.
    pub fn merge(&mut self, other: &DependencySet) {
        for (kind, refs) in &other.0 {
            for reference in refs {
                self.insert(*kind, reference.clone());
            }
        }
    }

    /// Whether no references are declared under any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Iterate over `(kind, references)` pairs with at least one reference.
    pub fn iter(&self) -> impl Iterator<Item = (DependencyKind, &[String])> {
        self.0
            .iter()
            .filter(|(_, refs)| !refs.is_empty())
            .map(|(kind, refs)| (*kind, refs.as_slice()))
    }

    /// Build a set from a raw `{ "<kind>": [..] }` object, ignoring unknown
    /// keys and non-string entries.
    fn from_object(object: &Map<String, Value>) -> Self {
        let mut set = Self::new();
        for (key, refs) in object {
            let Ok(kind) = key.parse::<DependencyKind>() else {
                continue;
            };
            let Some(refs) = refs.as_array() else {
                continue;
            };
            for reference in refs.iter().filter_map(Value::as_str) {
                set.insert(kind, reference);
            }
        }
        set
    }

    fn to_object(&self) -> Map<String, Value> {
        self.iter()
            .map(|(kind, refs)| {
                (
                    kind.as_str().to_string(),
                    Value::Array(refs.iter().cloned().map(Value::String).collect()),
                )
            })
            .collect()
    }
}

/// Dependencies as stored in raw configuration data: a declared part that an
/// entity may drop during repair, and an enforced part that it may not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredDependencies {
    /// Dependencies the entity computed for itself
    pub declared: DependencySet,

    /// Dependencies pinned by whoever installed the entity
    pub enforced: DependencySet,
}

impl DeclaredDependencies {
    /// Read the `dependencies` key of raw configuration data.
    ///
    /// Missing or malformed data yields empty sets.
    #[must_use]
    pub fn from_config_data(data: &Value) -> Self {
        let Some(object) = data.get("dependencies").and_then(Value::as_object) else {
            return Self::default();
        };
        let enforced = object
            .get(ENFORCED_KEY)
            .and_then(Value::as_object)
            .map(DependencySet::from_object)
            .unwrap_or_default();

        Self {
            declared: DependencySet::from_object(object),
            enforced,
        }
    }

    /// Declared and enforced dependencies combined.
    #[must_use]
    pub fn merged(&self) -> DependencySet {
        let mut merged = self.declared.clone();
        merged.merge(&self.enforced);
        merged
    }

    /// Render back into the raw `dependencies` object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = self.declared.to_object();
        if !self.enforced.is_empty() {
            object.insert(
                ENFORCED_KEY.to_string(),
                Value::Object(self.enforced.to_object()),
            );
        }
        Value::Object(object)
    }
}

/// Parsed content dependency of the form `entity_type:bundle:uuid`.
///
/// The bundle is informational only; content is resolved by type and uuid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReference {
    /// Content entity type (e.g. `node`)
    pub entity_type: String,

    /// Bundle (e.g. `article`)
    pub bundle: String,

    /// Content uuid
    pub uuid: String,
}

impl ContentReference {
    /// Parse a composite content reference.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidContentReference` if the reference does not have
    /// three `:`-separated parts.
    pub fn parse(reference: &str) -> Result<Self> {
        let mut parts = reference.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(entity_type), Some(bundle), Some(uuid))
                if !entity_type.is_empty() && !uuid.is_empty() =>
            {
                Ok(Self {
                    entity_type: entity_type.to_string(),
                    bundle: bundle.to_string(),
                    uuid: uuid.to_string(),
                })
            }
            _ => Err(Error::InvalidContentReference(reference.to_string())),
        }
    }
}

impl fmt::Display for ContentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.entity_type, self.bundle, self.uuid)
    }
}

/// A content record that configuration may depend on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntity {
    /// Content entity type (e.g. `node`)
    pub entity_type: String,

    /// Bundle (e.g. `article`)
    pub bundle: String,

    /// Content uuid
    pub uuid: String,

    /// Human readable label (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ContentEntity {
    /// The `entity_type:bundle:uuid` name configuration uses to depend on this record.
    #[must_use]
    pub fn dependency_name(&self) -> String {
        format!("{}:{}:{}", self.entity_type, self.bundle, self.uuid)
    }

    /// Whether `reference` points at this record. The bundle is not compared.
    #[must_use]
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        ContentReference::parse(reference)
            .is_ok_and(|r| r.entity_type == self.entity_type && r.uuid == self.uuid)
    }
}
