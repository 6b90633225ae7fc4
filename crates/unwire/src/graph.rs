//! Dependency graph of configuration entities using petgraph.
//!
//! The graph keeps each entity's full [`DependencySet`] plus a `DiGraph` of
//! config-to-config edges used for transitive lookups.
//!
//! # Edge Direction
//!
//! Edges point from **dependent -> dependency**: if `views.view.a` depends on
//! `field.storage.node.body`, the edge is `views.view.a -> field.storage.node.body`.
//! Transitive dependents of a node are therefore found by walking
//! `Direction::Incoming` edges.
//!
//! Module, theme and content references are not nodes. They only seed a
//! lookup: entities declaring one of the requested names are the direct
//! dependents, and everything that config-depends on those is added on top.

use crate::domain::{ConfigName, DependencyKind, DependencySet};
use crate::storage::EntityMarker;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// In-memory dependency graph, built fresh for each resolution.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Declared dependencies per entity.
    data: BTreeMap<ConfigName, DependencySet>,

    /// Config dependency edges. Nodes hold config names.
    graph: DiGraph<ConfigName, ()>,

    /// Mapping from config name to graph node.
    node_map: HashMap<ConfigName, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph from raw configuration objects.
    ///
    /// Objects the marker does not classify as entities are skipped.
    pub fn build<I>(objects: I, marker: &dyn EntityMarker) -> Self
    where
        I: IntoIterator<Item = (ConfigName, Value)>,
    {
        let mut skipped = 0usize;
        let entities = objects.into_iter().filter_map(|(name, data)| {
            if marker.is_entity(&name, &data) {
                let deps = crate::domain::DeclaredDependencies::from_config_data(&data).merged();
                Some((name, deps))
            } else {
                skipped += 1;
                None
            }
        });
        let graph = Self::from_dependencies(entities.collect::<Vec<_>>());
        tracing::debug!(entities = graph.len(), skipped, "Built dependency graph");
        graph
    }

    /// Build the graph from already-parsed dependency sets.
    pub fn from_dependencies<I>(entities: I) -> Self
    where
        I: IntoIterator<Item = (ConfigName, DependencySet)>,
    {
        // Sorted insertion keeps node indices, and so traversal order, stable.
        let data: BTreeMap<ConfigName, DependencySet> = entities.into_iter().collect();

        let mut graph = DiGraph::new();
        let mut node_map = HashMap::with_capacity(data.len());
        for name in data.keys() {
            node_map.insert(name.clone(), graph.add_node(name.clone()));
        }

        let mut this = Self {
            data,
            graph,
            node_map,
        };
        let names: Vec<ConfigName> = this.data.keys().cloned().collect();
        for name in names {
            this.add_config_edges(&name);
        }
        this
    }

    /// Number of entities in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Whether the graph has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Whether `name` is an entity in the graph.
    #[must_use]
    pub fn contains(&self, name: &ConfigName) -> bool {
        self.node_map.contains_key(name)
    }

    /// Recorded dependencies of `name`.
    #[must_use]
    pub fn dependencies(&self, name: &ConfigName) -> Option<&DependencySet> {
        self.data.get(name)
    }

    /// Replace the dependencies of one entity.
    ///
    /// Unknown names are ignored, since the entity may already be gone. The
    /// change is only visible to later [`DependencyGraph::dependents_of`] calls.
    pub fn update(&mut self, name: &ConfigName, dependencies: DependencySet) {
        let Some(&node) = self.node_map.get(name) else {
            tracing::debug!(%name, "Ignoring update for entity outside the graph");
            return;
        };

        self.graph
            .retain_edges(|g, edge| g.edge_endpoints(edge).is_none_or(|(source, _)| source != node));
        self.data.insert(name.clone(), dependencies);
        self.add_config_edges(name);
    }

    /// Every entity depending on one of `names` under `kind`, directly or
    /// through other entities.
    ///
    /// The result is in dependency order: each entity comes after everything
    /// it depends on, so the last entry is the most dependent. Entities in a
    /// dependency cycle are ordered by name.
    #[must_use]
    pub fn dependents_of(&self, kind: DependencyKind, names: &[String]) -> Vec<ConfigName> {
        let mut dependents: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();

        for (name, deps) in &self.data {
            if deps.intersects(kind, names) {
                let node = self.node_map[name];
                if dependents.insert(node) {
                    queue.push_back(node);
                }
            }
        }

        // Anything depending on a dependent is itself a dependent.
        while let Some(node) = queue.pop_front() {
            for dependent in self.graph.neighbors_directed(node, Direction::Incoming) {
                if dependents.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        if dependents.is_empty() {
            return Vec::new();
        }

        // Tarjan emits components in reverse topological order, i.e.
        // dependencies before their dependents.
        let mut ordered = Vec::with_capacity(dependents.len());
        for component in algo::tarjan_scc(&self.graph) {
            let mut members: Vec<&ConfigName> = component
                .into_iter()
                .filter(|node| dependents.contains(node))
                .map(|node| &self.graph[node])
                .collect();
            members.sort();
            ordered.extend(members.into_iter().cloned());
        }
        ordered
    }

    fn add_config_edges(&mut self, name: &ConfigName) {
        let from = self.node_map[name];
        let targets: Vec<NodeIndex> = self
            .data
            .get(name)
            .map(|deps| deps.get(DependencyKind::Config))
            .unwrap_or_default()
            .iter()
            .filter_map(|target| self.node_map.get(target.as_str()))
            .copied()
            .collect();
        for to in targets {
            self.graph.add_edge(from, to, ());
        }
    }
}
