//! Unwire - dependency-removal planning for configuration entities.
//!
//! When a module, theme, configuration entity or content record is about to
//! be removed, every configuration entity depending on it must either drop
//! the dependency or be deleted. This crate computes that plan and, for
//! real uninstalls, applies it to an in-memory store persisted as JSONL.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use unwire::domain::{ConfigName, DependencyKind};
//! use unwire::manager::ConfigManager;
//! use unwire::storage::in_memory::InMemoryConfigStore;
//! use unwire::storage::registry::EntityTypeRegistry;
//! use unwire::storage::MarkerField;
//!
//! let mut registry = EntityTypeRegistry::new();
//! registry.register_record("view", "views.view").unwrap();
//! let mut store = InMemoryConfigStore::new(registry);
//! store.insert_config(
//!     ConfigName::new("views.view.frontpage"),
//!     json!({"uuid": "f1", "dependencies": {"module": ["node", "views"]}}),
//! );
//!
//! let manager = ConfigManager::new(store, MarkerField::default());
//! let plan = manager
//!     .plan_removal(DependencyKind::Module, &["node".to_string()], true)
//!     .unwrap();
//! assert_eq!(plan.update_names(), vec![ConfigName::new("views.view.frontpage")]);
//! ```

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod entity;
pub mod error;
pub mod graph;
pub mod manager;
pub mod resolver;
pub mod storage;

// Public CLI module (needed by binary)
pub mod cli;

pub mod config;

// Internal modules (not exposed as public API)
pub(crate) mod app;
pub(crate) mod output;
