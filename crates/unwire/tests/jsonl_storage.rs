//! Integration tests for JSONL corpus persistence.
//!
//! # Test Coverage
//!
//! - Resilient loading of corrupted files
//! - Round-trip persistence through save and load
//! - Uninstall results surviving a save

use serde_json::json;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};
use unwire::config::UnwireConfig;
use unwire::domain::{ConfigName, ContentEntity, DependencyKind};
use unwire::manager::ConfigManager;
use unwire::storage::jsonl::{load_from_jsonl, save_to_jsonl, LoadWarning};
use unwire::storage::registry::EntityTypeRegistry;
use unwire::storage::{EntityRepository, MarkerField};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_temp_jsonl_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

fn registry() -> EntityTypeRegistry {
    UnwireConfig::default().registry().unwrap()
}

const SITE: &str = r#"{"type":"config","name":"node.settings","data":{"use_admin_theme":true}}
{"type":"config","name":"node.type.article","data":{"uuid":"t1","dependencies":{"enforced":{"module":["node"]}}}}
{"type":"config","name":"views.view.frontpage","data":{"uuid":"v1","dependencies":{"module":["node","views"]}}}
{"type":"config","name":"block.block.promo","data":{"uuid":"b1","dependencies":{"content":["block_content:basic:c1"],"enforced":{"module":["node"]}}}}
{"type":"content","entity_type":"block_content","bundle":"basic","uuid":"c1","label":"Promo"}
"#;

// =============================================================================
// Resilient Loading
// =============================================================================

mod load_tests {
    use super::*;

    #[tokio::test]
    async fn loads_config_and_content_records() {
        let file = create_temp_jsonl_file(SITE);
        let (store, warnings) = load_from_jsonl(file.path(), registry()).await.unwrap();

        assert!(warnings.is_empty());
        assert_eq!(store.len(), 4);
        assert!(store.load_content("block_content", "c1").is_some());
        assert!(store.load(&ConfigName::new("views.view.frontpage")).is_some());
        // Simple configuration is not an entity.
        assert!(store.load(&ConfigName::new("node.settings")).is_none());
    }

    #[tokio::test]
    async fn skips_malformed_lines_and_reports_them() {
        let content = r#"{"type":"config","name":"node.type.page","data":{"uuid":"t2"}}
not json at all

{"type":"widget","name":"x"}
{"type":"config","name":"system.site","data":"oops"}
{"type":"config","name":"node.type.page","data":{"uuid":"t3"}}
"#;
        let file = create_temp_jsonl_file(content);
        let (store, warnings) = load_from_jsonl(file.path(), registry()).await.unwrap();

        assert_eq!(warnings.len(), 4);
        assert!(matches!(warnings[0], LoadWarning::MalformedJson { line_number: 2, .. }));
        assert!(matches!(warnings[1], LoadWarning::MalformedJson { line_number: 4, .. }));
        assert_eq!(
            warnings[2],
            LoadWarning::InvalidConfigData {
                name: ConfigName::new("system.site"),
                line_number: 5,
            }
        );
        assert_eq!(
            warnings[3],
            LoadWarning::DuplicateConfig {
                name: ConfigName::new("node.type.page"),
                line_number: 6,
            }
        );

        // The later duplicate wins.
        assert_eq!(store.len(), 1);
        let page = store.read(&ConfigName::new("node.type.page")).unwrap();
        assert_eq!(page["uuid"], "t3");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = load_from_jsonl(&dir.path().join("absent.jsonl"), registry()).await;
        assert!(result.is_err());
    }
}

// =============================================================================
// Persistence
// =============================================================================

mod save_tests {
    use super::*;

    #[tokio::test]
    async fn save_and_reload_preserves_corpus() {
        let file = create_temp_jsonl_file(SITE);
        let (mut store, _) = load_from_jsonl(file.path(), registry()).await.unwrap();
        store.insert_content(ContentEntity {
            entity_type: "node".to_string(),
            bundle: "page".to_string(),
            uuid: "n1".to_string(),
            label: None,
        });

        let dir = tempdir().unwrap();
        let path = dir.path().join("config.jsonl");
        save_to_jsonl(&store, &path).await.unwrap();

        let (reloaded, warnings) = load_from_jsonl(&path, registry()).await.unwrap();
        assert!(warnings.is_empty());
        assert_eq!(reloaded.len(), store.len());
        assert_eq!(
            reloaded.read(&ConfigName::new("block.block.promo")),
            store.read(&ConfigName::new("block.block.promo"))
        );
        assert_eq!(reloaded.content_records().count(), 2);
        assert!(!dir.path().join("config.tmp").exists());
    }

    #[tokio::test]
    async fn uninstall_results_survive_a_save() {
        let file = create_temp_jsonl_file(SITE);
        let (store, _) = load_from_jsonl(file.path(), registry()).await.unwrap();
        let mut manager = ConfigManager::new(store, MarkerField::default());

        let report = manager.uninstall(DependencyKind::Module, "node").unwrap();
        assert_eq!(report.updated, vec![ConfigName::new("views.view.frontpage")]);
        assert_eq!(
            report.deleted,
            vec![
                ConfigName::new("node.type.article"),
                ConfigName::new("block.block.promo"),
            ]
        );
        assert_eq!(report.removed_config, vec![ConfigName::new("node.settings")]);

        let dir = tempdir().unwrap();
        let path = dir.path().join("config.jsonl");
        save_to_jsonl(manager.store(), &path).await.unwrap();

        let (reloaded, _) = load_from_jsonl(&path, registry()).await.unwrap();
        assert_eq!(reloaded.len(), 1);
        let view = reloaded
            .read(&ConfigName::new("views.view.frontpage"))
            .unwrap();
        assert_eq!(view["dependencies"], json!({"module": ["views"]}));
        // Content is not owned by configuration and stays put.
        assert_eq!(reloaded.content_records().count(), 1);
    }
}
