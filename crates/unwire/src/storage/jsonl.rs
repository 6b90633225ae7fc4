//! JSONL persistence for the in-memory configuration store.
//!
//! Each line of the file is one tagged record:
//!
//! ```text
//! {"type":"config","name":"views.view.frontpage","data":{"uuid":"...","dependencies":{"module":["node"]}}}
//! {"type":"content","entity_type":"node","bundle":"page","uuid":"..."}
//! ```

use super::in_memory::InMemoryConfigStore;
use super::registry::EntityTypeRegistry;
use crate::domain::{ConfigName, ContentEntity};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};

/// One line of a JSONL corpus file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredRecord {
    /// A configuration object
    Config {
        /// Config name
        name: ConfigName,
        /// Raw data
        data: Value,
    },

    /// A content record
    Content(ContentEntity),
}

/// Non-fatal problems found while loading a JSONL corpus.
///
/// The offending line is skipped and loading continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Line was not valid JSON or not a known record shape
    MalformedJson {
        /// 1-based line number
        line_number: usize,
        /// Parser error message
        error: String,
    },

    /// Config record whose data is not a JSON object
    InvalidConfigData {
        /// Config name
        name: ConfigName,
        /// 1-based line number
        line_number: usize,
    },

    /// A config name appeared again; the later record wins
    DuplicateConfig {
        /// Config name
        name: ConfigName,
        /// 1-based line number of the later record
        line_number: usize,
    },
}

/// Load a store from a JSONL file.
///
/// Blank lines are ignored. Malformed lines are skipped and reported in the
/// returned warnings.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be opened or read.
pub async fn load_from_jsonl(
    path: &Path,
    registry: EntityTypeRegistry,
) -> Result<(InMemoryConfigStore, Vec<LoadWarning>)> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();

    let mut store = InMemoryConfigStore::new(registry);
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }

        let record = match serde_json::from_str::<StoredRecord>(&line) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line_number, error = %e, "Skipping malformed line");
                warnings.push(LoadWarning::MalformedJson {
                    line_number,
                    error: e.to_string(),
                });
                continue;
            }
        };

        match record {
            StoredRecord::Config { name, data } => {
                if !data.is_object() {
                    warnings.push(LoadWarning::InvalidConfigData { name, line_number });
                    continue;
                }
                if !seen.insert(name.clone()) {
                    warnings.push(LoadWarning::DuplicateConfig {
                        name: name.clone(),
                        line_number,
                    });
                }
                store.insert_config(name, data);
            }
            StoredRecord::Content(content) => store.insert_content(content),
        }
    }

    tracing::debug!(
        path = %path.display(),
        objects = store.len(),
        warnings = warnings.len(),
        "Loaded configuration corpus"
    );

    Ok((store, warnings))
}

/// Save a store to a JSONL file.
///
/// Config records are written in name order, followed by content records.
/// The write goes to a temporary file that is then renamed over `path`, so
/// an interrupted save leaves the original file intact.
///
/// # Errors
///
/// Returns `Error::Io` on write failures and `Error::Json` if a record
/// cannot be serialized.
pub async fn save_to_jsonl(store: &InMemoryConfigStore, path: &Path) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let file = File::create(&temp_path).await?;
    let mut writer = BufWriter::new(file);

    let configs = super::ConfigSource::list_all(store)
        .into_iter()
        .map(|(name, data)| StoredRecord::Config { name, data });
    let contents = store.content_records().cloned().map(StoredRecord::Content);

    for record in configs.chain(contents) {
        let json = serde_json::to_string(&record)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }

    writer.flush().await?;
    drop(writer);

    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| Error::Storage(format!("Failed to replace {}: {e}", path.display())))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_shapes() {
        let config: StoredRecord = serde_json::from_value(json!({
            "type": "config",
            "name": "views.view.frontpage",
            "data": {"uuid": "f1"}
        }))
        .unwrap();
        assert!(matches!(config, StoredRecord::Config { ref name, .. } if name.as_str() == "views.view.frontpage"));

        let content: StoredRecord = serde_json::from_value(json!({
            "type": "content",
            "entity_type": "node",
            "bundle": "page",
            "uuid": "c1"
        }))
        .unwrap();
        assert!(matches!(content, StoredRecord::Content(ref c) if c.uuid == "c1"));

        let rendered = serde_json::to_value(&content).unwrap();
        assert_eq!(rendered["type"], "content");
        assert!(rendered.get("label").is_none());
    }

    #[test]
    fn test_unknown_record_type_is_rejected() {
        let result = serde_json::from_value::<StoredRecord>(json!({"type": "theme", "name": "x"}));
        assert!(result.is_err());
    }
}
