//! Source catalog backed by a JSON seed

use crate::error::SourceError;
use async_trait::async_trait;
use cxfer_core::{RegistryError, Resource, ResourceType, SourceRegistry};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Read-only catalog of raw resource records
///
/// Records are served exactly as seeded. Those without a `type` field are
/// never listed.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    records: Arc<Vec<Value>>,
}

impl SourceCatalog {
    /// Create catalog from records
    #[must_use]
    pub fn from_records(records: Vec<Value>) -> Self {
        Self {
            records: Arc::new(records),
        }
    }

    /// Parse a JSON array of records
    ///
    /// # Errors
    /// `Parse` for invalid JSON, `NotAnArray` for any other top-level value.
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        match serde_json::from_str(text)? {
            Value::Array(records) => Ok(Self::from_records(records)),
            _ => Err(SourceError::NotAnArray),
        }
    }

    /// Load a seed file
    ///
    /// # Errors
    /// `Read` if the file is unreadable, otherwise as [`SourceCatalog::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&text)?;
        tracing::info!(path = %path.display(), records = catalog.len(), "catalog seed loaded");
        Ok(catalog)
    }

    /// Number of seeded records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the seed was empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose `type` equals `resource_type`, in seed order
    #[must_use]
    pub fn records(&self, resource_type: &str) -> Vec<Value> {
        self.records
            .iter()
            .filter(|record| record.get("type").and_then(Value::as_str) == Some(resource_type))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SourceRegistry for SourceCatalog {
    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<Resource>, RegistryError> {
        self.records(resource_type.as_str())
            .into_iter()
            .map(|record| {
                serde_json::from_value(record).map_err(|e| RegistryError::Malformed(e.to_string()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"[
        {"id": "eg-1", "type": "EntryGroup", "name": "orders"},
        {"id": "tt-1", "type": "TagTemplate", "dependencies": ["eg-1"]},
        {"id": "untyped"},
        {"id": "eg-2", "type": "EntryGroup"}
    ]"#;

    #[test]
    fn records_filter_by_type_in_seed_order() {
        let catalog = SourceCatalog::from_json_str(SEED).unwrap();

        let groups = catalog.records("EntryGroup");
        let ids: Vec<&str> = groups.iter().filter_map(|r| r["id"].as_str()).collect();

        assert_eq!(ids, vec!["eg-1", "eg-2"]);
        assert!(catalog.records("Table").is_empty());
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn non_array_seed_is_rejected() {
        let result = SourceCatalog::from_json_str(r#"{"id": "eg-1"}"#);
        assert!(matches!(result, Err(SourceError::NotAnArray)));
    }

    #[test]
    fn load_reads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let catalog = SourceCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.records("TagTemplate").len(), 1);
    }

    #[tokio::test]
    async fn lists_typed_resources() {
        let catalog = SourceCatalog::from_json_str(SEED).unwrap();

        let templates = catalog
            .list_resources(ResourceType::TagTemplate)
            .await
            .unwrap();

        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id.as_str(), "tt-1");
        assert_eq!(templates[0].dependencies[0].as_str(), "eg-1");
    }

    #[tokio::test]
    async fn record_without_id_is_malformed() {
        let catalog = SourceCatalog::from_records(vec![serde_json::json!({"type": "EntryGroup"})]);

        let err = catalog
            .list_resources(ResourceType::EntryGroup)
            .await
            .unwrap_err();

        assert!(matches!(err, RegistryError::Malformed(_)));
    }
}
