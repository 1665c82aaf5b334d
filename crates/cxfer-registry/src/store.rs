//! In-memory destination catalog
//!
//! Accepted submissions are stored as pending. A timer task flips each one to
//! finished once the completion delay has elapsed, so clients have to poll.
//!
//! # Validation order
//!
//! 1. Resource type recognized
//! 2. Identifier not already stored
//! 3. Payload names its type
//! 4. Every dependency stored, and finished

use crate::error::StoreError;
use async_trait::async_trait;
use cxfer_core::{
    DestinationRegistry, RegistryError, Resource, ResourceId, ResourceType, TransferStatus,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Time between acceptance and completion when not configured
pub const DEFAULT_COMPLETION_DELAY: Duration = Duration::from_secs(10);

const TYPE_UNRECOGNIZED: &str = "Type unrecognized.";
const DUPLICATE_ID: &str = "Duplicate resource id.";
const TYPE_NOT_SPECIFIED: &str = "Resource type not specified.";
const UNSATISFIED_DEPENDENCY: &str = "Can not satisfy dependencies.";
const DEPENDENCY_PENDING: &str = "Dependency not yet transferred.";

/// Field added to fetched records
pub const FINISHED_FIELD: &str = "transfer_finished";

#[derive(Debug)]
struct StoredResource {
    payload: Map<String, Value>,
    finished: bool,
}

impl StoredResource {
    fn has_type(&self, resource_type: &str) -> bool {
        self.payload.get("type").and_then(Value::as_str) == Some(resource_type)
    }
}

/// Destination catalog shared by every handler of a server
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    entries: Arc<RwLock<IndexMap<ResourceId, StoredResource>>>,
    completion_delay: Duration,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore {
    /// Create empty store with the default completion delay
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(IndexMap::new())),
            completion_delay: DEFAULT_COMPLETION_DELAY,
        }
    }

    /// With completion delay
    #[inline]
    #[must_use]
    pub fn with_completion_delay(mut self, delay: Duration) -> Self {
        self.completion_delay = delay;
        self
    }

    /// Configured completion delay
    #[inline]
    #[must_use]
    pub fn completion_delay(&self) -> Duration {
        self.completion_delay
    }

    /// Number of stored resources, pending or finished
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing has been stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Accept a resource for transfer
    ///
    /// Must be called from within a tokio runtime; completion is scheduled
    /// on a spawned timer task.
    ///
    /// # Errors
    /// Returns `StoreError::Rejected` with the first violated rule.
    pub fn submit(&self, resource_type: &str, id: &str, payload: Value) -> Result<(), StoreError> {
        if resource_type.parse::<ResourceType>().is_err() {
            return Err(rejected(TYPE_UNRECOGNIZED));
        }

        let id = ResourceId::from(id);
        {
            let mut entries = self.entries.write();
            if entries.contains_key(&id) {
                return Err(rejected(DUPLICATE_ID));
            }

            let payload = match payload {
                Value::Object(map) if map.contains_key("type") => map,
                _ => return Err(rejected(TYPE_NOT_SPECIFIED)),
            };
            check_dependencies(&entries, &payload)?;

            entries.insert(
                id.clone(),
                StoredResource {
                    payload,
                    finished: false,
                },
            );
        }

        tracing::debug!(%id, resource_type, "transfer accepted");
        self.schedule_completion(id);
        Ok(())
    }

    /// Stored record plus its `transfer_finished` flag
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` when the id is unknown or stored under
    /// another type.
    pub fn get(&self, resource_type: &str, id: &str) -> Result<Value, StoreError> {
        let entries = self.entries.read();
        let stored = entries
            .get(id)
            .filter(|stored| stored.has_type(resource_type))
            .ok_or(StoreError::NotFound)?;

        let mut record = stored.payload.clone();
        record.insert(FINISHED_FIELD.to_string(), Value::Bool(stored.finished));
        Ok(Value::Object(record))
    }

    /// Completion flag for a stored resource
    ///
    /// # Errors
    /// Same as [`CatalogStore::get`].
    pub fn status(&self, resource_type: &str, id: &str) -> Result<TransferStatus, StoreError> {
        self.entries
            .read()
            .get(id)
            .filter(|stored| stored.has_type(resource_type))
            .map(|stored| TransferStatus {
                finished: stored.finished,
            })
            .ok_or(StoreError::NotFound)
    }

    fn schedule_completion(&self, id: ResourceId) {
        let entries = Arc::clone(&self.entries);
        let delay = self.completion_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(stored) = entries.write().get_mut(&id) {
                stored.finished = true;
                tracing::debug!(%id, "transfer finished");
            }
        });
    }
}

fn rejected(message: &str) -> StoreError {
    StoreError::Rejected(message.to_string())
}

fn check_dependencies(
    entries: &IndexMap<ResourceId, StoredResource>,
    payload: &Map<String, Value>,
) -> Result<(), StoreError> {
    let Some(dependencies) = payload.get("dependencies").and_then(Value::as_array) else {
        return Ok(());
    };

    for dependency in dependencies {
        let stored = dependency
            .as_str()
            .and_then(|id| entries.get(id))
            .ok_or_else(|| rejected(UNSATISFIED_DEPENDENCY))?;
        if !stored.finished {
            return Err(rejected(DEPENDENCY_PENDING));
        }
    }
    Ok(())
}

#[async_trait]
impl DestinationRegistry for CatalogStore {
    async fn submit_transfer(&self, resource: &Resource) -> Result<(), RegistryError> {
        let payload =
            serde_json::to_value(resource).map_err(|e| RegistryError::Malformed(e.to_string()))?;
        Ok(self.submit(resource.resource_type.as_str(), resource.id.as_str(), payload)?)
    }

    async fn fetch_status(
        &self,
        resource_type: ResourceType,
        id: &ResourceId,
    ) -> Result<TransferStatus, RegistryError> {
        Ok(self.status(resource_type.as_str(), id.as_str())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> CatalogStore {
        CatalogStore::new().with_completion_delay(Duration::from_secs(10))
    }

    fn message(result: Result<(), StoreError>) -> String {
        result.unwrap_err().to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_type_is_checked_first() {
        let store = store();
        store
            .submit("EntryGroup", "eg-1", json!({"id": "eg-1", "type": "EntryGroup"}))
            .unwrap();

        // Duplicate id and missing type as well, but the type wins
        let err = message(store.submit("Table", "eg-1", json!({})));
        assert_eq!(err, "Type unrecognized.");
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_checked_before_payload_type() {
        let store = store();
        store
            .submit("EntryGroup", "eg-1", json!({"id": "eg-1", "type": "EntryGroup"}))
            .unwrap();

        let err = message(store.submit("EntryGroup", "eg-1", json!({"id": "eg-1"})));
        assert_eq!(err, "Duplicate resource id.");
    }

    #[tokio::test(start_paused = true)]
    async fn payload_without_type_is_rejected() {
        let err = message(store().submit("EntryGroup", "eg-1", json!({"id": "eg-1"})));
        assert_eq!(err, "Resource type not specified.");
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_dependency_is_rejected() {
        let payload = json!({"id": "tt-1", "type": "TagTemplate", "dependencies": ["eg-1"]});
        let err = message(store().submit("TagTemplate", "tt-1", payload));
        assert_eq!(err, "Can not satisfy dependencies.");
    }

    #[tokio::test(start_paused = true)]
    async fn pending_dependency_is_rejected_until_finished() {
        let store = store();
        store
            .submit("EntryGroup", "eg-1", json!({"id": "eg-1", "type": "EntryGroup"}))
            .unwrap();
        let payload = json!({"id": "tt-1", "type": "TagTemplate", "dependencies": ["eg-1"]});

        let err = message(store.submit("TagTemplate", "tt-1", payload.clone()));
        assert_eq!(err, "Dependency not yet transferred.");

        tokio::time::sleep(Duration::from_secs(11)).await;
        store.submit("TagTemplate", "tt-1", payload).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_flips_after_delay() {
        let store = store();
        store
            .submit("EntryGroup", "eg-1", json!({"id": "eg-1", "type": "EntryGroup"}))
            .unwrap();

        let record = store.get("EntryGroup", "eg-1").unwrap();
        assert_eq!(record["transfer_finished"], json!(false));

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(!store.status("EntryGroup", "eg-1").unwrap().finished);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let record = store.get("EntryGroup", "eg-1").unwrap();
        assert_eq!(record["transfer_finished"], json!(true));
        assert_eq!(record["id"], json!("eg-1"));
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_under_other_type_is_not_found() {
        let store = store();
        store
            .submit("EntryGroup", "eg-1", json!({"id": "eg-1", "type": "EntryGroup"}))
            .unwrap();

        assert_eq!(store.get("TagTemplate", "eg-1"), Err(StoreError::NotFound));
        assert_eq!(store.get("EntryGroup", "nope"), Err(StoreError::NotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn registry_impl_maps_rejections() {
        let store = store();
        let resource = Resource::new("tt-1", ResourceType::TagTemplate).with_dependencies(["eg-9"]);

        let err = store.submit_transfer(&resource).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::Validation("Can not satisfy dependencies.".into())
        );

        let err = store
            .fetch_status(ResourceType::TagTemplate, &ResourceId::from("tt-1"))
            .await
            .unwrap_err();
        assert!(err.is_transient_miss());
    }
}
