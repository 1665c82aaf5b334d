//! Registry contracts
//!
//! The source and destination registries are consumed through these traits.
//! HTTP clients, the in-memory store and test fakes all implement them, so the
//! orchestration never depends on a transport.

use crate::error::RegistryError;
use crate::types::{Resource, ResourceId, ResourceType, TransferStatus};
use async_trait::async_trait;

/// Registry resources are read from
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    /// List every resource of the given type
    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<Resource>, RegistryError>;
}

/// Registry resources are transferred to
///
/// Submissions complete asynchronously: a successful submit only means the
/// destination accepted the resource, and [`fetch_status`](Self::fetch_status)
/// must be polled until it reports the transfer finished.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DestinationRegistry: Send + Sync {
    /// Submit a resource for transfer
    async fn submit_transfer(&self, resource: &Resource) -> Result<(), RegistryError>;

    /// Fetch the transfer status of a previously submitted resource
    async fn fetch_status(
        &self,
        resource_type: ResourceType,
        id: &ResourceId,
    ) -> Result<TransferStatus, RegistryError>;
}
