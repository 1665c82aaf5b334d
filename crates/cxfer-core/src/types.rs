//! Core types for catalog transfer
//!
//! Defines the data model shared by every stage:
//! - Resource identifiers and types
//! - Resources with their dependency lists and opaque payloads
//! - Layers produced by the resolver
//! - Destination-observed transfer status

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::str::FromStr;

/// Identifier of a catalog resource, unique within a valid batch
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Create identifier from any string-like value
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ResourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Kind of catalog resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// Entry group
    EntryGroup,
    /// Tag template
    TagTemplate,
}

impl ResourceType {
    /// Every supported type, in source load order
    pub const ALL: [ResourceType; 2] = [ResourceType::EntryGroup, ResourceType::TagTemplate];

    /// Wire name of the type
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::EntryGroup => "EntryGroup",
            ResourceType::TagTemplate => "TagTemplate",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a type name is not recognized
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized resource type: {0}")]
pub struct UnknownResourceType(pub String);

impl FromStr for ResourceType {
    type Err = UnknownResourceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EntryGroup" => Ok(ResourceType::EntryGroup),
            "TagTemplate" => Ok(ResourceType::TagTemplate),
            other => Err(UnknownResourceType(other.to_string())),
        }
    }
}

/// A catalog resource as listed by the source registry
///
/// Type-specific fields live in `payload` and are forwarded to the
/// destination untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource identifier
    pub id: ResourceId,
    /// Resource type
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Identifiers this resource depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<ResourceId>,
    /// Opaque type-specific fields
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Resource {
    /// Create resource without dependencies or payload
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ResourceId>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            resource_type,
            dependencies: Vec::new(),
            payload: Map::new(),
        }
    }

    /// With dependencies
    #[must_use]
    pub fn with_dependencies<I, D>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<ResourceId>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// With an extra payload field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }
}

/// Group of resources whose dependencies are all satisfied by earlier layers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layer {
    resources: Vec<Resource>,
}

impl Layer {
    /// Create layer from resources
    #[inline]
    #[must_use]
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Resources in this layer
    #[inline]
    #[must_use]
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Identifiers of the resources in this layer
    pub fn ids(&self) -> impl Iterator<Item = &ResourceId> {
        self.resources.iter().map(|r| &r.id)
    }

    /// Number of resources
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the layer has no resources
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Iterate over resources
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }
}

impl<'a> IntoIterator for &'a Layer {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

/// Transfer status reported by the destination registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStatus {
    /// Whether the destination finished processing the resource
    #[serde(rename = "transfer_finished")]
    pub finished: bool,
}

impl TransferStatus {
    /// Submitted but not yet complete
    pub const PENDING: TransferStatus = TransferStatus { finished: false };
    /// Complete
    pub const COMPLETED: TransferStatus = TransferStatus { finished: true };
}
