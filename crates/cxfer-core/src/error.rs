//! Error types for catalog transfer
//!
//! Provides error handling for:
//! - Registry client operations (discriminated by failure kind)
//! - Per-resource transfer failures
//! - Pipeline-level validation aborts
//! - Configuration loading

use crate::types::{ResourceId, ResourceType};
use std::path::PathBuf;

/// Failure of a single registry client operation
///
/// Every variant carries the server-reported or transport message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Transport failure talking to the registry
    #[error("networking error: {0}")]
    Networking(String),

    /// Response arrived but could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Business-rule rejection (4xx class)
    #[error("validation error: {0}")]
    Validation(String),

    /// Registry-side failure (5xx class)
    #[error("server error: {0}")]
    Server(String),

    /// Resource unknown to the registry
    #[error("not found: {0}")]
    NotFound(String),
}

impl RegistryError {
    /// Check if a status poll returning this error counts as a miss rather than a failure
    ///
    /// Only transport failures and 4xx rejections end polling early.
    #[inline]
    #[must_use]
    pub fn is_transient_miss(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::NotFound(_) | Self::Server(_))
    }

    /// Server or transport message
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Networking(m)
            | Self::Malformed(m)
            | Self::Validation(m)
            | Self::Server(m)
            | Self::NotFound(m) => m,
        }
    }
}

/// Kinds of per-resource transfer failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferErrorKind {
    /// Destination rejected the submission
    Validation,
    /// Destination failed while accepting the submission
    Server,
    /// Transport or decoding failure
    Networking,
    /// Completion polling exhausted its attempts
    Timeout,
    /// Transfer task panicked
    Panicked,
}

impl std::fmt::Display for TransferErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Validation => "validation error",
            Self::Server => "server error",
            Self::Networking => "networking error",
            Self::Timeout => "timeout",
            Self::Panicked => "task panicked",
        };
        f.write_str(name)
    }
}

/// Failure transferring one resource
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} transferring {resource_type} '{resource}': {message}")]
pub struct TransferError {
    /// Resource being transferred
    pub resource: ResourceId,
    /// Type of the resource
    pub resource_type: ResourceType,
    /// Failure kind
    pub kind: TransferErrorKind,
    /// Human-readable detail, server message when available
    pub message: String,
}

impl TransferError {
    /// Create transfer error
    #[must_use]
    pub fn new(
        resource: ResourceId,
        resource_type: ResourceType,
        kind: TransferErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            resource_type,
            kind,
            message: message.into(),
        }
    }

    /// Build from a registry client error, keeping its message
    #[must_use]
    pub fn from_registry(
        resource: ResourceId,
        resource_type: ResourceType,
        error: &RegistryError,
    ) -> Self {
        let kind = match error {
            RegistryError::Validation(_) => TransferErrorKind::Validation,
            RegistryError::Server(_) => TransferErrorKind::Server,
            RegistryError::Networking(_)
            | RegistryError::Malformed(_)
            | RegistryError::NotFound(_) => TransferErrorKind::Networking,
        };
        Self::new(resource, resource_type, kind, error.message())
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            TransferErrorKind::Server | TransferErrorKind::Networking | TransferErrorKind::Timeout
        )
    }
}

/// Pipeline-level failure raised before any transfer begins
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Source registry could not be read
    #[error("unable to fetch {resource_type} resources: {source}")]
    Load {
        /// Type being listed
        resource_type: ResourceType,
        /// Underlying client error
        #[source]
        source: RegistryError,
    },

    /// Source data contains repeated identifiers
    #[error("duplicate resource identifiers in source data: {}", join_ids(.ids))]
    DuplicateResources {
        /// Every identifier seen more than once
        ids: Vec<ResourceId>,
    },

    /// Some resources cannot be placed in any layer
    #[error(
        "validation failed for {} identifier(s): missing [{}], cyclic [{}]",
        .missing.len() + .cyclic.len(),
        join_ids(.missing),
        join_ids(.cyclic)
    )]
    UnresolvedResources {
        /// Absent identifiers and the resources depending on them
        missing: Vec<ResourceId>,
        /// Part of a dependency cycle
        cyclic: Vec<ResourceId>,
    },
}

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn join_ids(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ResourceId::as_str)
        .collect::<Vec<_>>()
        .join(",")
}
