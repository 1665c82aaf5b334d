//! Error types for registry collaborators

use cxfer_core::RegistryError;
use std::path::PathBuf;

/// Rejection reported by the in-memory destination store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Submission violates a business rule
    #[error("{0}")]
    Rejected(String),

    /// No resource with this id and type
    #[error("Not Found.")]
    NotFound,
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(message) => RegistryError::Validation(message),
            not_found @ StoreError::NotFound => RegistryError::NotFound(not_found.to_string()),
        }
    }
}

/// Failure loading a source catalog seed
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Seed file could not be read
    #[error("failed to read catalog seed {}: {source}", .path.display())]
    Read {
        /// Seed location
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Seed is not valid JSON
    #[error("invalid catalog seed: {0}")]
    Parse(#[from] serde_json::Error),

    /// Seed JSON is not an array of records
    #[error("catalog seed must be a JSON array of resources")]
    NotAnArray,
}

/// Failure constructing an HTTP registry client
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Endpoint is not usable as a base URL
    #[error("invalid registry endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured
        endpoint: String,
        /// Why it was rejected
        reason: String,
    },

    /// HTTP client could not be built
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}
