//! cxfer core - dependency-layered catalog transfer
//!
//! Moves catalog resources (entry groups, tag templates) from a source
//! registry to a destination registry:
//! - Drops identifiers that repeat in the source batch
//! - Resolves dependencies into layers, excluding missing and cyclic resources
//! - Transfers each layer concurrently with a barrier between layers
//! - Polls the destination with exponential backoff until each transfer finishes
//!
//! # Example
//!
//! ```rust,ignore
//! use cxfer_core::{Migration, TransferConfig};
//!
//! # async fn example(source: Arc<dyn SourceRegistry>, destination: Arc<dyn DestinationRegistry>) {
//! let migration = Migration::new(source, destination, TransferConfig::new());
//! let report = migration.run().await?;
//! assert!(report.is_success());
//! # }
//! ```

#![warn(unreachable_pub)]

// Core modules
pub mod config;
pub mod dedup;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod worker;

// Re-exports for convenience
pub use config::{PollPolicy, SubmitPolicy, TransferConfig, DEFAULT_ENDPOINT};
pub use dedup::{deduplicate, find_duplicates, Deduplicated};
pub use error::{ConfigError, MigrationError, RegistryError, TransferError, TransferErrorKind};
pub use orchestrator::{RunOutcome, TransferOrchestrator};
pub use pipeline::{Migration, MigrationOutcome, MigrationPlan, MigrationReport};
pub use registry::{DestinationRegistry, SourceRegistry};
pub use resolver::{DependencyResolver, Resolution};
pub use types::{Layer, Resource, ResourceId, ResourceType, TransferStatus, UnknownResourceType};
pub use worker::{TransferReceipt, TransferWorker};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
