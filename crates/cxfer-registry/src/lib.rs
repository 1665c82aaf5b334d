//! cxfer registry - collaborators for catalog transfer
//!
//! - HTTP clients implementing the core registry traits
//! - An in-memory destination store with delayed completion
//! - A source catalog served from a JSON seed
//! - An axum server exposing both catalogs for local runs and tests

#![warn(unreachable_pub)]

pub mod error;
pub mod http;
pub mod server;
pub mod source;
pub mod store;

pub use error::{ClientError, SourceError, StoreError};
pub use http::{DestinationHttpClient, SourceHttpClient};
pub use server::{router, serve, MockState};
pub use source::SourceCatalog;
pub use store::{CatalogStore, DEFAULT_COMPLETION_DELAY};
