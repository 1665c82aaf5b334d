//! Mock catalog server
//!
//! Endpoints:
//! - GET  /data_catalog/:type - Source records of one type
//! - POST /dataplex_catalog/:type/:id - Submit a resource for transfer
//! - GET  /dataplex_catalog/:type/:id - Stored record with `transfer_finished`

use crate::error::StoreError;
use crate::source::SourceCatalog;
use crate::store::CatalogStore;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Shared server state
#[derive(Debug, Clone, Default)]
pub struct MockState {
    /// Records served to migration sources
    pub source: SourceCatalog,
    /// Destination storage
    pub store: CatalogStore,
}

impl MockState {
    /// Create state
    #[must_use]
    pub fn new(source: SourceCatalog, store: CatalogStore) -> Self {
        Self { source, store }
    }
}

/// Build the application router
pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/data_catalog/:resource_type", get(list_resources))
        .route(
            "/dataplex_catalog/:resource_type/:resource_id",
            get(fetch_resource).post(submit_transfer),
        )
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C
///
/// # Errors
/// Returns the I/O error if binding or serving fails.
pub async fn serve(addr: SocketAddr, state: MockState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "mock catalog listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(%err, "failed to listen for shutdown signal");
            }
        })
        .await?;
    tracing::info!("mock catalog stopped");
    Ok(())
}

fn status_for(err: &StoreError) -> StatusCode {
    match err {
        StoreError::Rejected(_) => StatusCode::BAD_REQUEST,
        StoreError::NotFound => StatusCode::NOT_FOUND,
    }
}

fn error_body(message: impl std::fmt::Display) -> Json<Value> {
    Json(json!({ "error": message.to_string() }))
}

async fn list_resources(
    State(state): State<MockState>,
    Path(resource_type): Path<String>,
) -> Json<Vec<Value>> {
    Json(state.source.records(&resource_type))
}

async fn submit_transfer(
    State(state): State<MockState>,
    Path((resource_type, resource_id)): Path<(String, String)>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    // Content type is not required; any JSON body is accepted
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => return (StatusCode::BAD_REQUEST, error_body(err)),
    };

    match state.store.submit(&resource_type, &resource_id, payload) {
        Ok(()) => (StatusCode::ACCEPTED, Json(json!({ "error": false }))),
        Err(err) => {
            tracing::warn!(%resource_type, %resource_id, error = %err, "transfer rejected");
            (status_for(&err), error_body(err))
        }
    }
}

async fn fetch_resource(
    State(state): State<MockState>,
    Path((resource_type, resource_id)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    match state.store.get(&resource_type, &resource_id) {
        Ok(record) => (StatusCode::OK, Json(record)),
        Err(err) => (status_for(&err), error_body(err)),
    }
}
