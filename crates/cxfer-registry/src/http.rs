//! HTTP registry clients
//!
//! Both clients share one wire convention: paths are appended to the
//! configured base URL as percent-encoded segments, and error responses carry
//! a JSON body of the form `{"error": "<message>"}`.

use crate::error::ClientError;
use async_trait::async_trait;
use cxfer_core::{
    DestinationRegistry, RegistryError, Resource, ResourceId, ResourceType, SourceRegistry,
    TransferConfig, TransferStatus,
};
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const SOURCE_PATH: &str = "data_catalog";
const DESTINATION_PATH: &str = "dataplex_catalog";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Value,
}

/// Client plus normalized base URL
#[derive(Debug, Clone)]
struct Endpoint {
    client: Client,
    base_url: Url,
}

impl Endpoint {
    fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = Url::parse(endpoint).map_err(|err| ClientError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "not a base URL".to_string(),
            });
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn networking(err: &reqwest::Error) -> RegistryError {
    RegistryError::Networking(err.to_string())
}

/// Message from an `{"error": ...}` body, falling back to the raw text
async fn error_message(response: Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => match serde_json::from_str::<ErrorBody>(&text) {
            Ok(ErrorBody {
                error: Value::String(message),
            }) => message,
            _ if text.trim().is_empty() => status.to_string(),
            _ => text,
        },
        Err(err) => format!("unreadable error response ({status}): {err}"),
    }
}

/// Client for the source catalog (`GET {base}/data_catalog/{type}`)
#[derive(Debug, Clone)]
pub struct SourceHttpClient {
    endpoint: Endpoint,
}

impl SourceHttpClient {
    /// Create client for a registry base URL
    ///
    /// # Errors
    /// Returns `ClientError` if the endpoint is not a usable base URL.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: Endpoint::new(endpoint, timeout)?,
        })
    }

    /// Create client from transfer configuration
    ///
    /// # Errors
    /// Same as [`SourceHttpClient::new`].
    pub fn from_config(config: &TransferConfig) -> Result<Self, ClientError> {
        Self::new(&config.endpoint, config.request_timeout())
    }
}

#[async_trait]
impl SourceRegistry for SourceHttpClient {
    async fn list_resources(
        &self,
        resource_type: ResourceType,
    ) -> Result<Vec<Resource>, RegistryError> {
        let url = self.endpoint.url(&[SOURCE_PATH, resource_type.as_str()]);
        tracing::debug!(%url, "listing source resources");

        let response = self
            .endpoint
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| networking(&err))?;
        let status = response.status();

        let body: Value = response
            .json()
            .await
            .map_err(|_| RegistryError::Networking("could not retrieve resources".to_string()))?;

        if !status.is_success() {
            let message = match body.get("error") {
                Some(Value::String(message)) => message.clone(),
                _ => format!("error response in unsupported format ({status})"),
            };
            return Err(RegistryError::Server(message));
        }

        let Value::Array(records) = body else {
            return Err(RegistryError::Malformed(
                "expected a list of resources".to_string(),
            ));
        };
        records.into_iter().map(decode_record).collect()
    }
}

fn decode_record(record: Value) -> Result<Resource, RegistryError> {
    if record.get("id").is_none() {
        return Err(RegistryError::Malformed("resource id not found".to_string()));
    }
    if record.get("type").is_none() {
        return Err(RegistryError::Malformed(
            "resource type not found".to_string(),
        ));
    }
    serde_json::from_value(record).map_err(|err| RegistryError::Malformed(err.to_string()))
}

/// Client for the destination catalog (`{base}/dataplex_catalog/{type}/{id}`)
#[derive(Debug, Clone)]
pub struct DestinationHttpClient {
    endpoint: Endpoint,
}

impl DestinationHttpClient {
    /// Create client for a registry base URL
    ///
    /// # Errors
    /// Returns `ClientError` if the endpoint is not a usable base URL.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        Ok(Self {
            endpoint: Endpoint::new(endpoint, timeout)?,
        })
    }

    /// Create client from transfer configuration
    ///
    /// # Errors
    /// Same as [`DestinationHttpClient::new`].
    pub fn from_config(config: &TransferConfig) -> Result<Self, ClientError> {
        Self::new(&config.endpoint, config.request_timeout())
    }

    fn resource_url(&self, resource_type: ResourceType, id: &ResourceId) -> Url {
        self.endpoint
            .url(&[DESTINATION_PATH, resource_type.as_str(), id.as_str()])
    }
}

#[async_trait]
impl DestinationRegistry for DestinationHttpClient {
    async fn submit_transfer(&self, resource: &Resource) -> Result<(), RegistryError> {
        let url = self.resource_url(resource.resource_type, &resource.id);

        let response = self
            .endpoint
            .client
            .post(url)
            .json(resource)
            .send()
            .await
            .map_err(|err| networking(&err))?;
        let status = response.status();

        let body: Value = response
            .json()
            .await
            .map_err(|err| RegistryError::Malformed(format!("unable to decode response: {err}")))?;

        let message = || match body.get("error") {
            Some(Value::String(message)) => message.clone(),
            _ => status.to_string(),
        };
        if status.is_client_error() {
            return Err(RegistryError::Validation(message()));
        }
        if status.is_server_error() {
            return Err(RegistryError::Server(message()));
        }
        Ok(())
    }

    async fn fetch_status(
        &self,
        resource_type: ResourceType,
        id: &ResourceId,
    ) -> Result<TransferStatus, RegistryError> {
        let url = self.resource_url(resource_type, id);

        let response = self
            .endpoint
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| networking(&err))?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(RegistryError::NotFound(error_message(response).await));
        }
        if status.is_client_error() {
            return Err(RegistryError::Validation(error_message(response).await));
        }
        if status.is_server_error() {
            return Err(RegistryError::Server(error_message(response).await));
        }

        response
            .json::<TransferStatus>()
            .await
            .map_err(|err| RegistryError::Malformed(err.to_string()))
    }
}
