use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::{value, Document, DocumentStore, StoreError};
use crate::config::StoreConfig;
use crate::google::{self, AccessTokenProvider};

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// REST client for the hosted document database
#[derive(Clone)]
pub struct FirestoreClient {
    client: reqwest::Client,
    tokens: AccessTokenProvider,
    base_url: String,
    project_id: String,
    database_id: String,
}

impl FirestoreClient {
    pub fn new(client: reqwest::Client, config: &StoreConfig, tokens: AccessTokenProvider) -> Self {
        Self {
            client,
            tokens,
            base_url: config.api_base_url.clone(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
        }
    }

    /// `{base}/v1/projects/{p}/databases/{db}/documents/{collection}/{id}`,
    /// each segment percent-encoded
    fn document_url(&self, collection: &str, id: &str) -> Result<Url, StoreError> {
        validate_segment(collection)?;
        validate_segment(id)?;

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| StoreError::InvalidPath(format!("bad base url '{}': {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidPath(format!("base url '{}' cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database_id.as_str(),
                "documents",
                collection,
                id,
            ]);
        Ok(url)
    }
}

fn validate_segment(segment: &str) -> Result<(), StoreError> {
    if segment.trim().is_empty() || segment.contains('/') || segment == "." || segment == ".." {
        return Err(StoreError::InvalidPath(format!("'{}' is not a valid path segment", segment)));
    }
    Ok(())
}

async fn upstream_error(response: reqwest::Response) -> StoreError {
    let status = response.status();
    let message = match response.json::<ErrorEnvelope>().await {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    StoreError::Upstream {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = self.document_url(collection, id)?;
        let request = google::authorize(self.client.get(url), &self.tokens).await?;
        let response = request.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(collection = %collection, id = %id, "Document not found");
                Ok(None)
            }
            status if status.is_success() => {
                let raw: RawDocument = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Decode(e.to_string()))?;
                value::decode_fields(&raw.fields).map(Some)
            }
            _ => Err(upstream_error(response).await),
        }
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let url = self.document_url(collection, id)?;
        let request = google::authorize(self.client.delete(url), &self.tokens).await?;
        let response = request.send().await?;

        match response.status() {
            // The service already answers 200 for absent documents; 404 is
            // accepted too so cleanup retries stay idempotent
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => {
                tracing::info!(collection = %collection, id = %id, "Deleted document");
                Ok(())
            }
            _ => Err(upstream_error(response).await),
        }
    }
}
