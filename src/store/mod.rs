pub mod firestore;
pub mod value;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::google::CredentialError;

pub use firestore::FirestoreClient;

/// A stored document decoded to plain JSON fields
pub type Document = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document store returned HTTP {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to decode document: {0}")]
    Decode(String),

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Hosted document database. Implementations are shared across concurrent
/// requests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document; `Ok(None)` when it does not exist
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Delete a document. Deleting an absent document succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}
