pub mod remote;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::CallerIdentity;
use crate::google::CredentialError;

pub use remote::IdentityToolkitClient;

#[derive(Debug, Error)]
pub enum IdentityError {
    /// Expired, malformed, revoked, or otherwise unverifiable credential
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Identity service error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Authentication directory: verifies bearer credentials and owns the
/// account records. Implementations are shared across concurrent requests.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn verify_credential(&self, token: &str) -> Result<CallerIdentity, IdentityError>;

    async fn delete_identity(&self, uid: &str) -> Result<(), IdentityError>;
}
