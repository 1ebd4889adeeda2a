use axum::http::HeaderMap;
use std::sync::Arc;

use super::UserDeletionError;
use crate::auth::{extract_bearer_token, CallerIdentity};
use crate::identity::{AuthService, IdentityError};

/// Turns the Authorization header into a verified caller identity.
/// Verification goes to the identity service on every request so revoked
/// credentials stop working immediately.
#[derive(Clone)]
pub struct RequestAuthenticator {
    auth: Arc<dyn AuthService>,
}

impl RequestAuthenticator {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self { auth }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<CallerIdentity, UserDeletionError> {
        let token = extract_bearer_token(headers).map_err(|reason| {
            tracing::debug!(reason = %reason, "No usable bearer credential");
            UserDeletionError::Unauthenticated
        })?;

        match self.auth.verify_credential(token).await {
            Ok(identity) => Ok(identity),
            Err(IdentityError::InvalidCredential(reason)) | Err(IdentityError::NotFound(reason)) => {
                tracing::warn!(reason = %reason, "Credential rejected");
                Err(UserDeletionError::InvalidCredential)
            }
            Err(e) => Err(UserDeletionError::InternalError(format!(
                "credential verification failed: {}",
                e
            ))),
        }
    }
}
