//! Authorization-gated user deletion.
//!
//! A request flows through three stages, each of which may end it:
//!
//! 1. [`RequestAuthenticator`] verifies the bearer credential on every call.
//! 2. [`AuthorizationChecker`] forbids self-deletion and requires the caller's
//!    stored profile to grant `canManageUsers`. It hands out a
//!    [`DeletionGrant`], the only way to reach the next stage.
//! 3. [`DeletionOrchestrator`] removes the identity record, then the profile
//!    document. The two systems are not updated atomically: if the document
//!    step fails after the identity record is gone, the caller gets
//!    [`UserDeletionError::PartialDeletion`] and the remedy is an idempotent
//!    document-only retry ([`UserDeletionService::purge_user_profile`]).

pub mod authenticator;
pub mod authorization;
pub mod orchestrator;

use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::identity::AuthService;
use crate::store::DocumentStore;

pub use authenticator::RequestAuthenticator;
pub use authorization::{AuthorizationChecker, DeletionGrant};
pub use orchestrator::{DeletionOrchestrator, DeletionReport};

/// Step that failed after the identity record was removed. An identity-step
/// failure leaves nothing half-deleted, so only the document step appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeletionStep {
    Document,
}

impl std::fmt::Display for DeletionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletionStep::Document => write!(f, "document"),
        }
    }
}

/// Progress of a single invocation, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStage {
    Start,
    Authenticated,
    Authorized,
    AuthDeleted,
    Completed,
    Failed(&'static str),
}

impl std::fmt::Display for DeletionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeletionStage::Start => write!(f, "start"),
            DeletionStage::Authenticated => write!(f, "authenticated"),
            DeletionStage::Authorized => write!(f, "authorized"),
            DeletionStage::AuthDeleted => write!(f, "auth_deleted"),
            DeletionStage::Completed => write!(f, "completed"),
            DeletionStage::Failed(kind) => write!(f, "failed({})", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserDeletionError {
    #[error("User id is required")]
    MissingTarget,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid or expired credential")]
    InvalidCredential,

    #[error("Users cannot delete their own account")]
    SelfDeletionForbidden,

    #[error("Caller profile not found")]
    ProfileNotFound,

    #[error("Caller lacks the canManageUsers permission")]
    PermissionDenied,

    #[error("User '{0}' not found")]
    TargetNotFound(String),

    #[error("User '{target}' partially deleted: {failed_step} step failed: {reason}")]
    PartialDeletion {
        target: String,
        failed_step: DeletionStep,
        reason: String,
    },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl UserDeletionError {
    /// Stable kind name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            UserDeletionError::MissingTarget => "missing_target",
            UserDeletionError::Unauthenticated => "unauthenticated",
            UserDeletionError::InvalidCredential => "invalid_credential",
            UserDeletionError::SelfDeletionForbidden => "self_deletion_forbidden",
            UserDeletionError::ProfileNotFound => "profile_not_found",
            UserDeletionError::PermissionDenied => "permission_denied",
            UserDeletionError::TargetNotFound(_) => "target_not_found",
            UserDeletionError::PartialDeletion { .. } => "partial_deletion",
            UserDeletionError::InternalError(_) => "internal_error",
        }
    }
}

/// Entry point used by the HTTP handlers
#[derive(Clone)]
pub struct UserDeletionService {
    authenticator: RequestAuthenticator,
    checker: AuthorizationChecker,
    orchestrator: DeletionOrchestrator,
}

impl UserDeletionService {
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        users_collection: impl Into<String>,
    ) -> Self {
        let users_collection = users_collection.into();
        Self {
            authenticator: RequestAuthenticator::new(auth.clone()),
            checker: AuthorizationChecker::new(store.clone(), users_collection.clone()),
            orchestrator: DeletionOrchestrator::new(auth, store, users_collection),
        }
    }

    /// Delete `target_id` from the identity service and the document store
    #[instrument(
        skip(self, headers),
        fields(deletion_id = %uuid::Uuid::new_v4(), caller = tracing::field::Empty)
    )]
    pub async fn delete_user(
        &self,
        headers: &HeaderMap,
        target_id: &str,
    ) -> Result<DeletionReport, UserDeletionError> {
        let result = async {
            let grant = self.authorize(headers, target_id).await?;
            self.orchestrator.delete(grant).await
        }
        .await;

        match &result {
            Ok(_) => tracing::info!(stage = %DeletionStage::Completed, "User deleted"),
            Err(e) => log_failure(e),
        }
        result
    }

    /// Remove only the profile document of `target_id`. Used to finish a
    /// deletion that previously ended in `PartialDeletion`; succeeds when the
    /// document is already gone.
    #[instrument(
        skip(self, headers),
        fields(deletion_id = %uuid::Uuid::new_v4(), caller = tracing::field::Empty)
    )]
    pub async fn purge_user_profile(&self, headers: &HeaderMap, target_id: &str) -> Result<(), UserDeletionError> {
        let result = async {
            let grant = self.authorize(headers, target_id).await?;
            self.orchestrator.purge_profile(grant).await
        }
        .await;

        match &result {
            Ok(()) => tracing::info!(stage = %DeletionStage::Completed, "User profile purged"),
            Err(e) => log_failure(e),
        }
        result
    }

    async fn authorize(&self, headers: &HeaderMap, target_id: &str) -> Result<DeletionGrant, UserDeletionError> {
        // Blank ids are rejected, but a non-blank id is used verbatim
        if target_id.trim().is_empty() {
            return Err(UserDeletionError::MissingTarget);
        }
        tracing::debug!(stage = %DeletionStage::Start);

        let caller = self.authenticator.authenticate(headers).await?;
        tracing::Span::current().record("caller", caller.as_str());
        tracing::debug!(stage = %DeletionStage::Authenticated);

        let grant = self.checker.authorize(&caller, target_id).await?;
        tracing::debug!(stage = %DeletionStage::Authorized);
        Ok(grant)
    }
}

fn log_failure(error: &UserDeletionError) {
    let stage = DeletionStage::Failed(error.kind());
    match error {
        UserDeletionError::PartialDeletion { .. } | UserDeletionError::InternalError(_) => {
            tracing::error!(stage = %stage, error = %error, "User deletion failed")
        }
        _ => tracing::warn!(stage = %stage, error = %error, "User deletion rejected"),
    }
}
