use std::sync::Arc;

use super::UserDeletionError;
use crate::auth::CallerIdentity;
use crate::models::UserProfile;
use crate::store::DocumentStore;

/// Proof that a caller may delete a specific target. Only
/// [`AuthorizationChecker::authorize`] creates one.
#[derive(Debug)]
pub struct DeletionGrant {
    caller: CallerIdentity,
    target: String,
}

impl DeletionGrant {
    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Loads the caller's stored profile and checks `canManageUsers`.
/// Never mutates anything.
#[derive(Clone)]
pub struct AuthorizationChecker {
    store: Arc<dyn DocumentStore>,
    users_collection: String,
}

impl AuthorizationChecker {
    pub fn new(store: Arc<dyn DocumentStore>, users_collection: impl Into<String>) -> Self {
        Self {
            store,
            users_collection: users_collection.into(),
        }
    }

    pub async fn authorize(
        &self,
        caller: &CallerIdentity,
        target_id: &str,
    ) -> Result<DeletionGrant, UserDeletionError> {
        if caller.as_str() == target_id {
            return Err(UserDeletionError::SelfDeletionForbidden);
        }

        let document = self
            .store
            .get_document(&self.users_collection, caller.as_str())
            .await
            .map_err(|e| UserDeletionError::InternalError(format!("failed to load caller profile: {}", e)))?
            .ok_or(UserDeletionError::ProfileNotFound)?;

        // A profile we cannot read grants nothing
        let profile = UserProfile::from_document(document).map_err(|e| {
            tracing::warn!(caller = %caller, error = %e, "Caller profile is malformed");
            UserDeletionError::PermissionDenied
        })?;

        if !profile.can_manage_users() {
            return Err(UserDeletionError::PermissionDenied);
        }

        Ok(DeletionGrant {
            caller: caller.clone(),
            target: target_id.to_string(),
        })
    }
}
