use serde::Serialize;
use std::sync::Arc;

use super::{DeletionGrant, DeletionStage, DeletionStep, UserDeletionError};
use crate::identity::{AuthService, IdentityError};
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionReport {
    pub target: String,
    pub auth_record_deleted: bool,
    pub document_deleted: bool,
}

/// Removes a user from the identity service, then from the document store.
///
/// No rollback: a recreated identity record would not carry the original
/// credentials. A document failure after the identity delete is reported as
/// `PartialDeletion` and fixed with [`DeletionOrchestrator::purge_profile`].
#[derive(Clone)]
pub struct DeletionOrchestrator {
    auth: Arc<dyn AuthService>,
    store: Arc<dyn DocumentStore>,
    users_collection: String,
}

impl DeletionOrchestrator {
    pub fn new(
        auth: Arc<dyn AuthService>,
        store: Arc<dyn DocumentStore>,
        users_collection: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            store,
            users_collection: users_collection.into(),
        }
    }

    pub async fn delete(&self, grant: DeletionGrant) -> Result<DeletionReport, UserDeletionError> {
        let target = grant.target();

        match self.auth.delete_identity(target).await {
            Ok(()) => {}
            // The document may belong to a recreated account; leave it alone
            Err(IdentityError::NotFound(_)) => {
                return Err(UserDeletionError::TargetNotFound(target.to_string()));
            }
            Err(e) => {
                return Err(UserDeletionError::InternalError(format!(
                    "identity record deletion failed: {}",
                    e
                )));
            }
        }
        tracing::info!(stage = %DeletionStage::AuthDeleted, caller = %grant.caller(), "Identity record removed");

        self.store
            .delete_document(&self.users_collection, target)
            .await
            .map_err(|e| UserDeletionError::PartialDeletion {
                target: target.to_string(),
                failed_step: DeletionStep::Document,
                reason: e.to_string(),
            })?;

        Ok(DeletionReport {
            target: target.to_string(),
            auth_record_deleted: true,
            document_deleted: true,
        })
    }

    /// Document-only delete for finishing a partial deletion
    pub async fn purge_profile(&self, grant: DeletionGrant) -> Result<(), UserDeletionError> {
        self.store
            .delete_document(&self.users_collection, grant.target())
            .await
            .map_err(|e| UserDeletionError::InternalError(format!("profile document deletion failed: {}", e)))
    }
}
