use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;
use crate::google::{AccessTokenProvider, CredentialError};
use crate::identity::{AuthService, IdentityToolkitClient};
use crate::services::UserDeletionService;
use crate::store::{DocumentStore, FirestoreClient};

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Handles shared by every request. Both clients are `Send + Sync` and hold
/// their own connection pools, so one instance serves all concurrent
/// requests.
#[derive(Clone)]
pub struct AppState {
    pub users: UserDeletionService,
}

impl AppState {
    pub fn new(auth: Arc<dyn AuthService>, store: Arc<dyn DocumentStore>, users_collection: &str) -> Self {
        Self {
            users: UserDeletionService::new(auth, store, users_collection),
        }
    }

    /// Build the hosted-service clients from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        if config.identity.project_id.is_empty() {
            return Err(StateError::ConfigMissing("IDENTITY_PROJECT_ID or PROJECT_ID"));
        }
        if config.store.project_id.is_empty() {
            return Err(StateError::ConfigMissing("STORE_PROJECT_ID or PROJECT_ID"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.security.request_timeout_secs))
            .build()?;
        let tokens = AccessTokenProvider::from_config(client.clone(), &config.security)?;

        let auth = IdentityToolkitClient::new(client.clone(), &config.identity, tokens.clone());
        let store = FirestoreClient::new(client, &config.store, tokens);

        tracing::info!(
            identity_project = %config.identity.project_id,
            store_project = %config.store.project_id,
            "Service clients initialized"
        );
        Ok(Self::new(Arc::new(auth), Arc::new(store), &config.store.users_collection))
    }

    /// Process-wide state, built from the global config on first use
    pub fn global() -> Result<&'static AppState, &'static StateError> {
        static INSTANCE: OnceLock<Result<AppState, StateError>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| AppState::from_config(crate::config::config()))
            .as_ref()
    }
}
