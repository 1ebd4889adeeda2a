// Access tokens for the hosted admin REST APIs

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::SecurityConfig;

const SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/identitytoolkit https://www.googleapis.com/auth/datastore";

/// Refresh this long before the provider-reported expiry
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to read credentials file '{path}': {message}")]
    Read { path: String, message: String },

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

enum TokenSource {
    /// No Authorization header on admin calls (local emulators, tests)
    Anonymous,
    Static(String),
    ServiceAccount {
        key: ServiceAccountKey,
        encoding_key: EncodingKey,
        token_uri: String,
        cached: RwLock<Option<CachedToken>>,
    },
}

/// Supplies bearer tokens for outbound admin requests. Cheap to clone and
/// safe to share across concurrent requests.
#[derive(Clone)]
pub struct AccessTokenProvider {
    client: reqwest::Client,
    source: Arc<TokenSource>,
}

impl AccessTokenProvider {
    pub fn anonymous(client: reqwest::Client) -> Self {
        Self {
            client,
            source: Arc::new(TokenSource::Anonymous),
        }
    }

    pub fn fixed(client: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            client,
            source: Arc::new(TokenSource::Static(token.into())),
        }
    }

    pub fn service_account(
        client: reqwest::Client,
        key: ServiceAccountKey,
        default_token_uri: &str,
    ) -> Result<Self, CredentialError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
        let token_uri = key
            .token_uri
            .clone()
            .unwrap_or_else(|| default_token_uri.to_string());
        Ok(Self {
            client,
            source: Arc::new(TokenSource::ServiceAccount {
                key,
                encoding_key,
                token_uri,
                cached: RwLock::new(None),
            }),
        })
    }

    /// Pick a token source from configuration: a fixed token wins over a key file
    pub fn from_config(client: reqwest::Client, security: &SecurityConfig) -> Result<Self, CredentialError> {
        if let Some(token) = &security.access_token {
            return Ok(Self::fixed(client, token.clone()));
        }
        if let Some(path) = &security.credentials_file {
            let raw = std::fs::read_to_string(path).map_err(|e| CredentialError::Read {
                path: path.clone(),
                message: e.to_string(),
            })?;
            let key: ServiceAccountKey =
                serde_json::from_str(&raw).map_err(|e| CredentialError::InvalidKey(e.to_string()))?;
            tracing::info!(client_email = %key.client_email, "Using service account credentials");
            return Self::service_account(client, key, &security.token_uri);
        }
        tracing::warn!("No admin credentials configured; outbound admin calls are unauthenticated");
        Ok(Self::anonymous(client))
    }

    /// Current bearer token, or `None` when running without credentials
    pub async fn token(&self) -> Result<Option<String>, CredentialError> {
        match self.source.as_ref() {
            TokenSource::Anonymous => Ok(None),
            TokenSource::Static(token) => Ok(Some(token.clone())),
            TokenSource::ServiceAccount {
                key,
                encoding_key,
                token_uri,
                cached,
            } => {
                {
                    let guard = cached.read().await;
                    if let Some(token) = guard.as_ref() {
                        if token.expires_at > Utc::now() {
                            return Ok(Some(token.value.clone()));
                        }
                    }
                }

                let mut guard = cached.write().await;
                // Another request may have refreshed while we waited for the lock
                if let Some(token) = guard.as_ref() {
                    if token.expires_at > Utc::now() {
                        return Ok(Some(token.value.clone()));
                    }
                }

                let fresh = self.exchange(key, encoding_key, token_uri).await?;
                let value = fresh.value.clone();
                *guard = Some(fresh);
                Ok(Some(value))
            }
        }
    }

    async fn exchange(
        &self,
        key: &ServiceAccountKey,
        encoding_key: &EncodingKey,
        token_uri: &str,
    ) -> Result<CachedToken, CredentialError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: SCOPES,
            aud: token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, encoding_key)
            .map_err(|e| CredentialError::InvalidKey(e.to_string()))?;

        let response = self
            .client
            .post(token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Exchange(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Exchanged service account assertion");
        Ok(CachedToken {
            value: token.access_token,
            expires_at: now + Duration::seconds((token.expires_in - EXPIRY_MARGIN_SECS).max(0)),
        })
    }
}

/// Attach the provider's token, if any, to an outbound request
pub async fn authorize(
    request: reqwest::RequestBuilder,
    tokens: &AccessTokenProvider,
) -> Result<reqwest::RequestBuilder, CredentialError> {
    Ok(match tokens.token().await? {
        Some(token) => request.bearer_auth(token),
        None => request,
    })
}
