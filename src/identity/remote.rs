use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::Jwk, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{AuthService, IdentityError};
use crate::auth::{CallerIdentity, IdTokenClaims, JwksCache};
use crate::config::IdentityConfig;
use crate::google::{self, AccessTokenProvider};

/// Provider error message for an unknown account
const USER_NOT_FOUND: &str = "USER_NOT_FOUND";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    #[serde(default)]
    disabled: bool,
    /// Seconds since epoch, serialized as a string by the provider
    #[serde(default)]
    valid_since: Option<String>,
}

/// REST client for the hosted identity provider (ID token verification and
/// account administration)
#[derive(Clone)]
pub struct IdentityToolkitClient {
    client: reqwest::Client,
    tokens: AccessTokenProvider,
    jwks: JwksCache,
    base_url: String,
    project_id: String,
    issuer: String,
    check_revoked: bool,
}

impl IdentityToolkitClient {
    pub fn new(client: reqwest::Client, config: &IdentityConfig, tokens: AccessTokenProvider) -> Self {
        let jwks = JwksCache::new(
            client.clone(),
            config.jwks_url.clone(),
            Duration::from_secs(config.jwks_cache_ttl_secs),
            Duration::from_secs(config.jwks_min_refresh_secs),
        );
        Self {
            client,
            tokens,
            jwks,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            issuer: format!("{}/{}", config.issuer_prefix.trim_end_matches('/'), config.project_id),
            check_revoked: config.check_revoked,
        }
    }

    fn accounts_url(&self, action: &str) -> String {
        format!("{}/v1/projects/{}/accounts:{}", self.base_url, self.project_id, action)
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk, IdentityError> {
        let find = |set: jsonwebtoken::jwk::JwkSet| {
            set.keys
                .into_iter()
                .find(|jwk| jwk.common.key_id.as_deref() == Some(kid))
        };

        let jwks = self.jwks.get().await.map_err(IdentityError::Upstream)?;
        if let Some(jwk) = find(jwks) {
            return Ok(jwk);
        }

        // Keys rotate; retry once against a fresh set before rejecting.
        // The cache holds refetches to its minimum interval.
        self.jwks.invalidate().await;
        let jwks = self.jwks.get().await.map_err(IdentityError::Upstream)?;
        find(jwks).ok_or_else(|| IdentityError::InvalidCredential("unknown signing key".to_string()))
    }

    async fn decode_claims(&self, token: &str) -> Result<IdTokenClaims, IdentityError> {
        let header = decode_header(token)
            .map_err(|e| IdentityError::InvalidCredential(format!("malformed token: {}", e)))?;
        if header.alg != Algorithm::RS256 {
            return Err(IdentityError::InvalidCredential(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }
        let kid = header
            .kid
            .ok_or_else(|| IdentityError::InvalidCredential("token has no key id".to_string()))?;

        let jwk = self.signing_key(&kid).await?;
        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|e| IdentityError::Upstream(format!("unusable signing key: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);

        let data = decode::<IdTokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| IdentityError::InvalidCredential(e.to_string()))?;

        if data.claims.sub.trim().is_empty() {
            return Err(IdentityError::InvalidCredential("empty subject".to_string()));
        }
        Ok(data.claims)
    }

    /// Reject tokens for accounts that were disabled, deleted, or had their
    /// sessions revoked after the token was issued
    async fn ensure_not_revoked(&self, claims: &IdTokenClaims) -> Result<(), IdentityError> {
        let request = self
            .client
            .post(self.accounts_url("lookup"))
            .json(&json!({ "localId": [claims.sub] }));
        let response = google::authorize(request, &self.tokens).await?.send().await?;

        if !response.status().is_success() {
            let message = upstream_message(response).await;
            return Err(IdentityError::Upstream(format!("account lookup failed: {}", message)));
        }

        let lookup: LookupResponse = response.json().await?;
        let account = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::InvalidCredential("account no longer exists".to_string()))?;

        if account.disabled {
            return Err(IdentityError::InvalidCredential("account disabled".to_string()));
        }

        let issued_at = claims.auth_time.unwrap_or(claims.iat);
        let valid_since = account
            .valid_since
            .as_deref()
            .and_then(|v| v.parse::<i64>().ok());
        if let Some(valid_since) = valid_since {
            if issued_at < valid_since {
                return Err(IdentityError::InvalidCredential("credential revoked".to_string()));
            }
        }
        Ok(())
    }
}

async fn upstream_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ErrorEnvelope>().await {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => format!("HTTP {}", status),
    }
}

#[async_trait]
impl AuthService for IdentityToolkitClient {
    async fn verify_credential(&self, token: &str) -> Result<CallerIdentity, IdentityError> {
        let claims = self.decode_claims(token).await?;
        if self.check_revoked {
            self.ensure_not_revoked(&claims).await?;
        }
        Ok(CallerIdentity::new(claims.sub))
    }

    async fn delete_identity(&self, uid: &str) -> Result<(), IdentityError> {
        let request = self
            .client
            .post(self.accounts_url("delete"))
            .json(&json!({ "localId": uid }));
        let response = google::authorize(request, &self.tokens).await?.send().await?;

        if response.status().is_success() {
            tracing::info!(uid = %uid, "Deleted identity record");
            return Ok(());
        }

        let message = upstream_message(response).await;
        // Provider messages look like "USER_NOT_FOUND" or "USER_NOT_FOUND : detail"
        if message.starts_with(USER_NOT_FOUND) {
            Err(IdentityError::NotFound(uid.to_string()))
        } else {
            Err(IdentityError::Upstream(message))
        }
    }
}
