use jsonwebtoken::jwk::JwkSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Default)]
struct JwksCacheState {
    jwks: Option<JwkSet>,
    fetched_at: Option<Instant>,
    attempted_at: Option<Instant>,
}

/// Signing keys of the identity provider, refreshed after `ttl`.
///
/// A failed refresh falls back to the last good key set so a brief outage of
/// the key endpoint does not reject every request. Fetches, successful or
/// not, are spaced at least `min_refresh` apart.
#[derive(Clone)]
pub struct JwksCache {
    client: reqwest::Client,
    jwks_url: String,
    ttl: Duration,
    min_refresh: Duration,
    state: Arc<RwLock<JwksCacheState>>,
}

impl JwksCache {
    pub fn new(client: reqwest::Client, jwks_url: impl Into<String>, ttl: Duration, min_refresh: Duration) -> Self {
        Self {
            client,
            jwks_url: jwks_url.into(),
            ttl,
            min_refresh,
            state: Arc::new(RwLock::new(JwksCacheState::default())),
        }
    }

    pub async fn get(&self) -> Result<JwkSet, String> {
        {
            let state = self.state.read().await;
            if let (Some(jwks), Some(fetched_at)) = (&state.jwks, &state.fetched_at) {
                if fetched_at.elapsed() <= self.ttl {
                    return Ok(jwks.clone());
                }
            }
            if state.attempted_at.is_some_and(|at| at.elapsed() < self.min_refresh) {
                return state
                    .jwks
                    .clone()
                    .ok_or_else(|| "jwks unavailable; last fetch failed".to_string());
            }
        }

        let fetch_result = self.fetch().await;

        let mut state = self.state.write().await;
        state.attempted_at = Some(Instant::now());
        match fetch_result {
            Ok(jwks) => {
                state.jwks = Some(jwks.clone());
                state.fetched_at = Some(Instant::now());
                Ok(jwks)
            }
            Err(err) => {
                tracing::warn!(url = %self.jwks_url, error = %err, "JWKS refresh failed");
                state.jwks.clone().ok_or(err)
            }
        }
    }

    /// Mark the cached keys stale so the next lookup refetches once
    /// `min_refresh` has passed (used on unknown `kid`)
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.fetched_at = None;
    }

    async fn fetch(&self) -> Result<JwkSet, String> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| format!("jwks fetch failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("jwks fetch failed: HTTP {}", response.status()));
        }
        response
            .json::<JwkSet>()
            .await
            .map_err(|e| format!("jwks parse failed: {}", e))
    }
}
