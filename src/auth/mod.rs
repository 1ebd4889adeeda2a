pub mod jwks;

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

pub use jwks::JwksCache;

/// Claims carried by an identity-provider ID token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub iss: String,
    pub aud: String,
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub auth_time: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Verified identifier of the requester. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallerIdentity(String);

impl CallerIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a bearer credential could not be read from the request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BearerError {
    #[error("Missing Authorization header")]
    Missing,
    #[error("Invalid Authorization header format")]
    NotUtf8,
    #[error("Authorization header must use Bearer token format")]
    WrongScheme,
    #[error("Empty bearer token")]
    Empty,
}

/// Extract the bearer credential from the Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, BearerError> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(BearerError::Missing)?;

    let auth_str = auth_header.to_str().map_err(|_| BearerError::NotUtf8)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .or_else(|| auth_str.strip_prefix("bearer "))
        .ok_or(BearerError::WrongScheme)?
        .trim();

    if token.is_empty() {
        return Err(BearerError::Empty);
    }
    Ok(token)
}
