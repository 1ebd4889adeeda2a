mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{id_token_claims, jwks, sign_token, MockUpstream, KEY_ID, PROJECT_ID};
use parts_admin_api::config::IdentityConfig;
use parts_admin_api::google::AccessTokenProvider;
use parts_admin_api::identity::{AuthService, IdentityError, IdentityToolkitClient};

const LOOKUP: &str = "/v1/projects/parts-shop/accounts:lookup";
const DELETE: &str = "/v1/projects/parts-shop/accounts:delete";

async fn setup(check_revoked: bool) -> Result<(MockUpstream, IdentityToolkitClient)> {
    let upstream = MockUpstream::start().await?;
    upstream.on(Method::GET, "/jwks", StatusCode::OK, jwks());
    let client = client_for(&upstream, check_revoked, 0);
    Ok((upstream, client))
}

fn client_for(upstream: &MockUpstream, check_revoked: bool, jwks_min_refresh_secs: u64) -> IdentityToolkitClient {
    let config = IdentityConfig {
        project_id: PROJECT_ID.to_string(),
        api_base_url: upstream.base_url.clone(),
        jwks_url: format!("{}/jwks", upstream.base_url),
        issuer_prefix: "https://securetoken.google.com".to_string(),
        jwks_cache_ttl_secs: 300,
        jwks_min_refresh_secs,
        check_revoked,
    };
    let http = reqwest::Client::new();
    let tokens = AccessTokenProvider::fixed(http.clone(), "admin-access-token");
    IdentityToolkitClient::new(http, &config, tokens)
}

fn account(uid: &str, extra: serde_json::Value) -> serde_json::Value {
    let mut user = json!({"localId": uid});
    if let (Some(user), Some(extra)) = (user.as_object_mut(), extra.as_object()) {
        user.extend(extra.clone());
    }
    json!({"kind": "identitytoolkit#GetAccountInfoResponse", "users": [user]})
}

#[tokio::test]
async fn verifies_signed_token_and_checks_account() -> Result<()> {
    let (upstream, client) = setup(true).await?;
    upstream.on(Method::POST, LOOKUP, StatusCode::OK, account("U1", json!({"validSince": "1"})));

    let token = sign_token(KEY_ID, &id_token_claims("U1"));
    let identity = client.verify_credential(&token).await?;

    assert_eq!(identity.as_str(), "U1");
    let lookups = upstream.requests_to(LOOKUP);
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].body, json!({"localId": ["U1"]}));
    assert_eq!(lookups[0].authorization.as_deref(), Some("Bearer admin-access-token"));
    Ok(())
}

#[tokio::test]
async fn keys_are_cached_between_verifications() -> Result<()> {
    let (upstream, client) = setup(false).await?;
    let token = sign_token(KEY_ID, &id_token_claims("U1"));

    client.verify_credential(&token).await?;
    client.verify_credential(&token).await?;

    assert_eq!(upstream.requests_to("/jwks").len(), 1);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_rejected() -> Result<()> {
    let (_upstream, client) = setup(false).await?;
    let mut claims = id_token_claims("U1");
    let now = chrono::Utc::now().timestamp();
    claims["iat"] = json!(now - 7200);
    claims["exp"] = json!(now - 3600);

    let err = client.verify_credential(&sign_token(KEY_ID, &claims)).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn token_for_another_project_is_rejected() -> Result<()> {
    let (_upstream, client) = setup(false).await?;
    let mut claims = id_token_claims("U1");
    claims["aud"] = json!("other-project");
    claims["iss"] = json!("https://securetoken.google.com/other-project");

    let err = client.verify_credential(&sign_token(KEY_ID, &claims)).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let (_upstream, client) = setup(false).await?;
    let err = client.verify_credential("not-a-jwt").await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn unknown_key_id_refetches_once_then_rejects() -> Result<()> {
    let (upstream, client) = setup(false).await?;
    let token = sign_token("rotated-away", &id_token_claims("U1"));

    let err = client.verify_credential(&token).await.unwrap_err();

    assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);
    assert_eq!(upstream.requests_to("/jwks").len(), 2);
    Ok(())
}

#[tokio::test]
async fn unknown_key_ids_do_not_refetch_within_interval() -> Result<()> {
    let upstream = MockUpstream::start().await?;
    upstream.on(Method::GET, "/jwks", StatusCode::OK, jwks());
    let client = client_for(&upstream, false, 300);

    for _ in 0..3 {
        let token = sign_token("forged-kid", &id_token_claims("U1"));
        let err = client.verify_credential(&token).await.unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);
    }
    // Cached keys keep serving genuine tokens meanwhile
    let identity = client
        .verify_credential(&sign_token(KEY_ID, &id_token_claims("U1")))
        .await?;

    assert_eq!(identity.as_str(), "U1");
    assert_eq!(upstream.requests_to("/jwks").len(), 1);
    Ok(())
}

#[tokio::test]
async fn key_endpoint_outage_is_not_retried_per_request() -> Result<()> {
    // No /jwks route: every fetch answers 404
    let upstream = MockUpstream::start().await?;
    let client = client_for(&upstream, false, 300);
    let token = sign_token(KEY_ID, &id_token_claims("U1"));

    for _ in 0..3 {
        let err = client.verify_credential(&token).await.unwrap_err();
        assert!(matches!(err, IdentityError::Upstream(_)), "got {:?}", err);
    }

    assert_eq!(upstream.requests_to("/jwks").len(), 1);
    Ok(())
}

#[tokio::test]
async fn revoked_sessions_are_rejected() -> Result<()> {
    let (upstream, client) = setup(true).await?;
    let valid_since = chrono::Utc::now().timestamp() + 5;
    upstream.on(
        Method::POST,
        LOOKUP,
        StatusCode::OK,
        account("U1", json!({"validSince": valid_since.to_string()})),
    );

    let err = client
        .verify_credential(&sign_token(KEY_ID, &id_token_claims("U1")))
        .await
        .unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredential(ref m) if m.contains("revoked")), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn disabled_or_deleted_accounts_are_rejected() -> Result<()> {
    let (upstream, client) = setup(true).await?;
    let token = sign_token(KEY_ID, &id_token_claims("U1"));

    upstream.on(Method::POST, LOOKUP, StatusCode::OK, account("U1", json!({"disabled": true})));
    let err = client.verify_credential(&token).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);

    upstream.on(Method::POST, LOOKUP, StatusCode::OK, json!({"kind": "identitytoolkit#GetAccountInfoResponse"}));
    let err = client.verify_credential(&token).await.unwrap_err();
    assert!(matches!(err, IdentityError::InvalidCredential(_)), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn deletes_account_with_admin_token() -> Result<()> {
    let (upstream, client) = setup(true).await?;
    upstream.on(Method::POST, DELETE, StatusCode::OK, json!({"kind": "identitytoolkit#DeleteAccountResponse"}));

    client.delete_identity("U2").await?;

    let calls = upstream.requests_to(DELETE);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, json!({"localId": "U2"}));
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer admin-access-token"));
    Ok(())
}

#[tokio::test]
async fn unknown_account_maps_to_not_found() -> Result<()> {
    let (upstream, client) = setup(true).await?;
    upstream.on(
        Method::POST,
        DELETE,
        StatusCode::BAD_REQUEST,
        json!({"error": {"code": 400, "message": "USER_NOT_FOUND"}}),
    );

    let err = client.delete_identity("U9").await.unwrap_err();
    assert!(matches!(err, IdentityError::NotFound(ref uid) if uid == "U9"), "got {:?}", err);
    Ok(())
}

#[tokio::test]
async fn other_delete_failures_are_upstream_errors() -> Result<()> {
    let (upstream, client) = setup(true).await?;
    upstream.on(
        Method::POST,
        DELETE,
        StatusCode::FORBIDDEN,
        json!({"error": {"code": 403, "message": "INSUFFICIENT_PERMISSION"}}),
    );

    let err = client.delete_identity("U2").await.unwrap_err();
    assert!(matches!(err, IdentityError::Upstream(ref m) if m == "INSUFFICIENT_PERMISSION"), "got {:?}", err);
    Ok(())
}
