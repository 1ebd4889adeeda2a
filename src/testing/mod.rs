//! In-memory collaborators for tests. They record every call so tests can
//! assert which mutations happened, and can be told to fail on demand.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::auth::CallerIdentity;
use crate::identity::{AuthService, IdentityError};
use crate::store::{Document, DocumentStore, StoreError};

/// Headers carrying `Authorization: Bearer <token>`
pub fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value");
    headers.insert(axum::http::header::AUTHORIZATION, value);
    headers
}

#[derive(Default)]
struct AuthState {
    tokens: HashMap<String, String>,
    accounts: HashSet<String>,
    verify_calls: usize,
    delete_calls: Vec<String>,
    verify_failure: Option<String>,
    delete_failure: Option<String>,
}

#[derive(Default)]
pub struct FakeAuthService {
    state: Mutex<AuthState>,
}

impl FakeAuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and a token that verifies to it
    pub fn add_account(&self, uid: &str, token: &str) {
        let mut state = self.state.lock().unwrap();
        state.accounts.insert(uid.to_string());
        state.tokens.insert(token.to_string(), uid.to_string());
    }

    pub fn revoke_token(&self, token: &str) {
        self.state.lock().unwrap().tokens.remove(token);
    }

    /// Make every verification fail with a transport-style error
    pub fn fail_verification(&self, message: &str) {
        self.state.lock().unwrap().verify_failure = Some(message.to_string());
    }

    /// Make every identity deletion fail with an upstream error
    pub fn fail_deletes(&self, message: &str) {
        self.state.lock().unwrap().delete_failure = Some(message.to_string());
    }

    pub fn has_account(&self, uid: &str) -> bool {
        self.state.lock().unwrap().accounts.contains(uid)
    }

    pub fn verify_calls(&self) -> usize {
        self.state.lock().unwrap().verify_calls
    }

    pub fn delete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().delete_calls.clone()
    }
}

#[async_trait]
impl AuthService for FakeAuthService {
    async fn verify_credential(&self, token: &str) -> Result<CallerIdentity, IdentityError> {
        let mut state = self.state.lock().unwrap();
        state.verify_calls += 1;
        if let Some(message) = &state.verify_failure {
            return Err(IdentityError::Upstream(message.clone()));
        }
        state
            .tokens
            .get(token)
            .map(|uid| CallerIdentity::new(uid.clone()))
            .ok_or_else(|| IdentityError::InvalidCredential("unknown token".to_string()))
    }

    async fn delete_identity(&self, uid: &str) -> Result<(), IdentityError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push(uid.to_string());
        if let Some(message) = &state.delete_failure {
            return Err(IdentityError::Upstream(message.clone()));
        }
        if !state.accounts.remove(uid) {
            return Err(IdentityError::NotFound(uid.to_string()));
        }
        state.tokens.retain(|_, owner| owner != uid);
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    documents: HashMap<(String, String), Document>,
    get_calls: usize,
    delete_calls: Vec<(String, String)>,
    read_failure: Option<String>,
    next_delete_failure: Option<String>,
}

#[derive(Default)]
pub struct FakeDocumentStore {
    state: Mutex<StoreState>,
}

impl FakeDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a document; `fields` must be a JSON object
    pub fn insert(&self, collection: &str, id: &str, fields: Value) {
        let document = match fields {
            Value::Object(map) => map,
            other => panic!("document fields must be an object, got {}", other),
        };
        self.state
            .lock()
            .unwrap()
            .documents
            .insert((collection.to_string(), id.to_string()), document);
    }

    pub fn contains(&self, collection: &str, id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .documents
            .contains_key(&(collection.to_string(), id.to_string()))
    }

    pub fn fail_reads(&self, message: &str) {
        self.state.lock().unwrap().read_failure = Some(message.to_string());
    }

    /// Fail only the next delete; later deletes behave normally
    pub fn fail_next_delete(&self, message: &str) {
        self.state.lock().unwrap().next_delete_failure = Some(message.to_string());
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn delete_calls(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().delete_calls.clone()
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if let Some(message) = &state.read_failure {
            return Err(StoreError::Upstream {
                status: 503,
                message: message.clone(),
            });
        }
        Ok(state
            .documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.delete_calls.push((collection.to_string(), id.to_string()));
        if let Some(message) = state.next_delete_failure.take() {
            return Err(StoreError::Upstream { status: 503, message });
        }
        state.documents.remove(&(collection.to_string(), id.to_string()));
        Ok(())
    }
}
