use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

/// Hosted identity provider (token verification and account deletion)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub project_id: String,
    pub api_base_url: String,
    pub jwks_url: String,
    pub issuer_prefix: String,
    pub jwks_cache_ttl_secs: u64,
    /// Minimum spacing between key-set fetches, including failed ones
    pub jwks_min_refresh_secs: u64,
    pub check_revoked: bool,
}

/// Hosted document database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub project_id: String,
    pub api_base_url: String,
    pub database_id: String,
    pub users_collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub access_token: Option<String>,
    pub credentials_file: Option<String>,
    pub token_uri: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("PARTS_ADMIN_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|v| v.parse().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("SERVER_ENABLE_REQUEST_LOGGING") {
            self.server.enable_request_logging = v.parse().unwrap_or(self.server.enable_request_logging);
        }

        // A single project id feeds both hosted services unless overridden individually
        if let Ok(v) = env::var("PROJECT_ID") {
            self.identity.project_id = v.clone();
            self.store.project_id = v;
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_PROJECT_ID") {
            self.identity.project_id = v;
        }
        if let Ok(v) = env::var("IDENTITY_API_BASE_URL") {
            self.identity.api_base_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_JWKS_URL") {
            self.identity.jwks_url = v;
        }
        if let Ok(v) = env::var("IDENTITY_ISSUER_PREFIX") {
            self.identity.issuer_prefix = v;
        }
        if let Ok(v) = env::var("IDENTITY_JWKS_CACHE_TTL_SECS") {
            self.identity.jwks_cache_ttl_secs = v.parse().unwrap_or(self.identity.jwks_cache_ttl_secs);
        }
        if let Ok(v) = env::var("IDENTITY_JWKS_MIN_REFRESH_SECS") {
            self.identity.jwks_min_refresh_secs = v.parse().unwrap_or(self.identity.jwks_min_refresh_secs);
        }
        if let Ok(v) = env::var("IDENTITY_CHECK_REVOKED") {
            self.identity.check_revoked = v.parse().unwrap_or(self.identity.check_revoked);
        }

        // Store overrides
        if let Ok(v) = env::var("STORE_PROJECT_ID") {
            self.store.project_id = v;
        }
        if let Ok(v) = env::var("STORE_API_BASE_URL") {
            self.store.api_base_url = v;
        }
        if let Ok(v) = env::var("STORE_DATABASE_ID") {
            self.store.database_id = v;
        }
        if let Ok(v) = env::var("STORE_USERS_COLLECTION") {
            self.store.users_collection = v;
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_REQUEST_TIMEOUT_SECS") {
            self.security.request_timeout_secs = v.parse().unwrap_or(self.security.request_timeout_secs);
        }
        if let Ok(v) = env::var("PARTS_ADMIN_ACCESS_TOKEN") {
            self.security.access_token = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("GOOGLE_APPLICATION_CREDENTIALS") {
            self.security.credentials_file = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("SECURITY_TOKEN_URI") {
            self.security.token_uri = v;
        }

        self
    }

    fn hosted_defaults() -> (IdentityConfig, StoreConfig) {
        (
            IdentityConfig {
                project_id: String::new(),
                api_base_url: "https://identitytoolkit.googleapis.com".to_string(),
                jwks_url: "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
                    .to_string(),
                issuer_prefix: "https://securetoken.google.com".to_string(),
                jwks_cache_ttl_secs: 60 * 60,
                jwks_min_refresh_secs: 30,
                check_revoked: true,
            },
            StoreConfig {
                project_id: String::new(),
                api_base_url: "https://firestore.googleapis.com".to_string(),
                database_id: "(default)".to_string(),
                users_collection: "users".to_string(),
            },
        )
    }

    fn development() -> Self {
        let (identity, store) = Self::hosted_defaults();
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                enable_request_logging: true,
            },
            identity,
            store,
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                request_timeout_secs: 30,
                access_token: None,
                credentials_file: None,
                token_uri: "https://oauth2.googleapis.com/token".to_string(),
            },
        }
    }

    fn staging() -> Self {
        let (identity, store) = Self::hosted_defaults();
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                enable_request_logging: true,
            },
            identity: IdentityConfig {
                jwks_cache_ttl_secs: 30 * 60,
                ..identity
            },
            store,
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                request_timeout_secs: 15,
                access_token: None,
                credentials_file: None,
                token_uri: "https://oauth2.googleapis.com/token".to_string(),
            },
        }
    }

    fn production() -> Self {
        let (identity, store) = Self::hosted_defaults();
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                enable_request_logging: false,
            },
            identity,
            store,
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://admin.example.com".to_string()],
                request_timeout_secs: 10,
                access_token: None,
                credentials_file: None,
                token_uri: "https://oauth2.googleapis.com/token".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
