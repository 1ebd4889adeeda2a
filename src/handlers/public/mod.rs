// handlers/public/mod.rs - Service info and liveness, no credential required

use axum::response::Json;
use serde_json::{json, Value};

use crate::config;
use crate::middleware::ApiResponse;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Parts Admin API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Administrative user management for the parts storefront",
            "endpoints": {
                "health": "/health (public)",
                "users": "DELETE /users/:id (bearer credential, canManageUsers)",
                "profile_cleanup": "DELETE /users/:id/profile (bearer credential, canManageUsers)",
            }
        }
    }))
}

/// GET /health - liveness; does not call the hosted services
pub async fn health() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "environment": config::config().environment,
    }))
}
