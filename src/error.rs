// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::user_deletion::UserDeletionError;

/// HTTP API error with status code, stable code, and client-safe message
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),
    SelfDeletionForbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError { message: String, details: Option<String> },
    PartialDeletion { message: String, details: Value },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::SelfDeletionForbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalServerError { .. } | ApiError::PartialDeletion { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::SelfDeletionForbidden(msg)
            | ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
            ApiError::PartialDeletion { message, .. } => message,
        }
    }

    /// Stable code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::SelfDeletionForbidden(_) => "SELF_DELETION_FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
            ApiError::PartialDeletion { .. } => "PARTIAL_DELETION",
        }
    }

    pub fn to_json(&self) -> Value {
        let mut response = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        });

        match self {
            ApiError::InternalServerError { details: Some(details), .. } => {
                response["details"] = json!(details);
            }
            ApiError::PartialDeletion { details, .. } => {
                response["details"] = details.clone();
            }
            _ => {}
        }

        response
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>, details: Option<String>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            details,
        }
    }
}

// 401/403 bodies name only the category; the specific reason stays in the logs
impl From<UserDeletionError> for ApiError {
    fn from(err: UserDeletionError) -> Self {
        match err {
            UserDeletionError::MissingTarget => ApiError::bad_request("User id is required"),
            UserDeletionError::Unauthenticated => ApiError::unauthorized("Authentication required"),
            UserDeletionError::InvalidCredential => ApiError::unauthorized("Invalid or expired credential"),
            UserDeletionError::SelfDeletionForbidden => {
                ApiError::SelfDeletionForbidden("You cannot delete your own account".to_string())
            }
            UserDeletionError::ProfileNotFound | UserDeletionError::PermissionDenied => {
                ApiError::forbidden("Insufficient permissions")
            }
            UserDeletionError::TargetNotFound(_) => ApiError::not_found("User not found"),
            UserDeletionError::PartialDeletion {
                target,
                failed_step,
                reason,
            } => ApiError::PartialDeletion {
                message: format!(
                    "User '{}' was removed from authentication but the profile document was not deleted",
                    target
                ),
                details: json!({
                    "authRecordDeleted": true,
                    "documentDeleted": false,
                    "failedStep": failed_step,
                    "reason": reason,
                    "remediation": format!("retry DELETE /users/{}/profile", target),
                }),
            },
            UserDeletionError::InternalError(details) => {
                ApiError::internal_server_error("Failed to delete user", Some(details))
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
