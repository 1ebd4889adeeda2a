// handlers/protected/users/delete.rs - DELETE /users/:id and DELETE /users/:id/profile

use axum::{
    extract::{Path, State},
    http::HeaderMap,
};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserDeletionError;
use crate::state::AppState;

/// DELETE /users/:id - remove a user from authentication and the document store
///
/// Requires `Authorization: Bearer <credential>` from a caller whose profile
/// grants `canManageUsers`. Responds `{"success": true}` once both records
/// are gone.
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target_id): Path<String>,
) -> ApiResult<()> {
    state.users.delete_user(&headers, &target_id).await?;
    Ok(ApiResponse::ok())
}

/// DELETE /users/:id/profile - remove only the profile document
///
/// Finishes a deletion that answered `PARTIAL_DELETION`. Safe to repeat.
pub async fn delete_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(target_id): Path<String>,
) -> ApiResult<()> {
    state.users.purge_user_profile(&headers, &target_id).await?;
    Ok(ApiResponse::ok())
}

/// DELETE /users - no id in the path
pub async fn missing_id() -> ApiError {
    UserDeletionError::MissingTarget.into()
}
