use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::profile::UpdateUserRequest;
use super::ApiError;
use super::ApiSuccess;
use super::JsonBody;
use super::UserData;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

/// Reject access to any account other than the caller's own.
fn ensure_owner(caller: &AuthenticatedUser, user_id: &str) -> Result<(), ApiError> {
    if caller.user_id.to_string() == user_id {
        Ok(())
    } else {
        tracing::warn!(
            caller = %caller.user_id,
            target = %user_id,
            "Rejected access to another user's account"
        );
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    ensure_owner(&caller, &user_id)?;

    state
        .auth_service
        .get_user(&caller.user_id)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> Result<ApiSuccess<UserData>, ApiError> {
    ensure_owner(&caller, &user_id)?;

    state
        .auth_service
        .update_user(&caller.user_id, body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref user| ApiSuccess::new(StatusCode::OK, user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
    Path(user_id): Path<String>,
) -> Result<ApiSuccess<()>, ApiError> {
    ensure_owner(&caller, &user_id)?;

    state
        .auth_service
        .delete_user(&caller.user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::message(StatusCode::OK, "User deleted successfully"))
}
