use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedUser;
use crate::inbound::http::router::AppState;

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthenticatedUser>,
) -> Result<ApiSuccess<()>, ApiError> {
    state
        .auth_service
        .delete_user(&caller.user_id)
        .await
        .map_err(ApiError::from)?;

    tracing::info!(user_id = %caller.user_id, "Account deleted");

    Ok(ApiSuccess::message(
        StatusCode::OK,
        "Account deleted successfully",
    ))
}
