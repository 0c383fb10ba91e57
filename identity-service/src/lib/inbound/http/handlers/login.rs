use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::AuthResponseData;
use super::JsonBody;
use crate::domain::user::models::LoginCommand;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::Validator;

pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    state
        .auth_service
        .login(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref outcome| ApiSuccess::new(StatusCode::OK, outcome.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

impl LoginRequest {
    /// Only presence is checked; policy violations surface as bad credentials.
    fn try_into_command(self) -> Result<LoginCommand, ApiError> {
        let mut validator = Validator::new();
        validator.require("username", &self.username);
        validator.require("password", &self.password);
        validator.finish()?;

        Ok(LoginCommand {
            username: self.username,
            password: self.password,
        })
    }
}
