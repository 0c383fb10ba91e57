use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::JsonBody;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::Validator;

/// Sent whether or not the address belongs to an account.
pub const RESET_REQUESTED_MESSAGE: &str = "If the email exists, a password reset link has been sent";

pub async fn request_password_reset(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<PasswordResetRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    let email = body.try_into_email()?;

    state
        .auth_service
        .request_password_reset(&email)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::message(StatusCode::OK, RESET_REQUESTED_MESSAGE))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    JsonBody(body): JsonBody<PasswordResetConfirmRequest>,
) -> Result<ApiSuccess<()>, ApiError> {
    let password = body.try_into_password()?;

    state
        .auth_service
        .reset_password(&token, password)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::message(
        StatusCode::OK,
        "Password reset successfully",
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetRequest {
    #[serde(default)]
    email: String,
}

impl PasswordResetRequest {
    fn try_into_email(self) -> Result<EmailAddress, ApiError> {
        let mut validator = Validator::new();
        if !validator.require("email", &self.email) {
            return Err(validator.into_error());
        }

        validator
            .check("email", EmailAddress::new(self.email))
            .ok_or_else(|| validator.into_error())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetConfirmRequest {
    #[serde(default)]
    password: String,
}

impl PasswordResetConfirmRequest {
    fn try_into_password(self) -> Result<Password, ApiError> {
        let mut validator = Validator::new();
        validator
            .check("password", Password::new(self.password))
            .ok_or_else(|| validator.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_required() {
        let request = PasswordResetRequest {
            email: String::new(),
        };

        match request.try_into_email() {
            Err(ApiError::Validation(details)) => {
                assert_eq!(details[0].message, "email is required");
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_new_password_policy() {
        let request = PasswordResetConfirmRequest {
            password: "short".to_string(),
        };

        assert!(matches!(
            request.try_into_password(),
            Err(ApiError::Validation(_))
        ));
    }
}
