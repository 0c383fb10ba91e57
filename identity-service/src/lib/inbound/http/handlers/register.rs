use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::AuthResponseData;
use super::JsonBody;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Password;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Username;
use crate::inbound::http::router::AppState;
use crate::inbound::http::validation::Validator;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError> {
    state
        .auth_service
        .register(body.try_into_command()?)
        .await
        .map_err(ApiError::from)
        .map(|ref outcome| ApiSuccess::new(StatusCode::OK, outcome.into()))
}

/// HTTP request body for registration (raw JSON)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: String,
}

impl RegisterRequest {
    fn try_into_command(self) -> Result<RegisterCommand, ApiError> {
        let mut validator = Validator::new();

        let username = validator.check("username", Username::new(self.username));
        let email = match self.email.filter(|e| !e.is_empty()) {
            Some(email) => validator
                .check("email", EmailAddress::new(email))
                .map(Some),
            None => Some(None),
        };
        let password = validator.check("password", Password::new(self.password));

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) => {
                Ok(RegisterCommand::new(username, email, password))
            }
            _ => Err(validator.into_error()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inbound::http::validation::FieldViolation;

    fn request(username: &str, email: Option<&str>, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.map(str::to_string),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        let command = request("alice", Some("a@x.io"), "p@ssw0rd!")
            .try_into_command()
            .unwrap();

        assert_eq!(command.username.as_str(), "alice");
        assert_eq!(command.email.unwrap().as_str(), "a@x.io");
    }

    #[test]
    fn test_empty_email_is_absent() {
        let command = request("alice", Some(""), "p@ssw0rd!")
            .try_into_command()
            .unwrap();

        assert!(command.email.is_none());
    }

    #[test]
    fn test_reports_every_invalid_field() {
        match request("al", Some("not-an-email"), "short").try_into_command() {
            Err(ApiError::Validation(details)) => {
                let fields: Vec<&str> = details
                    .iter()
                    .map(|FieldViolation { field, .. }| field.as_str())
                    .collect();
                assert_eq!(fields, vec!["username", "email", "password"]);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
