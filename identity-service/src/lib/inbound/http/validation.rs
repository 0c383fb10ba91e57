use std::fmt::Display;

use serde::Serialize;

use super::handlers::ApiError;

/// One failed field constraint, as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &str, message: impl Display) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Collects field violations while a request body is parsed into domain types.
///
/// Every field is checked, so the client sees all problems at once rather
/// than the first one.
#[derive(Debug, Default)]
pub struct Validator {
    violations: Vec<FieldViolation>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of a failed conversion and return the value otherwise.
    pub fn check<T, E: Display>(&mut self, field: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.violations.push(FieldViolation::new(field, e));
                None
            }
        }
    }

    /// Record a violation when `value` is blank.
    pub fn require(&mut self, field: &str, value: &str) -> bool {
        if value.is_empty() {
            self.violations
                .push(FieldViolation::new(field, format!("{} is required", field)));
            false
        } else {
            true
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Turn the collected violations into a `400 Validation failed` error.
    pub fn into_error(self) -> ApiError {
        ApiError::Validation(self.violations)
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_every_violation() {
        let mut validator = Validator::new();

        assert_eq!(validator.check::<u8, _>("age", Err("out of range")), None);
        assert!(!validator.require("password", ""));
        assert_eq!(validator.check::<_, String>("username", Ok("alice")), Some("alice"));

        match validator.finish() {
            Err(ApiError::Validation(violations)) => {
                assert_eq!(
                    violations,
                    vec![
                        FieldViolation::new("age", "out of range"),
                        FieldViolation::new("password", "password is required"),
                    ]
                );
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_finish_without_violations() {
        let mut validator = Validator::new();
        assert!(validator.require("username", "alice"));
        assert!(validator.finish().is_ok());
    }
}
