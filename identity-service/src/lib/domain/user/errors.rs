use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username is required")]
    Missing,

    #[error("Username must be at least {min} characters")]
    TooShort { min: usize, actual: usize },

    #[error("Username must be at most {max} characters")]
    TooLong { max: usize, actual: usize },
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailAddressError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error for password policy violations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password is required")]
    Missing,

    #[error("Password must be at least {min} characters")]
    TooShort { min: usize },

    #[error("Password must be at most {max} characters and {max} bytes")]
    TooLong { max: usize },
}

/// Error for Age validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgeError {
    #[error("Age must be between {min} and {max}")]
    OutOfRange { min: i64, max: i64, actual: i64 },
}

/// Column whose unique constraint rejected a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Username,
    Email,
    Token,
}

/// Error surfaced by credential store implementations.
///
/// Engine-specific failures are collapsed into these three categories so the
/// service never sees driver types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violated on {0:?}")]
    Conflict(ConflictField),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Top-level error for all identity operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserError {
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    NotFound,

    // Reset token lifecycle
    #[error("Invalid or expired token")]
    ResetTokenNotFound,

    #[error("Token has expired")]
    ResetTokenExpired,

    #[error("Token has already been used")]
    ResetTokenUsed,

    // Infrastructure errors
    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => UserError::NotFound,
            StoreError::Conflict(ConflictField::Username) => UserError::UsernameAlreadyExists,
            StoreError::Conflict(ConflictField::Email) => UserError::EmailAlreadyExists,
            StoreError::Conflict(ConflictField::Token) => {
                UserError::Backend("reset token collision".to_string())
            }
            StoreError::Backend(msg) => UserError::Backend(msg),
        }
    }
}

impl From<tokio::task::JoinError> for UserError {
    fn from(err: tokio::task::JoinError) -> Self {
        UserError::Backend(format!("blocking task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_conflicts_map_to_field_specific_errors() {
        assert_eq!(
            UserError::from(StoreError::Conflict(ConflictField::Username)),
            UserError::UsernameAlreadyExists
        );
        assert_eq!(
            UserError::from(StoreError::Conflict(ConflictField::Email)),
            UserError::EmailAlreadyExists
        );
        assert!(matches!(
            UserError::from(StoreError::Conflict(ConflictField::Token)),
            UserError::Backend(_)
        ));
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            UserError::UsernameAlreadyExists.to_string(),
            "Username already exists"
        );
        assert_eq!(UserError::ResetTokenUsed.to_string(), "Token has already been used");
        assert_eq!(UserError::ResetTokenNotFound.to_string(), "Invalid or expired token");
    }
}
