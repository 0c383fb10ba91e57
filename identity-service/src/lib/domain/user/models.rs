use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::user::errors::AgeError;
use crate::user::errors::EmailAddressError;
use crate::user::errors::PasswordPolicyError;
use crate::user::errors::UserIdError;
use crate::user::errors::UsernameError;

/// User aggregate entity.
///
/// Represents a registered account. The password hash never leaves the
/// service boundary; HTTP responses use a projection instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: Option<EmailAddress>,
    pub password_hash: String,
    pub age: Option<Age>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    ///
    /// # Returns
    /// UserId with random UUID v4
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Returns
    /// Parsed UserId
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters long. Length is counted in characters,
/// not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    pub const MIN_LENGTH: usize = 3;
    pub const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// # Arguments
    /// * `username` - Raw username string
    ///
    /// # Returns
    /// Validated Username value object
    ///
    /// # Errors
    /// * `Missing` - Username is empty
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let length = username.chars().count();
        if length == 0 {
            Err(UsernameError::Missing)
        } else if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(Self(username))
        }
    }

    /// Get username as string slice.
    ///
    /// # Returns
    /// Username string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Returns
    /// Validated EmailAddress value object
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailAddressError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailAddressError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    ///
    /// # Returns
    /// Email string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Plaintext password that satisfies the length policy.
///
/// Length is counted in characters, and the UTF-8 encoding may not exceed
/// bcrypt's 72-byte input limit. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub const MIN_LENGTH: usize = 8;
    pub const MAX_LENGTH: usize = 72;
    pub const MAX_BYTES: usize = 72;

    /// Create a new password that satisfies the policy.
    ///
    /// # Errors
    /// * `Missing` - Password is empty
    /// * `TooShort` - Fewer than 8 characters
    /// * `TooLong` - More than 72 characters or more than 72 bytes
    pub fn new(password: String) -> Result<Self, PasswordPolicyError> {
        let length = password.chars().count();
        if length == 0 {
            Err(PasswordPolicyError::Missing)
        } else if length < Self::MIN_LENGTH {
            Err(PasswordPolicyError::TooShort {
                min: Self::MIN_LENGTH,
            })
        } else if length > Self::MAX_LENGTH || password.len() > Self::MAX_BYTES {
            Err(PasswordPolicyError::TooLong {
                max: Self::MAX_LENGTH,
            })
        } else {
            Ok(Self(password))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Age in years, 0 to 150 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u8);

impl Age {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 150;

    /// # Errors
    /// * `OutOfRange` - Value outside 0..=150
    pub fn new(age: i64) -> Result<Self, AgeError> {
        if (Self::MIN..=Self::MAX).contains(&age) {
            Ok(Self(age as u8))
        } else {
            Err(AgeError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: age,
            })
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Login audit record.
///
/// Bearer tokens are stateless, so sessions are written for bookkeeping only
/// and never consulted when authenticating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: UserId, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            expires_at,
        }
    }
}

/// One-time password reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub id: Uuid,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Check whether the token has expired at `now`.
    ///
    /// The expiry instant itself already counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Column updates applied to a stored user.
///
/// Only fields set to `Some` are written. `updated_at` is always refreshed by
/// the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
    pub age: Option<Age>,
    pub password_hash: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.age.is_none()
            && self.password_hash.is_none()
    }
}

/// Command to register a new account with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub username: Username,
    pub email: Option<EmailAddress>,
    pub password: Password,
}

impl RegisterCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `username` - Validated username
    /// * `email` - Optional validated email address
    /// * `password` - Plain text password (will be hashed by service)
    ///
    /// # Returns
    /// RegisterCommand with validated fields
    pub fn new(username: Username, email: Option<EmailAddress>, password: Password) -> Self {
        Self {
            username,
            email,
            password,
        }
    }
}

/// Command to log in.
///
/// Fields are not policy-checked: a malformed username simply fails to match.
#[derive(Debug)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

/// Command to update an existing user with optional validated fields.
///
/// All fields are optional to support partial updates.
/// Only provided fields will be updated.
#[derive(Debug, Default)]
pub struct UpdateUserCommand {
    pub username: Option<Username>,
    pub email: Option<EmailAddress>,
    pub age: Option<Age>,
}

/// Bearer token plus the account it was minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub token: auth::IssuedToken,
    pub user: User,
}

/// Row counts removed by a credential cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub reset_tokens: u64,
    pub sessions: u64,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(matches!(
            Username::new("ab".to_string()),
            Err(UsernameError::TooShort { .. })
        ));
        assert!(Username::new("abc".to_string()).is_ok());
        assert!(Username::new("a".repeat(32)).is_ok());
        assert!(matches!(
            Username::new("a".repeat(33)),
            Err(UsernameError::TooLong { .. })
        ));
        assert_eq!(Username::new(String::new()), Err(UsernameError::Missing));
    }

    #[test]
    fn test_username_counts_characters_not_bytes() {
        assert!(Username::new("ééé".to_string()).is_ok());
        assert!(Username::new("é".repeat(32)).is_ok());
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(matches!(
            Password::new("a".repeat(7)),
            Err(PasswordPolicyError::TooShort { .. })
        ));
        assert!(Password::new("a".repeat(8)).is_ok());
        assert!(Password::new("a".repeat(72)).is_ok());
        assert!(matches!(
            Password::new("a".repeat(73)),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_byte_length_bound() {
        assert!(Password::new("é".repeat(36)).is_ok());

        // 44 characters, 80 bytes.
        let multibyte = format!("{}aaaaaaaa", "é".repeat(36));
        assert_eq!(
            Password::new(multibyte),
            Err(PasswordPolicyError::TooLong {
                max: Password::MAX_BYTES
            })
        );
        assert!(matches!(
            Password::new(format!("{}a", "é".repeat(36))),
            Err(PasswordPolicyError::TooLong { .. })
        ));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("super-secret".to_string()).unwrap();
        assert!(!format!("{:?}", password).contains("super-secret"));
    }

    #[test]
    fn test_age_bounds() {
        assert!(Age::new(0).is_ok());
        assert!(Age::new(150).is_ok());
        assert!(Age::new(-1).is_err());
        assert!(Age::new(151).is_err());
    }

    #[test]
    fn test_email_validation() {
        assert!(EmailAddress::new("a@x.io".to_string()).is_ok());
        assert!(EmailAddress::new("not-an-email".to_string()).is_err());
    }

    #[test]
    fn test_reset_token_expiry_boundary() {
        let now = Utc::now();
        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: UserId::new(),
            token: "ab".repeat(32),
            expires_at: now,
            used: false,
            created_at: now - Duration::hours(24),
        };

        assert!(token.is_expired(now));
        assert!(token.is_expired(now + Duration::seconds(1)));
        assert!(!token.is_expired(now - Duration::seconds(1)));
    }
}
