use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::jwt::Claims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining password verification and JWT generation.
///
/// Provides high-level authentication operations by coordinating
/// password hashing and bearer token handling.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
    token_lifetime: Duration,
}

/// A freshly minted bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// JWT access token (compact form)
    pub access_token: String,
    /// Instant at which the token stops verifying
    pub expires_at: DateTime<Utc>,
}

/// Result of successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationResult {
    pub token: IssuedToken,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Bearer token lifetime used when none is configured.
    pub const DEFAULT_TOKEN_LIFETIME_HOURS: i64 = 72;

    /// Create a new authenticator.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for JWT signing
    ///
    /// # Returns
    /// Authenticator issuing 72-hour tokens and hashing with the default bcrypt cost
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
            token_lifetime: Duration::hours(Self::DEFAULT_TOKEN_LIFETIME_HOURS),
        }
    }

    /// Hash a password for storage.
    ///
    /// # Errors
    /// * `PasswordError` - Hashing operation failed
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Verify credentials and mint a bearer token.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `stored_hash` - Stored password hash
    /// * `user_id` - Identifier placed in the `user_id` claim
    /// * `username` - Name placed in the `username` claim
    ///
    /// # Errors
    /// * `InvalidCredentials` - Password does not match
    /// * `PasswordError` - Stored hash could not be parsed
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        user_id: &str,
        username: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let is_valid = self.password_hasher.verify(password, stored_hash)?;

        if !is_valid {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let token = self.issue_token(user_id, username)?;

        Ok(AuthenticationResult { token })
    }

    /// Mint a bearer token without password verification.
    ///
    /// Used right after registration, when the password was just chosen.
    ///
    /// # Errors
    /// * `JwtError` - Token generation failed
    pub fn issue_token(&self, user_id: &str, username: &str) -> Result<IssuedToken, JwtError> {
        self.issue_token_at(user_id, username, Utc::now())
    }

    /// Mint a bearer token as if issued at `issued_at`.
    pub fn issue_token_at(
        &self,
        user_id: &str,
        username: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, JwtError> {
        let claims = Claims::for_user(user_id, username, issued_at, self.token_lifetime);
        let access_token = self.jwt_handler.encode(&claims)?;
        let expires_at = claims
            .expires_at()
            .ok_or_else(|| JwtError::EncodingFailed("expiry out of range".to_string()))?;

        Ok(IssuedToken {
            access_token,
            expires_at,
        })
    }

    /// Validate a bearer token and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` - Current time is at or past `exp`
    /// * `DecodingFailed` - Malformed token, wrong algorithm, bad signature, or
    ///   missing / mistyped claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        let claims: Claims = self.jwt_handler.decode(token)?;

        if claims.is_expired(Utc::now().timestamp()) {
            return Err(JwtError::TokenExpired);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret_key_at_least_32_bytes!";

    #[test]
    fn test_authenticate_success() {
        let authenticator = Authenticator::new(SECRET);

        let password = "my_password";
        let hash = authenticator
            .hash_password(password)
            .expect("Failed to hash password");

        let result = authenticator
            .authenticate(password, &hash, "user123", "alice")
            .expect("Authentication failed");

        assert!(!result.token.access_token.is_empty());

        let decoded = authenticator
            .validate_token(&result.token.access_token)
            .expect("Token validation failed");
        assert_eq!(decoded.user_id, "user123");
        assert_eq!(decoded.username, "alice");
        assert_eq!(decoded.exp - decoded.iat, 72 * 60 * 60);
    }

    #[test]
    fn test_authenticate_invalid_password() {
        let authenticator = Authenticator::new(SECRET);

        let hash = authenticator
            .hash_password("my_password")
            .expect("Failed to hash password");

        let result = authenticator.authenticate("wrong_password", &hash, "user123", "alice");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_authenticate_does_not_match_on_shared_72_byte_prefix() {
        let authenticator = Authenticator::new(SECRET);
        let prefix = "é".repeat(36);
        let stored = format!("{}aaaaaaaa", prefix);

        assert!(matches!(
            authenticator.hash_password(&stored),
            Err(PasswordError::HashingFailed(_))
        ));

        let hash = authenticator
            .hash_password(&prefix)
            .expect("Failed to hash password");
        let result =
            authenticator.authenticate(&format!("{}bbbbbbbb", prefix), &hash, "user123", "alice");
        assert!(matches!(
            result,
            Err(AuthenticationError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_token_valid_just_before_lifetime_elapses() {
        let authenticator = Authenticator::new(SECRET);
        let issued_at = Utc::now() - Duration::hours(72) + Duration::minutes(1);

        let token = authenticator
            .issue_token_at("user123", "alice", issued_at)
            .expect("Failed to generate token");

        assert!(authenticator.validate_token(&token.access_token).is_ok());
    }

    #[test]
    fn test_token_rejected_after_lifetime() {
        let authenticator = Authenticator::new(SECRET);
        let issued_at = Utc::now() - Duration::hours(72) - Duration::seconds(1);

        let token = authenticator
            .issue_token_at("user123", "alice", issued_at)
            .expect("Failed to generate token");

        assert!(matches!(
            authenticator.validate_token(&token.access_token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_issued_token_reports_expiry() {
        let authenticator = Authenticator::new(SECRET);
        let issued_at = Utc::now();

        let token = authenticator
            .issue_token_at("user123", "alice", issued_at)
            .expect("Failed to generate token");

        assert_eq!(
            token.expires_at.timestamp(),
            (issued_at + Duration::hours(72)).timestamp()
        );
    }

    #[test]
    fn test_validate_invalid_token() {
        let authenticator = Authenticator::new(SECRET);

        assert!(authenticator.validate_token("invalid.token.here").is_err());
        assert!(authenticator.validate_token("").is_err());
    }
}
