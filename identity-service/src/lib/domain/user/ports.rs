use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::user::models::AuthOutcome;
use crate::domain::user::models::CleanupReport;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::LoginCommand;
use crate::domain::user::models::Password;
use crate::domain::user::models::PasswordResetToken;
use crate::domain::user::models::RegisterCommand;
use crate::domain::user::models::Session;
use crate::domain::user::models::UpdateUserCommand;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserUpdate;
use crate::user::errors::StoreError;
use crate::user::errors::UserError;

/// Port for identity domain service operations.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a new account and mint its first bearer token.
    ///
    /// # Arguments
    /// * `command` - Validated command containing username, optional email, and password
    ///
    /// # Returns
    /// Bearer token and the created user
    ///
    /// # Errors
    /// * `UsernameAlreadyExists` - Username is already taken
    /// * `EmailAlreadyExists` - Email is already registered
    /// * `Backend` - Hashing, token minting, or storage failed
    async fn register(&self, command: RegisterCommand) -> Result<AuthOutcome, UserError>;

    /// Verify credentials and mint a bearer token.
    ///
    /// # Arguments
    /// * `command` - Username and plaintext password
    ///
    /// # Returns
    /// Bearer token and the authenticated user
    ///
    /// # Errors
    /// * `InvalidCredentials` - Unknown username, wrong password, or lookup failure
    /// * `Backend` - Token minting failed
    async fn login(&self, command: LoginCommand) -> Result<AuthOutcome, UserError>;

    /// Retrieve user by unique identifier.
    ///
    /// # Arguments
    /// * `id` - User ID
    ///
    /// # Returns
    /// User entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Backend` - Database operation failed
    async fn get_user(&self, id: &UserId) -> Result<User, UserError>;

    /// Start the password reset flow for an email address.
    ///
    /// Succeeds without side effects when no account uses `email`.
    ///
    /// # Arguments
    /// * `email` - Address the reset link is sent to
    ///
    /// # Errors
    /// * `Backend` - Token could not be persisted
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), UserError>;

    /// Consume a reset token and set a new password.
    ///
    /// # Arguments
    /// * `token` - Hex token from the reset email
    /// * `new_password` - Replacement password
    ///
    /// # Errors
    /// * `ResetTokenNotFound` - No such token
    /// * `ResetTokenExpired` - Token expiry has passed
    /// * `ResetTokenUsed` - Token was already consumed
    /// * `Backend` - Hashing or storage failed
    async fn reset_password(&self, token: &str, new_password: Password) -> Result<(), UserError>;

    /// Update existing user with optional fields.
    ///
    /// # Arguments
    /// * `id` - User ID to update
    /// * `command` - Command with optional username, email, and age fields
    ///
    /// # Returns
    /// Updated user entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `UsernameAlreadyExists` - New username is already taken
    /// * `EmailAlreadyExists` - New email is already registered
    /// * `Backend` - Database operation failed
    async fn update_user(&self, id: &UserId, command: UpdateUserCommand)
        -> Result<User, UserError>;

    /// Delete existing user together with its sessions and reset tokens.
    ///
    /// # Arguments
    /// * `id` - User ID to delete
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Backend` - Database operation failed
    async fn delete_user(&self, id: &UserId) -> Result<(), UserError>;

    /// Remove expired or consumed reset tokens and expired sessions.
    ///
    /// # Returns
    /// Number of rows removed per table
    ///
    /// # Errors
    /// * `Backend` - Database operation failed
    async fn purge_expired_credentials(&self) -> Result<CleanupReport, UserError>;
}

/// Persistence operations for users, sessions, and password reset tokens.
///
/// Implementations translate engine errors into `StoreError` and keep SQL
/// dialect differences to themselves.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Persist new user to storage.
    ///
    /// # Errors
    /// * `Conflict` - Username or email is already taken
    /// * `Backend` - Database operation failed
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Retrieve user by identifier.
    ///
    /// # Errors
    /// * `NotFound` - No matching user
    /// * `Backend` - Database operation failed
    async fn find_user_by_id(&self, id: &UserId) -> Result<User, StoreError>;

    /// Retrieve user by username.
    ///
    /// # Errors
    /// * `NotFound` - No matching user
    /// * `Backend` - Database operation failed
    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Retrieve user by email address.
    ///
    /// # Errors
    /// * `NotFound` - No matching user
    /// * `Backend` - Database operation failed
    async fn find_user_by_email(&self, email: &EmailAddress) -> Result<User, StoreError>;

    /// Apply a partial update in a single statement.
    ///
    /// `updated_at` is rewritten even when `update` carries no fields.
    ///
    /// # Errors
    /// * `NotFound` - No row matched `id`
    /// * `Conflict` - New username or email collides
    /// * `Backend` - Database operation failed
    async fn update_user(&self, id: &UserId, update: &UserUpdate) -> Result<(), StoreError>;

    /// Remove user and its dependent rows.
    ///
    /// Deleting an absent user is not an error.
    ///
    /// # Errors
    /// * `Backend` - Database operation failed
    async fn delete_user(&self, id: &UserId) -> Result<(), StoreError>;

    /// Persist a session audit record.
    async fn create_session(&self, session: &Session) -> Result<(), StoreError>;

    /// Retrieve a session by identifier.
    ///
    /// # Errors
    /// * `NotFound` - No matching session
    async fn find_session(&self, id: &Uuid) -> Result<Session, StoreError>;

    /// Remove a session; absent sessions are ignored.
    async fn delete_session(&self, id: &Uuid) -> Result<(), StoreError>;

    /// Remove sessions whose expiry has passed.
    ///
    /// # Returns
    /// Number of sessions removed
    async fn delete_expired_sessions(&self) -> Result<u64, StoreError>;

    /// Persist a new password reset token.
    ///
    /// # Errors
    /// * `Conflict` - Token value collides with an existing one
    /// * `Backend` - Database operation failed
    async fn create_password_reset_token(
        &self,
        token: &PasswordResetToken,
    ) -> Result<(), StoreError>;

    /// Retrieve a reset token by its value.
    ///
    /// Expiry and used-ness are reported as stored, not enforced.
    ///
    /// # Errors
    /// * `NotFound` - No matching token
    async fn find_password_reset_token(&self, token: &str)
        -> Result<PasswordResetToken, StoreError>;

    /// Flag a reset token as used.
    async fn mark_password_reset_token_used(&self, id: &Uuid) -> Result<(), StoreError>;

    /// Set a new password hash and consume the reset token atomically.
    ///
    /// The token is only consumed if it is still unused; otherwise nothing
    /// is written.
    ///
    /// # Errors
    /// * `NotFound` - Token was already consumed, or the user no longer exists
    /// * `Backend` - Database operation failed
    async fn complete_password_reset(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    /// Delete reset tokens that are expired or already used.
    ///
    /// # Returns
    /// Number of tokens removed
    async fn cleanup_expired_password_reset_tokens(&self) -> Result<u64, StoreError>;
}
