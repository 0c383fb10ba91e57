use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Duration;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::domain::email::EmailMessage;
use crate::domain::email::EmailSender;
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
use crate::user::ports::AuthServicePort;
use crate::user::ports::CredentialStore;

/// Number of random bytes in a password reset token.
const RESET_TOKEN_BYTES: usize = 32;

/// Settings for the password reset flow.
#[derive(Debug, Clone)]
pub struct PasswordResetSettings {
    /// Frontend base URL used to build the reset link
    pub app_url: String,
    /// Reset token lifetime in hours
    pub token_ttl_hours: i64,
}

impl Default for PasswordResetSettings {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:5173".to_string(),
            token_ttl_hours: 24,
        }
    }
}

/// Domain service implementation for identity operations.
///
/// Concrete implementation of AuthServicePort with dependency injection.
pub struct AuthService<S, M>
where
    S: CredentialStore,
    M: EmailSender,
{
    store: Arc<S>,
    mailer: Arc<M>,
    authenticator: Arc<Authenticator>,
    reset_settings: PasswordResetSettings,
}

impl<S, M> AuthService<S, M>
where
    S: CredentialStore,
    M: EmailSender,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential persistence implementation
    /// * `mailer` - Outbound email channel
    /// * `authenticator` - Password hashing and bearer token minting
    /// * `reset_settings` - Password reset link and lifetime
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(
        store: Arc<S>,
        mailer: Arc<M>,
        authenticator: Arc<Authenticator>,
        reset_settings: PasswordResetSettings,
    ) -> Self {
        Self {
            store,
            mailer,
            authenticator,
            reset_settings,
        }
    }

    /// Hash off the async executor; bcrypt is deliberately slow.
    async fn hash_password(&self, password: Password) -> Result<String, UserError> {
        let authenticator = Arc::clone(&self.authenticator);
        tokio::task::spawn_blocking(move || authenticator.hash_password(password.as_str()))
            .await?
            .map_err(|e| UserError::Backend(format!("Password hashing failed: {}", e)))
    }

    async fn ensure_username_available(&self, username: &str) -> Result<(), UserError> {
        match self.store.find_user_by_username(username).await {
            Ok(_) => Err(UserError::UsernameAlreadyExists),
            Err(StoreError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_email_available(&self, email: &EmailAddress) -> Result<(), UserError> {
        match self.store.find_user_by_email(email).await {
            Ok(_) => Err(UserError::EmailAlreadyExists),
            Err(StoreError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn record_session(&self, user_id: UserId, token: &auth::IssuedToken) {
        let session = Session::new(user_id, token.expires_at);
        if let Err(e) = self.store.create_session(&session).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to record session");
        }
    }

    /// Queue delivery on a background task so SMTP latency never reaches
    /// the caller. Failures are logged only.
    fn dispatch_email(&self, message: EmailMessage, email_kind: &'static str) {
        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            match mailer.send(&message).await {
                Ok(()) => tracing::debug!(email_kind, "Email dispatched"),
                Err(e) => tracing::error!(email_kind, error = %e, "Failed to send email"),
            }
        });
    }
}

/// Draw a reset token from the operating system CSPRNG, hex-encoded.
fn generate_reset_token() -> Result<String, UserError> {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| UserError::Backend(format!("Random token generation failed: {}", e)))?;
    Ok(hex::encode(bytes))
}

#[async_trait]
impl<S, M> AuthServicePort for AuthService<S, M>
where
    S: CredentialStore,
    M: EmailSender,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthOutcome, UserError> {
        let RegisterCommand {
            username,
            email,
            password,
        } = command;

        self.ensure_username_available(username.as_str()).await?;
        if let Some(email) = &email {
            self.ensure_email_available(email).await?;
        }

        let password_hash = self.hash_password(password).await?;

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            username,
            email,
            password_hash,
            age: None,
            created_at: now,
            updated_at: now,
        };

        // The lookups above race with concurrent registrations; the unique
        // constraints decide.
        self.store.create_user(&user).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        let token = self
            .authenticator
            .issue_token(&user.id.to_string(), user.username.as_str())
            .map_err(|e| UserError::Backend(format!("Token generation failed: {}", e)))?;

        self.record_session(user.id, &token).await;

        if let Some(email) = &user.email {
            self.dispatch_email(
                EmailMessage::welcome(email, user.username.as_str()),
                "welcome",
            );
        }

        Ok(AuthOutcome { token, user })
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthOutcome, UserError> {
        let user = match self.store.find_user_by_username(&command.username).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(UserError::InvalidCredentials),
            Err(e) => {
                tracing::error!(error = %e, "User lookup failed during login");
                return Err(UserError::InvalidCredentials);
            }
        };

        let authenticator = Arc::clone(&self.authenticator);
        let password = command.password;
        let password_hash = user.password_hash.clone();
        let user_id = user.id.to_string();
        let username = user.username.as_str().to_string();

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &password_hash, &user_id, &username)
        })
        .await?;

        let token = match result {
            Ok(result) => result.token,
            Err(AuthenticationError::InvalidCredentials) => {
                tracing::debug!(user_id = %user.id, "Password mismatch");
                return Err(UserError::InvalidCredentials);
            }
            Err(AuthenticationError::PasswordError(e)) => {
                return Err(UserError::Backend(format!(
                    "Password verification failed: {}",
                    e
                )))
            }
            Err(AuthenticationError::JwtError(e)) => {
                return Err(UserError::Backend(format!("Token generation failed: {}", e)))
            }
        };

        self.record_session(user.id, &token).await;

        tracing::info!(user_id = %user.id, "User logged in");

        Ok(AuthOutcome { token, user })
    }

    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        Ok(self.store.find_user_by_id(id).await?)
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), UserError> {
        let user = match self.store.find_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => {
                tracing::debug!("Password reset requested for unknown email");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let now = Utc::now();
        let expires_at = Duration::try_hours(self.reset_settings.token_ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| UserError::Backend("reset token lifetime out of range".to_string()))?;
        let reset_token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: generate_reset_token()?,
            expires_at,
            used: false,
            created_at: now,
        };

        self.store.create_password_reset_token(&reset_token).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");

        self.dispatch_email(
            EmailMessage::password_reset(
                email,
                &self.reset_settings.app_url,
                &reset_token.token,
                self.reset_settings.token_ttl_hours,
            ),
            "password_reset",
        );

        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: Password) -> Result<(), UserError> {
        let reset_token = match self.store.find_password_reset_token(token).await {
            Ok(reset_token) => reset_token,
            Err(StoreError::NotFound) => return Err(UserError::ResetTokenNotFound),
            Err(e) => return Err(e.into()),
        };

        if reset_token.is_expired(Utc::now()) {
            return Err(UserError::ResetTokenExpired);
        }

        if reset_token.used {
            return Err(UserError::ResetTokenUsed);
        }

        let password_hash = self.hash_password(new_password).await?;

        match self
            .store
            .complete_password_reset(&reset_token.id, &reset_token.user_id, &password_hash)
            .await
        {
            Ok(()) => {
                tracing::info!(user_id = %reset_token.user_id, "Password reset completed");
                Ok(())
            }
            // Another request consumed the token between lookup and commit.
            Err(StoreError::NotFound) => Err(UserError::ResetTokenUsed),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_user(
        &self,
        id: &UserId,
        command: UpdateUserCommand,
    ) -> Result<User, UserError> {
        self.store.find_user_by_id(id).await?;

        let update = UserUpdate {
            username: command.username,
            email: command.email,
            age: command.age,
            password_hash: None,
        };

        self.store.update_user(id, &update).await?;

        tracing::info!(user_id = %id, "User updated");

        Ok(self.store.find_user_by_id(id).await?)
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserError> {
        self.store.find_user_by_id(id).await?;
        self.store.delete_user(id).await?;

        tracing::info!(user_id = %id, "User deleted");

        Ok(())
    }

    async fn purge_expired_credentials(&self) -> Result<CleanupReport, UserError> {
        let reset_tokens = self.store.cleanup_expired_password_reset_tokens().await?;
        let sessions = self.store.delete_expired_sessions().await?;

        Ok(CleanupReport {
            reset_tokens,
            sessions,
        })
    }
}
