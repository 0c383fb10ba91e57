pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresCredentialStore;
pub use sqlite::SqliteCredentialStore;

use chrono::DateTime;
use chrono::Utc;
use sqlx::Database;
use sqlx::Encode;
use sqlx::QueryBuilder;
use sqlx::Type;
use uuid::Uuid;

use crate::domain::user::models::Age;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PasswordResetToken;
use crate::domain::user::models::Session;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserUpdate;
use crate::domain::user::models::Username;
use crate::user::errors::ConflictField;
use crate::user::errors::StoreError;

/// Tables holding rows keyed by `user_id`, cleared before the user row itself.
pub(crate) const USER_DEPENDENT_TABLES: [&str; 2] = ["password_reset_token", "session"];

/// Append the assignments and `WHERE` clause of a partial user update.
///
/// `builder` must already hold `UPDATE "user" SET `. `updated_at` is always
/// written; other columns only when present in `update`. Placeholders follow
/// the builder's engine.
pub(crate) fn push_user_update<'args, DB>(
    builder: &mut QueryBuilder<'args, DB>,
    id: &UserId,
    update: &UserUpdate,
    now: DateTime<Utc>,
) where
    DB: Database,
    String: Encode<'args, DB> + Type<DB>,
    i32: Encode<'args, DB> + Type<DB>,
    DateTime<Utc>: Encode<'args, DB> + Type<DB>,
{
    builder.push("updated_at = ").push_bind(now);

    if let Some(username) = &update.username {
        builder
            .push(", username = ")
            .push_bind(username.as_str().to_string());
    }
    if let Some(email) = &update.email {
        builder.push(", email = ").push_bind(email.as_str().to_string());
    }
    if let Some(age) = update.age {
        builder.push(", age = ").push_bind(i32::from(age.value()));
    }
    if let Some(password_hash) = &update.password_hash {
        builder
            .push(", password_hash = ")
            .push_bind(password_hash.clone());
    }

    builder.push(" WHERE id = ").push_bind(id.to_string());
}

/// `user` table row. Both engines store identifiers as text.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_user_id(&row.id)?,
            username: Username::new(row.username).map_err(corrupt_row)?,
            email: row
                .email
                .map(EmailAddress::new)
                .transpose()
                .map_err(corrupt_row)?,
            password_hash: row.password_hash,
            age: row
                .age
                .map(|age| Age::new(i64::from(age)))
                .transpose()
                .map_err(corrupt_row)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `session` table row
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SessionRow {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: parse_uuid(&row.id)?,
            user_id: parse_user_id(&row.user_id)?,
            expires_at: row.expires_at,
        })
    }
}

/// `password_reset_token` table row
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PasswordResetTokenRow {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PasswordResetTokenRow> for PasswordResetToken {
    type Error = StoreError;

    fn try_from(row: PasswordResetTokenRow) -> Result<Self, Self::Error> {
        Ok(PasswordResetToken {
            id: parse_uuid(&row.id)?,
            user_id: parse_user_id(&row.user_id)?,
            token: row.token,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        })
    }
}

fn parse_user_id(value: &str) -> Result<UserId, StoreError> {
    UserId::from_string(value).map_err(corrupt_row)
}

fn parse_uuid(value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(corrupt_row)
}

fn corrupt_row(err: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(format!("Corrupt row: {}", err))
}

/// Map a read-path driver error.
pub(crate) fn backend_error(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Map a write-path driver error, recognising unique violations.
///
/// Postgres reports the violated constraint by name (`user_username_key`);
/// SQLite only names the column in the message (`UNIQUE constraint failed:
/// user.username`). Both contain the column name.
pub(crate) fn write_error(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let hint = db_err
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());
            if let Some(field) = conflict_field(&hint) {
                return StoreError::Conflict(field);
            }
        }
    }
    StoreError::Backend(err.to_string())
}

fn conflict_field(hint: &str) -> Option<ConflictField> {
    if hint.contains("username") {
        Some(ConflictField::Username)
    } else if hint.contains("email") {
        Some(ConflictField::Email)
    } else if hint.contains("token") {
        Some(ConflictField::Token)
    } else {
        None
    }
}
