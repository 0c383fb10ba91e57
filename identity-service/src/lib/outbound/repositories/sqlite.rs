use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::QueryBuilder;
use sqlx::Sqlite;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::backend_error;
use super::push_user_update;
use super::write_error;
use super::PasswordResetTokenRow;
use super::SessionRow;
use super::UserRow;
use super::USER_DEPENDENT_TABLES;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::PasswordResetToken;
use crate::domain::user::models::Session;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserUpdate;
use crate::domain::user::ports::CredentialStore;
use crate::user::errors::StoreError;

const USER_COLUMNS: &str = "id, username, email, password_hash, age, created_at, updated_at";

/// Credential store backed by an embedded SQLite database file.
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a connection pool on the database file at `path`.
    ///
    /// The parent directory and the file are created when missing. Foreign
    /// keys are enforced on every connection.
    pub async fn connect(path: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
    }

    /// Open a private in-memory database.
    ///
    /// The pool holds a single connection that never expires, since the
    /// database lives exactly as long as that connection.
    pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
    }

    /// Apply the embedded SQLite migrations.
    pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations/sqlite").run(pool).await
    }

    async fn find_user_where(&self, column: &str, value: &str) -> Result<User, StoreError> {
        let sql = format!(r#"SELECT {USER_COLUMNS} FROM "user" WHERE {column} = ?"#);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "user" (id, username, email, password_hash, age, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(user.username.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(&user.password_hash)
        .bind(user.age.map(|a| i32::from(a.value())))
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn find_user_by_id(&self, id: &UserId) -> Result<User, StoreError> {
        self.find_user_where("id", &id.to_string()).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.find_user_where("username", username).await
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> Result<User, StoreError> {
        self.find_user_where("email", email.as_str()).await
    }

    async fn update_user(&self, id: &UserId, update: &UserUpdate) -> Result<(), StoreError> {
        let mut builder = QueryBuilder::<Sqlite>::new(r#"UPDATE "user" SET "#);
        push_user_update(&mut builder, id, update, Utc::now());

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), StoreError> {
        let id = id.to_string();
        let mut tx = self.pool.begin().await.map_err(backend_error)?;

        for table in USER_DEPENDENT_TABLES {
            let sql = format!("DELETE FROM {table} WHERE user_id = ?");
            sqlx::query(&sql)
                .bind(&id)
                .execute(&mut *tx)
                .await
                .map_err(backend_error)?;
        }
        sqlx::query(r#"DELETE FROM "user" WHERE id = ?"#)
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(backend_error)?;

        tx.commit().await.map_err(backend_error)
    }

    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO session (id, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(session.id.to_string())
            .bind(session.user_id.to_string())
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(write_error)?;

        Ok(())
    }

    async fn find_session(&self, id: &Uuid) -> Result<Session, StoreError> {
        sqlx::query_as::<_, SessionRow>("SELECT id, user_id, expires_at FROM session WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend_error)?
            .ok_or(StoreError::NotFound)?
            .try_into()
    }

    async fn delete_session(&self, id: &Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM session WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn delete_expired_sessions(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at < ?")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(result.rows_affected())
    }

    async fn create_password_reset_token(
        &self,
        token: &PasswordResetToken,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_token (id, user_id, token, expires_at, used, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(token.user_id.to_string())
        .bind(&token.token)
        .bind(token.expires_at)
        .bind(token.used)
        .bind(token.created_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(())
    }

    async fn find_password_reset_token(
        &self,
        token: &str,
    ) -> Result<PasswordResetToken, StoreError> {
        sqlx::query_as::<_, PasswordResetTokenRow>(
            r#"
            SELECT id, user_id, token, expires_at, used, created_at
            FROM password_reset_token
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?
        .ok_or(StoreError::NotFound)?
        .try_into()
    }

    async fn mark_password_reset_token_used(&self, id: &Uuid) -> Result<(), StoreError> {
        sqlx::query("UPDATE password_reset_token SET used = 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn complete_password_reset(
        &self,
        token_id: &Uuid,
        user_id: &UserId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend_error)?;

        // SQLite takes the write lock here, so a concurrent reset blocks until commit.
        let consumed = sqlx::query(
            "UPDATE password_reset_token SET used = 1 WHERE id = ? AND used = 0",
        )
        .bind(token_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(backend_error)?;

        if consumed.rows_affected() == 0 {
            tx.rollback().await.map_err(backend_error)?;
            return Err(StoreError::NotFound);
        }

        let updated =
            sqlx::query(r#"UPDATE "user" SET password_hash = ?, updated_at = ? WHERE id = ?"#)
                .bind(password_hash)
                .bind(Utc::now())
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(backend_error)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(backend_error)?;
            return Err(StoreError::NotFound);
        }

        tx.commit().await.map_err(backend_error)
    }

    async fn cleanup_expired_password_reset_tokens(&self) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM password_reset_token WHERE expires_at < ? OR used = 1")
                .bind(Utc::now())
                .execute(&self.pool)
                .await
                .map_err(backend_error)?;

        Ok(result.rows_affected())
    }
}
