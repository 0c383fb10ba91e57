use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use identity_service::domain::email::EmailError;
use identity_service::domain::email::EmailMessage;
use identity_service::domain::email::EmailSender;
use identity_service::domain::user::service::AuthService;
use identity_service::domain::user::service::PasswordResetSettings;
use identity_service::inbound::http::middleware::RateLimiter;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::outbound::repositories::SqliteCredentialStore;
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::sync::Mutex;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const APP_URL: &str = "http://frontend.test";

/// Email sender that hands every message to the test.
pub struct CapturingMailer {
    sent: mpsc::UnboundedSender<EmailMessage>,
}

#[async_trait]
impl EmailSender for CapturingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent
            .send(message.clone())
            .map_err(|e| EmailError::Delivery(e.to_string()))
    }
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub api_client: reqwest::Client,
    pub authenticator: Authenticator,
    emails: Mutex<mpsc::UnboundedReceiver<EmailMessage>>,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with_burst(1_000).await
    }

    /// Spawn the application with a rate limit of `burst` requests per minute
    pub async fn spawn_with_burst(burst: u32) -> Self {
        let pool = SqliteCredentialStore::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");
        SqliteCredentialStore::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let (sender, receiver) = mpsc::unbounded_channel();
        let authenticator = Arc::new(Authenticator::new(JWT_SECRET));
        let auth_service = Arc::new(AuthService::new(
            Arc::new(SqliteCredentialStore::new(pool.clone())),
            Arc::new(CapturingMailer { sent: sender }),
            Arc::clone(&authenticator),
            PasswordResetSettings {
                app_url: APP_URL.to_string(),
                token_ttl_hours: 24,
            },
        ));

        let router = create_router(
            AppState::new(auth_service, authenticator),
            RateLimiter::new(Duration::from_secs(60), burst),
            &["http://localhost:5173".to_string()],
        );

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Server error");
        });

        Self {
            address,
            pool,
            api_client: reqwest::Client::new(),
            authenticator: Authenticator::new(JWT_SECRET),
            emails: Mutex::new(receiver),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account and return the response body
    pub async fn register(&self, username: &str, email: &str, password: &str) -> serde_json::Value {
        let response = self
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Failed to parse response")
    }

    /// Wait for the next email handed to the mailer
    pub async fn next_email(&self) -> EmailMessage {
        let mut emails = self.emails.lock().await;
        tokio::time::timeout(Duration::from_secs(5), emails.recv())
            .await
            .expect("Timed out waiting for email")
            .expect("Mailer dropped")
    }

    /// Wait for the next email with `subject`, skipping any others
    pub async fn next_email_with_subject(&self, subject: &str) -> EmailMessage {
        loop {
            let email = self.next_email().await;
            if email.subject == subject {
                return email;
            }
        }
    }

    /// Count reset token rows in the database
    pub async fn reset_token_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_token")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count reset tokens")
    }
}

/// Extract the reset token from a password reset email body
pub fn reset_token_from(email: &EmailMessage) -> String {
    let start = email
        .body
        .find("token=")
        .expect("Reset link missing from email")
        + "token=".len();

    email.body[start..]
        .chars()
        .take_while(|c| c.is_ascii_hexdigit())
        .collect()
}
