use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::config::DatabaseKind;
use identity_service::domain::user::ports::AuthServicePort;
use identity_service::domain::user::ports::CredentialStore;
use identity_service::domain::user::service::AuthService;
use identity_service::inbound::http::middleware::RateLimiter;
use identity_service::inbound::http::router::create_router;
use identity_service::inbound::http::router::AppState;
use identity_service::outbound::email::Mailer;
use identity_service::outbound::repositories::PostgresCredentialStore;
use identity_service::outbound::repositories::SqliteCredentialStore;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const MAX_CONNECTIONS: u32 = 5;
const RATE_LIMIT_SWEEP_PERIOD: Duration = Duration::from_secs(60);
const CREDENTIAL_CLEANUP_PERIOD: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        "Service starting"
    );
    tracing::info!(config = ?config, "Configuration loaded");

    let mailer = Arc::new(Mailer::from_settings(config.smtp_settings())?);
    tracing::info!(mailer = mailer.kind(), "Email dispatcher ready");

    match config.db_type {
        DatabaseKind::Postgres => {
            let pool = PostgresCredentialStore::connect(&config.db_url, MAX_CONNECTIONS).await?;
            tracing::info!(
                max_connections = MAX_CONNECTIONS,
                database = "postgresql",
                "Database connection pool created"
            );

            PostgresCredentialStore::migrate(&pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            serve(
                &config,
                Arc::new(PostgresCredentialStore::new(pool.clone())),
                mailer,
            )
            .await?;
            pool.close().await;
        }
        DatabaseKind::Sqlite => {
            let pool = SqliteCredentialStore::connect(&config.sqlite_path, MAX_CONNECTIONS).await?;
            tracing::info!(
                max_connections = MAX_CONNECTIONS,
                database = "sqlite",
                path = %config.sqlite_path,
                "Database connection pool created"
            );

            SqliteCredentialStore::migrate(&pool).await?;
            tracing::info!(database = "sqlite", "Database migrations completed");

            serve(
                &config,
                Arc::new(SqliteCredentialStore::new(pool.clone())),
                mailer,
            )
            .await?;
            pool.close().await;
        }
    }

    tracing::info!("Database connection pool closed");
    Ok(())
}

async fn serve<S>(config: &Config, store: Arc<S>, mailer: Arc<Mailer>) -> Result<(), anyhow::Error>
where
    S: CredentialStore,
{
    let authenticator = Arc::new(Authenticator::new(config.jwt_secret.as_bytes()));
    let auth_service: Arc<dyn AuthServicePort> = Arc::new(AuthService::new(
        store,
        mailer,
        Arc::clone(&authenticator),
        config.password_reset_settings(),
    ));

    let rate_limiter = RateLimiter::new(config.rate_limit_window(), config.rate_limit_burst);
    rate_limiter.spawn_sweeper(RATE_LIMIT_SWEEP_PERIOD);
    spawn_credential_cleanup(Arc::clone(&auth_service));

    let application = create_router(
        AppState::new(auth_service, authenticator),
        rate_limiter,
        &config.cors_origin_list(),
    );

    let address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        address = %address,
        port = config.port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(
        listener,
        application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Http server stopped");
    Ok(())
}

fn spawn_credential_cleanup(auth_service: Arc<dyn AuthServicePort>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CREDENTIAL_CLEANUP_PERIOD);
        loop {
            interval.tick().await;
            match auth_service.purge_expired_credentials().await {
                Ok(report) => tracing::info!(
                    reset_tokens = report.reset_tokens,
                    sessions = report.sessions,
                    "Expired credentials purged"
                ),
                Err(e) => tracing::error!(error = %e, "Credential cleanup failed"),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
