use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_account::delete_account;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::password_reset::confirm_password_reset;
use super::handlers::password_reset::request_password_reset;
use super::handlers::profile::get_profile;
use super::handlers::profile::update_profile;
use super::handlers::register::register;
use super::handlers::users::delete_user;
use super::handlers::users::get_user;
use super::handlers::users::update_user;
use super::middleware::optional_auth;
use super::middleware::rate_limit;
use super::middleware::require_auth;
use super::middleware::security_headers;
use super::middleware::RateLimiter;
use crate::domain::user::ports::AuthServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    pub fn new(auth_service: Arc<dyn AuthServicePort>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            auth_service,
            authenticator,
        }
    }
}

/// Build the HTTP application.
///
/// # Arguments
/// * `state` - Shared service and authenticator
/// * `rate_limiter` - Limiter applied to every request
/// * `cors_origins` - Origins allowed to make cross-origin requests
///
/// # Returns
/// Router with all routes and middleware layers attached
pub fn create_router(state: AppState, rate_limiter: RateLimiter, cors_origins: &[String]) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/password-reset", post(request_password_reset))
        .route(
            "/api/auth/password-reset/:token",
            post(confirm_password_reset),
        )
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            optional_auth,
        ));

    let protected_routes = Router::new()
        .route("/api/auth/profile", get(get_profile).put(update_profile))
        .route("/api/auth/account", axum::routing::delete(delete_account))
        .route(
            "/api/users/:user_id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            require_auth,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit))
        .layer(middleware::from_fn(security_headers))
        .layer(cors_layer(cors_origins))
        .layer(trace_layer)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
