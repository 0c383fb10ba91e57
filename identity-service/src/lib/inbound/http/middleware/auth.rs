use std::sync::Arc;

use auth::Authenticator;
use axum::extract::Request;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::domain::user::models::UserId;
use crate::inbound::http::handlers::ApiError;

/// Extension type to store authenticated user info in request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
    pub username: String,
}

/// Middleware that rejects requests without a valid bearer token and adds
/// the caller to request extensions.
pub async fn require_auth(
    State(authenticator): State<Arc<Authenticator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = bearer_token(req.headers()).and_then(|token| verify(&authenticator, token))?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// Middleware that adds the caller to request extensions when a valid bearer
/// token is present. Never rejects.
pub async fn optional_auth(
    State(authenticator): State<Arc<Authenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Ok(caller) = bearer_token(req.headers()).and_then(|token| verify(&authenticator, token))
    {
        req.extensions_mut().insert(caller);
    }

    next.run(req).await
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Authorization header required".to_string()))?;

    let value = header.to_str().map_err(|_| invalid_format())?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => Err(invalid_format()),
    }
}

fn verify(authenticator: &Authenticator, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let claims = authenticator.validate_token(token).map_err(|e| {
        tracing::debug!(error = %e, "Bearer token rejected");
        invalid_token()
    })?;

    let user_id = UserId::from_string(&claims.user_id).map_err(|e| {
        tracing::warn!(error = %e, "Bearer token carries a malformed user id");
        invalid_token()
    })?;

    Ok(AuthenticatedUser {
        user_id,
        username: claims.username,
    })
}

fn invalid_format() -> ApiError {
    ApiError::Unauthorized("Invalid authorization header format".to_string())
}

fn invalid_token() -> ApiError {
    ApiError::Unauthorized("Invalid token".to_string())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use axum::http::StatusCode;
    use axum::middleware;
    use axum::routing::get;
    use axum::Extension;
    use axum::Router;
    use chrono::Duration;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &[u8] = b"middleware-test-secret-at-least-32-bytes";

    async fn whoami(caller: Option<Extension<AuthenticatedUser>>) -> String {
        caller
            .map(|Extension(c)| c.username)
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn app(authenticator: Arc<Authenticator>) -> Router {
        let protected = Router::new()
            .route("/protected", get(whoami))
            .route_layer(middleware::from_fn_with_state(
                authenticator.clone(),
                require_auth,
            ));
        let public = Router::new()
            .route("/public", get(whoami))
            .route_layer(middleware::from_fn_with_state(authenticator, optional_auth));

        Router::new().merge(protected).merge(public)
    }

    async fn call(path: &str, authorization: Option<&str>) -> (StatusCode, Vec<u8>) {
        let authenticator = Arc::new(Authenticator::new(SECRET));
        let mut request = Request::builder().uri(path);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }

        let response = app(authenticator)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    fn error_message(body: &[u8]) -> String {
        let value: Value = serde_json::from_slice(body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    fn token_for(username: &str) -> String {
        Authenticator::new(SECRET)
            .issue_token(&UserId::new().to_string(), username)
            .unwrap()
            .access_token
    }

    #[tokio::test]
    async fn test_missing_header() {
        let (status, body) = call("/protected", None).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), "Authorization header required");
    }

    #[tokio::test]
    async fn test_malformed_header() {
        for value in ["Basic abc", "Bearer", "Bearer a b", "bearer abc"] {
            let (status, body) = call("/protected", Some(value)).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {:?}", value);
            assert_eq!(error_message(&body), "Invalid authorization header format");
        }
    }

    #[tokio::test]
    async fn test_invalid_and_expired_tokens_are_indistinguishable() {
        let expired = Authenticator::new(SECRET)
            .issue_token_at(
                &UserId::new().to_string(),
                "alice",
                Utc::now() - Duration::hours(73),
            )
            .unwrap()
            .access_token;
        let foreign = Authenticator::new(b"another-secret-that-is-32-bytes-long")
            .issue_token(&UserId::new().to_string(), "alice")
            .unwrap()
            .access_token;

        for token in [expired, foreign, "not.a.jwt".to_string()] {
            let (status, body) = call("/protected", Some(&format!("Bearer {}", token))).await;

            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(error_message(&body), "Invalid token");
        }
    }

    #[tokio::test]
    async fn test_valid_token_attaches_caller() {
        let header = format!("Bearer {}", token_for("alice"));
        let (status, body) = call("/protected", Some(&header)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"alice");
    }

    #[tokio::test]
    async fn test_optional_auth_falls_through() {
        let (status, body) = call("/public", Some("Bearer garbage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"anonymous");

        let header = format!("Bearer {}", token_for("bob"));
        let (_, body) = call("/public", Some(&header)).await;
        assert_eq!(body, b"bob");
    }
}
