use std::collections::HashMap;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::SecondsFormat;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::inbound::http::handlers::ApiResponseBody;

/// Headers consulted for the client address, in priority order.
const FORWARDING_HEADERS: [&str; 3] = ["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Outcome of admitting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed {
        remaining: u32,
        reset_after: Duration,
    },
    Limited {
        reset_after: Duration,
    },
}

/// Process-local sliding-window limiter keyed by client address.
///
/// A client may make at most `burst` requests within any `window`. The table
/// sits behind a single async mutex that covers eviction, the count check and
/// the append, so interleaved requests can never exceed the burst.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    clients: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    window: Duration,
    burst: u32,
}

impl RateLimiter {
    /// Create a limiter.
    ///
    /// # Arguments
    /// * `window` - Length of the sliding window
    /// * `burst` - Requests admitted per client within one window
    pub fn new(window: Duration, burst: u32) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            window,
            burst,
        }
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Record a request from `client` unless it is over the limit.
    pub async fn check(&self, client: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let hits = clients.entry(client.to_string()).or_default();

        evict_expired(hits, now, self.window);

        if hits.len() >= self.burst as usize {
            return RateLimitDecision::Limited {
                reset_after: self.reset_after(hits, now),
            };
        }

        hits.push_back(now);
        RateLimitDecision::Allowed {
            remaining: self.burst.saturating_sub(hits.len() as u32),
            reset_after: self.reset_after(hits, now),
        }
    }

    /// Evict expired timestamps across the table and drop idle clients.
    ///
    /// # Returns
    /// Number of client entries removed
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut clients = self.clients.lock().await;
        let before = clients.len();

        clients.retain(|_, hits| {
            evict_expired(hits, now, self.window);
            !hits.is_empty()
        });

        before - clients.len()
    }

    /// Run `sweep` every `period` until the runtime shuts down.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let removed = limiter.sweep().await;
                if removed > 0 {
                    tracing::debug!(removed, "Swept idle rate-limit entries");
                }
            }
        })
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.len()
    }

    fn reset_after(&self, hits: &VecDeque<Instant>, now: Instant) -> Duration {
        hits.front()
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(self.window)
    }
}

fn evict_expired(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = hits.front() {
        if now.saturating_duration_since(*oldest) >= window {
            hits.pop_front();
        } else {
            break;
        }
    }
}

/// Derive the client address from forwarding headers, falling back to the
/// transport peer. Header values are used verbatim.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    FORWARDING_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware that admits or rejects a request against the limiter.
pub async fn rate_limit(State(limiter): State<RateLimiter>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_address(req.headers(), peer);

    match limiter.check(&client).await {
        RateLimitDecision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut response = next.run(req).await;
            apply_headers(response.headers_mut(), limiter.burst(), remaining, reset_after);
            response
        }
        RateLimitDecision::Limited { reset_after } => {
            tracing::warn!(client = %client, "Rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ApiResponseBody::new_error(
                    "Rate limit exceeded. Please try again later.".to_string(),
                )),
            )
                .into_response();
            apply_headers(response.headers_mut(), limiter.burst(), 0, reset_after);
            response
        }
    }
}

fn apply_headers(headers: &mut HeaderMap, limit: u32, remaining: u32, reset_after: Duration) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(remaining));

    let reset_at = Utc::now()
        + chrono::Duration::from_std(reset_after).unwrap_or_else(|_| chrono::Duration::zero());
    if let Ok(value) = HeaderValue::from_str(&reset_at.to_rfc3339_opts(SecondsFormat::Secs, true))
    {
        headers.insert(RESET_HEADER, value);
    }
}
