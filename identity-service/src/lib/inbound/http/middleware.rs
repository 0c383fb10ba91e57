mod auth;
mod rate_limit;
mod security_headers;

pub use auth::optional_auth;
pub use auth::require_auth;
pub use auth::AuthenticatedUser;
pub use rate_limit::client_address;
pub use rate_limit::rate_limit;
pub use rate_limit::RateLimitDecision;
pub use rate_limit::RateLimiter;
pub use security_headers::security_headers;
