use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Bearer token claims.
///
/// Identity travels as `user_id` and `username` rather than `sub`, with the
/// standard `iat` / `exp` pair as Unix timestamps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Create claims for a user issued at `issued_at` and valid for `lifetime`.
    ///
    /// # Arguments
    /// * `user_id` - Unique user identifier
    /// * `username` - Username at issuance time
    /// * `issued_at` - Issuance instant
    /// * `lifetime` - Validity window starting at `issued_at`
    ///
    /// # Returns
    /// Claims with user_id, username, iat, and exp set
    pub fn for_user(
        user_id: impl ToString,
        username: impl Into<String>,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: username.into(),
            iat: issued_at.timestamp(),
            exp: (issued_at + lifetime).timestamp(),
        }
    }

    /// Expiration as a timestamp, if representable.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Check if token is expired.
    ///
    /// A token stops being valid at the exact `exp` second.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        current_timestamp >= self.exp
    }
}
