use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type to allow services to define their own token payload.
/// Signs with HS256 and accepts nothing else on decode: tokens whose header names
/// another algorithm (including `none`) are rejected before the signature is checked.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens (should be stored securely)
    ///
    /// # Returns
    /// JwtHandler instance configured with HS256 algorithm
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
        }
    }

    /// Encode claims into a JWT token.
    ///
    /// # Arguments
    /// * `claims` - Claims to encode (must implement Serialize)
    ///
    /// # Returns
    /// JWT token string in compact form
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// The `exp` claim is mandatory and no clock leeway is granted.
    ///
    /// # Arguments
    /// * `token` - JWT token string to decode
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `TokenExpired` - Token `exp` is in the past
    /// * `DecodingFailed` - Token is malformed, uses another algorithm, has a bad
    ///   signature, or its claims do not match `T`
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = vec![self.algorithm];
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let token_data =
            decode::<T>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::DecodingFailed(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::jwt::Claims;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn claims_valid_for(lifetime: Duration) -> Claims {
        Claims::for_user("user123", "alice", Utc::now(), lifetime)
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(SECRET);
        let claims = claims_valid_for(Duration::hours(72));

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: Claims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_invalid_token() {
        let handler = JwtHandler::new(SECRET);

        let result = handler.decode::<Claims>("invalid.token.here");
        assert!(matches!(result, Err(JwtError::DecodingFailed(_))));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::new(b"secret1_at_least_32_bytes_long_key!");
        let handler2 = JwtHandler::new(b"secret2_at_least_32_bytes_long_key!");

        let token = handler1
            .encode(&claims_valid_for(Duration::hours(1)))
            .expect("Failed to encode token");

        let result = handler2.decode::<Claims>(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_expired_token() {
        let handler = JwtHandler::new(SECRET);
        let issued = Utc::now() - Duration::hours(73);
        let claims = Claims::for_user("user123", "alice", issued, Duration::hours(72));

        let token = handler.encode(&claims).expect("Failed to encode token");

        assert!(matches!(
            handler.decode::<Claims>(&token),
            Err(JwtError::TokenExpired)
        ));
    }

    #[test]
    fn test_decode_rejects_other_hmac_algorithm() {
        let handler = JwtHandler::new(SECRET);
        let claims = claims_valid_for(Duration::hours(1));

        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .expect("Failed to encode token");

        assert!(handler.decode::<Claims>(&token).is_err());
    }

    #[test]
    fn test_decode_rejects_alg_none() {
        let handler = JwtHandler::new(SECRET);
        let token = handler
            .encode(&claims_valid_for(Duration::hours(1)))
            .expect("Failed to encode token");

        // Swap the header for {"alg":"none","typ":"JWT"} and keep payload and signature.
        let mut parts = token.splitn(3, '.');
        let _header = parts.next().unwrap();
        let payload = parts.next().unwrap();
        let signature = parts.next().unwrap();

        let forged = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{payload}.{signature}");
        assert!(handler.decode::<Claims>(&forged).is_err());

        let unsigned = format!("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.{payload}.");
        assert!(handler.decode::<Claims>(&unsigned).is_err());
    }

    #[test]
    fn test_decode_requires_exp() {
        #[derive(Serialize)]
        struct NoExpiry {
            user_id: String,
            username: String,
        }

        let handler = JwtHandler::new(SECRET);
        let token = handler
            .encode(&NoExpiry {
                user_id: "user123".to_string(),
                username: "alice".to_string(),
            })
            .expect("Failed to encode token");

        assert!(handler.decode::<Claims>(&token).is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_claim_types() {
        #[derive(Serialize)]
        struct NumericUser {
            user_id: i64,
            username: String,
            iat: i64,
            exp: i64,
        }

        let handler = JwtHandler::new(SECRET);
        let now = Utc::now().timestamp();
        let token = handler
            .encode(&NumericUser {
                user_id: 42,
                username: "alice".to_string(),
                iat: now,
                exp: now + 3600,
            })
            .expect("Failed to encode token");

        assert!(handler.decode::<Claims>(&token).is_err());
    }
}
