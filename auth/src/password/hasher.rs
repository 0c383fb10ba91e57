use super::errors::PasswordError;

/// Password hashing implementation.
///
/// Produces bcrypt hashes (`$2b$...`) with a per-hash random salt.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Cost used when none is configured.
    pub const DEFAULT_COST: u32 = 10;

    /// Longest input bcrypt consumes, in bytes.
    pub const MAX_PASSWORD_BYTES: usize = 72;

    /// Create a new password hasher instance.
    ///
    /// # Returns
    /// PasswordHasher instance configured with the default bcrypt cost
    pub fn new() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
        }
    }

    /// Hash a plaintext password securely.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// Modular crypt string (includes version, cost, salt, and hash)
    ///
    /// # Errors
    /// * `HashingFailed` - Password is longer than 72 bytes or hashing failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        bcrypt::non_truncating_hash(password, self.cost)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// The comparison inside bcrypt is constant-time. Input past 72 bytes
    /// never matches, since [`PasswordHasher::hash`] refuses to store it.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored bcrypt hash
    ///
    /// # Returns
    /// True if password matches, false otherwise
    ///
    /// # Errors
    /// * `VerificationFailed` - Hash format is invalid
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        if password.len() > Self::MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        bcrypt::non_truncating_verify(password, hash).map_err(|e| {
            PasswordError::VerificationFailed(format!("Invalid password hash: {}", e))
        })
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
