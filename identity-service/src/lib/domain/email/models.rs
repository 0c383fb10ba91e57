use crate::domain::user::models::EmailAddress;

/// Rendered plain-text email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl EmailMessage {
    /// Render the welcome email sent after registration.
    ///
    /// # Arguments
    /// * `to` - Recipient address
    /// * `username` - Name of the new account
    pub fn welcome(to: &EmailAddress, username: &str) -> Self {
        let body = format!(
            "Hello {username},\n\
             \n\
             Welcome to Vortex! Your account has been successfully created.\n\
             \n\
             You can now log in to your account and start using our services.\n\
             \n\
             If you have any questions, please don't hesitate to contact us.\n\
             \n\
             Best regards,\n\
             The Vortex Team\n"
        );

        Self {
            to: to.as_str().to_string(),
            subject: "Welcome to Vortex!".to_string(),
            body,
        }
    }

    /// Render the password reset email.
    ///
    /// # Arguments
    /// * `to` - Recipient address
    /// * `app_url` - Public base URL of the frontend (no trailing slash needed)
    /// * `token` - Hex-encoded reset token
    /// * `ttl_hours` - Token lifetime shown to the reader
    pub fn password_reset(to: &EmailAddress, app_url: &str, token: &str, ttl_hours: i64) -> Self {
        let link = Self::reset_link(app_url, token);
        let body = format!(
            "Hello,\n\
             \n\
             You have requested a password reset for your account.\n\
             \n\
             Click the following link to reset your password:\n\
             {link}\n\
             \n\
             This link will expire in {ttl_hours} hours.\n\
             \n\
             If you did not request this reset, please ignore this email.\n\
             \n\
             Best regards,\n\
             The Vortex Team\n"
        );

        Self {
            to: to.as_str().to_string(),
            subject: "Password Reset Request".to_string(),
            body,
        }
    }

    /// Link embedded in the reset email.
    pub fn reset_link(app_url: &str, token: &str) -> String {
        format!(
            "{}/auth/reset-password?token={}",
            app_url.trim_end_matches('/'),
            token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> EmailAddress {
        EmailAddress::new("a@x.io".to_string()).unwrap()
    }

    #[test]
    fn test_welcome_message() {
        let message = EmailMessage::welcome(&address(), "alice");

        assert_eq!(message.to, "a@x.io");
        assert_eq!(message.subject, "Welcome to Vortex!");
        assert!(message.body.starts_with("Hello alice,"));
    }

    #[test]
    fn test_password_reset_message_contains_link_and_ttl() {
        let message =
            EmailMessage::password_reset(&address(), "http://localhost:5173/", "abc123", 24);

        assert_eq!(message.subject, "Password Reset Request");
        assert!(message
            .body
            .contains("http://localhost:5173/auth/reset-password?token=abc123"));
        assert!(message.body.contains("expire in 24 hours"));
    }
}
