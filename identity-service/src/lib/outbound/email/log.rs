use async_trait::async_trait;

use crate::domain::email::EmailError;
use crate::domain::email::EmailMessage;
use crate::domain::email::EmailSender;

/// Development sink used when no SMTP host is configured.
///
/// Logs the composed message, reset links included, and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "SMTP not configured, email not delivered"
        );
        Ok(())
    }
}
