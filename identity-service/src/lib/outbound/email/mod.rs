pub mod log;
pub mod smtp;

pub use log::LogEmailSender;
pub use smtp::SmtpEmailSender;
pub use smtp::SmtpSettings;

use async_trait::async_trait;

use crate::domain::email::EmailError;
use crate::domain::email::EmailMessage;
use crate::domain::email::EmailSender;

/// Email channel chosen at startup.
pub enum Mailer {
    Smtp(SmtpEmailSender),
    Log(LogEmailSender),
}

impl Mailer {
    /// Pick SMTP delivery when a host is configured, the log sink otherwise.
    ///
    /// # Errors
    /// * `Delivery` - SMTP settings are invalid
    pub fn from_settings(settings: Option<SmtpSettings>) -> Result<Self, EmailError> {
        match settings {
            Some(settings) => Ok(Mailer::Smtp(SmtpEmailSender::new(&settings)?)),
            None => Ok(Mailer::Log(LogEmailSender)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Mailer::Smtp(_) => "smtp",
            Mailer::Log(_) => "log",
        }
    }
}

#[async_trait]
impl EmailSender for Mailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        match self {
            Mailer::Smtp(sender) => sender.send(message).await,
            Mailer::Log(sender) => sender.send(message).await,
        }
    }
}
