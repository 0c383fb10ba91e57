use async_trait::async_trait;

use crate::domain::email::errors::EmailError;
use crate::domain::email::models::EmailMessage;

/// Outbound email channel.
#[async_trait]
pub trait EmailSender: Send + Sync + 'static {
    /// Deliver a rendered message.
    ///
    /// # Arguments
    /// * `message` - Rendered message with recipient, subject, and body
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `Delivery` - Message could not be handed to the transport
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}
