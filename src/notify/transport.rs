//! Email transport abstraction

#[cfg(test)]
use mockall::automock;

use crate::notify::error::DispatchError;

/// A fully addressed email ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub html: String,
    pub from_email: String,
    pub from_name: String,
    pub to: Vec<String>,
}

/// Trait for delivering email through an external service
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send the message. `Ok` means the service accepted it for delivery.
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError>;
}
