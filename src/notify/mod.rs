//! Notification layer
//!
//! - [`notifier`]: formats update notices into emails and dispatches them
//! - [`transport`]: `EmailTransport` trait and the message type it accepts
//! - [`sendgrid`]: SendGrid mail API transport
//! - [`error`]: dispatch errors

pub mod error;
pub mod notifier;
pub mod sendgrid;
pub mod transport;

pub use error::DispatchError;
pub use notifier::{Envelope, Notifier, UpdateNotice};
pub use sendgrid::SendGridTransport;
pub use transport::{EmailMessage, EmailTransport};
