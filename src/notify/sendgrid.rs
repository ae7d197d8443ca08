//! SendGrid v3 mail API transport

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::notify::error::DispatchError;
use crate::notify::transport::{EmailMessage, EmailTransport};

/// Default base URL for the SendGrid API
pub const DEFAULT_BASE_URL: &str = "https://api.sendgrid.com";

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct MailSendRequest<'a> {
    personalizations: Vec<Personalization<'a>>,
    from: Address<'a>,
    subject: &'a str,
    content: Vec<Content<'a>>,
}

impl<'a> From<&'a EmailMessage> for MailSendRequest<'a> {
    fn from(message: &'a EmailMessage) -> Self {
        Self {
            personalizations: vec![Personalization {
                to: message
                    .to
                    .iter()
                    .map(|email| Address {
                        email: email.as_str(),
                        name: None,
                    })
                    .collect(),
            }],
            from: Address {
                email: &message.from_email,
                name: Some(message.from_name.as_str()),
            },
            subject: &message.subject,
            content: vec![Content {
                content_type: "text/html",
                value: &message.html,
            }],
        }
    }
}

/// Transport posting to SendGrid's `/v3/mail/send`
pub struct SendGridTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SendGridTransport {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .user_agent("depwatch")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl EmailTransport for SendGridTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), DispatchError> {
        if message.to.is_empty() {
            return Err(DispatchError::NoRecipients);
        }

        let url = format!("{}/v3/mail/send", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&MailSendRequest::from(message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("SendGrid returned status {}: {}", status, body);
            return Err(DispatchError::Rejected { status, body });
        }

        debug!("SendGrid accepted \"{}\" ({})", message.subject, status);
        Ok(())
    }
}
