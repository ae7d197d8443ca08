//! Update notification formatting and dispatch

use std::sync::Arc;

use tracing::info;

use crate::notify::error::DispatchError;
use crate::notify::transport::{EmailMessage, EmailTransport};
use crate::version::checker::Severity;
use crate::version::semver::SemanticVersion;

/// Everything a notification reports about one crossed version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNotice {
    pub dependency: String,
    pub declared: SemanticVersion,
    pub latest: SemanticVersion,
    /// Manifest the dependency was declared in
    pub manifest_url: String,
    /// Upstream listing for the dependency
    pub package_url: String,
    pub severity: Severity,
}

/// Sender identity and recipients for outgoing alerts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from_email: String,
    pub from_name: String,
    pub to: Vec<String>,
}

pub struct Notifier {
    transport: Arc<dyn EmailTransport>,
    envelope: Envelope,
}

impl Notifier {
    pub fn new(transport: Arc<dyn EmailTransport>, envelope: Envelope) -> Self {
        Self {
            transport,
            envelope,
        }
    }

    /// Build the email for a notice without sending it
    pub fn compose(&self, notice: &UpdateNotice) -> EmailMessage {
        let html = format!(
            "<p>I have detected that in the package.json {manifest} the dependency \
             <b>{dependency}</b> has the version <b>{declared}</b> selected and the last one \
             available is the <b>{latest}</b>.</p>\
             <p>Go and check out the last changes!: {link}.</p>",
            manifest = escape_html(&notice.manifest_url),
            dependency = escape_html(&notice.dependency),
            declared = notice.declared,
            latest = notice.latest,
            link = escape_html(&notice.package_url),
        );

        EmailMessage {
            subject: format!(
                "[{}] {} {}",
                notice.severity, notice.dependency, notice.latest
            ),
            html,
            from_email: self.envelope.from_email.clone(),
            from_name: self.envelope.from_name.clone(),
            to: self.envelope.to.clone(),
        }
    }

    /// Send the notice. An `Err` means nothing was delivered.
    pub async fn notify(&self, notice: &UpdateNotice) -> Result<(), DispatchError> {
        let message = self.compose(notice);
        self.transport.send(&message).await?;

        info!(
            "Sent {} notification for {} {} -> {} ({})",
            notice.severity, notice.dependency, notice.declared, notice.latest, notice.manifest_url
        );
        Ok(())
    }
}

/// Escape text interpolated into the html body
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
