//! Transactional email: rendering and fire-and-forget delivery via Resend.
//!
//! Two messages exist: "verify email" (carries the 24-hour verification
//! link) and "welcome" (links to the dashboard). Delivery never blocks or
//! fails the request that triggered it; errors are logged and dropped.

use std::sync::Arc;

use async_trait::async_trait;
use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;

const VERIFY_EMAIL_TEMPLATE: &str = include_str!("../../templates/verify_email.html");
const WELCOME_TEMPLATE: &str = include_str!("../../templates/welcome.html");

pub const VERIFY_EMAIL_SUBJECT: &str = "Verify your email address";
pub const WELCOME_SUBJECT: &str = "Welcome to Your App!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    VerifyEmail,
    Welcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub kind: EmailKind,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("email delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

pub struct ResendMailer {
    client: Resend,
    from: String,
}

impl ResendMailer {
    #[must_use]
    pub fn new(api_key: &str, from: &str) -> Self {
        Self { client: Resend::new(api_key), from: from.to_owned() }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let to = [email.to.as_str()];
        let options = CreateEmailBaseOptions::new(&self.from, to, &email.subject).with_html(&email.html);
        self.client
            .emails
            .send(options)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        Ok(())
    }
}

/// Send in the background. The returned handle is only useful to tests.
pub fn dispatch(mailer: Arc<dyn Mailer>, email: OutboundEmail) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let kind = email.kind;
        let to = email.to.clone();
        match mailer.send(email).await {
            Ok(()) => tracing::debug!(?kind, %to, "email sent"),
            Err(e) => tracing::error!(?kind, %to, error = %e, "email send failed"),
        }
    })
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render(template: &str, name: &str, url: &str) -> String {
    template
        .replace("{{NAME}}", &escape_html(name))
        .replace("{{URL}}", &escape_html(url))
}

#[must_use]
pub fn verify_email(to: &str, name: &str, verification_url: &str) -> OutboundEmail {
    OutboundEmail {
        kind: EmailKind::VerifyEmail,
        to: to.to_owned(),
        subject: VERIFY_EMAIL_SUBJECT.to_owned(),
        html: render(VERIFY_EMAIL_TEMPLATE, name, verification_url),
    }
}

#[must_use]
pub fn welcome(to: &str, name: &str, dashboard_url: &str) -> OutboundEmail {
    OutboundEmail {
        kind: EmailKind::Welcome,
        to: to.to_owned(),
        subject: WELCOME_SUBJECT.to_owned(),
        html: render(WELCOME_TEMPLATE, name, dashboard_url),
    }
}

#[cfg(test)]
#[path = "mailer_test.rs"]
mod tests;
