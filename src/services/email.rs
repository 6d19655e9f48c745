use std::sync::Arc;

use anyhow::{Context, Result};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::email_templates;
use super::Mailer;
use crate::config::MailConfig;

/// Sends mail through an authenticated STARTTLS relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .with_context(|| format!("Invalid SMTP relay {}", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        let from = config
            .username
            .parse::<Mailbox>()
            .context("EMAIL must be a valid address")?;
        Ok(Self { transport, from })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse::<Mailbox>()
                .with_context(|| format!("Invalid recipient {to}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("Failed to build email")?;
        self.transport
            .send(message)
            .await
            .with_context(|| format!("Failed to send email to {to}"))?;
        tracing::info!(to, subject, "email sent");
        Ok(())
    }
}

/// Used when no SMTP credentials are configured: messages are logged and dropped.
pub struct LogMailer;

#[async_trait::async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<()> {
        tracing::info!(to, subject, "email delivery disabled, message dropped");
        Ok(())
    }
}

pub fn mailer_from_config(config: Option<&MailConfig>) -> Result<Arc<dyn Mailer>> {
    Ok(match config {
        Some(config) => Arc::new(SmtpMailer::new(config)?),
        None => {
            tracing::warn!("EMAIL/APP_PASSWORD not set, outgoing email is disabled");
            Arc::new(LogMailer)
        }
    })
}

/// Welcome mail after registration. Delivery problems are logged, never returned.
pub async fn send_welcome_email(mailer: &dyn Mailer, site_url: &str, to: &str, name: &str) {
    let result = match email_templates::welcome(site_url, name) {
        Ok((subject, body)) => mailer.send(to, &subject, &body).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!("Failed to send welcome email to {}: {:#}", to, e);
    }
}

/// Confirmation after (re)subscribing. The subscription stands even if this fails.
pub async fn send_subscription_confirmation(mailer: &dyn Mailer, site_url: &str, to: &str) {
    let result = match email_templates::subscription_confirmation(site_url) {
        Ok((subject, body)) => mailer.send(to, &subject, &body).await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::warn!("Failed to send subscription confirmation to {}: {:#}", to, e);
    }
}
