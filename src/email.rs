//! Transactional email: verification codes and notification mirrors.
//!
//! SMTP is optional. Without credentials the mailer logs a warning and
//! reports the message as skipped; the calling flows treat email as
//! best-effort and never fail a request over it.

use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};

use crate::config::SmtpConfig;

/// Outcome of a send attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// SMTP not configured, message skipped
    Skipped,
}

/// SMTP mailer. Construction never fails on missing credentials, only on a
/// malformed relay host.
pub struct Mailer {
    transport: Option<SmtpTransport>,
    from: String,
    app_url: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = if config.is_configured() {
            let creds = Credentials::new(config.username.clone(), config.password.clone());
            let transport = SmtpTransport::starttls_relay(&config.host)
                .context("Invalid SMTP relay host")?
                .credentials(creds)
                .port(config.port)
                .build();
            Some(transport)
        } else {
            tracing::warn!("SMTP not configured, emails will not be sent");
            None
        };

        Ok(Self {
            transport,
            from: config.from.clone(),
            app_url: config.app_url.clone(),
        })
    }

    fn send(&self, to: &str, subject: &str, html: String) -> Result<SendOutcome> {
        let Some(transport) = &self.transport else {
            tracing::warn!(to, subject, "Email skipped: SMTP not configured");
            return Ok(SendOutcome::Skipped);
        };

        let from: Mailbox = self.from.parse().context("Invalid SMTP from address")?;
        let to_mailbox: Mailbox = to.parse().context("Invalid recipient address")?;

        let message = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)
            .context("Failed to build email")?;

        transport.send(&message).context("Failed to send email")?;
        tracing::info!(to, subject, "Sent email");
        Ok(SendOutcome::Sent)
    }

    /// Send the 6-digit email verification code.
    pub fn send_verification_email(
        &self,
        to: &str,
        name: Option<&str>,
        code: &str,
    ) -> Result<SendOutcome> {
        let greeting = name.unwrap_or("there");
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Shopping List</h1>
    <h2>Verify your email address</h2>
    <p>Hi {greeting},</p>
    <p>Thanks for registering! Enter this verification code to complete your registration:</p>
    <div style="font-size: 32px; font-weight: bold; text-align: center; letter-spacing: 5px; padding: 20px;">{code}</div>
    <p>The code is valid for 24 hours.</p>
    <p>If you did not register, you can ignore this email.</p>
  </div>
</body>
</html>"#
        );

        self.send(to, "Verify your email address - Shopping List", html)
    }

    /// Send an email mirror of an in-app notification.
    pub fn send_notification_email(
        &self,
        to: &str,
        to_name: Option<&str>,
        title: &str,
        message: &str,
        list_name: Option<&str>,
    ) -> Result<SendOutcome> {
        let greeting = to_name.unwrap_or("there");
        let list_line = list_name
            .map(|n| format!("<p><strong>List:</strong> {n}</p>"))
            .unwrap_or_default();
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1>Shopping List</h1>
    <h2>{title}</h2>
    <p>Hi {greeting},</p>
    <p>{message}</p>
    {list_line}
    <p><a href="{app_url}/notifications">Open the app</a></p>
  </div>
</body>
</html>"#,
            app_url = self.app_url,
        );

        self.send(to, title, html)
    }
}
