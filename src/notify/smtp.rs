//! SMTP delivery via lettre.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::error::NotifyError;
use crate::notify::{AssignmentNotice, Notifier};

/// SMTP settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl SmtpConfig {
    /// Build config from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (email delivery disabled).
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("SMTP_HOST").ok().filter(|h| !h.trim().is_empty())?;

        let port: u16 = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").unwrap_or_default();
        let password = std::env::var("SMTP_PASSWORD").unwrap_or_default();
        let from_address = std::env::var("SMTP_FROM_ADDRESS").unwrap_or_else(|_| username.clone());

        Some(Self {
            host,
            port,
            username,
            password: SecretString::from(password),
            from_address,
        })
    }
}

/// Sends multipart (plain + HTML) notices over SMTP.
pub struct SmtpNotifier {
    config: SmtpConfig,
}

impl SmtpNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build the outgoing message without sending it.
    pub fn build_message(&self, notice: &AssignmentNotice) -> Result<Message, NotifyError> {
        let from: Mailbox = parse_mailbox(&self.config.from_address)?;
        let to: Mailbox = parse_mailbox(&notice.assignee_email)?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(notice.subject())
            .multipart(MultiPart::alternative_plain_html(
                notice.text_body(),
                notice.html_body(),
            ))
            .map_err(|e| NotifyError::Build(e.to_string()))
    }

    fn transport(&self) -> Result<SmtpTransport, NotifyError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );

        Ok(SmtpTransport::relay(&self.config.host)
            .map_err(|e| NotifyError::Build(format!("SMTP relay error: {e}")))?
            .port(self.config.port)
            .credentials(creds)
            .build())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn notify(&self, notice: &AssignmentNotice) -> Result<bool, NotifyError> {
        let message = self.build_message(notice)?;
        let transport = self.transport()?;
        let address = notice.assignee_email.clone();

        // lettre's SmtpTransport is blocking.
        let sent = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| NotifyError::SendFailed {
                address: address.clone(),
                reason: format!("send task failed: {e}"),
            })?;

        sent.map_err(|e| NotifyError::SendFailed {
            address: address.clone(),
            reason: format!("SMTP send failed: {e}"),
        })?;

        tracing::info!(task_id = %notice.task_id, to = %address, "Assignment email sent");
        Ok(true)
    }
}
