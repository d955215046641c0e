//! Outbound replies over SMTP (lettre, STARTTLS, one connection per send).

use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{error, info};

use crate::config::Config;
use crate::error::NotifyError;

const REPORT_SUBJECT: &str = "Your Requested Weather Forecast";
const ERROR_SUBJECT: &str = "Error Processing Your Weather Request";

/// Outbound reply delivery. This is a terminal boundary: an absent
/// recipient is a logged no-op and delivery failures are logged and
/// swallowed — nothing here propagates, and the cooldown already charged
/// for the request stays charged either way.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_report(&self, recipient: Option<&str>, report: &str);
    async fn send_error(&self, recipient: Option<&str>, reason: &str);
}

/// Production sender: builds a single-part plain-text message and
/// delivers it over a fresh STARTTLS connection per call.
pub struct SmtpNotifier {
    smtp_host: String,
    smtp_port: u16,
    username: String,
    password: String,
}

impl SmtpNotifier {
    pub fn new(config: &Config) -> Self {
        Self {
            smtp_host: config.smtp_host.clone(),
            smtp_port: config.smtp_port,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    fn deliver(&self, to: &str, subject: &str, body: String) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.username.parse().map_err(|e| NotifyError::InvalidAddress {
                address: self.username.clone(),
                reason: format!("{e}"),
            })?)
            .to(to.parse().map_err(|e| NotifyError::InvalidAddress {
                address: to.to_string(),
                reason: format!("{e}"),
            })?)
            .subject(subject)
            .body(body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        let transport = SmtpTransport::starttls_relay(&self.smtp_host)
            .map_err(|e| NotifyError::Transport(format!("relay setup: {e}")))?
            .port(self.smtp_port)
            .credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
            .build();

        transport
            .send(&message)
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(())
    }

    fn send(&self, recipient: Option<&str>, subject: &str, body: String) {
        let Some(to) = recipient else {
            error!(subject, "No recipient address, reply not sent");
            return;
        };
        match self.deliver(to, subject, body) {
            Ok(()) => info!(to, subject, "Reply sent"),
            Err(e) => error!(to, error = %e, "Failed to send reply"),
        }
    }
}

#[async_trait]
impl MailSender for SmtpNotifier {
    async fn send_report(&self, recipient: Option<&str>, report: &str) {
        self.send(recipient, REPORT_SUBJECT, report.to_string());
    }

    async fn send_error(&self, recipient: Option<&str>, reason: &str) {
        self.send(recipient, ERROR_SUBJECT, error_body(reason));
    }
}

/// Body of the error reply sent back to the requester.
fn error_body(reason: &str) -> String {
    format!("There was an error processing your weather request: {reason}")
}
