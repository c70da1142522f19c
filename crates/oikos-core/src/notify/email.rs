//! Email delivery.

use super::NotifyError;
use async_trait::async_trait;
use oikos_smtp::{OutboundMessage, SmtpConfig};
use tracing::info;

/// Sends email messages.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers one message.
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}

/// Delivers through the SMTP client, one connection per message.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    /// Creates a mailer for the given relay.
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        oikos_smtp::send_mail(&self.config, message).await?;
        Ok(())
    }
}

/// Logs messages instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let to: Vec<String> = message.to.iter().map(ToString::to_string).collect();
        info!(to = ?to, subject = %message.subject, "mail backend disabled, message not sent");
        Ok(())
    }
}
