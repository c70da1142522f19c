//! Notification channels.
//!
//! Every channel sits behind a small async trait so the intake service can be
//! exercised with in-memory fakes:
//!
//! - [`Mailer`]: email through the SMTP client, or a log-only stand-in
//! - [`SmsSender`]: SMS through the Twilio REST API
//! - [`PushSender`]: Firebase Cloud Messaging
//! - [`SheetsWebhook`]: booking rows posted to a spreadsheet webhook
//!
//! Carrier email-to-SMS gateways reuse the [`Mailer`].

mod email;
mod gateway;
mod push;
mod sheets;
mod sms;
pub mod templates;

pub use email::{LogMailer, Mailer, SmtpMailer};
pub use gateway::gateway_addresses;
pub use push::{FcmClient, PushMessage, PushSender, PushTarget, ServiceAccountKey};
pub use sheets::{SheetsRow, SheetsWebhook};
pub use sms::{SmsSender, TwilioClient};

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Error raised by a notification channel.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP delivery failed.
    #[error("smtp: {0}")]
    Smtp(#[from] oikos_smtp::Error),

    /// HTTP request failed before a response was read.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered but refused the request.
    #[error("{service} rejected the request: {message}")]
    Rejected {
        /// Service name.
        service: &'static str,
        /// Message reported by the service.
        message: String,
    },

    /// Credentials could not be loaded or exchanged.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Recipient is not usable on this channel.
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Direct email.
    Email,
    /// SMS through Twilio.
    Sms,
    /// SMS through a carrier email gateway.
    SmsGateway,
    /// Push notification.
    Push,
    /// Spreadsheet webhook.
    Sheets,
}

impl Channel {
    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Sms => "sms",
            Self::SmsGateway => "sms_gateway",
            Self::Push => "push",
            Self::Sheets => "sheets",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one notification attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    /// Channel used.
    pub channel: Channel,
    /// Address, number or topic the notification went to.
    pub recipient: String,
    /// Error text when the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Delivery {
    /// Records and logs the outcome of an attempt.
    pub fn record<T>(
        channel: Channel,
        recipient: impl Into<String>,
        result: &Result<T, NotifyError>,
    ) -> Self {
        let recipient = recipient.into();
        let error = match result {
            Ok(_) => {
                info!(%channel, %recipient, "notification sent");
                None
            }
            Err(e) => {
                warn!(%channel, %recipient, error = %e, "notification failed");
                Some(e.to_string())
            }
        };
        Self {
            channel,
            recipient,
            error,
        }
    }

    /// Whether the attempt succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
