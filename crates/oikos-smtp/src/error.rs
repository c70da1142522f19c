//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse failure classes reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The socket could not be opened.
    Connect,
    /// The server answered with something other than the expected reply.
    Protocol,
    /// The AUTH LOGIN exchange did not reach 235.
    Auth,
    /// STARTTLS negotiation or the TLS handshake failed.
    Tls,
}

/// Step of the AUTH LOGIN exchange that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// `AUTH LOGIN` itself.
    Start,
    /// The base64 username line.
    Username,
    /// The base64 password line.
    Password,
}

impl std::fmt::Display for AuthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stage = match self {
            Self::Start => "AUTH LOGIN",
            Self::Username => "username",
            Self::Password => "password",
        };
        f.write_str(stage)
    }
}

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// TCP connect failed.
    #[error("Could not connect to SMTP host {host}:{port}: {source}")]
    Connect {
        /// Relay hostname.
        host: String,
        /// Relay port.
        port: u16,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// TCP connect did not finish in time.
    #[error("Timed out connecting to SMTP host {host}:{port} after {timeout:?}")]
    ConnectTimeout {
        /// Relay hostname.
        host: String,
        /// Relay port.
        port: u16,
        /// Configured connect timeout.
        timeout: Duration,
    },

    /// I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server did not answer within the read timeout.
    #[error("Timed out waiting for server reply after {0:?}")]
    ReadTimeout(Duration),

    /// The server closed the connection mid-exchange.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// TLS handshake or setup failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Server returned a reply code other than the one the step requires.
    #[error("{command} rejected: expected {expected}, got {code} {text}")]
    UnexpectedReply {
        /// Command (or stage) whose reply was checked.
        command: &'static str,
        /// Human readable description of the accepted codes.
        expected: &'static str,
        /// Reply code received.
        code: u16,
        /// Reply text received.
        text: String,
    },

    /// AUTH LOGIN did not complete.
    #[error("SMTP authentication failed at {stage}: {code} {text}")]
    Auth {
        /// Stage of the exchange that failed.
        stage: AuthStage,
        /// Reply code received.
        code: u16,
        /// Reply text received.
        text: String,
    },

    /// Malformed reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Credentials are configured but the session is not authenticated.
    #[error("Authentication required before MAIL FROM")]
    AuthRequired,

    /// Message has no envelope recipients.
    #[error("No recipients specified")]
    NoRecipients,
}

impl Error {
    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } | Self::ConnectTimeout { .. } => ErrorKind::Connect,
            Self::Auth { .. } | Self::AuthRequired => ErrorKind::Auth,
            Self::Tls(_)
            | Self::UnexpectedReply {
                command: "STARTTLS",
                ..
            } => ErrorKind::Tls,
            Self::Io(_)
            | Self::ReadTimeout(_)
            | Self::ConnectionClosed
            | Self::UnexpectedReply { .. }
            | Self::Protocol(_)
            | Self::InvalidAddress(_)
            | Self::NoRecipients => ErrorKind::Protocol,
        }
    }

    /// Reply code carried by this error, if the server sent one.
    #[must_use]
    pub const fn reply_code(&self) -> Option<u16> {
        match self {
            Self::UnexpectedReply { code, .. } | Self::Auth { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.reply_code(), Some(code) if code >= 500 && code < 600)
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.reply_code(), Some(code) if code >= 400 && code < 500)
    }

    /// Whether the connection can still carry a `QUIT` after this error.
    pub(crate) const fn leaves_stream_usable(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedReply { .. }
                | Self::Auth { .. }
                | Self::AuthRequired
                | Self::InvalidAddress(_)
                | Self::NoRecipients
        )
    }
}
