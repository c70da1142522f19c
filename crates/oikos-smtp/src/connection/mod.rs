//! SMTP connection management.

mod session;
mod stream;

pub use session::SmtpSession;
pub use stream::{Connector, MAX_LINE_LEN, SmtpStream, TcpConnector, create_tls_connector};

use crate::types::{AuthMechanism, Extension};

/// Server details gathered during the handshake.
///
/// Extensions are recorded for logging only; the send flow never branches
/// on them.
#[derive(Debug, Clone, Default)]
pub struct ServerInfo {
    /// Text of the 220 greeting.
    pub greeting: String,
    /// Extensions from the most recent EHLO reply.
    pub extensions: Vec<Extension>,
}

impl ServerInfo {
    /// Server hostname announced in the greeting.
    #[must_use]
    pub fn hostname(&self) -> &str {
        self.greeting.split_whitespace().next().unwrap_or("unknown")
    }

    /// Checks if the server supports an extension.
    #[must_use]
    pub fn supports(&self, ext: &Extension) -> bool {
        self.extensions.contains(ext)
    }

    /// Checks if STARTTLS is advertised.
    #[must_use]
    pub fn supports_starttls(&self) -> bool {
        self.supports(&Extension::StartTls)
    }

    /// Returns the advertised authentication mechanisms.
    #[must_use]
    pub fn auth_mechanisms(&self) -> &[AuthMechanism] {
        self.extensions
            .iter()
            .find_map(|ext| match ext {
                Extension::Auth(mechanisms) => Some(mechanisms.as_slice()),
                _ => None,
            })
            .unwrap_or_default()
    }
}
