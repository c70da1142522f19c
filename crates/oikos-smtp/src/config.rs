//! Relay configuration passed into every send.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for a single reply line.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Security/encryption mode for the relay connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// No encryption (local relays and test servers only).
    None,
    /// STARTTLS upgrade after plaintext connect.
    #[default]
    StartTls,
    /// Implicit TLS (connect directly with TLS).
    Tls,
}

impl Security {
    /// Get default port for the security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Tls => 465,
        }
    }

    /// Get display name for the security mode.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::None => "None (insecure)",
            Self::StartTls => "STARTTLS",
            Self::Tls => "SSL/TLS",
        }
    }
}

impl std::str::FromStr for Security {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "plain" | "off" => Ok(Self::None),
            "starttls" | "tls-upgrade" => Ok(Self::StartTls),
            "tls" | "ssl" | "implicit" => Ok(Self::Tls),
            other => Err(format!("unknown SMTP security mode: {other}")),
        }
    }
}

/// AUTH LOGIN credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Username for authentication.
    pub username: String,
    /// Password for authentication.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP relay configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Credentials for AUTH LOGIN; `None` skips authentication.
    pub credentials: Option<Credentials>,
    /// Name announced in EHLO.
    pub client_name: String,
    /// Bound on opening the TCP connection.
    #[serde(with = "secs")]
    pub connect_timeout: Duration,
    /// Bound on each reply line.
    #[serde(with = "secs")]
    pub read_timeout: Duration,
    /// Require 2xx replies to MAIL FROM and RCPT TO.
    ///
    /// When false the replies are read and logged but not checked.
    pub strict_envelope: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: Security::default().default_port(),
            security: Security::default(),
            credentials: None,
            client_name: "localhost".to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            strict_envelope: true,
        }
    }
}

impl SmtpConfig {
    /// Creates a configuration for `host` using the default port of `security`.
    #[must_use]
    pub fn new(host: impl Into<String>, security: Security) -> Self {
        Self {
            host: host.into(),
            port: security.default_port(),
            security,
            ..Self::default()
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the AUTH LOGIN credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Chooses whether envelope replies are checked.
    #[must_use]
    pub const fn strict_envelope(mut self, strict: bool) -> Self {
        self.strict_envelope = strict;
        self
    }

    /// Gmail submission on port 587 with STARTTLS.
    #[must_use]
    pub fn gmail(username: impl Into<String>, app_password: impl Into<String>) -> Self {
        Self::new("smtp.gmail.com", Security::StartTls).credentials(username, app_password)
    }
}

mod secs {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
