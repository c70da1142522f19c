//! # oikos-smtp
//!
//! A small SMTP submission client: one connection, one message.
//!
//! ## Features
//!
//! - **Linear exchange**: greeting, EHLO, STARTTLS, AUTH LOGIN, MAIL FROM,
//!   RCPT TO, DATA, QUIT
//! - **TLS support**: STARTTLS upgrade (port 587) and implicit TLS (port 465)
//!   via rustls
//! - **Explicit configuration**: [`SmtpConfig`] is passed into every send
//! - **Guaranteed release**: the transport is closed exactly once on every path
//!
//! ## Quick Start
//!
//! ```ignore
//! use oikos_smtp::{Mailbox, OutboundMessage, SmtpConfig, send_mail};
//!
//! #[tokio::main]
//! async fn main() -> oikos_smtp::Result<()> {
//!     let config = SmtpConfig::gmail("farm@gmail.com", "app-password");
//!
//!     let message = OutboundMessage::new(
//!         Mailbox::with_name("Oikos Orchard & Farm", "farm@gmail.com")?,
//!         "Hi",
//!         "Hello",
//!     )
//!     .to(Mailbox::new("guest@example.com")?);
//!
//!     send_mail(&config, &message).await
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders and DATA encoding
//! - [`connection`]: Stream, connector and session
//! - [`parser`]: Reply parser
//! - [`types`]: Addresses, extensions, replies

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
mod config;
pub mod connection;
mod error;
mod message;
pub mod parser;
mod send;
pub mod types;

pub use config::{
    Credentials, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, Security, SmtpConfig,
};
pub use connection::{Connector, ServerInfo, SmtpSession, SmtpStream, TcpConnector};
pub use error::{AuthStage, Error, ErrorKind, Result};
pub use message::{BodyKind, OutboundMessage};
pub use send::{send_mail, send_mail_with};
pub use types::{Address, AuthMechanism, Extension, Mailbox, Reply, ReplyCode};
