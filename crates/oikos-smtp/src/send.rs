//! The one-message send flow.

use crate::config::{Security, SmtpConfig};
use crate::connection::{Connector, SmtpSession, SmtpStream, TcpConnector, create_tls_connector};
use crate::error::{Error, Result};
use crate::message::OutboundMessage;
use crate::types::Address;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

/// Sends one message over a fresh TCP connection.
///
/// # Errors
///
/// Returns the first failure of the exchange. See [`send_mail_with`].
pub async fn send_mail(config: &SmtpConfig, message: &OutboundMessage) -> Result<()> {
    send_mail_with(&TcpConnector, config, message).await
}

/// Sends one message over a connection opened by `connector`.
///
/// Opens exactly one connection, runs greeting, EHLO, optional STARTTLS and
/// AUTH LOGIN, the envelope and DATA, then closes. QUIT is still sent after a
/// failure as long as the greeting was accepted and the stream is intact.
///
/// # Errors
///
/// Returns the first failure of the exchange; [`Error::kind`] tells connect,
/// protocol, authentication and TLS failures apart.
pub async fn send_mail_with<C: Connector>(
    connector: &C,
    config: &SmtpConfig,
    message: &OutboundMessage,
) -> Result<()> {
    let recipients: Vec<Address> = message.recipients().cloned().collect();
    if recipients.is_empty() {
        return Err(Error::NoRecipients);
    }

    info!(
        host = %config.host,
        port = config.port,
        security = config.security.display_name(),
        recipients = recipients.len(),
        "sending mail"
    );

    let io = connector
        .connect(&config.host, config.port, config.connect_timeout)
        .await?;
    let stream = match config.security {
        Security::Tls => {
            SmtpStream::implicit_tls(io, &config.host, &create_tls_connector()).await?
        }
        Security::None | Security::StartTls => SmtpStream::plain(io),
    };

    let mut session = SmtpSession::new(stream, config);
    let result = transact(&mut session, config, message, &recipients).await;
    session.close().await;

    match &result {
        Ok(()) => info!(subject = %message.subject, "mail accepted"),
        Err(e) => warn!(error = %e, kind = ?e.kind(), "mail not sent"),
    }
    result
}

async fn transact<S>(
    session: &mut SmtpSession<S>,
    config: &SmtpConfig,
    message: &OutboundMessage,
    recipients: &[Address],
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    session.read_greeting().await?;
    session.ehlo().await?;

    if config.security == Security::StartTls {
        session.starttls(&create_tls_connector()).await?;
    }

    if let Some(credentials) = &config.credentials {
        session.auth_login(credentials).await?;
    }

    session.mail_from(&message.from.address).await?;
    for to in recipients {
        session.rcpt_to(to).await?;
    }

    session.data(message.to_rfc5322().as_bytes()).await?;
    Ok(())
}
