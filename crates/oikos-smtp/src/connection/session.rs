//! One SMTP session: a single connection carrying a single message.

use super::{ServerInfo, SmtpStream};
use crate::command::{Command, encode_data};
use crate::config::{Credentials, SmtpConfig};
use crate::error::{AuthStage, Error, Result};
use crate::parser::{is_last_reply_line, parse_reply, parse_reply_code};
use crate::types::{Address, Extension, Reply, ReplyCode};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};

/// Upper bound on lines in one reply.
const MAX_REPLY_LINES: usize = 256;

/// Transient state of one send.
///
/// The session owns the stream. Steps must run in protocol order:
/// greeting, EHLO, optional STARTTLS (with its second EHLO), optional
/// AUTH LOGIN, then the envelope and DATA. [`SmtpSession::close`] consumes the
/// session, so the transport is released exactly once.
#[derive(Debug)]
pub struct SmtpSession<S> {
    stream: Option<SmtpStream<S>>,
    host: String,
    client_name: String,
    read_timeout: Duration,
    strict_envelope: bool,
    requires_auth: bool,
    info: ServerInfo,
    greeted: bool,
    ehlo_done: bool,
    tls: bool,
    authenticated: bool,
}

impl<S> SmtpSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an open stream using the settings of `config`.
    pub fn new(stream: SmtpStream<S>, config: &SmtpConfig) -> Self {
        let tls = stream.is_tls();
        Self {
            stream: Some(stream),
            host: config.host.clone(),
            client_name: config.client_name.clone(),
            read_timeout: config.read_timeout,
            strict_envelope: config.strict_envelope,
            requires_auth: config.credentials.is_some(),
            info: ServerInfo::default(),
            greeted: false,
            ehlo_done: false,
            tls,
            authenticated: false,
        }
    }

    /// Server details gathered so far.
    pub const fn server_info(&self) -> &ServerInfo {
        &self.info
    }

    /// Whether the stream is encrypted.
    pub const fn is_tls(&self) -> bool {
        self.tls
    }

    /// Whether AUTH LOGIN completed with 235.
    pub const fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the greeting was accepted.
    pub const fn is_greeted(&self) -> bool {
        self.greeted
    }

    /// Whether the stream can still carry commands.
    pub const fn is_usable(&self) -> bool {
        self.stream.is_some()
    }

    /// Reads the server greeting. Anything but 220 is fatal.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the code is not 220.
    pub async fn read_greeting(&mut self) -> Result<()> {
        let reply = self.read_reply().await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(unexpected("greeting", "220", &reply));
        }

        self.info.greeting = reply.text();
        self.greeted = true;
        debug!(server = self.info.hostname(), "greeting accepted");
        Ok(())
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply is not 2xx.
    pub async fn ehlo(&mut self) -> Result<()> {
        if !self.greeted {
            return Err(Error::Protocol("EHLO before greeting".into()));
        }

        let cmd = Command::Ehlo {
            hostname: self.client_name.clone(),
        };
        let reply = self.send_command(&cmd).await?;
        if !reply.is_success() {
            return Err(unexpected("EHLO", "2xx", &reply));
        }

        // First line is the server's greeting text
        self.info.extensions = reply.lines.iter().skip(1).map(|l| Extension::parse(l)).collect();
        self.ehlo_done = true;
        debug!(extensions = ?self.info.extensions, "EHLO accepted");
        Ok(())
    }

    /// Upgrades to TLS with STARTTLS and repeats EHLO on the encrypted stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedReply`] if the server does not answer 220,
    /// or [`Error::Tls`] if the handshake fails.
    pub async fn starttls(&mut self, connector: &TlsConnector) -> Result<()> {
        if !self.ehlo_done {
            return Err(Error::Protocol("STARTTLS before EHLO".into()));
        }
        if self.tls {
            return Err(Error::Tls("Already using TLS".into()));
        }
        if !self.info.supports_starttls() {
            warn!(host = %self.host, "server did not advertise STARTTLS, trying anyway");
        }

        let reply = self.send_command(&Command::StartTls).await?;
        if reply.code != ReplyCode::SERVICE_READY {
            return Err(unexpected("STARTTLS", "220", &reply));
        }

        let stream = self.stream.take().ok_or(Error::ConnectionClosed)?;
        let upgraded = stream.upgrade_to_tls(&self.host, connector).await?;
        self.stream = Some(upgraded);
        self.tls = true;

        // The TLS session starts from scratch
        self.ehlo_done = false;
        self.info.extensions.clear();
        debug!(host = %self.host, "TLS established");

        self.ehlo().await
    }

    /// Authenticates with AUTH LOGIN.
    ///
    /// The password line is only sent after the username line got 334.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] naming the step that did not get its expected
    /// reply (334, 334, 235).
    pub async fn auth_login(&mut self, credentials: &Credentials) -> Result<()> {
        if !self.ehlo_done {
            return Err(Error::Protocol("AUTH before EHLO".into()));
        }

        let reply = self.send_command(&Command::AuthLogin).await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(auth_failed(AuthStage::Start, &reply));
        }

        let reply = self
            .send_command(&Command::credential(&credentials.username))
            .await?;
        if reply.code != ReplyCode::AUTH_CONTINUE {
            return Err(auth_failed(AuthStage::Username, &reply));
        }

        let reply = self
            .send_command(&Command::credential(&credentials.password))
            .await?;
        if reply.code != ReplyCode::AUTH_SUCCEEDED {
            return Err(auth_failed(AuthStage::Password, &reply));
        }

        self.authenticated = true;
        debug!(username = %credentials.username, "authenticated");
        Ok(())
    }

    /// Starts the mail transaction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthRequired`] if credentials are configured but were
    /// not accepted, or an unexpected-reply error under strict envelope
    /// checking.
    pub async fn mail_from(&mut self, from: &Address) -> Result<()> {
        if !self.ehlo_done {
            return Err(Error::Protocol("MAIL FROM before EHLO".into()));
        }
        if self.requires_auth && !self.authenticated {
            return Err(Error::AuthRequired);
        }

        let cmd = Command::MailFrom { from: from.clone() };
        let reply = self.send_command(&cmd).await?;
        self.check_envelope("MAIL FROM", &reply)
    }

    /// Adds one envelope recipient.
    ///
    /// # Errors
    ///
    /// Returns an unexpected-reply error under strict envelope checking.
    pub async fn rcpt_to(&mut self, to: &Address) -> Result<()> {
        let cmd = Command::RcptTo { to: to.clone() };
        let reply = self.send_command(&cmd).await?;
        self.check_envelope("RCPT TO", &reply)
    }

    /// Sends DATA, the encoded message and reads the final reply.
    ///
    /// The DATA reply is accepted unless it is 4xx/5xx; the final reply must
    /// be 2xx.
    ///
    /// # Errors
    ///
    /// Returns an error if either reply is rejected or the transfer fails.
    pub async fn data(&mut self, message: &[u8]) -> Result<Reply> {
        let reply = self.send_command(&Command::Data).await?;
        if reply.is_negative() {
            return Err(unexpected("DATA", "354", &reply));
        }
        if reply.code != ReplyCode::START_DATA {
            debug!(code = reply.code.as_u16(), "DATA answered without 354, sending anyway");
        }

        let encoded = encode_data(message);
        debug!(bytes = encoded.len(), "C: <message data>");
        self.write(&encoded).await?;

        let reply = self.read_reply().await?;
        if !reply.is_success() {
            return Err(unexpected("message data", "2xx", &reply));
        }
        Ok(reply)
    }

    /// Sends QUIT. The reply code is logged, not checked.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails.
    pub async fn quit(&mut self) -> Result<()> {
        let reply = self.send_command(&Command::Quit).await?;
        if reply.code != ReplyCode::CLOSING {
            debug!(code = reply.code.as_u16(), "QUIT answered without 221");
        }
        Ok(())
    }

    /// Ends the session and releases the transport.
    ///
    /// QUIT is sent only if the greeting was accepted and the stream is still
    /// usable. Errors while closing are logged.
    pub async fn close(mut self) {
        if self.greeted && self.stream.is_some() {
            if let Err(e) = self.quit().await {
                debug!(error = %e, "QUIT failed");
            }
        }

        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "shutdown failed");
            }
        }
    }

    fn check_envelope(&self, command: &'static str, reply: &Reply) -> Result<()> {
        if reply.is_success() {
            return Ok(());
        }
        if self.strict_envelope {
            return Err(unexpected(command, "2xx", reply));
        }
        warn!(command, reply = %reply, "envelope command not accepted, continuing");
        Ok(())
    }

    async fn send_command(&mut self, cmd: &Command) -> Result<Reply> {
        debug!(command = ?cmd, "C:");
        self.write(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        let result = stream.write_all(data).await;
        self.track(result)
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let result = self.read_reply_inner().await;
        let reply = self.track(result)?;
        debug!(code = reply.code.as_u16(), text = %reply.text(), "S:");
        Ok(reply)
    }

    async fn read_reply_inner(&mut self) -> Result<Reply> {
        let timeout = self.read_timeout;
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;

        let mut lines = Vec::new();
        let mut read = 0;
        loop {
            let line = stream.read_line(timeout).await?;
            read += 1;

            // Blank lines are skipped but still count against the limit
            if !line.is_empty() {
                parse_reply_code(&line)?;
                let is_last = is_last_reply_line(&line);
                lines.push(line);
                if is_last {
                    break;
                }
            }
            if read >= MAX_REPLY_LINES {
                return Err(Error::Protocol("Reply has too many lines".into()));
            }
        }

        parse_reply(&lines)
    }

    /// Drops the stream once an error leaves it in an unknown state.
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if !e.leaves_stream_usable() {
                self.stream = None;
            }
        }
        result
    }
}

fn unexpected(command: &'static str, expected: &'static str, reply: &Reply) -> Error {
    Error::UnexpectedReply {
        command,
        expected,
        code: reply.code.as_u16(),
        text: reply.text(),
    }
}

fn auth_failed(stage: AuthStage, reply: &Reply) -> Error {
    Error::Auth {
        stage,
        code: reply.code.as_u16(),
        text: reply.text(),
    }
}
