//! Low-level SMTP stream handling.

use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::debug;

/// Longest reply line accepted, CRLF included.
pub const MAX_LINE_LEN: u64 = 515;

/// Opens the raw transport to a relay.
pub trait Connector {
    /// Transport produced by this connector.
    type Io: AsyncRead + AsyncWrite + Unpin + Send;

    /// Opens a connection to `host:port` within `timeout`.
    fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Io>> + Send;
}

/// Plain TCP connector.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Io = TcpStream;

    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
        let addr = format!("{host}:{port}");
        match tokio::time::timeout(timeout, TcpStream::connect(&addr)).await {
            Ok(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    debug!(error = %e, "could not disable Nagle's algorithm");
                }
                Ok(stream)
            }
            Ok(Err(source)) => Err(Error::Connect {
                host: host.to_string(),
                port,
                source,
            }),
            Err(_) => Err(Error::ConnectTimeout {
                host: host.to_string(),
                port,
                timeout,
            }),
        }
    }
}

/// SMTP stream (plain or TLS) over a transport `S`.
#[derive(Debug)]
pub enum SmtpStream<S> {
    /// Plain connection.
    Plain(BufReader<S>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<S>>>),
}

impl<S> SmtpStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a freshly opened transport.
    pub fn plain(io: S) -> Self {
        Self::Plain(BufReader::new(io))
    }

    /// Performs a TLS handshake directly on a freshly opened transport.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tls`] if the handshake fails.
    pub async fn implicit_tls(io: S, hostname: &str, connector: &TlsConnector) -> Result<Self> {
        let tls_stream = handshake(io, hostname, connector).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }

    /// Returns true once the stream is encrypted.
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Reads one reply line, without the trailing CRLF.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails, times out, the peer closes the
    /// connection, or the line exceeds [`MAX_LINE_LEN`].
    pub async fn read_line(&mut self, timeout: Duration) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Plain(reader) => {
                tokio::time::timeout(timeout, reader.take(MAX_LINE_LEN).read_line(&mut line)).await
            }
            Self::Tls(reader) => {
                tokio::time::timeout(timeout, reader.take(MAX_LINE_LEN).read_line(&mut line)).await
            }
        };

        let n = read.map_err(|_| Error::ReadTimeout(timeout))??;
        if n == 0 {
            return Err(Error::ConnectionClosed);
        }
        if !line.ends_with('\n') && n as u64 >= MAX_LINE_LEN {
            return Err(Error::Protocol(format!(
                "Reply line exceeds {MAX_LINE_LEN} bytes"
            )));
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Upgrades a plain stream to TLS in place (after `220` to STARTTLS).
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is already encrypted or the TLS
    /// handshake fails. The transport is dropped on failure.
    pub async fn upgrade_to_tls(self, hostname: &str, connector: &TlsConnector) -> Result<Self> {
        let io = match self {
            Self::Plain(reader) => {
                if !reader.buffer().is_empty() {
                    return Err(Error::Protocol(
                        "Server sent data before TLS handshake".into(),
                    ));
                }
                reader.into_inner()
            }
            Self::Tls(_) => return Err(Error::Tls("Already using TLS".into())),
        };

        let tls_stream = handshake(io, hostname, connector).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }

    /// Shuts down the write half of the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails.
    pub async fn shutdown(&mut self) -> Result<()> {
        match self {
            Self::Plain(reader) => reader.get_mut().shutdown().await?,
            Self::Tls(reader) => reader.get_mut().shutdown().await?,
        }
        Ok(())
    }
}

async fn handshake<S>(
    io: S,
    hostname: &str,
    connector: &TlsConnector,
) -> Result<tokio_rustls::client::TlsStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Tls(format!("Invalid hostname: {hostname}")))?;

    debug!(hostname, "starting TLS handshake");
    connector
        .connect(server_name, io)
        .await
        .map_err(|e| Error::Tls(e.to_string()))
}

/// Creates a TLS connector with the webpki root certificates.
#[must_use]
pub fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
