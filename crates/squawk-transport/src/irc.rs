//! IRC client connection over plain TCP or TLS.
//!
//! Inbound bytes are framed into lines by [`LinesCodec`]; outbound lines are
//! written to the other half of the stream with a `\r\n` terminator.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, info, warn};

use squawk_core::{Outbox, Transport, TransportError, TransportResult};

/// Longest inbound line accepted, in bytes.
///
/// IRCv3 allows up to 8191 bytes of tags on top of a 512 byte message.
pub const MAX_LINE_LENGTH: usize = 16 * 1024;

/// Byte stream an [`IrcTransport`] can run over.
pub trait IrcStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> IrcStream for T {}

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct IrcEndpoint {
    /// Server hostname, also used for TLS name verification.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Whether to wrap the connection in TLS.
    pub tls: bool,
    /// How long to wait for the TCP connection.
    pub connect_timeout: Duration,
}

impl IrcEndpoint {
    /// Creates a TLS endpoint with a 10 second connect timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            tls: true,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Enables or disables TLS.
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Sets the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Returns `host:port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A connected chat server.
///
/// Writes are flushed line by line. Reads yield one complete line at a time,
/// however the bytes were split across socket reads.
pub struct IrcTransport {
    reader: FramedRead<ReadHalf<Box<dyn IrcStream>>, LinesCodec>,
    writer: WriteHalf<Box<dyn IrcStream>>,
    peer: String,
}

impl IrcTransport {
    /// Connects to `endpoint`.
    pub async fn connect(endpoint: &IrcEndpoint) -> TransportResult<Self> {
        let addr = endpoint.addr();
        info!(addr = %addr, tls = endpoint.tls, "Connecting to chat server");

        let tcp = tokio::time::timeout(endpoint.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| TransportError::ConnectionFailed {
                addr: addr.clone(),
                reason: format!("timed out after {:?}", endpoint.connect_timeout),
            })?
            .map_err(|e| TransportError::ConnectionFailed {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        tcp.set_nodelay(true)?;

        let stream: Box<dyn IrcStream> = if endpoint.tls {
            upgrade_to_tls(tcp, &endpoint.host).await?
        } else {
            Box::new(tcp)
        };

        info!(addr = %addr, "Connected to chat server");
        Ok(Self::from_stream(stream, addr))
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: impl IrcStream + 'static, peer: impl Into<String>) -> Self {
        let stream: Box<dyn IrcStream> = Box::new(stream);
        let (read_half, writer) = tokio::io::split(stream);
        Self {
            reader: FramedRead::new(
                read_half,
                LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
            ),
            writer,
            peer: peer.into(),
        }
    }

    /// Sets the longest inbound line accepted.
    ///
    /// Only meant to be called before the first receive.
    pub fn max_line_length(mut self, max: usize) -> Self {
        *self.reader.decoder_mut() = LinesCodec::new_with_max_length(max);
        self
    }

    /// Returns the peer address.
    pub fn peer(&self) -> &str {
        &self.peer
    }
}

impl std::fmt::Debug for IrcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrcTransport")
            .field("peer", &self.peer)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Outbox for IrcTransport {
    async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        let mut data = Vec::with_capacity(line.len() + 2);
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(b"\r\n");

        self.writer
            .write_all(&data)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl Transport for IrcTransport {
    async fn receive(&mut self) -> TransportResult<String> {
        match self.reader.next().await {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => {
                warn!(peer = %self.peer, error = %e, "Failed to decode inbound line");
                Err(codec_error(e, self.reader.decoder().max_length()))
            }
            None => {
                debug!(peer = %self.peer, "Read returned EOF");
                Err(TransportError::closed("server closed the connection"))
            }
        }
    }
}

fn codec_error(err: LinesCodecError, max: usize) -> TransportError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => TransportError::LineTooLong { max },
        LinesCodecError::Io(e) => e.into(),
    }
}

#[cfg(feature = "tls")]
async fn upgrade_to_tls(tcp: TcpStream, host: &str) -> TransportResult<Box<dyn IrcStream>> {
    use std::sync::Arc;

    use tokio_rustls::TlsConnector;
    use tokio_rustls::rustls::pki_types::ServerName;
    use tokio_rustls::rustls::{ClientConfig, RootCertStore};

    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for e in &certs.errors {
        warn!(error = %e, "Error loading native certs");
    }
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!(error = %e, "Failed to add root cert");
        }
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| TransportError::Tls(format!("invalid server name '{host}': {e}")))?;

    let stream = connector
        .connect(server_name, tcp)
        .await
        .map_err(|e| TransportError::Tls(e.to_string()))?;

    debug!(host = %host, "TLS handshake completed");
    Ok(Box::new(stream))
}

#[cfg(not(feature = "tls"))]
async fn upgrade_to_tls(_tcp: TcpStream, _host: &str) -> TransportResult<Box<dyn IrcStream>> {
    Err(TransportError::Tls(
        "TLS support is not enabled; build with the `tls` feature".to_string(),
    ))
}
