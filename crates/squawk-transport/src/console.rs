//! Line-oriented transport over a reader and a writer.
//!
//! Used for dry runs: protocol lines are typed (or piped) on stdin and every
//! outbound line is printed to stdout.

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, Stdin, Stdout};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use squawk_core::{Outbox, Transport, TransportError, TransportResult};

use crate::irc::MAX_LINE_LENGTH;

/// A [`Transport`] that reads input lines and echoes sends.
pub struct ConsoleTransport<R, W> {
    lines: FramedRead<R, LinesCodec>,
    writer: W,
}

impl ConsoleTransport<Stdin, Stdout> {
    /// Creates a transport over the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    /// Creates a transport over the given halves.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_LENGTH)),
            writer,
        }
    }

    /// Returns the writer.
    pub fn writer(&self) -> &W {
        &self.writer
    }
}

#[async_trait]
impl<R, W> Outbox for ConsoleTransport<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        let out = format!("< {line}\n");
        self.writer
            .write_all(out.as_bytes())
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.writer
            .flush()
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl<R, W> Transport for ConsoleTransport<R, W>
where
    R: AsyncRead + Send + Unpin,
    W: AsyncWrite + Send + Unpin,
{
    async fn receive(&mut self) -> TransportResult<String> {
        match self.lines.next().await {
            Some(Ok(line)) => Ok(line),
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                Err(TransportError::LineTooLong {
                    max: MAX_LINE_LENGTH,
                })
            }
            Some(Err(LinesCodecError::Io(e))) => Err(e.into()),
            None => Err(TransportError::closed("end of input")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_input_lines_are_received() {
        let input: &[u8] = b"PING :tmi.twitch.tv\nsecond\r\nlast";
        let mut transport = ConsoleTransport::new(input, Vec::new());

        assert_eq!(transport.receive().await.unwrap(), "PING :tmi.twitch.tv");
        assert_eq!(transport.receive().await.unwrap(), "second");
        assert_eq!(transport.receive().await.unwrap(), "last");
        assert!(matches!(
            transport.receive().await,
            Err(TransportError::ConnectionClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_sends_are_printed() {
        let mut transport = ConsoleTransport::new(&b""[..], Vec::new());
        transport.send_line("PONG :tmi.twitch.tv").await.unwrap();
        assert_eq!(transport.writer(), b"< PONG :tmi.twitch.tv\n");
    }
}
