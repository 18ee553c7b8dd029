//! Transport capability traits.
//!
//! The dispatcher only ever writes lines, so it depends on [`Outbox`]. The
//! receive loop additionally reads lines through [`Transport`].
//!
//! Implementations live in `squawk-transport`; this module also provides the
//! [`RecordingOutbox`] used by tests.

use async_trait::async_trait;
use tracing::debug;

use crate::error::TransportResult;

// =============================================================================
// Capability traits
// =============================================================================

/// Sink for outbound protocol lines.
#[async_trait]
pub trait Outbox: Send {
    /// Sends one protocol line.
    ///
    /// `line` carries no line terminator; implementations append `\r\n`.
    async fn send_line(&mut self, line: &str) -> TransportResult<()>;
}

/// A bidirectional line-oriented connection.
#[async_trait]
pub trait Transport: Outbox {
    /// Receives the next complete line, without its terminator.
    ///
    /// Implementations frame the stream themselves; a line split across
    /// reads is only returned once it is complete. A closed stream is
    /// reported as
    /// [`TransportError::ConnectionClosed`](crate::error::TransportError::ConnectionClosed).
    async fn receive(&mut self) -> TransportResult<String>;
}

// =============================================================================
// Recording outbox
// =============================================================================

/// An [`Outbox`] that keeps every sent line in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutbox {
    lines: Vec<String>,
}

impl RecordingOutbox {
    /// Creates an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines sent so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Removes and returns the lines sent so far.
    pub fn take(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        debug!(line = %line, "Recorded outbound line");
        self.lines.push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_outbox() {
        let mut outbox = RecordingOutbox::new();
        outbox.send_line("PONG :tmi.twitch.tv").await.unwrap();
        assert_eq!(outbox.lines(), ["PONG :tmi.twitch.tv"]);
        assert_eq!(outbox.take().len(), 1);
        assert!(outbox.lines().is_empty());
    }
}
