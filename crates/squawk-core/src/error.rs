//! Unified error types for the Squawk core.
//!
//! Errors raised while handling a single command (missing arguments, bad
//! templates) live in `squawk-framework`. The errors here belong to the two
//! capabilities every bot depends on, the transport and the persistence
//! layer, plus typed access to state slots.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur in transport operations.
///
/// Every transport error is fatal to the receive loop.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {addr} - {reason}")]
    ConnectionFailed {
        /// The address that failed to connect.
        addr: String,
        /// Reason for failure.
        reason: String,
    },

    /// The peer closed the connection.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// A line could not be written.
    #[error("failed to send line: {0}")]
    SendFailed(String),

    /// The peer sent a line longer than the transport accepts.
    #[error("line exceeds {max} bytes")]
    LineTooLong {
        /// Maximum accepted line length.
        max: usize,
    },

    /// TLS setup or handshake failed.
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl TransportError {
    /// Creates a connection-closed error.
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Persistence Errors
// =============================================================================

/// Errors raised by a [`Persistence`](crate::state::Persistence) capability.
///
/// Persistence faults are always fatal: continuing with state that may be
/// stale or lost is never safe.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The blob could not be read.
    #[error("failed to read state blob '{name}': {reason}")]
    Read {
        /// Blob name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// The blob could not be written.
    #[error("failed to write state blob '{name}': {reason}")]
    Write {
        /// Blob name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// The blob was read but is not a JSON object.
    #[error("state blob '{name}' is malformed: {reason}")]
    Malformed {
        /// Blob name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl PersistenceError {
    /// Creates a read error.
    pub fn read(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Read {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a write error.
    pub fn write(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates a malformed-blob error.
    pub fn malformed(name: impl Into<String>, reason: impl ToString) -> Self {
        Self::Malformed {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

// =============================================================================
// State Errors
// =============================================================================

/// Errors from typed access to a state slot.
///
/// These are local to the command that triggered them.
#[derive(Debug, Clone, Error)]
pub enum StateError {
    /// The slot is not present in the state.
    #[error("state slot '{0}' does not exist")]
    MissingSlot(String),

    /// The slot holds a value of a different JSON type.
    #[error("state slot '{slot}' is not {expected}")]
    WrongType {
        /// Slot name.
        slot: String,
        /// Expected JSON type, e.g. "an integer".
        expected: &'static str,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Result type for state slot access.
pub type StateResult<T> = Result<T, StateError>;
