//! Error types for the Squawk framework.

use squawk_core::{PersistenceError, StateError, TransportError};
use thiserror::Error;

// =============================================================================
// Command Errors
// =============================================================================

/// Errors returned by a built-in command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A state slot was missing or had the wrong type.
    #[error(transparent)]
    State(#[from] StateError),

    /// The state could not be persisted.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A reply could not be sent.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Command-specific failure.
    #[error("{0}")]
    Custom(String),
}

impl CommandError {
    /// Creates a custom command error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}

/// Result type for command handlers.
pub type CommandResult<T> = Result<T, CommandError>;

// =============================================================================
// Render Errors
// =============================================================================

/// Errors raised while rendering a template command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A subscript pointed past the end of a message field.
    ///
    /// This is the only render error that is reported back to the chat.
    #[error("'{field}' has no element at index {index}")]
    ArgumentMissing {
        /// Field that was indexed.
        field: String,
        /// Requested index.
        index: usize,
    },

    /// A `{` without matching `}` or a lone `}`.
    #[error("unbalanced brace at byte {position}")]
    UnbalancedBrace {
        /// Byte offset of the offending brace.
        position: usize,
    },

    /// The placeholder does not name a message field.
    #[error("unknown field '{0}'")]
    UnknownField(String),

    /// A tag key that the message does not carry.
    #[error("message has no tag '{0}'")]
    MissingKey(String),

    /// A subscript that does not fit the field type.
    #[error("invalid subscript '{subscript}' on '{field}'")]
    InvalidSubscript {
        /// Field that was subscripted.
        field: String,
        /// The subscript as written.
        subscript: String,
    },

    /// Conversion flags or format specs, which templates do not support.
    #[error("unsupported format in placeholder '{0}'")]
    UnsupportedFormat(String),
}

/// Result type for template rendering.
pub type RenderResult<T> = Result<T, RenderError>;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors that escape the handling of one protocol line.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Sending failed; the connection is unusable.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Persisting failed; the in-memory state is ahead of storage.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// A built-in command failed for this message only.
    #[error("command '{command}' failed: {source}")]
    Command {
        /// Command name.
        command: String,
        /// Underlying error.
        #[source]
        source: CommandError,
    },
}

impl DispatchError {
    /// Wraps an error returned by the named command.
    ///
    /// Transport and persistence faults are lifted out so that
    /// [`is_fatal`](Self::is_fatal) sees them.
    pub fn from_command(command: impl Into<String>, err: CommandError) -> Self {
        match err {
            CommandError::Transport(e) => Self::Transport(e),
            CommandError::Persistence(e) => Self::Persistence(e),
            other => Self::Command {
                command: command.into(),
                source: other,
            },
        }
    }

    /// Returns true if the bot cannot keep running after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Persistence(_))
    }
}

/// Result type for dispatching a line.
pub type DispatchResult<T> = Result<T, DispatchError>;
