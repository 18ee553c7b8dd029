//! Runtime error types.

use thiserror::Error;

use squawk_core::{PersistenceError, TransportError, WeatherError};
use squawk_framework::DispatchError;

use crate::config::ConfigError;

/// Errors that stop a bot.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// State could not be loaded or saved.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The connection failed or was closed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A fatal error surfaced while dispatching a line.
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The weather client could not be built.
    #[error("Weather client error: {0}")]
    Weather(#[from] WeatherError),
}

impl RuntimeError {
    /// Returns true if the connection was closed by the peer or the input ended.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Transport(TransportError::ConnectionClosed { .. })
                | Self::Dispatch(DispatchError::Transport(
                    TransportError::ConnectionClosed { .. }
                ))
        )
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
