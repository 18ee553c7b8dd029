//! Squawk Runtime - configuration, logging, storage and the bot session.
//!
//! This crate provides:
//! - Layered configuration with figment ([`config`])
//! - Logging setup over `tracing-subscriber` ([`logging`])
//! - JSON file persistence for bot state ([`JsonFileStore`])
//! - The bot session: login handshake and receive loop ([`Bot`])
//! - Wiring from configuration to a running bot ([`SquawkRuntime`])
//!
//! ```ignore
//! use squawk_runtime::SquawkRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = SquawkRuntime::builder().build()?;
//!
//!     // Connect, log in and run until Ctrl+C
//!     runtime.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod storage;

// Re-exports
pub use bot::{Bot, BotStatus};
pub use config::{ConfigError, ConfigLoader, ConfigResult, SquawkConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use runtime::{RuntimeBuilder, SquawkRuntime};
pub use storage::JsonFileStore;

// Re-export tracing for use by other crates
pub use tracing;
