//! # Squawk
//!
//! A small, stateful chat bot framework for Twitch IRC.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐ line ┌────────────┐ Message ┌────────────┐     ┌──────────────────┐
//! │ Transport │─────▶│ LineParser │────────▶│ Dispatcher │────▶│ built-in command │──▶ reply
//! └───────────┘      └────────────┘         │ (mod gate) │────▶│ template command │──▶ reply
//!                                           └────────────┘     └──────────────────┘
//!                                                 │ mutations
//!                                                 ▼
//!                                           ┌────────────┐
//!                                           │ StateStore │──▶ Persistence
//!                                           └────────────┘
//! ```
//!
//! - **core**: message parsing, state, capability traits
//! - **framework**: commands, dispatcher, moderation, templates
//! - **transport**: IRC over TCP/TLS, console, OpenWeather
//! - **runtime**: configuration, logging, file storage, the bot session
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use squawk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = SquawkRuntime::builder().config_file("squawk.toml").build()?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: TOML configuration files
//! - `tls` *(default)*: TLS connections to the chat server
//! - `http-client` *(default)*: the `weather` command
//! - `json-log`: JSON log output

pub use squawk_core as core;
pub use squawk_framework as framework;
pub use squawk_runtime as runtime;
pub use squawk_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use squawk::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use squawk_runtime::{Bot, JsonFileStore, SquawkConfig, SquawkRuntime};

    // Writing commands
    pub use squawk_framework::{
        BotContext, BotSettings, Command, CommandError, CommandRegistry, CommandResult,
        Dispatcher, MessageHook,
    };

    // Messages and state
    pub use squawk_core::{Message, MemoryStore, Persistence, StateSchema, StateStore};
}
