//! # Squawk Core
//!
//! The core types of the Squawk chat bot framework.
//!
//! This crate has no knowledge of sockets, files or HTTP. It defines what the
//! rest of the framework agrees on:
//!
//! - **Parsing**: one raw protocol line becomes a [`Message`] ([`LineParser`])
//! - **State**: the persisted JSON slots of a bot ([`StateStore`], [`StateSchema`])
//!   behind the [`Persistence`] capability
//! - **Transport**: the [`Outbox`] and [`Transport`] capabilities
//! - **Weather**: the [`WeatherProvider`] capability used by the `weather` command
//!
//! ## Data flow
//!
//! ```text
//! ┌───────────┐ line ┌────────────┐ Message ┌────────────┐
//! │ Transport │─────▶│ LineParser │────────▶│ Dispatcher │
//! └───────────┘      └────────────┘         └────────────┘
//! ```
//!
//! The dispatcher itself lives in `squawk-framework`.

pub mod error;
pub mod message;
pub mod parser;
pub mod state;
mod tags;
pub mod transport;
pub mod weather;

pub use error::{
    PersistenceError, PersistenceResult, StateError, StateResult, TransportError, TransportResult,
};
pub use message::{Message, PING, PRIVMSG};
pub use parser::{DEFAULT_SERVER_DOMAIN, LineParser};
pub use state::{MemoryStore, Persistence, StateSchema, StateStore, TEMPLATE_COMMANDS_SLOT};
pub use transport::{Outbox, RecordingOutbox, Transport};
pub use weather::{Units, WeatherError, WeatherProvider, WeatherReport};
