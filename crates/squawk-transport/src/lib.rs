//! # Squawk Transport
//!
//! Concrete implementations of the capabilities defined in `squawk-core`.
//!
//! ## Features
//!
//! - `tls`: TLS connections to the chat server (tokio-rustls with the
//!   platform's root certificates)
//! - `http-client`: the OpenWeather client behind the `weather` command
//! - `full`: all of the above
//!
//! ## Capability Implementations
//!
//! | Capability | Implementation | Use Case |
//! |------------|----------------|----------|
//! | `Transport` | [`IrcTransport`] | Chat server connection over TCP or TLS |
//! | `Transport` | [`ConsoleTransport`] | Dry runs on stdin/stdout |
//! | `WeatherProvider` | `OpenWeatherClient` | Current weather lookups |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use squawk_core::{Outbox, Transport};
//! use squawk_transport::{IrcEndpoint, IrcTransport};
//!
//! let endpoint = IrcEndpoint::new("irc.chat.twitch.tv", 6697);
//! let mut transport = IrcTransport::connect(&endpoint).await?;
//!
//! transport.send_line("NICK squishymcbotty").await?;
//! let line = transport.receive().await?;
//! ```

pub mod console;
pub mod irc;

#[cfg(feature = "http-client")]
pub mod http_client;

pub use console::ConsoleTransport;
pub use irc::{IrcEndpoint, IrcStream, IrcTransport};

#[cfg(feature = "http-client")]
pub use http_client::{OPENWEATHER_URL, OpenWeatherClient, OpenWeatherConfig};
