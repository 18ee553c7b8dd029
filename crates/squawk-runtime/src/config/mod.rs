//! Configuration for a Squawk bot.
//!
//! Settings are layered with figment (defaults, TOML files, `SQUAWK_*`
//! environment variables) and checked by [`validate_config`] before the
//! runtime starts.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, PROFILE_ENV, Profile, load_config, load_config_from_file};
pub use schema::{
    BUILTIN_COMMANDS, BotConfig, CommandsConfig, ConnectionConfig, CounterConfig, LogFormat,
    LogLevel, LogOutput, LoggingConfig, SpanEventMode, SquawkConfig, StateConfig, WeatherConfig,
};
pub use validation::validate_config;
