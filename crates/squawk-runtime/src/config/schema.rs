//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use squawk_core::{DEFAULT_SERVER_DOMAIN, StateSchema, TEMPLATE_COMMANDS_SLOT, Units};

/// Names of the built-in commands that `commands.enabled` may list.
pub const BUILTIN_COMMANDS: &[&str] = &[
    "cmds",
    "addcmd",
    "editcmd",
    "delcmd",
    "date",
    "addquote",
    "quote",
    "join",
    "clearjoinlist",
    "getrandomjoiner",
    "weather",
];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SquawkConfig {
    /// Identity, channels and command behavior.
    #[serde(default)]
    pub bot: BotConfig,

    /// Chat server connection.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Where and how state is persisted.
    #[serde(default)]
    pub state: StateConfig,

    /// Which built-in commands are registered.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Weather lookups.
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot identity and command settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Login name, sent with `NICK`.
    #[serde(default)]
    pub username: String,

    /// Password sent with `PASS`, usually `oauth:<token>`.
    #[serde(default)]
    pub oauth_token: String,

    /// Channels to join, without the leading `#`.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Character that marks a chat message as a command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Capabilities requested after login.
    #[serde(default = "default_caps")]
    pub caps: Vec<String>,

    /// Message sent to every channel after joining. Empty disables it.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Commands only moderators and the broadcaster may run.
    #[serde(default = "default_mod_only_commands")]
    pub mod_only_commands: Vec<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            oauth_token: String::new(),
            channels: Vec::new(),
            command_prefix: default_command_prefix(),
            caps: default_caps(),
            greeting: default_greeting(),
            mod_only_commands: default_mod_only_commands(),
        }
    }
}

impl BotConfig {
    /// Returns the command prefix if it is exactly one character.
    pub fn prefix_char(&self) -> Option<char> {
        let mut chars = self.command_prefix.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.oauth_token.is_empty() {
            ""
        } else {
            "***"
        };
        f.debug_struct("BotConfig")
            .field("username", &self.username)
            .field("oauth_token", &token)
            .field("channels", &self.channels)
            .field("command_prefix", &self.command_prefix)
            .field("caps", &self.caps)
            .field("greeting", &self.greeting)
            .field("mod_only_commands", &self.mod_only_commands)
            .finish()
    }
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_caps() -> Vec<String> {
    vec!["twitch.tv/tags".to_string()]
}

fn default_greeting() -> String {
    "Hey there!".to_string()
}

fn default_mod_only_commands() -> Vec<String> {
    ["addcmd", "editcmd", "delcmd", "addquote", "clearjoinlist"]
        .into_iter()
        .map(String::from)
        .collect()
}

// =============================================================================
// Connection
// =============================================================================

/// Chat server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Wrap the connection in TLS.
    #[serde(default = "default_tls")]
    pub tls: bool,

    /// Domain the server uses in its own prefixes and in `PONG` replies.
    #[serde(default = "default_server_domain")]
    pub server_domain: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: default_tls(),
            server_domain: default_server_domain(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_host() -> String {
    "irc.chat.twitch.tv".to_string()
}

fn default_port() -> u16 {
    6697
}

fn default_tls() -> bool {
    true
}

fn default_server_domain() -> String {
    DEFAULT_SERVER_DOMAIN.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// =============================================================================
// State
// =============================================================================

/// State persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Directory holding the state file.
    #[serde(default = "default_state_dir")]
    pub dir: PathBuf,

    /// File name of the state blob inside `dir`.
    #[serde(default = "default_state_file")]
    pub file: String,

    /// Slots and their defaults.
    #[serde(default = "default_schema")]
    pub schema: StateSchema,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            file: default_state_file(),
            schema: default_schema(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_state_file() -> String {
    "state.json".to_string()
}

fn default_schema() -> StateSchema {
    StateSchema::new().slot(TEMPLATE_COMMANDS_SLOT, json!({}))
}

// =============================================================================
// Commands
// =============================================================================

/// Built-in command selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Built-ins to register, by name. See [`BUILTIN_COMMANDS`].
    #[serde(default = "default_enabled")]
    pub enabled: Vec<String>,

    /// Counter commands, keyed by command name.
    #[serde(default)]
    pub counters: BTreeMap<String, CounterConfig>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            counters: BTreeMap::new(),
        }
    }
}

fn default_enabled() -> Vec<String> {
    ["cmds", "addcmd", "editcmd", "delcmd", "date", "addquote", "quote"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// A command that increments an integer slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    /// State slot holding the count.
    pub slot: String,
    /// Text shown before the count.
    pub label: String,
}

// =============================================================================
// Weather
// =============================================================================

/// Weather lookup settings. The `weather` command needs an API key.
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_weather_url")]
    pub base_url: String,

    #[serde(default)]
    pub units: Units,

    #[serde(default = "default_weather_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            units: Units::default(),
            timeout_secs: default_weather_timeout_secs(),
        }
    }
}

impl fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("units", &self.units)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_weather_timeout_secs() -> u64 {
    10
}

// =============================================================================
// Logging
// =============================================================================

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `squawk_transport = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    /// Which span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventMode,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_location: bool,
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "invalid log level '{other}', expected one of: trace, debug, info, warn, error"
            )),
        }
    }
}

/// Output format of log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// One JSON object per line.
    #[cfg(feature = "json-log")]
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Span lifecycle events to log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanEventMode {
    /// No span events.
    #[default]
    None,
    /// Span creation and close, which shows the time spent per dispatch.
    Lifecycle,
    /// Every new, enter, exit and close event.
    Full,
}
