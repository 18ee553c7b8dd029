//! Turns a [`SquawkConfig`] into a running bot.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use squawk_runtime::SquawkRuntime;
//!
//! let runtime = SquawkRuntime::builder()
//!     .config_file("squawk.toml")
//!     .profile("production")
//!     .build()?;
//!
//! runtime.run().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::signal;
use tracing::{debug, info, warn};

use squawk_core::{
    MemoryStore, Persistence, StateSchema, StateStore, TEMPLATE_COMMANDS_SLOT, Transport,
};
use squawk_framework::builtin::{
    AddQuote, AddTemplate, ClearJoinList, Counter, DeleteTemplates, JOINLIST_SLOT, JoinList,
    ListCommands, QUOTES_SLOT, RandomJoiner, ReplyWithDate, ReplyWithQuote,
};
use squawk_framework::{BotSettings, CommandRegistry, Dispatcher};
use squawk_transport::{ConsoleTransport, IrcEndpoint, IrcTransport};

use crate::bot::Bot;
use crate::config::{ConfigError, ConfigLoader, ConfigResult, SquawkConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::storage::JsonFileStore;

/// Builds and runs a bot from its configuration.
///
/// The configuration is validated on construction and fixed afterwards.
#[derive(Debug, Clone)]
pub struct SquawkRuntime {
    config: SquawkConfig,
}

impl SquawkRuntime {
    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Validates `config` and initializes logging from it.
    pub fn from_config(config: SquawkConfig) -> ConfigResult<Self> {
        validate_config(&config)?;
        logging::init_from_config(&config.logging);

        info!(
            username = %config.bot.username,
            channels = ?config.bot.channels,
            log_level = %config.logging.level,
            "Runtime initialized from configuration"
        );

        Ok(Self { config })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &SquawkConfig {
        &self.config
    }

    /// Returns the dispatcher settings derived from the configuration.
    pub fn settings(&self) -> BotSettings {
        let prefix = self.config.bot.prefix_char().unwrap_or('!');
        BotSettings::new()
            .command_prefix(prefix)
            .mod_only(self.config.bot.mod_only_commands.iter().cloned())
            .server_domain(self.config.connection.server_domain.clone())
    }

    /// Returns the configured schema plus the slots the enabled built-ins
    /// rely on.
    ///
    /// Slots declared in the configuration keep their configured default.
    pub fn schema(&self) -> StateSchema {
        let mut schema = self.config.state.schema.clone();
        let enabled = |name: &str| self.config.commands.enabled.iter().any(|n| n == name);

        let mut required = vec![(TEMPLATE_COMMANDS_SLOT, json!({}))];
        if enabled("addquote") || enabled("quote") {
            required.push((QUOTES_SLOT, json!([])));
        }
        if enabled("join") || enabled("clearjoinlist") || enabled("getrandomjoiner") {
            required.push((JOINLIST_SLOT, json!([])));
        }

        for (slot, default) in required {
            if !schema.contains(slot) {
                schema = schema.slot(slot, default);
            }
        }
        schema
    }

    /// Builds the registry of enabled built-ins and counters.
    pub fn registry(&self) -> RuntimeResult<CommandRegistry> {
        let mut registry = CommandRegistry::new();

        for name in &self.config.commands.enabled {
            match name.as_str() {
                "cmds" => registry.insert(name, ListCommands),
                "addcmd" => registry.insert(name, AddTemplate::new()),
                "editcmd" => registry.insert(name, AddTemplate::overwriting()),
                "delcmd" => registry.insert(name, DeleteTemplates),
                "date" => registry.insert(name, ReplyWithDate),
                "addquote" => registry.insert(name, AddQuote),
                "quote" => registry.insert(name, ReplyWithQuote),
                "join" => registry.insert(name, JoinList),
                "clearjoinlist" => registry.insert(name, ClearJoinList),
                "getrandomjoiner" => registry.insert(name, RandomJoiner),
                "weather" => self.register_weather(&mut registry)?,
                other => return Err(ConfigError::UnknownCommand(other.to_string()).into()),
            }
        }

        for (name, counter) in &self.config.commands.counters {
            registry.insert(name, Counter::new(&counter.slot, &counter.label));
        }

        debug!(commands = ?registry.names().collect::<Vec<_>>(), "Command registry built");
        Ok(registry)
    }

    #[cfg(feature = "http-client")]
    fn register_weather(&self, registry: &mut CommandRegistry) -> RuntimeResult<()> {
        use squawk_framework::builtin::Weather;
        use squawk_transport::{OpenWeatherClient, OpenWeatherConfig};

        let weather = &self.config.weather;
        let Some(api_key) = weather.api_key.clone() else {
            warn!("The weather command needs weather.api_key, not registering it");
            return Ok(());
        };

        let client = OpenWeatherClient::new(OpenWeatherConfig {
            api_key,
            base_url: weather.base_url.clone(),
            units: weather.units,
            timeout: Duration::from_secs(weather.timeout_secs),
        })?;
        registry.insert("weather", Weather::new(Arc::new(client)));
        Ok(())
    }

    #[cfg(not(feature = "http-client"))]
    fn register_weather(&self, _registry: &mut CommandRegistry) -> RuntimeResult<()> {
        warn!("Built without the http-client feature, the weather command is unavailable");
        Ok(())
    }

    /// Builds a dispatcher over the configured registry.
    pub fn dispatcher(&self) -> RuntimeResult<Dispatcher> {
        Ok(Dispatcher::new(self.registry()?, self.settings()))
    }

    /// Loads and reconciles the state blob through `persistence`.
    pub async fn init_state(&self, persistence: Arc<dyn Persistence>) -> RuntimeResult<StateStore> {
        let state =
            StateStore::init(persistence, self.config.state.file.as_str(), &self.schema()).await?;
        Ok(state)
    }

    /// Assembles a bot over `transport` and `persistence`.
    pub async fn bot<T: Transport>(
        &self,
        transport: T,
        persistence: Arc<dyn Persistence>,
    ) -> RuntimeResult<Bot<T>> {
        let dispatcher = self.dispatcher()?;
        let state = self.init_state(persistence).await?;
        Ok(Bot::new(dispatcher, state, transport))
    }

    /// Connects to the chat server, loads state from disk and logs in.
    pub async fn connect(&self) -> RuntimeResult<Bot<IrcTransport>> {
        if self.config.bot.oauth_token.is_empty() {
            return Err(ConfigError::missing_field("bot.oauth_token").into());
        }

        let persistence = Arc::new(JsonFileStore::new(&self.config.state.dir));
        let connection = &self.config.connection;
        let endpoint = IrcEndpoint::new(&connection.host, connection.port)
            .tls(connection.tls)
            .connect_timeout(Duration::from_secs(connection.connect_timeout_secs));

        // State first, so a broken state file fails before we go online.
        let dispatcher = self.dispatcher()?;
        let state = self.init_state(persistence).await?;
        let transport = IrcTransport::connect(&endpoint).await?;

        let mut bot = Bot::new(dispatcher, state, transport);
        bot.login(&self.config.bot).await?;
        Ok(bot)
    }

    /// Runs the bot until Ctrl+C or SIGTERM, or until the connection fails.
    pub async fn run(&self) -> RuntimeResult<()> {
        let mut bot = self.connect().await?;
        info!("Squawk is now running. Press Ctrl+C to stop.");
        bot.run_until(wait_for_shutdown()).await?;
        info!("Runtime stopped");
        Ok(())
    }

    /// Runs against stdin and stdout with in-memory state.
    ///
    /// Each input line is handled as a received protocol line; every line the
    /// bot sends is printed. Ends cleanly at end of input.
    pub async fn run_dry(&self) -> RuntimeResult<()> {
        let mut bot = self
            .bot(ConsoleTransport::stdio(), Arc::new(MemoryStore::new()))
            .await?;
        info!("Dry run: type protocol lines, end input to stop");

        match bot.run_until(wait_for_shutdown()).await {
            Err(err) if err.is_disconnect() => {
                info!("End of input");
                Ok(())
            }
            other => other,
        }
    }
}

/// Waits for Ctrl+C or, on Unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {
                        info!("Received Ctrl+C, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down");
                    }
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for Ctrl+C, running until disconnected");
            std::future::pending::<()>().await;
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`SquawkRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    overrides: Vec<Box<dyn FnOnce(&mut SquawkConfig)>>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            overrides: Vec::new(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Adjusts the loaded configuration before it is validated, e.g. to apply
    /// command line flags.
    pub fn configure(mut self, f: impl FnOnce(&mut SquawkConfig) + 'static) -> Self {
        self.overrides.push(Box::new(f));
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> Result<SquawkRuntime, RuntimeError> {
        let mut config = self.config_loader.load()?;
        for apply in self.overrides {
            apply(&mut config);
        }
        Ok(SquawkRuntime::from_config(config)?)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
