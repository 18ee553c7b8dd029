//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic defaults passed to [`ConfigLoader::merge`]
//! 3. Profile-specific config file (`squawk.{profile}.toml`)
//! 4. Main config file (`squawk.toml` or `config.toml`), or the file given
//!    with [`ConfigLoader::file`]
//! 5. Environment variables (`SQUAWK_*`)
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables TOML configuration files
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `SQUAWK_` prefix with `__` as separator:
//!
//! - `SQUAWK_BOT__OAUTH_TOKEN=oauth:xxx` → `bot.oauth_token = "oauth:xxx"`
//! - `SQUAWK_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `SQUAWK_WEATHER__API_KEY=xxx` → `weather.api_key = "xxx"`
//!
//! # Example
//!
//! ```rust,ignore
//! use squawk_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./squawk.toml")
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::SquawkConfig;
use super::validation::validate_config;

/// Environment variable that selects the profile.
pub const PROFILE_ENV: &str = "SQUAWK_PROFILE";

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name; `prod` and `dev` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `SQUAWK_PROFILE`, defaulting to Development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic defaults.
    figment: Figment,
    profile: Profile,
    /// Directories searched for configuration files.
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds current directory to search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds the user config directory (e.g. `~/.config/squawk`) to search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("squawk"))
        } else {
            self
        }
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a configuration below every file and environment source.
    pub fn merge(mut self, config: SquawkConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration without validating it.
    pub fn load(self) -> ConfigResult<SquawkConfig> {
        let profile = self.profile.clone();
        let figment = self.build_figment()?;

        let config: SquawkConfig = figment.extract().map_err(|e| {
            ConfigError::ParseError(format!("Failed to extract configuration: {e}"))
        })?;

        debug!(
            profile = %profile,
            username = %config.bot.username,
            channels = ?config.bot.channels,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Loads the configuration and runs [`validate_config`] on it.
    pub fn load_validated(self) -> ConfigResult<SquawkConfig> {
        let config = self.load()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SquawkConfig::default()));

        let user_figment = std::mem::take(&mut self.figment);
        figment = figment.merge(user_figment);

        if let Some(path) = self.config_file.take() {
            if path.exists() {
                info!(path = %path.display(), "Loading configuration file");
                figment = Self::merge_config_file(figment, &path)?;
            } else {
                return Err(ConfigError::FileNotFound(path));
            }
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with SQUAWK_ prefix");
            figment = figment.merge(
                Env::prefixed("SQUAWK_")
                    .ignore(&["PROFILE"])
                    .split("__")
                    .map(|key| key.as_str().replace("__", ".").into()),
            );
        }

        Ok(figment)
    }

    /// Merges a single config file into the figment, dispatching on file extension.
    fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            #[cfg(feature = "toml-config")]
            "toml" => Ok(figment.merge(Toml::file(path))),
            _ => Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            ))),
        }
    }

    /// Returns the configured search paths, or the current directory and the
    /// user config directory if none were added.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if self.search_paths.is_empty() {
            let mut paths = Vec::new();
            if let Ok(cwd) = std::env::current_dir() {
                paths.push(cwd);
            }
            if let Some(config_dir) = dirs::config_dir() {
                paths.push(config_dir.join("squawk"));
            }
            paths
        } else {
            self.search_paths.clone()
        }
    }

    /// Loads the first main file found, preceded by its profile variant.
    #[cfg(feature = "toml-config")]
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for (stem, base_name) in [("squawk", "squawk.toml"), ("config", "config.toml")] {
                let profile_path =
                    search_path.join(format!("{stem}.{}.toml", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = figment.merge(Toml::file(&profile_path));
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return figment.merge(Toml::file(&base_path));
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }

    #[cfg(not(feature = "toml-config"))]
    fn load_config_files(&self, figment: Figment) -> Figment {
        debug!(
            search_paths = ?self.resolve_search_paths(),
            "File configuration disabled, using defaults and environment"
        );
        figment
    }
}

/// Loads and validates the configuration from the default locations.
pub fn load_config() -> ConfigResult<SquawkConfig> {
    ConfigLoader::new().load_validated()
}

/// Loads and validates the configuration from `path`.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<SquawkConfig> {
    ConfigLoader::new().file(path).load_validated()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.bot.command_prefix, "!");
        assert_eq!(config.connection.host, "irc.chat.twitch.tv");
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .file("/nonexistent/squawk.toml")
            .without_env()
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_merge_programmatic_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let mut base = SquawkConfig::default();
        base.bot.username = "squishymcbotty".to_string();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .merge(base)
            .load()
            .unwrap();
        assert_eq!(config.bot.username, "squishymcbotty");
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("squawk.toml"),
            r#"
[bot]
username = "squishymcbotty"
channels = ["clumsycomputer"]
command_prefix = "?"

[state.schema]
template_commands = {}
bigbrain_counter = 0

[commands.counters.bigbrain]
slot = "bigbrain_counter"
label = "Big brain moments"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load_validated()
            .unwrap();

        assert_eq!(config.bot.prefix_char(), Some('?'));
        assert_eq!(config.bot.channels, vec!["clumsycomputer"]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.state.schema.contains("bigbrain_counter"));
        assert_eq!(config.commands.counters["bigbrain"].label, "Big brain moments");
        // Untouched sections keep their defaults.
        assert_eq!(config.connection.port, 6697);
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_profile_file_fills_gaps() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("squawk.production.toml"),
            "[connection]\nport = 443\n\n[bot]\nusername = \"from-profile\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("squawk.toml"), "[bot]\nusername = \"main\"\n").unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .profile("prod")
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.connection.port, 443);
        assert_eq!(config.bot.username, "main");
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }
}
