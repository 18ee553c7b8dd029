//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{BUILTIN_COMMANDS, BotConfig, CommandsConfig, SquawkConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &SquawkConfig) -> ConfigResult<()> {
    validate_bot_config(&config.bot)?;
    validate_port(config.connection.port)?;

    if config.connection.server_domain.is_empty() {
        return Err(ConfigError::missing_field("connection.server_domain"));
    }
    if config.state.file.is_empty() {
        return Err(ConfigError::missing_field("state.file"));
    }

    validate_commands_config(config)?;
    Ok(())
}

/// Validates identity, prefix and channels.
fn validate_bot_config(bot: &BotConfig) -> ConfigResult<()> {
    if bot.username.is_empty() {
        return Err(ConfigError::missing_field("bot.username"));
    }

    match bot.prefix_char() {
        Some(c) if !c.is_whitespace() => {}
        _ => return Err(ConfigError::InvalidPrefix(bot.command_prefix.clone())),
    }

    if bot.channels.is_empty() {
        return Err(ConfigError::missing_field("bot.channels"));
    }

    let mut seen = HashSet::new();
    for channel in &bot.channels {
        if channel.is_empty() || channel.starts_with('#') || channel.contains(' ') {
            return Err(ConfigError::validation(format!(
                "Channel names must be non-empty, without '#' or spaces: {channel:?}"
            )));
        }
        if !seen.insert(channel.to_lowercase()) {
            return Err(ConfigError::DuplicateChannel(channel.clone()));
        }
    }

    Ok(())
}

/// Validates a port number.
fn validate_port(port: u16) -> ConfigResult<()> {
    if port == 0 {
        return Err(ConfigError::InvalidPort(port));
    }
    Ok(())
}

/// Checks built-in names and counter slots.
fn validate_commands_config(config: &SquawkConfig) -> ConfigResult<()> {
    let CommandsConfig { enabled, counters } = &config.commands;

    for name in enabled {
        if !BUILTIN_COMMANDS.contains(&name.as_str()) {
            return Err(ConfigError::UnknownCommand(name.clone()));
        }
    }

    for (name, counter) in counters {
        if BUILTIN_COMMANDS.contains(&name.as_str()) {
            return Err(ConfigError::validation(format!(
                "Counter '{name}' shadows a built-in command"
            )));
        }
        if !config.state.schema.contains(&counter.slot) {
            return Err(ConfigError::UnknownSlot {
                counter: name.clone(),
                slot: counter.slot.clone(),
            });
        }
    }

    Ok(())
}
