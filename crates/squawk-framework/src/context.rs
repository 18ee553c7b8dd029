//! Per-message handler context.
//!
//! A [`BotContext`] is built by the dispatcher for each protocol line. It
//! borrows everything a command may touch while handling that line:
//!
//! - the bot's [`StateStore`] (mutably, it is the only writer)
//! - the [`Outbox`] replies are written to
//! - the [`CommandRegistry`] and [`BotSettings`] (read-only)

use std::collections::BTreeSet;

use squawk_core::{
    DEFAULT_SERVER_DOMAIN, LineParser, Message, Outbox, PersistenceResult, StateStore,
    TransportResult,
};
use tracing::debug;

use crate::command::CommandRegistry;

// =============================================================================
// BotSettings
// =============================================================================

/// Settings fixed when a dispatcher is built.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Character that marks a chat message as a command.
    pub command_prefix: char,
    /// Commands only moderators and the broadcaster may run.
    pub mod_only: BTreeSet<String>,
    /// Domain of the chat server, used for `PONG` and prefix parsing.
    pub server_domain: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            command_prefix: '!',
            mod_only: BTreeSet::new(),
            server_domain: DEFAULT_SERVER_DOMAIN.to_string(),
        }
    }
}

impl BotSettings {
    /// Creates default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the command prefix.
    pub fn command_prefix(mut self, prefix: char) -> Self {
        self.command_prefix = prefix;
        self
    }

    /// Marks commands as mod-only.
    pub fn mod_only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mod_only.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the server domain.
    pub fn server_domain(mut self, domain: impl Into<String>) -> Self {
        self.server_domain = domain.into();
        self
    }

    /// Returns true if `name` is restricted to moderators.
    pub fn is_mod_only(&self, name: &str) -> bool {
        self.mod_only.contains(name)
    }

    /// Returns `name` with the command prefix in front.
    pub fn prefixed(&self, name: &str) -> String {
        format!("{}{name}", self.command_prefix)
    }

    /// Builds the line parser matching these settings.
    pub fn parser(&self) -> LineParser {
        LineParser::new(self.command_prefix, self.server_domain.as_str())
    }
}

// =============================================================================
// BotContext
// =============================================================================

/// What a command can reach while handling one message.
pub struct BotContext<'a> {
    state: &'a mut StateStore,
    outbox: &'a mut dyn Outbox,
    registry: &'a CommandRegistry,
    settings: &'a BotSettings,
}

impl<'a> BotContext<'a> {
    /// Creates a context over borrowed bot parts.
    pub fn new(
        state: &'a mut StateStore,
        outbox: &'a mut dyn Outbox,
        registry: &'a CommandRegistry,
        settings: &'a BotSettings,
    ) -> Self {
        Self {
            state,
            outbox,
            registry,
            settings,
        }
    }

    /// Returns the bot state.
    pub fn state(&self) -> &StateStore {
        self.state
    }

    /// Returns the bot state mutably.
    ///
    /// Call [`persist`](Self::persist) after every mutation.
    pub fn state_mut(&mut self) -> &mut StateStore {
        self.state
    }

    /// Returns the built-in command registry.
    pub fn registry(&self) -> &CommandRegistry {
        self.registry
    }

    /// Returns the bot settings.
    pub fn settings(&self) -> &BotSettings {
        self.settings
    }

    /// Writes the state through its persistence capability.
    pub async fn persist(&mut self) -> PersistenceResult<()> {
        self.state.save().await
    }

    /// Sends a raw protocol line.
    pub async fn send_line(&mut self, line: &str) -> TransportResult<()> {
        if line.starts_with("PASS ") {
            debug!("< PASS ***");
        } else {
            debug!("< {line}");
        }
        self.outbox.send_line(line).await
    }

    /// Sends a chat message to a channel.
    ///
    /// Text starting with `/` would run as a chat command on the server
    /// and is dropped.
    pub async fn send_reply(&mut self, channel: &str, text: &str) -> TransportResult<()> {
        if text.starts_with('/') {
            debug!(channel = %channel, "Dropping reply that starts with '/'");
            return Ok(());
        }
        self.send_line(&format!("PRIVMSG #{channel} :{text}")).await
    }

    /// Replies in the channel the message came from.
    ///
    /// Messages without a channel get no reply.
    pub async fn reply(&mut self, message: &Message, text: &str) -> TransportResult<()> {
        match message.channel.as_deref() {
            Some(channel) => self.send_reply(channel, text).await,
            None => {
                debug!(%message, "No channel to reply to");
                Ok(())
            }
        }
    }

    /// Replies with the sender mentioned in front.
    pub async fn reply_to_sender(&mut self, message: &Message, text: &str) -> TransportResult<()> {
        let text = format!("@{} {text}", message.sender());
        self.reply(message, &text).await
    }
}

impl std::fmt::Debug for BotContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use squawk_core::{MemoryStore, RecordingOutbox};

    use super::*;

    async fn store() -> StateStore {
        StateStore::load(Arc::new(MemoryStore::new()), "state.json")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_reply_formats_privmsg() {
        let mut state = store().await;
        let mut outbox = RecordingOutbox::new();
        let registry = CommandRegistry::new();
        let settings = BotSettings::default();
        let mut ctx = BotContext::new(&mut state, &mut outbox, &registry, &settings);

        ctx.send_reply("bob", "hello").await.unwrap();
        assert_eq!(outbox.lines(), ["PRIVMSG #bob :hello"]);
    }

    #[tokio::test]
    async fn test_send_reply_drops_slash_commands() {
        let mut state = store().await;
        let mut outbox = RecordingOutbox::new();
        let registry = CommandRegistry::new();
        let settings = BotSettings::default();
        let mut ctx = BotContext::new(&mut state, &mut outbox, &registry, &settings);

        ctx.send_reply("bob", "/ban alice").await.unwrap();
        assert!(outbox.lines().is_empty());
    }

    #[tokio::test]
    async fn test_reply_to_sender() {
        let mut state = store().await;
        let mut outbox = RecordingOutbox::new();
        let registry = CommandRegistry::new();
        let settings = BotSettings::default();
        let mut ctx = BotContext::new(&mut state, &mut outbox, &registry, &settings);

        let message = Message::parse(":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!x", '!').unwrap();
        ctx.reply_to_sender(&message, "hi").await.unwrap();
        assert_eq!(outbox.lines(), ["PRIVMSG #bob :@alice hi"]);
    }

    #[test]
    fn test_settings_builder() {
        let settings = BotSettings::new()
            .command_prefix('?')
            .mod_only(["addcmd", "delcmd"])
            .server_domain("irc.example.org");

        assert!(settings.is_mod_only("addcmd"));
        assert!(!settings.is_mod_only("quote"));
        assert_eq!(settings.prefixed("quote"), "?quote");
        assert_eq!(settings.parser().server_domain(), "irc.example.org");
    }
}
