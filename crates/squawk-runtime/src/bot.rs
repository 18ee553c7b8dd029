//! One bot session: login, then a receive loop feeding the dispatcher.

use std::future::Future;

use tracing::{debug, error, info};

use squawk_core::{StateStore, Transport};
use squawk_framework::{BotContext, Dispatcher};

use crate::config::BotConfig;
use crate::error::RuntimeResult;

/// Represents the current status of a bot session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    /// Created, not logged in yet.
    Idle,
    /// Logged in and handling lines.
    Running,
    /// The receive loop has ended.
    Stopped,
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// A bot bound to one transport and one state blob.
///
/// Lines are handled strictly in order, each to completion (replies sent,
/// state persisted) before the next one is looked at.
pub struct Bot<T> {
    dispatcher: Dispatcher,
    state: StateStore,
    transport: T,
    status: BotStatus,
}

impl<T: Transport> Bot<T> {
    /// Creates a bot over initialized state.
    pub fn new(dispatcher: Dispatcher, state: StateStore, transport: T) -> Self {
        Self {
            dispatcher,
            state,
            transport,
            status: BotStatus::Idle,
        }
    }

    /// Returns the current status.
    pub fn status(&self) -> BotStatus {
        self.status
    }

    /// Returns the bot state.
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the dispatcher.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Sends the login handshake and joins every configured channel.
    ///
    /// `PASS`, `NICK`, then `CAP REQ` if capabilities are configured, then a
    /// `JOIN` and the optional greeting per channel.
    pub async fn login(&mut self, config: &BotConfig) -> RuntimeResult<()> {
        let mut ctx = BotContext::new(
            &mut self.state,
            &mut self.transport,
            self.dispatcher.registry(),
            self.dispatcher.settings(),
        );

        ctx.send_line(&format!("PASS {}", config.oauth_token)).await?;
        ctx.send_line(&format!("NICK {}", config.username)).await?;
        if !config.caps.is_empty() {
            ctx.send_line(&format!("CAP REQ :{}", config.caps.join(" ")))
                .await?;
        }

        for channel in &config.channels {
            ctx.send_line(&format!("JOIN #{channel}")).await?;
            if !config.greeting.is_empty() {
                ctx.send_reply(channel, &config.greeting).await?;
            }
            info!(channel = %channel, "Joined channel");
        }

        self.status = BotStatus::Running;
        Ok(())
    }

    /// Dispatches one received line.
    ///
    /// A command failing is logged and the session carries on. Transport and
    /// persistence faults end the session.
    pub async fn handle_line(&mut self, line: &str) -> RuntimeResult<()> {
        let result = self
            .dispatcher
            .handle(line, &mut self.state, &mut self.transport)
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(err) if err.is_fatal() => {
                error!(line = %line, error = %err, "Fatal error while handling line");
                self.status = BotStatus::Stopped;
                Err(err.into())
            }
            Err(err) => {
                error!(line = %line, error = %err, "Failed to handle line");
                Ok(())
            }
        }
    }

    /// Receives and handles lines until the transport fails.
    pub async fn run(&mut self) -> RuntimeResult<()> {
        self.run_until(std::future::pending()).await
    }

    /// Receives and handles lines until `shutdown` completes or the
    /// transport fails.
    ///
    /// Shutdown is only observed between lines; a line being handled is
    /// always finished.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        self.status = BotStatus::Running;

        loop {
            let received = tokio::select! {
                received = self.transport.receive() => received,
                () = &mut shutdown => {
                    info!("Shutdown requested, leaving receive loop");
                    break;
                }
            };

            let line = match received {
                Ok(line) => line,
                Err(err) => {
                    self.status = BotStatus::Stopped;
                    return Err(err.into());
                }
            };
            debug!(bytes = line.len(), "Received line");
            self.handle_line(&line).await?;
        }

        self.status = BotStatus::Stopped;
        Ok(())
    }
}

impl<T> std::fmt::Debug for Bot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("state", &self.state)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use serde_json::Value;
    use squawk_core::{
        MemoryStore, Outbox, Persistence, PersistenceError, PersistenceResult, StateSchema,
        TransportError, TransportResult,
    };
    use squawk_framework::builtin::{AddQuote, AddTemplate, Counter};
    use squawk_framework::{BotSettings, CommandRegistry, DispatchError};

    use super::*;
    use crate::error::RuntimeError;

    /// Plays back canned lines, then reports the connection closed unless
    /// `hold_open` is set.
    #[derive(Default)]
    struct Scripted {
        incoming: VecDeque<String>,
        sent: Vec<String>,
        fail_sends: bool,
        hold_open: bool,
    }

    impl Scripted {
        fn with(lines: &[&str]) -> Self {
            Self {
                incoming: lines.iter().map(ToString::to_string).collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Outbox for Scripted {
        async fn send_line(&mut self, line: &str) -> TransportResult<()> {
            if self.fail_sends {
                return Err(TransportError::SendFailed("broken pipe".into()));
            }
            self.sent.push(line.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn receive(&mut self) -> TransportResult<String> {
            match self.incoming.pop_front() {
                Some(line) => Ok(line),
                None if self.hold_open => std::future::pending().await,
                None => Err(TransportError::closed("script finished")),
            }
        }
    }

    /// Loads fine, then refuses every write.
    struct ReadOnlyDisk;

    #[async_trait]
    impl Persistence for ReadOnlyDisk {
        async fn load_blob(&self, _name: &str) -> PersistenceResult<Value> {
            Ok(json!({"template_commands": {}}))
        }

        async fn save_blob(&self, name: &str, _value: &Value) -> PersistenceResult<()> {
            Err(PersistenceError::write(name, "read-only file system"))
        }
    }

    async fn bot(transport: Scripted) -> Bot<Scripted> {
        let schema = StateSchema::new()
            .slot("template_commands", json!({"hi": "Hi {message.user}!"}))
            .slot("quotes", json!([]))
            .slot("counter", json!(0));
        let state = StateStore::init(Arc::new(MemoryStore::new()), "state.json", &schema)
            .await
            .unwrap();
        let registry = CommandRegistry::new()
            .with("addquote", AddQuote)
            .with("broken", Counter::new("missing_slot", "Broken"));
        let dispatcher = Dispatcher::new(registry, BotSettings::new());
        Bot::new(dispatcher, state, transport)
    }

    fn login_config() -> BotConfig {
        BotConfig {
            username: "squishymcbotty".to_string(),
            oauth_token: "oauth:secret".to_string(),
            channels: vec!["clumsycomputer".to_string(), "vladh".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_login_handshake() {
        let mut bot = bot(Scripted::default()).await;
        bot.login(&login_config()).await.unwrap();

        assert_eq!(
            bot.transport().sent,
            vec![
                "PASS oauth:secret",
                "NICK squishymcbotty",
                "CAP REQ :twitch.tv/tags",
                "JOIN #clumsycomputer",
                "PRIVMSG #clumsycomputer :Hey there!",
                "JOIN #vladh",
                "PRIVMSG #vladh :Hey there!",
            ]
        );
        assert_eq!(bot.status(), BotStatus::Running);
    }

    #[tokio::test]
    async fn test_login_without_caps_or_greeting() {
        let mut config = login_config();
        config.caps.clear();
        config.greeting.clear();
        config.channels.truncate(1);

        let mut bot = bot(Scripted::default()).await;
        bot.login(&config).await.unwrap();
        assert_eq!(
            bot.transport().sent,
            vec!["PASS oauth:secret", "NICK squishymcbotty", "JOIN #clumsycomputer"]
        );
    }

    #[tokio::test]
    async fn test_run_handles_lines_until_closed() {
        let transport = Scripted::with(&[
            "PING :tmi.twitch.tv",
            "",
            ":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!hi",
        ]);
        let mut bot = bot(transport).await;

        let err = bot.run().await.unwrap_err();
        assert!(err.is_disconnect());
        assert_eq!(bot.status(), BotStatus::Stopped);
        assert_eq!(
            bot.transport().sent,
            vec!["PONG :tmi.twitch.tv", "PRIVMSG #bob :Hi alice!"]
        );
    }

    #[tokio::test]
    async fn test_command_failure_does_not_stop_the_session() {
        let transport = Scripted::with(&[
            ":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!broken",
            ":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!hi",
        ]);
        let mut bot = bot(transport).await;

        assert!(bot.run().await.unwrap_err().is_disconnect());
        assert_eq!(bot.transport().sent, vec!["PRIVMSG #bob :Hi alice!"]);
    }

    #[tokio::test]
    async fn test_send_failure_is_fatal() {
        let mut bot = bot(Scripted {
            fail_sends: true,
            ..Default::default()
        })
        .await;

        let err = bot
            .handle_line("PING :tmi.twitch.tv")
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Dispatch(_)));
        assert_eq!(bot.status(), BotStatus::Stopped);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let mut transport = Scripted::with(&["PING :tmi.twitch.tv"]);
        transport.hold_open = true;
        let mut bot = bot(transport).await;

        bot.run_until(async {}).await.unwrap();
        assert_eq!(bot.status(), BotStatus::Stopped);
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let persistence = Arc::new(MemoryStore::new());
        let schema = StateSchema::new().slot("quotes", json!([]));
        let state = StateStore::init(persistence.clone(), "state.json", &schema)
            .await
            .unwrap();
        let dispatcher = Dispatcher::new(
            CommandRegistry::new().with("addquote", AddQuote),
            BotSettings::new(),
        );
        let mut bot = Bot::new(dispatcher, state, Scripted::default());

        bot.handle_line(":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!addquote be kind")
            .await
            .unwrap();

        assert_eq!(
            persistence.blob("state.json"),
            Some(json!({"quotes": ["be kind"]}))
        );
    }

    #[tokio::test]
    async fn test_failed_save_is_fatal() {
        let state = StateStore::load(Arc::new(ReadOnlyDisk), "state.json")
            .await
            .unwrap();
        let dispatcher = Dispatcher::new(
            CommandRegistry::new().with("addcmd", AddTemplate::new()),
            BotSettings::new(),
        );
        let transport = Scripted::with(&[
            "@badges=broadcaster/1;mod=0 :bob!bob@bob.tmi.twitch.tv PRIVMSG #bob :!addcmd x y",
            "PING :tmi.twitch.tv",
        ]);
        let mut bot = Bot::new(dispatcher, state, transport);

        let err = bot.run().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Dispatch(DispatchError::Persistence(PersistenceError::Write { .. }))
        ));
        assert!(!err.is_disconnect());
        assert_eq!(bot.status(), BotStatus::Stopped);
        // Nothing is confirmed and the next line is never read.
        assert!(bot.transport().sent.is_empty());
        assert_eq!(bot.transport().incoming.len(), 1);
    }
}
