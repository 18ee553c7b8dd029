//! Line dispatcher for the Squawk framework.
//!
//! The [`Dispatcher`] takes one raw protocol line at a time and runs it to
//! completion:
//!
//! 1. Empty lines and lines without a command token are ignored
//! 2. Every [`MessageHook`] observes the parsed message
//! 3. `PING` is answered with `PONG :<server domain>`
//! 4. For `PRIVMSG` lines carrying a text command:
//!    - mod-only commands from non-moderators are dropped silently
//!    - a built-in [`Command`](crate::command::Command) runs if one is registered
//!    - otherwise a template command of that name is rendered
//!    - otherwise the message is ignored
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new(registry, BotSettings::default().mod_only(["addcmd"]));
//!
//! loop {
//!     let line = transport.receive().await?;
//!     dispatcher.handle(&line, &mut state, &mut transport).await?;
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use squawk_core::{LineParser, Message, Outbox, StateStore};
use tracing::{Instrument, Level, debug, span, warn};

use crate::command::CommandRegistry;
use crate::context::{BotContext, BotSettings};
use crate::error::{CommandResult, DispatchError, DispatchResult, RenderError};
use crate::moderation::is_moderator;
use crate::template::render;

/// Reply sent when a template indexes past the given arguments.
pub const MISSING_ARGUMENTS_REPLY: &str = "Your command is missing some arguments!";

/// Observer that sees every parsed message before dispatch.
///
/// Hooks run for all protocol lines, not just commands.
#[async_trait]
pub trait MessageHook: Send + Sync {
    /// Name used when reporting a failure of this hook.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Observes one message.
    async fn on_message(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()>;
}

/// Routes protocol lines to built-in and template commands.
///
/// The registry and settings are fixed at construction.
pub struct Dispatcher {
    parser: LineParser,
    registry: CommandRegistry,
    settings: BotSettings,
    hooks: Vec<Arc<dyn MessageHook>>,
}

impl Dispatcher {
    /// Creates a dispatcher over a finished registry.
    pub fn new(registry: CommandRegistry, settings: BotSettings) -> Self {
        Self {
            parser: settings.parser(),
            registry,
            settings,
            hooks: Vec::new(),
        }
    }

    /// Adds a message hook (builder pattern).
    ///
    /// Hooks run in the order they are added.
    pub fn with_hook(mut self, hook: impl MessageHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Returns the built-in command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Returns the dispatcher settings.
    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    /// Handles one protocol line.
    ///
    /// # Errors
    ///
    /// Failed sends and failed persistence writes are returned as fatal
    /// [`DispatchError`]s. A built-in command's own failure is returned as
    /// [`DispatchError::Command`], which concerns this line only. Template
    /// rendering faults never escape.
    pub async fn handle(
        &self,
        raw: &str,
        state: &mut StateStore,
        outbox: &mut dyn Outbox,
    ) -> DispatchResult<()> {
        if raw.is_empty() {
            return Ok(());
        }

        let Some(message) = self.parser.parse(raw) else {
            debug!(line = %raw, "Ignoring line without a command");
            return Ok(());
        };
        debug!("> {message}");

        let span = span!(Level::DEBUG, "dispatch", irc_command = %message.irc_command);
        self.dispatch(&message, state, outbox).instrument(span).await
    }

    async fn dispatch(
        &self,
        message: &Message,
        state: &mut StateStore,
        outbox: &mut dyn Outbox,
    ) -> DispatchResult<()> {
        let mut ctx = BotContext::new(state, outbox, &self.registry, &self.settings);

        for hook in &self.hooks {
            hook.on_message(&mut ctx, message)
                .await
                .map_err(|e| DispatchError::from_command(hook.name(), e))?;
        }

        if message.is_ping() {
            let pong = format!("PONG :{}", self.settings.server_domain);
            ctx.send_line(&pong).await?;
        }

        if !message.is_privmsg() {
            return Ok(());
        }

        let Some(name) = message.text_command.as_deref() else {
            return Ok(());
        };

        if self.settings.is_mod_only(name) && !is_moderator(message) {
            debug!(command = %name, user = %message.sender(), "Mod-only command denied");
            return Ok(());
        }

        if let Some(command) = self.registry.get(name) {
            debug!(command = %name, "Running built-in command");
            return command
                .call(&mut ctx, message)
                .await
                .map_err(|e| DispatchError::from_command(name, e));
        }

        let template = ctx.state().template(name).map(ToString::to_string);
        match template {
            Some(template) => run_template(&mut ctx, message, name, &template).await,
            None => {
                debug!(command = %name, "Unknown command");
                Ok(())
            }
        }
    }
}

async fn run_template(
    ctx: &mut BotContext<'_>,
    message: &Message,
    name: &str,
    template: &str,
) -> DispatchResult<()> {
    match render(template, message) {
        Ok(text) => ctx.reply(message, &text).await?,
        Err(RenderError::ArgumentMissing { .. }) => {
            ctx.reply_to_sender(message, MISSING_ARGUMENTS_REPLY).await?;
        }
        Err(err) => {
            warn!(command = %name, template = %template, error = %err, "Failed to render template command");
        }
    }
    Ok(())
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .field("hook_count", &self.hooks.len())
            .finish()
    }
}
