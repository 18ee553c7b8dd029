//! Built-in commands and their registry.
//!
//! A built-in command is any type implementing [`Command`]. Commands are
//! registered by name in a [`CommandRegistry`] before the dispatcher is
//! built; the registry is immutable afterwards.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use squawk_framework::{BotContext, Command, CommandRegistry, CommandResult};
//! use squawk_core::Message;
//!
//! struct Hello;
//!
//! #[async_trait]
//! impl Command for Hello {
//!     async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
//!         ctx.reply(message, "Hello!").await?;
//!         Ok(())
//!     }
//! }
//!
//! let registry = CommandRegistry::new().with("hello", Hello);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use squawk_core::Message;

use crate::context::BotContext;
use crate::error::CommandResult;

/// A built-in chat command.
#[async_trait]
pub trait Command: Send + Sync {
    /// Handles one invocation.
    ///
    /// `message.text_command` is the name the command was registered under.
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()>;
}

/// Shared, type-erased command.
pub type BoxedCommand = Arc<dyn Command>;

/// Mapping from command name to built-in command.
///
/// Names are kept sorted, so [`names`](Self::names) is deterministic.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, BoxedCommand>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command (builder pattern).
    pub fn with(mut self, name: impl Into<String>, command: impl Command + 'static) -> Self {
        self.insert(name, command);
        self
    }

    /// Registers a command, replacing any previous one of the same name.
    pub fn insert(&mut self, name: impl Into<String>, command: impl Command + 'static) {
        self.commands.insert(name.into(), Arc::new(command));
    }

    /// Registers an already shared command.
    pub fn insert_shared(&mut self, name: impl Into<String>, command: BoxedCommand) {
        self.commands.insert(name.into(), command);
    }

    /// Looks up a command.
    pub fn get(&self, name: &str) -> Option<&BoxedCommand> {
        self.commands.get(name)
    }

    /// Returns true if a command is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Iterates over registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if no command is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.commands.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl Command for Noop {
        async fn call(&self, _ctx: &mut BotContext<'_>, _message: &Message) -> CommandResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = CommandRegistry::new()
            .with("quote", Noop)
            .with("addcmd", Noop)
            .with("date", Noop);

        assert_eq!(registry.names().collect::<Vec<_>>(), ["addcmd", "date", "quote"]);
        assert!(registry.contains("date"));
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.len(), 3);
    }
}
