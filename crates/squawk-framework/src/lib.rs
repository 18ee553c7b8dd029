//! # Squawk Framework
//!
//! Command handling for Squawk bots.
//!
//! This layer provides:
//! - The [`Command`] trait and the [`CommandRegistry`] of built-ins
//! - The [`Dispatcher`], which parses lines, answers keep-alives, gates
//!   mod-only commands and runs built-in or template commands
//! - The template renderer behind user-defined commands ([`render`])
//! - A set of ready-made [`builtin`] commands
//!
//! Everything here works against the capability traits of `squawk-core`;
//! sockets, files and HTTP clients are plugged in by the runtime.

pub mod builtin;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod moderation;
pub mod template;

pub use command::{BoxedCommand, Command, CommandRegistry};
pub use context::{BotContext, BotSettings};
pub use dispatcher::{Dispatcher, MISSING_ARGUMENTS_REPLY, MessageHook};
pub use error::{
    CommandError, CommandResult, DispatchError, DispatchResult, RenderError, RenderResult,
};
pub use moderation::is_moderator;
pub use template::render;
