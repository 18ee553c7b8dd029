//! Template command management: `addcmd`, `editcmd`, `delcmd` and `cmds`.
//!
//! These are the only writers of the `template_commands` slot.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde_json::Value;
use squawk_core::Message;
use tracing::info;

use super::usage;
use crate::command::Command;
use crate::context::BotContext;
use crate::error::CommandResult;

/// Adds a template command, or replaces one when `overwrite` is set.
///
/// `!addcmd <name> <template...>`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddTemplate {
    overwrite: bool,
}

impl AddTemplate {
    /// Creates the `addcmd` flavour, which refuses to replace templates.
    pub fn new() -> Self {
        Self { overwrite: false }
    }

    /// Creates the `editcmd` flavour, which replaces existing templates.
    pub fn overwriting() -> Self {
        Self { overwrite: true }
    }
}

#[async_trait]
impl Command for AddTemplate {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let [name, words @ ..] = message.text_args.as_slice() else {
            return usage(ctx, message, "<name> <template>").await;
        };
        if words.is_empty() {
            return usage(ctx, message, "<name> <template>").await;
        }

        let prefix = ctx.settings().command_prefix;
        let name = name.strip_prefix(prefix).unwrap_or(name).to_string();

        if ctx.registry().contains(&name) {
            let text = format!("Can't add command {name} as it is already a built-in command.");
            ctx.reply_to_sender(message, &text).await?;
            return Ok(());
        }

        let exists = ctx.state().template_commands()?.contains_key(&name);
        if exists && !self.overwrite {
            let text = format!(
                "Command {name} already exists, use {} if you'd like to edit it.",
                ctx.settings().prefixed("editcmd")
            );
            ctx.reply_to_sender(message, &text).await?;
            return Ok(());
        }

        let template = words.join(" ");
        ctx.state_mut()
            .template_commands_mut()?
            .insert(name.clone(), Value::String(template));
        ctx.persist().await?;
        info!(command = %name, user = %message.sender(), replaced = exists, "Template command saved");

        let verb = if exists { "updated" } else { "added" };
        ctx.reply_to_sender(message, &format!("Command {name} {verb}!")).await?;
        Ok(())
    }
}

/// Deletes one or more template commands, all or none.
///
/// `!delcmd <name...>`
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteTemplates;

#[async_trait]
impl Command for DeleteTemplates {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        if message.text_args.is_empty() {
            return usage(ctx, message, "<name...>").await;
        }

        let prefix = ctx.settings().command_prefix;
        let names: Vec<&str> = message
            .text_args
            .iter()
            .map(|arg| arg.strip_prefix(prefix).unwrap_or(arg))
            .collect();

        let templates = ctx.state().template_commands()?;
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !templates.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            let text = format!("These commands don't exist: {}", missing.join(" "));
            ctx.reply_to_sender(message, &text).await?;
            return Ok(());
        }

        let templates = ctx.state_mut().template_commands_mut()?;
        for name in &names {
            templates.remove(*name);
        }
        ctx.persist().await?;
        info!(commands = ?names, user = %message.sender(), "Template commands deleted");

        let text = match names.as_slice() {
            [single] => format!("Command {single} deleted!"),
            _ => format!("Commands deleted! {}", names.join(" ")),
        };
        ctx.reply_to_sender(message, &text).await?;
        Ok(())
    }
}

/// Lists template and built-in commands.
///
/// When any command is mod-only the list is split in two.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListCommands;

#[async_trait]
impl Command for ListCommands {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let settings = ctx.settings();
        let names: BTreeSet<&str> = ctx
            .state()
            .template_commands()?
            .keys()
            .map(String::as_str)
            .chain(ctx.registry().names())
            .collect();

        let (mod_only, general): (Vec<&str>, Vec<&str>) =
            names.into_iter().partition(|name| settings.is_mod_only(name));
        let join = |names: Vec<&str>| {
            names
                .into_iter()
                .map(|name| settings.prefixed(name))
                .collect::<Vec<_>>()
                .join(" ")
        };

        let text = if settings.mod_only.is_empty() {
            format!("Commands: {}", join(general))
        } else {
            format!(
                "Commands: {} Mod-only commands: {}",
                join(general),
                join(mod_only)
            )
        };

        ctx.reply_to_sender(message, &text).await?;
        Ok(())
    }
}
