//! Built-in commands shipped with the Squawk framework.
//!
//! | Command | Type | State slot |
//! |---------|------|------------|
//! | `addcmd` / `editcmd` | [`AddTemplate`] | `template_commands` |
//! | `delcmd` | [`DeleteTemplates`] | `template_commands` |
//! | `cmds` | [`ListCommands`] | `template_commands` |
//! | `date` | [`ReplyWithDate`] | |
//! | `addquote` | [`AddQuote`] | `quotes` |
//! | `quote` | [`ReplyWithQuote`] | `quotes` |
//! | counters such as `bigbrain` | [`Counter`] | configurable |
//! | `join` / `clearjoinlist` / `getrandomjoiner` | [`JoinList`], [`ClearJoinList`], [`RandomJoiner`] | `joinlist` |
//! | `weather` | [`Weather`] | |
//!
//! Commands are not registered automatically; the runtime picks them by
//! name from its configuration.

pub mod counter;
pub mod date;
pub mod joinlist;
pub mod quotes;
pub mod templates;
pub mod weather;

pub use counter::Counter;
pub use date::ReplyWithDate;
pub use joinlist::{ClearJoinList, JOINLIST_SLOT, JoinList, RandomJoiner};
pub use quotes::{AddQuote, QUOTES_SLOT, ReplyWithQuote};
pub use templates::{AddTemplate, DeleteTemplates, ListCommands};
pub use weather::Weather;

use squawk_core::Message;

use crate::context::BotContext;
use crate::error::CommandResult;

/// Replies with `Usage: <prefix><command> <args>`.
pub(crate) async fn usage(
    ctx: &mut BotContext<'_>,
    message: &Message,
    args: &str,
) -> CommandResult<()> {
    let command = ctx
        .settings()
        .prefixed(message.text_command.as_deref().unwrap_or_default());
    ctx.reply_to_sender(message, &format!("Usage: {command} {args}"))
        .await?;
    Ok(())
}
