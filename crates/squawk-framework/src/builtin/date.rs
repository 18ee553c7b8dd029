//! `date`: replies with the local date and time.

use async_trait::async_trait;
use chrono::Local;
use squawk_core::Message;

use crate::command::Command;
use crate::context::BotContext;
use crate::error::CommandResult;

/// `strftime` pattern of the reply.
pub const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Replies with the current local date and time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyWithDate;

#[async_trait]
impl Command for ReplyWithDate {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let now = Local::now().format(DATE_FORMAT);
        let text = format!("Here you go {}, the date is: {now}.", message.sender());
        ctx.reply(message, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDateTime;
    use squawk_core::{MemoryStore, RecordingOutbox, StateStore};

    use super::*;
    use crate::command::CommandRegistry;
    use crate::context::BotSettings;

    #[tokio::test]
    async fn test_date_reply() {
        let mut state = StateStore::load(Arc::new(MemoryStore::new()), "s").await.unwrap();
        let mut outbox = RecordingOutbox::new();
        let registry = CommandRegistry::new();
        let settings = BotSettings::default();
        let mut ctx = BotContext::new(&mut state, &mut outbox, &registry, &settings);

        let message = Message::parse(":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!date", '!').unwrap();
        ReplyWithDate.call(&mut ctx, &message).await.unwrap();

        let line = &outbox.lines()[0];
        let stamp = line
            .strip_prefix("PRIVMSG #bob :Here you go alice, the date is: ")
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, DATE_FORMAT).is_ok());
    }
}
