//! Quote book: `addquote` and `quote`.

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use squawk_core::Message;
use tracing::info;

use super::usage;
use crate::command::Command;
use crate::context::BotContext;
use crate::error::CommandResult;

/// Slot holding the list of quotes.
pub const QUOTES_SLOT: &str = "quotes";

/// Appends a quote.
///
/// `!addquote <text...>`. A quote is at least two words.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddQuote;

#[async_trait]
impl Command for AddQuote {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        if message.text_args.len() < 2 {
            return usage(ctx, message, "<quote>").await;
        }

        let quotes = ctx.state_mut().list_mut(QUOTES_SLOT)?;
        let index = quotes.len();
        quotes.push(Value::String(message.joined_args()));
        ctx.persist().await?;
        info!(index, user = %message.sender(), "Quote added");

        ctx.reply_to_sender(message, &format!("Quote {index} added!"))
            .await?;
        Ok(())
    }
}

/// Replies with a quote.
///
/// `!quote [index]`. A missing or out-of-range index picks one at random.
/// Nothing is sent while the book is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyWithQuote;

#[async_trait]
impl Command for ReplyWithQuote {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let quotes = ctx.state().list(QUOTES_SLOT)?;
        if quotes.is_empty() {
            return Ok(());
        }

        let requested = message
            .text_args
            .first()
            .filter(|arg| arg.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|arg| arg.parse::<usize>().ok())
            .filter(|&index| index < quotes.len());
        let index = requested.unwrap_or_else(|| rand::thread_rng().gen_range(0..quotes.len()));

        let text = match &quotes[index] {
            Value::String(quote) => format!("Quote {index}: {quote}"),
            other => format!("Quote {index}: {other}"),
        };
        ctx.reply(message, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::builtin::harness::Harness;
    use crate::command::CommandRegistry;
    use crate::error::CommandError;

    async fn harness(quotes: Value) -> Harness {
        let registry = CommandRegistry::new()
            .with("addquote", AddQuote)
            .with("quote", ReplyWithQuote);
        Harness::new(json!({ "quotes": quotes }), registry).await
    }

    #[tokio::test]
    async fn test_add_quote() {
        let mut h = harness(json!(["first"])).await;
        let sent = h.run("!addquote never  gonna give").await;

        assert_eq!(sent, ["PRIVMSG #bob :@bob Quote 1 added!"]);
        assert_eq!(h.state.list(QUOTES_SLOT).unwrap()[1], json!("never  gonna give"));
        assert_eq!(h.persistence.saves(), 1);
    }

    #[tokio::test]
    async fn test_add_quote_usage() {
        let mut h = harness(json!([])).await;
        for line in ["!addquote", "!addquote hmm"] {
            let sent = h.run(line).await;
            assert_eq!(sent, ["PRIVMSG #bob :@bob Usage: !addquote <quote>"]);
        }
        assert!(h.state.list(QUOTES_SLOT).unwrap().is_empty());
        assert_eq!(h.persistence.saves(), 0);
    }

    #[tokio::test]
    async fn test_quote_by_index() {
        let mut h = harness(json!(["zero", "one"])).await;
        assert_eq!(h.run("!quote 1").await, ["PRIVMSG #bob :Quote 1: one"]);
        assert_eq!(h.run("!quote 0").await, ["PRIVMSG #bob :Quote 0: zero"]);
    }

    #[tokio::test]
    async fn test_quote_random_fallback() {
        let mut h = harness(json!(["only"])).await;
        assert_eq!(h.run("!quote 7").await, ["PRIVMSG #bob :Quote 0: only"]);
        assert_eq!(h.run("!quote -1").await, ["PRIVMSG #bob :Quote 0: only"]);
        assert_eq!(h.run("!quote").await, ["PRIVMSG #bob :Quote 0: only"]);
    }

    #[tokio::test]
    async fn test_quote_empty_book_is_silent() {
        let mut h = harness(json!([])).await;
        assert!(h.run("!quote").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_slot_is_an_error() {
        let registry = CommandRegistry::new().with("quote", ReplyWithQuote);
        let mut h = Harness::new(json!({}), registry).await;
        let err = h.try_run_as("bob", "!quote").await.unwrap_err();
        assert!(matches!(err, CommandError::State(_)));
    }
}
