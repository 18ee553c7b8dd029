//! Viewer queue: `join`, `clearjoinlist` and `getrandomjoiner`.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde_json::Value;
use squawk_core::Message;
use tracing::info;

use crate::command::Command;
use crate::context::BotContext;
use crate::error::CommandResult;

/// Slot holding the names of viewers who joined.
pub const JOINLIST_SLOT: &str = "joinlist";

/// Adds the sender to the join list, once.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinList;

#[async_trait]
impl Command for JoinList {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let user = message.sender();
        let joiners = ctx.state_mut().list_mut(JOINLIST_SLOT)?;

        if joiners.iter().any(|joiner| joiner.as_str() == Some(user)) {
            ctx.reply_to_sender(message, "You're already on the list!")
                .await?;
            return Ok(());
        }

        joiners.push(Value::String(user.to_string()));
        let position = joiners.len();
        ctx.persist().await?;

        ctx.reply_to_sender(message, &format!("You joined the list at position {position}!"))
            .await?;
        Ok(())
    }
}

/// Empties the join list.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClearJoinList;

#[async_trait]
impl Command for ClearJoinList {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let joiners = ctx.state_mut().list_mut(JOINLIST_SLOT)?;
        let cleared = joiners.len();
        joiners.clear();
        ctx.persist().await?;
        info!(cleared, user = %message.sender(), "Join list cleared");

        ctx.reply_to_sender(message, "Join list cleared!").await?;
        Ok(())
    }
}

/// Picks a random name from the join list.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJoiner;

#[async_trait]
impl Command for RandomJoiner {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let joiners = ctx.state().list(JOINLIST_SLOT)?;
        let picked = joiners
            .choose(&mut rand::thread_rng())
            .and_then(Value::as_str)
            .map(ToString::to_string);

        let text = match picked {
            Some(joiner) => format!("The lucky joiner is @{joiner}!"),
            None => "Nobody has joined yet!".to_string(),
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

    async fn harness(joiners: Value) -> Harness {
        let registry = CommandRegistry::new()
            .with("join", JoinList)
            .with("clearjoinlist", ClearJoinList)
            .with("getrandomjoiner", RandomJoiner);
        Harness::new(json!({ "joinlist": joiners }), registry).await
    }

    #[tokio::test]
    async fn test_join_once() {
        let mut h = harness(json!([])).await;

        assert_eq!(
            h.run_as("alice", "!join").await,
            ["PRIVMSG #bob :@alice You joined the list at position 1!"]
        );
        assert_eq!(
            h.run_as("carol", "!join").await,
            ["PRIVMSG #bob :@carol You joined the list at position 2!"]
        );
        assert_eq!(
            h.run_as("alice", "!join").await,
            ["PRIVMSG #bob :@alice You're already on the list!"]
        );
        assert_eq!(h.state.list(JOINLIST_SLOT).unwrap(), &vec![json!("alice"), json!("carol")]);
        assert_eq!(h.persistence.saves(), 2);
    }

    #[tokio::test]
    async fn test_random_joiner() {
        let mut h = harness(json!(["alice"])).await;
        assert_eq!(h.run("!getrandomjoiner").await, ["PRIVMSG #bob :The lucky joiner is @alice!"]);
    }

    #[tokio::test]
    async fn test_random_joiner_empty() {
        let mut h = harness(json!([])).await;
        assert_eq!(h.run("!getrandomjoiner").await, ["PRIVMSG #bob :Nobody has joined yet!"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let mut h = harness(json!(["alice", "carol"])).await;
        assert_eq!(h.run("!clearjoinlist").await, ["PRIVMSG #bob :@bob Join list cleared!"]);
        assert!(h.state.list(JOINLIST_SLOT).unwrap().is_empty());
        assert_eq!(h.persistence.saves(), 1);
    }
}
