//! Named tallies such as `bigbrain` ("Big brain moments: 4").

use async_trait::async_trait;
use squawk_core::Message;
use tracing::debug;

use crate::command::Command;
use crate::context::BotContext;
use crate::error::CommandResult;

/// Increments an integer slot and replies with `<label>: <value>`.
#[derive(Debug, Clone)]
pub struct Counter {
    slot: String,
    label: String,
}

impl Counter {
    /// Creates a counter over `slot`.
    pub fn new(slot: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            slot: slot.into(),
            label: label.into(),
        }
    }

    /// Returns the slot this counter increments.
    pub fn slot(&self) -> &str {
        &self.slot
    }
}

#[async_trait]
impl Command for Counter {
    async fn call(&self, ctx: &mut BotContext<'_>, message: &Message) -> CommandResult<()> {
        let value = ctx.state_mut().increment(&self.slot)?;
        ctx.persist().await?;
        debug!(slot = %self.slot, value, "Counter incremented");

        ctx.reply(message, &format!("{}: {value}", self.label)).await?;
        Ok(())
    }
}
