//! Moderation gate for mod-only commands.

use squawk_core::Message;

/// Returns true if the sender is the broadcaster or a moderator.
///
/// Decided from the `badges` and `mod` tags only. A message without tags is
/// never a moderator's.
pub fn is_moderator(message: &Message) -> bool {
    let Some(tags) = message.tags.as_ref() else {
        return false;
    };

    let is_broadcaster = tags
        .get("badges")
        .is_some_and(|badges| badges.contains("broadcaster"));
    let is_mod = tags.get("mod").is_some_and(|flag| flag == "1");

    is_broadcaster || is_mod
}
