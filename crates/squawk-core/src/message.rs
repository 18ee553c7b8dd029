//! The structured form of one protocol line.
//!
//! A [`Message`] is produced once per received line by the
//! [`LineParser`](crate::parser::LineParser) and never mutated afterwards.
//!
//! ```text
//! @badges=broadcaster/1;mod=0 :alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!quote 2
//! └────────── tags ─────────┘ └──────────── prefix ──────────┘ └─cmd─┘ └arg┘ └─ text ─┘
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::parser::{DEFAULT_SERVER_DOMAIN, LineParser};

/// Protocol verb of a server keep-alive.
pub const PING: &str = "PING";

/// Protocol verb of a chat message.
pub const PRIVMSG: &str = "PRIVMSG";

/// A parsed protocol line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Raw sender prefix (`nick!user@host` or the server hostname).
    pub prefix: Option<String>,
    /// Sender's short name, `None` when the prefix names the server itself.
    pub user: Option<String>,
    /// Target channel without the leading `#`.
    pub channel: Option<String>,
    /// Protocol verb, e.g. `PING`, `PRIVMSG` or a numeric reply code.
    pub irc_command: String,
    /// Positional parameters before the trailing parameter.
    pub irc_args: Vec<String>,
    /// The trailing parameter without its leading `:`.
    pub text: Option<String>,
    /// The word following the command prefix, if `text` starts with one.
    pub text_command: Option<String>,
    /// Words of `text` after `text_command`.
    pub text_args: Vec<String>,
    /// IRCv3 message tags, present only if the line began with `@`.
    pub tags: Option<HashMap<String, String>>,
}

impl Message {
    /// Parses a line against the default server domain.
    ///
    /// Returns `None` for lines that carry no message (empty, or without a
    /// command token).
    pub fn parse(line: &str, command_prefix: char) -> Option<Self> {
        LineParser::new(command_prefix, DEFAULT_SERVER_DOMAIN).parse(line)
    }

    /// Returns true if this is a chat message.
    pub fn is_privmsg(&self) -> bool {
        self.irc_command == PRIVMSG
    }

    /// Returns true if this is a server keep-alive.
    pub fn is_ping(&self) -> bool {
        self.irc_command == PING
    }

    /// Looks up a single tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }

    /// Returns the sender name, or an empty string for server messages.
    pub fn sender(&self) -> &str {
        self.user.as_deref().unwrap_or_default()
    }

    /// Returns the text arguments joined back with single spaces.
    pub fn joined_args(&self) -> String {
        self.text_args.join(" ")
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} {:?}) @{}: {}",
            self.irc_command,
            self.irc_args,
            self.user.as_deref().unwrap_or("-"),
            self.text.as_deref().unwrap_or_default()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_lookup_without_tags() {
        let msg = Message::default();
        assert_eq!(msg.tag("mod"), None);
    }

    #[test]
    fn test_display_format() {
        let msg = Message::parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :hello there", '!')
            .unwrap();
        assert_eq!(msg.to_string(), r##"(PRIVMSG ["#chan"]) @bob: hello there"##);
    }

    #[test]
    fn test_joined_args() {
        let msg = Message::parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :!weather New York", '!')
            .unwrap();
        assert_eq!(msg.joined_args(), "New York");
    }
}
