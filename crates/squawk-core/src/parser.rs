//! Line parser for the Twitch flavour of IRC.
//!
//! The parser works on the list of tokens produced by splitting a line on
//! single spaces and peels fields off the front, left to right:
//!
//! ```text
//! [@tags] [:prefix] <command> [args...] [:trailing text]
//! ```
//!
//! Splitting on single spaces (rather than runs of whitespace) keeps the
//! trailing text byte-for-byte intact when it is joined back together.

use std::collections::HashMap;

use crate::message::Message;
use crate::tags::unescape_tag_value;

/// Host domain of the Twitch chat servers.
pub const DEFAULT_SERVER_DOMAIN: &str = "tmi.twitch.tv";

/// Turns raw protocol lines into [`Message`]s.
///
/// # Example
///
/// ```rust
/// use squawk_core::LineParser;
///
/// let parser = LineParser::new('!', "tmi.twitch.tv");
/// let msg = parser
///     .parse(":alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!quote 2")
///     .unwrap();
///
/// assert_eq!(msg.user.as_deref(), Some("alice"));
/// assert_eq!(msg.text_command.as_deref(), Some("quote"));
/// ```
#[derive(Debug, Clone)]
pub struct LineParser {
    command_prefix: char,
    server_domain: String,
    /// `.<server_domain>`, the suffix carried by user hosts.
    host_suffix: String,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new('!', DEFAULT_SERVER_DOMAIN)
    }
}

impl LineParser {
    /// Creates a parser for the given command prefix and server domain.
    pub fn new(command_prefix: char, server_domain: impl Into<String>) -> Self {
        let server_domain = server_domain.into();
        Self {
            command_prefix,
            host_suffix: format!(".{server_domain}"),
            server_domain,
        }
    }

    /// Returns the command prefix character.
    pub fn command_prefix(&self) -> char {
        self.command_prefix
    }

    /// Returns the server domain used to recognise server prefixes.
    pub fn server_domain(&self) -> &str {
        &self.server_domain
    }

    /// Parses one line.
    ///
    /// A trailing CR/LF is ignored. Returns `None` when the line is empty or
    /// carries no command token.
    pub fn parse(&self, line: &str) -> Option<Message> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return None;
        }

        let parts: Vec<&str> = line.split(' ').collect();
        let mut rest = parts.as_slice();

        let mut tags = None;
        if let Some(first) = rest.first()
            && let Some(raw) = first.strip_prefix('@')
        {
            tags = Some(parse_tags(raw));
            rest = &rest[1..];
        }

        let mut prefix = None;
        let mut user = None;
        if let Some(first) = rest.first()
            && let Some(raw) = first.strip_prefix(':')
        {
            user = self.user_from_prefix(raw);
            prefix = Some(raw.to_string());
            rest = &rest[1..];
        }

        let mut text = None;
        let mut text_command = None;
        let mut text_args = Vec::new();
        if let Some(start) = rest.iter().position(|part| part.starts_with(':')) {
            let mut words = rest[start..].to_vec();
            words[0] = &words[0][1..];
            text = Some(words.join(" "));

            if let Some(command) = words[0].strip_prefix(self.command_prefix) {
                text_command = Some(command.to_string());
                text_args = words[1..].iter().map(ToString::to_string).collect();
            }
            rest = &rest[..start];
        }

        let (irc_command, irc_args) = rest.split_first()?;
        let irc_args: Vec<String> = irc_args.iter().map(ToString::to_string).collect();
        let channel = irc_args
            .iter()
            .find_map(|arg| arg.strip_prefix('#'))
            .map(ToString::to_string);

        Some(Message {
            prefix,
            user,
            channel,
            irc_command: irc_command.to_string(),
            irc_args,
            text,
            text_command,
            text_args,
            tags,
        })
    }

    /// Derives the sender's short name from a prefix.
    ///
    /// `alice!alice@alice.tmi.twitch.tv` yields `alice`; a bare
    /// `tmi.twitch.tv` names the server and yields `None`.
    fn user_from_prefix(&self, prefix: &str) -> Option<String> {
        let nick = prefix.split('!').next().unwrap_or(prefix);
        if let Some(user) = nick.strip_suffix(self.host_suffix.as_str()) {
            return Some(user.to_string());
        }
        if nick.contains(self.server_domain.as_str()) {
            return None;
        }
        Some(nick.to_string())
    }
}

/// Parses the tag section (without `@`) into a map.
///
/// Each `;`-separated piece is split on its first `=`; a piece without one
/// yields an empty value.
fn parse_tags(raw: &str) -> HashMap<String, String> {
    raw.split(';')
        .filter(|piece| !piece.is_empty())
        .map(|piece| match piece.split_once('=') {
            Some((key, value)) => (key.to_string(), unescape_tag_value(value)),
            None => (piece.to_string(), String::new()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> LineParser {
        LineParser::default()
    }

    #[test]
    fn test_parse_tagged_command() {
        let msg = parser()
            .parse("@badges=broadcaster/1;mod=0 :alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :!quote 2")
            .unwrap();

        assert_eq!(msg.prefix.as_deref(), Some("alice!alice@alice.tmi.twitch.tv"));
        assert_eq!(msg.user.as_deref(), Some("alice"));
        assert_eq!(msg.channel.as_deref(), Some("bob"));
        assert_eq!(msg.irc_command, "PRIVMSG");
        assert_eq!(msg.irc_args, vec!["#bob"]);
        assert_eq!(msg.text.as_deref(), Some("!quote 2"));
        assert_eq!(msg.text_command.as_deref(), Some("quote"));
        assert_eq!(msg.text_args, vec!["2"]);

        let tags = msg.tags.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags["badges"], "broadcaster/1");
        assert_eq!(tags["mod"], "0");
    }

    #[test]
    fn test_parse_ping() {
        let msg = parser().parse("PING :tmi.twitch.tv").unwrap();
        assert_eq!(msg.irc_command, "PING");
        assert!(msg.irc_args.is_empty());
        assert_eq!(msg.text.as_deref(), Some("tmi.twitch.tv"));
        assert!(msg.prefix.is_none());
        assert!(msg.user.is_none());
        assert!(msg.tags.is_none());
    }

    #[test]
    fn test_parse_server_numeric() {
        let msg = parser()
            .parse(":tmi.twitch.tv 001 squishymcbotty :Welcome, GLHF!")
            .unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("tmi.twitch.tv"));
        assert!(msg.user.is_none());
        assert_eq!(msg.irc_command, "001");
        assert_eq!(msg.irc_args, vec!["squishymcbotty"]);
        assert!(msg.channel.is_none());
        assert!(msg.text_command.is_none());
    }

    #[test]
    fn test_parse_bare_nick_prefix() {
        let msg = parser().parse(":someone JOIN #chan").unwrap();
        assert_eq!(msg.user.as_deref(), Some("someone"));
        assert_eq!(msg.channel.as_deref(), Some("chan"));
    }

    #[test]
    fn test_parse_user_host_suffix() {
        let msg = parser()
            .parse(":carol.tmi.twitch.tv 353 bot = #chan :carol")
            .unwrap();
        assert_eq!(msg.user.as_deref(), Some("carol"));
    }

    #[test]
    fn test_parse_without_trailing() {
        let msg = parser()
            .parse(":bot!bot@bot.tmi.twitch.tv JOIN #chan")
            .unwrap();
        assert_eq!(msg.irc_command, "JOIN");
        assert!(msg.text.is_none());
        assert!(msg.text_command.is_none());
        assert!(msg.text_args.is_empty());
    }

    #[test]
    fn test_parse_plain_text_has_no_command() {
        let msg = parser()
            .parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :hello !quote")
            .unwrap();
        assert_eq!(msg.text.as_deref(), Some("hello !quote"));
        assert!(msg.text_command.is_none());
        assert!(msg.text_args.is_empty());
    }

    #[test]
    fn test_parse_first_channel_wins() {
        let msg = parser().parse("CUSTOM #first #second :x").unwrap();
        assert_eq!(msg.channel.as_deref(), Some("first"));
        assert_eq!(msg.irc_args, vec!["#first", "#second"]);
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(parser().parse("").is_none());
        assert!(parser().parse("\r\n").is_none());
    }

    #[test]
    fn test_parse_without_command_token() {
        assert!(parser().parse("@a=b").is_none());
        assert!(parser().parse(":nick!nick@host").is_none());
    }

    #[test]
    fn test_parse_strips_crlf() {
        let msg = parser().parse("PING :tmi.twitch.tv\r\n").unwrap();
        assert_eq!(msg.text.as_deref(), Some("tmi.twitch.tv"));
    }

    #[test]
    fn test_parse_custom_prefix_is_case_sensitive() {
        let parser = LineParser::new('?', DEFAULT_SERVER_DOMAIN);
        let msg = parser
            .parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :?Dice 2 6")
            .unwrap();
        assert_eq!(msg.text_command.as_deref(), Some("Dice"));
        assert_eq!(msg.text_args, vec!["2", "6"]);

        let msg = parser
            .parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :!dice")
            .unwrap();
        assert!(msg.text_command.is_none());
    }

    #[test]
    fn test_parse_bare_prefix_is_empty_command() {
        let msg = parser()
            .parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :!")
            .unwrap();
        assert_eq!(msg.text_command.as_deref(), Some(""));
        assert!(msg.text_args.is_empty());
    }

    #[test]
    fn test_parse_preserves_text_spacing() {
        let msg = parser()
            .parse(":bob!bob@bob.tmi.twitch.tv PRIVMSG #chan :a  b")
            .unwrap();
        assert_eq!(msg.text.as_deref(), Some("a  b"));
    }

    #[test]
    fn test_parse_escaped_tag_values() {
        let msg = parser()
            .parse(r"@system-msg=hello\sworld;flag :tmi.twitch.tv USERNOTICE #chan")
            .unwrap();
        let tags = msg.tags.unwrap();
        assert_eq!(tags["system-msg"], "hello world");
        assert_eq!(tags["flag"], "");
    }

    #[test]
    fn test_parse_tag_value_with_equals() {
        let msg = parser().parse("@key=a=b PING :x").unwrap();
        assert_eq!(msg.tag("key"), Some("a=b"));
    }
}
