//! Renderer for user-defined template commands.
//!
//! A template is plain text with placeholders naming fields of the message
//! that triggered it:
//!
//! ```text
//! {message.user} rolled a {message.text_args[0]}!  {{not a placeholder}}
//! ```
//!
//! | Placeholder | Renders as |
//! |-------------|------------|
//! | `{message.user}`, `.channel`, `.prefix`, `.text` | the value, or nothing when absent |
//! | `{message.text_command}`, `.irc_command` | the command word |
//! | `{message.text_args}`, `.irc_args` | all words joined by spaces |
//! | `{message.text_args[N]}`, `.irc_args[N]` | the N-th word |
//! | `{message.tags[key]}` | one tag value |
//! | `{{`, `}}` | a literal brace |
//!
//! The list and command fields also answer to their camelCase names
//! (`textArgs`, `ircArgs`, `textCommand`, `ircCommand`).

use std::collections::HashMap;

use squawk_core::Message;

use crate::error::{RenderError, RenderResult};

/// Renders `template` against `message`.
///
/// # Errors
///
/// [`RenderError::ArgumentMissing`] when an index runs past the end of a
/// field; any other variant for a template that cannot be rendered at all.
pub fn render(template: &str, message: &Message) -> RenderResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    out.push('{');
                    continue;
                }

                let mut end = None;
                for (i, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            end = Some(i);
                            break;
                        }
                        '{' => return Err(RenderError::UnbalancedBrace { position: i }),
                        _ => {}
                    }
                }
                let end = end.ok_or(RenderError::UnbalancedBrace { position: pos })?;
                render_placeholder(&template[pos + 1..end], message, &mut out)?;
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_none() {
                    return Err(RenderError::UnbalancedBrace { position: pos });
                }
                out.push('}');
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// A message field as seen by templates.
enum Field<'m> {
    Text(Option<&'m str>),
    List(&'m [String]),
    Tags(Option<&'m HashMap<String, String>>),
}

fn lookup<'m>(message: &'m Message, name: &str) -> Option<Field<'m>> {
    let field = match name {
        "user" => Field::Text(message.user.as_deref()),
        "channel" => Field::Text(message.channel.as_deref()),
        "prefix" => Field::Text(message.prefix.as_deref()),
        "text" => Field::Text(message.text.as_deref()),
        "text_command" | "textCommand" => Field::Text(message.text_command.as_deref()),
        "irc_command" | "ircCommand" => Field::Text(Some(message.irc_command.as_str())),
        "text_args" | "textArgs" => Field::List(&message.text_args),
        "irc_args" | "ircArgs" => Field::List(&message.irc_args),
        "tags" => Field::Tags(message.tags.as_ref()),
        _ => return None,
    };
    Some(field)
}

fn render_placeholder(raw: &str, message: &Message, out: &mut String) -> RenderResult<()> {
    let (path, rest) = match raw.find('[') {
        Some(open) => (&raw[..open], Some(&raw[open..])),
        None => (raw, None),
    };

    if path.contains([':', '!']) {
        return Err(RenderError::UnsupportedFormat(raw.to_string()));
    }

    let name = path
        .strip_prefix("message.")
        .filter(|name| !name.contains('.'))
        .ok_or_else(|| RenderError::UnknownField(path.to_string()))?;
    let field = lookup(message, name).ok_or_else(|| RenderError::UnknownField(path.to_string()))?;

    let Some(rest) = rest else {
        render_whole(&field, out);
        return Ok(());
    };

    let invalid = || RenderError::InvalidSubscript {
        field: name.to_string(),
        subscript: rest.to_string(),
    };

    let close = rest.find(']').ok_or_else(invalid)?;
    let subscript = &rest[1..close];
    let trailer = &rest[close + 1..];
    if trailer.starts_with([':', '!']) {
        return Err(RenderError::UnsupportedFormat(raw.to_string()));
    }
    if !trailer.is_empty() {
        return Err(invalid());
    }

    match field {
        Field::List(items) => {
            let index = parse_index(subscript).ok_or_else(invalid)?;
            let item = items.get(index).ok_or_else(|| RenderError::ArgumentMissing {
                field: name.to_string(),
                index,
            })?;
            out.push_str(item);
        }
        Field::Text(Some(text)) => {
            let index = parse_index(subscript).ok_or_else(invalid)?;
            let ch = text.chars().nth(index).ok_or_else(|| RenderError::ArgumentMissing {
                field: name.to_string(),
                index,
            })?;
            out.push(ch);
        }
        Field::Text(None) => return Err(invalid()),
        Field::Tags(tags) => {
            let value = tags
                .and_then(|tags| tags.get(subscript))
                .ok_or_else(|| RenderError::MissingKey(subscript.to_string()))?;
            out.push_str(value);
        }
    }

    Ok(())
}

fn render_whole(field: &Field<'_>, out: &mut String) {
    match field {
        Field::Text(text) => out.push_str(text.unwrap_or_default()),
        Field::List(items) => out.push_str(&items.join(" ")),
        Field::Tags(None) => {}
        Field::Tags(Some(tags)) => {
            let mut pairs: Vec<_> = tags.iter().collect();
            pairs.sort();
            let joined: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
            out.push_str(&joined.join(";"));
        }
    }
}

/// Parses a decimal subscript. Signs and whitespace are not indexes.
fn parse_index(subscript: &str) -> Option<usize> {
    if subscript.is_empty() || !subscript.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    subscript.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> Message {
        let line = format!("@badges=broadcaster/1;mod=0 :alice!alice@alice.tmi.twitch.tv PRIVMSG #bob :{text}");
        Message::parse(&line, '!').unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(render("hello there", &message("!hi")).unwrap(), "hello there");
    }

    #[test]
    fn test_user_and_args() {
        let msg = message("!hug carol dave");
        assert_eq!(
            render("{message.user} hugs {message.text_args[0]}", &msg).unwrap(),
            "alice hugs carol"
        );
        assert_eq!(render("{message.text_args}", &msg).unwrap(), "carol dave");
    }

    #[test]
    fn test_camel_case_aliases() {
        let msg = message("!so carol");
        assert_eq!(
            render("{message.textCommand}: {message.textArgs[0]} in {message.ircArgs[0]} via {message.ircCommand}", &msg)
                .unwrap(),
            "so: carol in #bob via PRIVMSG"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let msg = message("!x");
        assert_eq!(render("{{literal}} {message.channel}", &msg).unwrap(), "{literal} bob");
    }

    #[test]
    fn test_missing_argument() {
        let err = render("Hi {message.textArgs[0]}", &message("!greet")).unwrap_err();
        assert_eq!(
            err,
            RenderError::ArgumentMissing {
                field: "textArgs".to_string(),
                index: 0
            }
        );
    }

    #[test]
    fn test_text_index() {
        let msg = message("!initial");
        assert_eq!(render("{message.user[0]}", &msg).unwrap(), "a");
        assert!(matches!(
            render("{message.user[10]}", &msg),
            Err(RenderError::ArgumentMissing { .. })
        ));
    }

    #[test]
    fn test_tag_lookup() {
        let msg = message("!badges");
        assert_eq!(render("{message.tags[badges]}", &msg).unwrap(), "broadcaster/1");
        assert_eq!(
            render("{message.tags[color]}", &msg).unwrap_err(),
            RenderError::MissingKey("color".to_string())
        );
        assert_eq!(render("{message.tags}", &msg).unwrap(), "badges=broadcaster/1;mod=0");
    }

    #[test]
    fn test_absent_optional_renders_empty() {
        let msg = Message::parse("PING :tmi.twitch.tv", '!').unwrap();
        assert_eq!(render("[{message.user}][{message.textArgs}]", &msg).unwrap(), "[][]");
    }

    #[test]
    fn test_unknown_fields() {
        let msg = message("!x");
        assert!(matches!(render("{message.nope}", &msg), Err(RenderError::UnknownField(_))));
        assert!(matches!(render("{user}", &msg), Err(RenderError::UnknownField(_))));
        assert!(matches!(render("{}", &msg), Err(RenderError::UnknownField(_))));
        assert!(matches!(render("{message.user.name}", &msg), Err(RenderError::UnknownField(_))));
    }

    #[test]
    fn test_unbalanced_braces() {
        let msg = message("!x");
        assert_eq!(
            render("oops {message.user", &msg).unwrap_err(),
            RenderError::UnbalancedBrace { position: 5 }
        );
        assert_eq!(
            render("oops }", &msg).unwrap_err(),
            RenderError::UnbalancedBrace { position: 5 }
        );
    }

    #[test]
    fn test_format_specs_rejected() {
        let msg = message("!x 1");
        assert!(matches!(render("{message.user!r}", &msg), Err(RenderError::UnsupportedFormat(_))));
        assert!(matches!(
            render("{message.text_args[0]:>5}", &msg),
            Err(RenderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_bad_subscripts() {
        let msg = message("!x 1");
        assert!(matches!(
            render("{message.text_args[-1]}", &msg),
            Err(RenderError::InvalidSubscript { .. })
        ));
        assert!(matches!(
            render("{message.text_args[0][0]}", &msg),
            Err(RenderError::InvalidSubscript { .. })
        ));
    }
}
