//! IRCv3 tag value unescaping.

/// Reverses IRCv3 tag value escaping.
///
/// | Escaped | Value |
/// |---------|-------|
/// | `\:` | `;` |
/// | `\s` | space |
/// | `\\` | `\` |
/// | `\r` | CR |
/// | `\n` | LF |
///
/// Any other escaped character stands for itself and a lone trailing
/// backslash is dropped.
pub(crate) fn unescape_tag_value(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_value_untouched() {
        assert_eq!(unescape_tag_value("broadcaster/1,subscriber/12"), "broadcaster/1,subscriber/12");
    }

    #[test]
    fn test_all_escapes() {
        assert_eq!(unescape_tag_value(r"a\:b\sc\\d\re\nf"), "a;b c\\d\re\nf");
    }

    #[test]
    fn test_unknown_escape_keeps_char() {
        assert_eq!(unescape_tag_value(r"a\xb"), "axb");
    }

    #[test]
    fn test_trailing_backslash_dropped() {
        assert_eq!(unescape_tag_value("gg\\"), "gg");
    }
}
