//! Single-line YAML value surgery

/// How a scalar value is quoted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStyle {
    /// `"value"`
    Double,
    /// `'value'`
    Single,
    /// `value`
    Plain,
}

impl QuoteStyle {
    /// Quote style of a value token
    pub fn of(token: &str) -> Self {
        let quoted_with = |quote: char| {
            token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote)
        };
        if quoted_with('"') {
            Self::Double
        } else if quoted_with('\'') {
            Self::Single
        } else {
            Self::Plain
        }
    }

    /// Render `value` in this style
    pub fn render(self, value: &str) -> String {
        match self {
            Self::Double => format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
            Self::Single => format!("'{}'", value.replace('\'', "''")),
            Self::Plain => value.to_string(),
        }
    }

    /// Strip this style's quotes from a token
    pub fn unquote(self, token: &str) -> String {
        let inner = |quote: char| {
            token
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
                .unwrap_or(token)
        };
        match self {
            Self::Double => inner('"').replace("\\\"", "\"").replace("\\\\", "\\"),
            Self::Single => inner('\'').replace("''", "'"),
            Self::Plain => token.to_string(),
        }
    }
}

/// Split a line into content and trailing comment
///
/// A comment starts at a `#` outside quotes that opens the line or follows
/// whitespace. The comment part keeps its `#`; whitespace before it stays with the
/// content.
pub fn split_comment(line: &str) -> (&str, &str) {
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut previous: Option<char> = None;

    for (index, c) in line.char_indices() {
        if in_double {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_double = false;
            }
        } else if in_single {
            if c == '\'' {
                in_single = false;
            }
        } else {
            match c {
                '"' => in_double = true,
                '\'' => in_single = true,
                '#' if previous.is_none_or(char::is_whitespace) => {
                    return line.split_at(index);
                }
                _ => {}
            }
        }
        previous = Some(c);
    }
    (line, "")
}

/// Replace the value of a `key: value` line, keeping everything around it
///
/// `line` must not include its terminator. Returns the new line and the previous
/// value, or `None` when the line has no `:`.
pub fn rewrite_value(line: &str, value: &str) -> Option<(String, String)> {
    let (content, comment) = split_comment(line);
    let (key, rest) = content.split_once(':')?;

    let after_gap = rest.trim_start_matches([' ', '\t']);
    let gap = rest.split_at(rest.len() - after_gap.len()).0;
    let token = after_gap.trim_end_matches([' ', '\t']);
    let mut tail = after_gap.split_at(token.len()).1;

    let style = QuoteStyle::of(token);
    let previous = style.unquote(token);
    let gap = if gap.is_empty() { " " } else { gap };
    if tail.is_empty() && !comment.is_empty() {
        tail = " ";
    }

    Some((
        format!("{key}:{gap}{}{tail}{comment}", style.render(value)),
        previous,
    ))
}

/// Number of leading spaces
pub(crate) fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Whether trimmed `content` is the mapping key `key`
pub(crate) fn is_key(content: &str, key: &str) -> bool {
    content
        .strip_prefix(key)
        .is_some_and(|rest| rest.trim_start_matches([' ', '\t']).starts_with(':'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_double_quotes_and_comment() {
        let (line, old) = rewrite_value("  incremental: \"100\"   # current", "200").unwrap_or_default();
        assert_eq!(line, "  incremental: \"200\"   # current");
        assert_eq!(old, "100");
    }

    #[test]
    fn keeps_single_quotes() {
        let (line, _) = rewrite_value("incremental: 'a'", "it's").unwrap_or_default();
        assert_eq!(line, "incremental: 'it''s'");
    }

    #[test]
    fn keeps_plain_style_and_spacing() {
        let (line, old) = rewrite_value("incremental:\t  V1  ", "V2").unwrap_or_default();
        assert_eq!(line, "incremental:\t  V2  ");
        assert_eq!(old, "V1");
    }

    #[test]
    fn empty_value_gets_a_space() {
        let (line, _) = rewrite_value("incremental:", "V2").unwrap_or_default();
        assert_eq!(line, "incremental: V2");
        let (line, _) = rewrite_value("incremental: # todo", "V2").unwrap_or_default();
        assert_eq!(line, "incremental: V2 # todo");
    }

    #[test]
    fn hash_inside_quotes_is_not_a_comment() {
        assert_eq!(split_comment("k: \"a # b\" # c"), ("k: \"a # b\" ", "# c"));
        assert_eq!(split_comment("k: 'a#b'"), ("k: 'a#b'", ""));
        assert_eq!(split_comment("k: a#b"), ("k: a#b", ""));
        assert_eq!(split_comment("# whole"), ("", "# whole"));
    }

    #[test]
    fn no_colon_is_rejected() {
        assert_eq!(rewrite_value("just text", "x"), None);
    }

    #[test]
    fn key_detection() {
        assert!(is_key("incremental: 1", "incremental"));
        assert!(is_key("incremental : 1", "incremental"));
        assert!(!is_key("incremental_base: 1", "incremental"));
        assert_eq!(indent("    - product: x"), 4);
    }
}
