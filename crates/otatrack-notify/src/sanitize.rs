//! Reduce vendor changelog HTML to what Telegram renders

use std::sync::LazyLock;

use regex::Regex;

const BULLETS: [char; 5] = ['\u{2022}', '\u{2023}', '\u{2043}', '\u{2219}', '\u{b7}'];

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($re).ok());
    };
}

pattern!(SMALL_TAG, r"(?i)<\s*/?\s*small\s*>");
pattern!(FONT_OPEN, r"(?i)<\s*font\b[^>]*>");
pattern!(FONT_CLOSE, r"(?i)</\s*font\s*>");
pattern!(BREAK_TAG, r"(?i)<\s*br\s*/?\s*>");
pattern!(ANCHOR_OPEN, r"(?i)<\s*a\b[^>]*?>");
pattern!(ANCHOR_CLOSE, r"(?i)</\s*a\s*>");
pattern!(COLON_GAP, r":\n\n");
pattern!(BULLET_GAP, r"\n\n(-\s+)");
pattern!(NUMBERED_GAP, r"\n\n(\d+\.)");
pattern!(WIDE_BULLET, r"-\s{2,}");
pattern!(LINK_NOISE, r"[ \t]*\(\s*https?://[^)]*\)");
pattern!(LEADING_BLANKS, r"\n[ \t]+");
pattern!(RUNS_OF_BLANKS, r"[ \t]{2,}");

/// Clean a changelog for Telegram's HTML mode
///
/// Drops `small`, `font` and anchor tags while keeping their text, turns `<br>` into
/// newlines, normalizes bullets to `- `, strips parenthesized links and collapses
/// blank lines and runs of spaces.
pub fn clean_description(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let text = replace_all(&SMALL_TAG, html, "");
    let text = replace_all(&FONT_OPEN, &text, "");
    let text = replace_all(&FONT_CLOSE, &text, "");
    let text = replace_all(&BREAK_TAG, &text, "\n");
    let text = replace_all(&ANCHOR_OPEN, &text, "");
    let text = replace_all(&ANCHOR_CLOSE, &text, "");

    let mut text = text.replace(BULLETS, "- ");
    text.retain(|c| c != '\u{c2}');

    let text = collapse_blank_lines(&text);
    let text = replace_all(&COLON_GAP, &text, ":\n");
    let text = replace_all(&BULLET_GAP, &text, "\n$1");
    let text = replace_all(&NUMBERED_GAP, &text, "\n$1");
    let text = replace_all(&WIDE_BULLET, &text, "- ");
    let text = replace_all(&LINK_NOISE, &text, "");
    let text = replace_all(&LEADING_BLANKS, &text, "\n");
    let text = replace_all(&RUNS_OF_BLANKS, &text, " ");
    text.replace(" \n", "\n").trim().to_string()
}

fn replace_all(pattern: &Option<Regex>, text: &str, replacement: &str) -> String {
    match pattern {
        Some(re) => re.replace_all(text, replacement).into_owned(),
        None => text.to_string(),
    }
}

/// Trim every line and keep at most one blank line in a row
fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !previous_blank {
                lines.push("");
            }
            previous_blank = true;
        } else {
            lines.push(line);
            previous_blank = false;
        }
    }
    lines.join("\n").trim().to_string()
}
