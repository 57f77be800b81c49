//! Boundary-aware description truncation
//!
//! Lengths are counted in characters, which is how Telegram counts them.

/// Longest message Telegram accepts, with a little headroom
pub const MESSAGE_MAX_LEN: usize = 4090;
/// Description budget once a message overflows
pub const DESCRIPTION_MAX_LEN: usize = 1500;

/// Link appended to a truncated description
pub fn continuation(page_url: Option<&str>) -> String {
    match page_url {
        Some(url) => format!("... <a href=\"{url}\">Read full changelogs</a>"),
        None => "...".to_string(),
    }
}

/// Cut `description` to at most `max_len` characters, link included
///
/// Cut points are preferred in this order: after a sentence end past 60% of the
/// available room, a paragraph break past 50%, a line break past 70%, a space past
/// 80%, and otherwise a hard cut. The continuation link (or a plain ellipsis when
/// there is no page) is appended. Descriptions within budget are returned as is.
///
/// When `max_len` is smaller than the continuation itself only the continuation is
/// returned.
pub fn truncate_description(description: &str, max_len: usize, page_url: Option<&str>) -> String {
    if description.chars().count() <= max_len {
        return description.to_string();
    }

    let link = continuation(page_url);
    let room = max_len.saturating_sub(link.chars().count());
    let head: Vec<char> = description.chars().take(room).collect();

    let cut = cut_point(&head, room);
    let mut out: String = head.iter().take(cut).collect();
    out.push_str(&link);
    out
}

fn cut_point(head: &[char], room: usize) -> usize {
    // position strictly past `tenths` of the room
    let past = |position: usize, tenths: usize| position.saturating_mul(10) > room.saturating_mul(tenths);

    let sentence = head
        .windows(2)
        .rposition(|pair| matches!(pair, ['.', next] if next.is_whitespace()));
    if let Some(dot) = sentence.filter(|dot| past(*dot, 6)) {
        return dot + 1;
    }

    let paragraph = head.windows(2).rposition(|pair| pair == ['\n', '\n']);
    if let Some(position) = paragraph.filter(|p| past(*p, 5)) {
        return position;
    }

    let line = head.iter().rposition(|c| *c == '\n');
    if let Some(position) = line.filter(|p| past(*p, 7)) {
        return position;
    }

    let space = head.iter().rposition(|c| *c == ' ');
    if let Some(position) = space.filter(|p| past(*p, 8)) {
        return position;
    }

    head.len()
}
