use std::sync::LazyLock;

use regex::Regex;

static MENTION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"@(everyone|here|[!&]?[0-9]{17,20})").ok());

/// Break `@everyone`, `@here` and user/role mentions with a zero-width space
/// so relayed text cannot ping anyone.
pub fn escape_mentions(text: &str) -> String {
    match MENTION_RE.as_ref() {
        Some(re) => re.replace_all(text, "@\u{200b}$1").into_owned(),
        None => text.replace('@', "@\u{200b}"),
    }
}

/// Cut `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
