// src/normalize.rs
//! Text cleanup for feed content and the normalized keys used for dedup/grouping.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Display text from feed markup: entities decoded, tags dropped, typographic
/// quotes folded to ASCII, whitespace collapsed, at most `max_chars` chars.
pub fn clean_text(s: &str, max_chars: usize) -> String {
    static TAGS: OnceCell<Regex> = OnceCell::new();
    let tags = TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));

    let decoded = html_escape::decode_html_entities(s);
    let stripped = tags.replace_all(&decoded, "");
    stripped
        .split_whitespace()
        .flat_map(|word| std::iter::once(' ').chain(word.chars().map(ascii_quote)))
        .skip(1)
        .take(max_chars)
        .collect()
}

fn ascii_quote(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' | '\u{00AB}' | '\u{00BB}' => '"',
        '\u{2018}' | '\u{2019}' => '\'',
        other => other,
    }
}

/// Title key: lowercase, alphanumerics and whitespace only, whitespace collapsed.
pub fn title_key(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// URL key: trimmed, fragment removed, trailing slashes removed.
pub fn url_key(url: &str) -> String {
    let trimmed = url.trim();
    let without_fragment = match trimmed.find('#') {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    without_fragment.trim_end_matches('/').to_string()
}

/// Host of a URL without a leading `www.`, if it parses.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}
