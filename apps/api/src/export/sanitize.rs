//! Plain-text cleanup for exported content.

use std::sync::OnceLock;

use regex::Regex;

use crate::analysis::text::normalize;

/// NFKC, ASCII punctuation, no icon glyphs, no typed bullet prefix, single spaces.
pub fn sanitize(text: &str) -> String {
    static RE_BULLET: OnceLock<Regex> = OnceLock::new();
    let bullet = RE_BULLET.get_or_init(|| {
        Regex::new(r"^\s*(?:[•◦‣∙·]+\s*|[*-]+\s+)").unwrap()
    });

    let cleaned: String = normalize(text)
        .chars()
        .filter(|c| !is_decorative(*c))
        .collect();
    let cleaned = bullet.replace(&cleaned, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Symbols, private-use code points (icon fonts) and replacement characters.
fn is_decorative(c: char) -> bool {
    static RE_SYMBOL: OnceLock<Regex> = OnceLock::new();
    let symbol = RE_SYMBOL.get_or_init(|| Regex::new(r"^[\p{So}\p{Co}\x{FFFD}]$").unwrap());
    let mut buf = [0u8; 4];
    symbol.is_match(c.encode_utf8(&mut buf)) || (c.is_control() && !c.is_whitespace())
}
