//! Text primitives shared by extraction and export: normalization, tokenization, stemming.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// A token with its original spelling and its lowercase form.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub surface: String,
    pub lower: String,
}

/// NFKC plus typographic punctuation folded to ASCII.
pub fn normalize(text: &str) -> String {
    text.nfkc()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201F}' | '\u{2033}' => '"',
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => '-',
            '\u{00A0}' => ' ',
            other => other,
        })
        .collect()
}

/// Splits a line into word-like tokens. Keeps `c++`, `c#` and dotted names like `node.js`
/// intact; a trailing sentence period is not part of the token.
pub fn tokenize(line: &str) -> Vec<Token> {
    static RE_TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = RE_TOKEN.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}+#]*(?:\.[\p{L}\p{N}]+)*").unwrap()
    });

    re.find_iter(line)
        .map(|m| Token {
            surface: m.as_str().to_string(),
            lower: m.as_str().to_lowercase(),
        })
        .collect()
}

/// Splits a line at list and sentence punctuation. Table phrases never span a clause.
/// Dots inside names (`node.js`) and slashes (`CI/CD`) do not split.
pub fn clauses(line: &str) -> impl Iterator<Item = &str> {
    static RE_BREAK: OnceLock<Regex> = OnceLock::new();
    let re = RE_BREAK.get_or_init(|| Regex::new(r"[,;:!?|()\[\]{}]|\.(?:\s|$)").unwrap());
    re.split(line).filter(|clause| !clause.trim().is_empty())
}

/// Suffix rules in priority order: (suffix, replacement, minimum remaining stem length).
const SUFFIX_RULES: &[(&str, &str, usize)] = &[
    ("sses", "ss", 2),
    ("ies", "y", 2),
    ("ing", "", 3),
    ("ed", "", 3),
    ("ly", "", 4),
    ("s", "", 3),
];

/// Light suffix-stripping stemmer. Deterministic, conservative, and only applied to
/// purely alphabetic tokens longer than three characters.
pub fn stem(word: &str) -> String {
    if word.chars().count() <= 3 || !word.chars().all(char::is_alphabetic) {
        return word.to_string();
    }
    if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
        return word.to_string();
    }

    let mut base = word.to_string();
    for (suffix, replacement, min_len) in SUFFIX_RULES {
        if let Some(stripped) = word.strip_suffix(suffix) {
            if stripped.chars().count() >= *min_len {
                base = format!("{stripped}{replacement}");
                if matches!(*suffix, "ing" | "ed") {
                    undouble(&mut base);
                }
                break;
            }
        }
    }

    if base.chars().count() >= 5 && base.ends_with('e') {
        base.pop();
    }
    base
}

/// `running` → `runn` → `run`; `filling` keeps its `ll`.
fn undouble(base: &mut String) {
    let mut tail = base.chars().rev();
    if let (Some(last), Some(prev)) = (tail.next(), tail.next()) {
        if last == prev && !matches!(last, 'l' | 's' | 'z') && !"aeiou".contains(last) {
            base.pop();
        }
    }
}
