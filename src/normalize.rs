// src/normalize.rs
//! Text normalization for feed content: HTML/URL stripping, whitespace and
//! ellipsis collapsing, bounded truncation.

use once_cell::sync::OnceCell;
use regex::Regex;

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap())
}

fn re_urls() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap())
}

// Keep word characters, whitespace and basic punctuation; everything else
// (emoji, zero-width characters, control bytes) is dropped.
fn re_disallowed() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s.,!?\-:;()]").unwrap())
}

fn re_ellipsis() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\.{3,}").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Normalize a raw feed fragment into plain text.
///
/// Decodes HTML entities, strips tags and URLs, removes everything outside
/// word characters and `. , ! ? - : ; ( )`, collapses ellipsis runs to
/// `"..."` and whitespace runs to single spaces. Empty input yields `""`.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = html_escape::decode_html_entities(text).to_string();
    out = re_tags().replace_all(&out, " ").to_string();
    out = re_urls().replace_all(&out, "").to_string();
    out = re_disallowed().replace_all(&out, "").to_string();
    out = re_ellipsis().replace_all(&out, "...").to_string();
    out = re_ws().replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Cut `text` down to at most `max_len` characters, appending `"..."` when
/// something was dropped. Counts chars, not bytes, so multibyte input never
/// splits a codepoint.
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
