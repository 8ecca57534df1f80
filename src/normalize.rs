// src/normalize.rs
//! Scraped-page text extraction: drop script/style, strip tags, unescape a
//! small fixed entity set, collapse whitespace.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Entities unescaped by `strip_html`. Anything else passes through verbatim.
const ENTITIES: [(&str, &str); 4] = [("&nbsp;", " "), ("&amp;", "&"), ("&lt;", "<"), ("&gt;", ">")];

fn re_script() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    // Unterminated blocks run to end of input so their body never leaks.
    RE.get_or_init(|| Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|\z)").unwrap())
}

fn re_style() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<style\b[^>]*>.*?(?:</style\s*>|\z)").unwrap())
}

fn re_tags() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

fn re_ws() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

fn single_pass(html: &str) -> String {
    let mut out = re_script().replace_all(html, " ").into_owned();
    out = re_style().replace_all(&out, " ").into_owned();
    out = re_tags().replace_all(&out, " ").into_owned();
    for (entity, plain) in ENTITIES {
        out = out.replace(entity, plain);
    }
    re_ws().replace_all(&out, " ").trim().to_string()
}

/// Extract visible text from an HTML document.
///
/// Repeats until a fixed point, so entity-escaped markup (`&lt;b&gt;`) that
/// unescapes into a tag is stripped too and re-normalizing is a no-op. Every
/// pass after the first strictly shortens a changed string, so this ends.
pub fn strip_html(html: &str) -> String {
    let mut cur = single_pass(html);
    loop {
        let next = single_pass(&cur);
        if next == cur {
            return cur;
        }
        cur = next;
    }
}

/// Hard character cut (Unicode scalar values, never mid code point).
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
