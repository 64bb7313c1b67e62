// src/feed/mod.rs
pub mod parse;
pub mod providers;
pub mod types;

use once_cell::sync::OnceCell;
use regex::Regex;

pub use parse::parse_feed;
pub use types::{Entry, FailureKind, FeedItem, FeedProvider, FeedSource, FetchError, SourceFailure};

/// Clean a feed title for display: decode entities, strip tags, fold whitespace.
pub fn clean_title(s: &str) -> String {
    // 1) HTML entity decode (titles are often double-escaped)
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[a-z][^>]*>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace (incl. nbsp)
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"[\s\u{00A0}]+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

/// Case-insensitive substring match of any keyword against a title.
pub fn title_matches<S: AsRef<str>>(title: &str, keywords: &[S]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let t = title.to_lowercase();
    keywords
        .iter()
        .any(|k| t.contains(k.as_ref().to_lowercase().as_str()))
}
