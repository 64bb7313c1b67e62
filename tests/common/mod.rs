// tests/common/mod.rs
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use tech_news_digest::FeedSource;

pub const HN_XML: &str = include_str!("../fixtures/hn_rss.xml");
pub const CNCF_XML: &str = include_str!("../fixtures/cncf_atom.xml");
pub const TNS_XML: &str = include_str!("../fixtures/tns_wordpress.xml");
pub const LWN_RDF: &str = include_str!("../fixtures/lwn_rdf.xml");
pub const NOT_A_FEED: &str = include_str!("../fixtures/not_a_feed.html");

pub const KEYWORDS: [&str; 7] = [
    "kubernetes",
    "k8s",
    "argocd",
    "gitops",
    "sre",
    "devops",
    "platform engineering",
];

/// The instant every fixture is dated against.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
}

pub fn hn() -> FeedSource {
    FeedSource::new("Hacker News", "https://hn.example/feed")
}

pub fn cncf() -> FeedSource {
    FeedSource::new("CNCF", "https://cncf.example/feed.xml")
}

/// Minimal RSS document; items are `(title, link, rfc2822 date)`.
pub fn rss(items: &[(&str, &str, &str)]) -> String {
    let mut out = String::from(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title>"#);
    for (title, link, date) in items {
        out.push_str(&format!(
            "<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate></item>"
        ));
    }
    out.push_str("</channel></rss>");
    out
}
