// src/feed/parse.rs
//! RSS 0.9x/1.0/2.0, Atom and JSON Feed documents into [`FeedItem`]s.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use feed_rs::{model, parser};
use metrics::histogram;
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

use crate::feed::{clean_title, FeedItem};

/// Offset-less layouts seen in the wild; read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a feed document. `limit` keeps only the first N items of the document.
pub fn parse_feed(body: &str, limit: Option<usize>) -> Result<Vec<FeedItem>> {
    let t0 = std::time::Instant::now();
    let xml = scrub_html_entities_for_xml(body.trim_start_matches('\u{feff}'));

    let feed = parser::Builder::new()
        .timestamp_parser(parse_feed_date)
        .build()
        .parse(xml.as_bytes())
        .context("parsing feed document")?;

    let items = feed
        .entries
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .filter_map(feed_item)
        .collect::<Vec<_>>();

    histogram!("digest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(items)
}

fn feed_item(e: model::Entry) -> Option<FeedItem> {
    let title = clean_title(e.title.as_ref().map(|t| t.content.as_str()).unwrap_or_default());
    if title.is_empty() {
        return None;
    }
    let link = article_link(&e.links).or_else(|| permalink_id(&e.id));
    Some(FeedItem {
        title,
        link,
        published: e.published.or(e.updated),
    })
}

/// `rel="alternate"` (or no rel) is the article link; `self`/`enclosure` only as a last resort.
fn article_link(links: &[model::Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// RSS `<guid>` that is a URL stands in for a missing `<link>`.
fn permalink_id(id: &str) -> Option<String> {
    let id = id.trim();
    (id.starts_with("http://") || id.starts_with("https://")).then(|| id.to_string())
}

/// Feed timestamp to UTC: RFC 2822, RFC 3339, then a few offset-less forms.
/// `None` when unparseable.
pub fn parse_feed_date(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if ts.is_empty() {
        return None;
    }
    let unix = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp());
    if let Some(secs) = unix {
        return DateTime::<Utc>::from_timestamp(secs, 0);
    }
    // chrono is more lenient with legacy zone names ("EST", "PDT")
    if let Ok(dt) = DateTime::parse_from_rfc2822(ts) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(ts, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(ts, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Feeds often carry HTML entities that XML does not define.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
