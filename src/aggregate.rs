// src/aggregate.rs
//! News aggregation: fetch every configured feed, keep recent on-topic entries,
//! dedup by link, and order them newest first.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{hash_map, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::feed::{
    parse_feed, title_matches, Entry, FeedItem, FeedProvider, FeedSource, FetchError,
    SourceFailure,
};
use crate::progress::ProgressSink;

pub const DEFAULT_WINDOW_HOURS: u32 = 48;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("digest_runs_total", "Digest runs, labelled by outcome.");
        describe_counter!(
            "digest_source_failures_total",
            "Sources that failed to fetch or parse."
        );
        describe_counter!(
            "digest_entries_kept_total",
            "Entries that made it into a digest."
        );
        describe_counter!(
            "digest_entries_dropped_total",
            "Entries dropped by the window, keyword or dedup filters."
        );
        describe_histogram!("digest_fetch_ms", "Per-source fetch + parse time in milliseconds.");
        describe_histogram!("digest_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Fatal errors. Per-source problems never end up here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("no feed sources configured")]
    NoSources,
    #[error("window_hours must be a positive number of hours")]
    InvalidWindow,
    #[error("none of the {0} configured sources has a usable name and http(s) url")]
    NoValidSources(usize),
}

/// Filtered, deduplicated entries, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Digest {
    entries: Vec<Entry>,
}

impl Digest {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Digest {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// The digest plus the sources that contributed nothing because they failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DigestOutcome {
    pub digest: Digest,
    /// In configured source order.
    pub failures: Vec<SourceFailure>,
}

/// What to keep from the fetched feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestFilter {
    /// Lowercased; empty means accept everything.
    pub keywords: Vec<String>,
    pub window_hours: u32,
    /// Only the first N items of each feed document are looked at.
    pub per_source_limit: Option<usize>,
    /// Truncate the sorted digest.
    pub max_items: Option<usize>,
}

impl Default for DigestFilter {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            window_hours: DEFAULT_WINDOW_HOURS,
            per_source_limit: None,
            max_items: None,
        }
    }
}

impl DigestFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: clean_keywords(keywords),
            ..Self::default()
        }
    }

    pub fn with_window_hours(mut self, hours: u32) -> Self {
        self.window_hours = hours;
        self
    }

    pub fn with_per_source_limit(mut self, limit: usize) -> Self {
        self.per_source_limit = Some(limit);
        self
    }

    pub fn with_max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }
}

/// Trim, lowercase, dedup; empty strings are dropped.
pub fn clean_keywords<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.as_ref().trim();
        if !t.is_empty() {
            set.insert(t.to_lowercase());
        }
    }
    set.into_iter().collect()
}

/// Fetches a fixed set of feeds through a [`FeedProvider`].
pub struct NewsAggregator {
    provider: Arc<dyn FeedProvider>,
    fetch_timeout: Duration,
    max_concurrency: usize,
}

impl NewsAggregator {
    pub fn new(provider: Arc<dyn FeedProvider>) -> Self {
        Self {
            provider,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// A source that does not answer within `timeout` is recorded as failed.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// `0` is treated as 1.
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Fetch all `sources`, filter and order the entries.
    ///
    /// Only configuration problems are errors; a source that times out, answers
    /// with an error status or serves a malformed feed is listed in
    /// [`DigestOutcome::failures`] and the rest of the digest is still built.
    pub async fn fetch_digest(
        &self,
        sources: &[FeedSource],
        filter: &DigestFilter,
        now: DateTime<Utc>,
        sink: &dyn ProgressSink,
    ) -> Result<DigestOutcome, DigestError> {
        ensure_metrics_described();
        sink.on_start();

        let res = self.run(sources, filter, now, sink).await;

        let outcome = if res.is_ok() { "ok" } else { "error" };
        counter!("digest_runs_total", "outcome" => outcome).increment(1);
        sink.on_done(res.as_ref());
        res
    }

    async fn run(
        &self,
        sources: &[FeedSource],
        filter: &DigestFilter,
        now: DateTime<Utc>,
        sink: &dyn ProgressSink,
    ) -> Result<DigestOutcome, DigestError> {
        if sources.is_empty() {
            return Err(DigestError::NoSources);
        }
        if filter.window_hours == 0 {
            return Err(DigestError::InvalidWindow);
        }

        let mut failures: Vec<(usize, SourceFailure)> = Vec::new();
        let mut valid = Vec::with_capacity(sources.len());
        for (idx, s) in sources.iter().enumerate() {
            match validate_source(s) {
                Ok(()) => valid.push((idx, s.clone())),
                Err(e) => {
                    tracing::warn!(source = %s.name, error = %e, "skipping invalid source");
                    failures.push((idx, SourceFailure::from_error(&s.name, &e)));
                }
            }
        }
        if valid.is_empty() {
            return Err(DigestError::NoValidSources(sources.len()));
        }

        sink.on_progress(&format!("Fetching {} feeds...", valid.len()));

        // Every fetch is spawned up front; the semaphore bounds how many run at once.
        let sem = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(valid.len());
        for (idx, source) in valid {
            let provider = Arc::clone(&self.provider);
            let sem = Arc::clone(&sem);
            let timeout = self.fetch_timeout;
            let limit = filter.per_source_limit;
            let src = source.clone();
            let handle = tokio::spawn(async move {
                let _permit = sem.acquire_owned().await;
                let t0 = Instant::now();
                let res = fetch_one(provider.as_ref(), &src, timeout, limit).await;
                histogram!("digest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
                res
            });
            handles.push((idx, source, handle));
        }

        let mut batches = Vec::with_capacity(handles.len());
        for (idx, source, handle) in handles {
            let res = match handle.await {
                Ok(r) => r,
                Err(e) => Err(FetchError::Network(format!("fetch task aborted: {e}"))),
            };
            match res {
                Ok(items) => {
                    sink.on_progress(&format!("Loaded {} ({} items)", source.name, items.len()));
                    batches.push((source.name, items));
                }
                Err(e) => {
                    tracing::warn!(
                        source = %source.name,
                        provider = self.provider.name(),
                        error = %e,
                        "feed source failed"
                    );
                    counter!("digest_source_failures_total").increment(1);
                    sink.on_progress(&format!("Skipped {}: {e}", source.name));
                    failures.push((idx, SourceFailure::from_error(&source.name, &e)));
                }
            }
        }

        let (digest, dropped) = select_entries_counted(batches, filter, now);

        failures.sort_by_key(|(idx, _)| *idx);
        let failures: Vec<SourceFailure> = failures.into_iter().map(|(_, f)| f).collect();

        counter!("digest_entries_kept_total").increment(digest.len() as u64);
        counter!("digest_entries_dropped_total").increment(dropped.total() as u64);
        tracing::info!(
            target: "digest",
            kept = digest.len(),
            failed = failures.len(),
            undated = dropped.undated,
            stale = dropped.stale,
            off_topic = dropped.off_topic,
            duplicate = dropped.duplicate,
            "digest built"
        );

        Ok(DigestOutcome { digest, failures })
    }
}

async fn fetch_one(
    provider: &dyn FeedProvider,
    source: &FeedSource,
    timeout: Duration,
    limit: Option<usize>,
) -> Result<Vec<FeedItem>, FetchError> {
    let body = tokio::time::timeout(timeout, provider.fetch(source))
        .await
        .map_err(|_| FetchError::Timeout(timeout))??;
    parse_feed(&body, limit).map_err(|e| FetchError::Parse(format!("{e:#}")))
}

fn validate_source(s: &FeedSource) -> Result<(), FetchError> {
    if s.name.trim().is_empty() {
        return Err(FetchError::InvalidSource(format!(
            "empty name for url '{}'",
            s.url
        )));
    }
    match reqwest::Url::parse(s.url.trim()) {
        Ok(u) if matches!(u.scheme(), "http" | "https") && u.has_host() => Ok(()),
        Ok(u) => Err(FetchError::InvalidSource(format!(
            "unsupported url scheme '{}'",
            u.scheme()
        ))),
        Err(e) => Err(FetchError::InvalidSource(format!("bad url '{}': {e}", s.url))),
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Dropped {
    undated: usize,
    stale: usize,
    off_topic: usize,
    duplicate: usize,
}

impl Dropped {
    fn total(&self) -> usize {
        self.undated + self.stale + self.off_topic + self.duplicate
    }
}

/// Order of a digest: newest first, then source name, then link.
pub fn digest_order(a: &Entry, b: &Entry) -> Ordering {
    b.published
        .cmp(&a.published)
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.link.cmp(&b.link))
}

/// Pure reduction over parsed feeds, `(source name, items)` per source.
///
/// Drops undated/linkless items, items older than the window and titles that
/// match no keyword; keeps the most recent entry per link.
pub fn select_entries<I>(batches: I, filter: &DigestFilter, now: DateTime<Utc>) -> Digest
where
    I: IntoIterator<Item = (String, Vec<FeedItem>)>,
{
    select_entries_counted(batches, filter, now).0
}

fn select_entries_counted<I>(
    batches: I,
    filter: &DigestFilter,
    now: DateTime<Utc>,
) -> (Digest, Dropped)
where
    I: IntoIterator<Item = (String, Vec<FeedItem>)>,
{
    let window = chrono::Duration::hours(i64::from(filter.window_hours));
    let mut dropped = Dropped::default();
    let mut by_link: HashMap<String, Entry> = HashMap::new();

    for (source, items) in batches {
        for it in items {
            let (Some(published), Some(link)) = (it.published, it.link) else {
                dropped.undated += 1;
                continue;
            };
            if now.signed_duration_since(published) > window {
                dropped.stale += 1;
                continue;
            }
            if !title_matches(&it.title, &filter.keywords) {
                dropped.off_topic += 1;
                continue;
            }

            let entry = Entry {
                title: it.title,
                link,
                published,
                source: source.clone(),
            };
            match by_link.entry(entry.link.clone()) {
                hash_map::Entry::Vacant(v) => {
                    v.insert(entry);
                }
                hash_map::Entry::Occupied(mut o) => {
                    dropped.duplicate += 1;
                    if preferred(&entry, o.get()) {
                        o.insert(entry);
                    }
                }
            }
        }
    }

    let mut entries: Vec<Entry> = by_link.into_values().collect();
    entries.sort_by(digest_order);
    if let Some(max) = filter.max_items {
        entries.truncate(max);
    }
    (Digest { entries }, dropped)
}

/// Between two entries sharing a link: most recent wins, then the smaller source, then title.
fn preferred(candidate: &Entry, current: &Entry) -> bool {
    candidate
        .published
        .cmp(&current.published)
        .then_with(|| current.source.cmp(&candidate.source))
        .then_with(|| current.title.cmp(&candidate.title))
        == Ordering::Greater
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
    }

    fn item(title: &str, link: &str, hours_ago: i64) -> FeedItem {
        FeedItem {
            title: title.into(),
            link: Some(link.into()),
            published: Some(now() - chrono::Duration::hours(hours_ago)),
        }
    }

    #[test]
    fn keywords_are_cleaned() {
        let kw = clean_keywords([" K8s ", "", "GitOps", "gitops"]);
        assert_eq!(kw, vec!["gitops".to_string(), "k8s".to_string()]);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let f = DigestFilter::default().with_window_hours(2);
        let d = select_entries(
            vec![(
                "A".to_string(),
                vec![item("edge", "https://a/edge", 2), item("old", "https://a/old", 3)],
            )],
            &f,
            now(),
        );
        let titles: Vec<_> = d.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["edge"]);
    }

    #[test]
    fn dedup_keeps_most_recent_then_smaller_source() {
        let f = DigestFilter::default();
        let d = select_entries(
            vec![
                ("B".to_string(), vec![item("same", "https://x/1", 1)]),
                ("A".to_string(), vec![item("same", "https://x/1", 1)]),
                ("C".to_string(), vec![item("older", "https://x/1", 5)]),
            ],
            &f,
            now(),
        );
        assert_eq!(d.len(), 1);
        assert_eq!(d.entries()[0].source, "A");
        assert_eq!(d.entries()[0].published, now() - chrono::Duration::hours(1));
    }

    #[test]
    fn undated_and_linkless_items_are_dropped() {
        let f = DigestFilter::default();
        let undated = FeedItem {
            title: "no date".into(),
            link: Some("https://a/1".into()),
            published: None,
        };
        let linkless = FeedItem {
            title: "no link".into(),
            link: None,
            published: Some(now()),
        };
        let (d, dropped) =
            select_entries_counted(vec![("A".to_string(), vec![undated, linkless])], &f, now());
        assert!(d.is_empty());
        assert_eq!(dropped.undated, 2);
    }

    #[test]
    fn max_items_truncates_after_sorting() {
        let f = DigestFilter::default().with_max_items(1);
        let d = select_entries(
            vec![(
                "A".to_string(),
                vec![item("older", "https://a/1", 5), item("newer", "https://a/2", 1)],
            )],
            &f,
            now(),
        );
        assert_eq!(d.len(), 1);
        assert_eq!(d.entries()[0].title, "newer");
    }

    #[test]
    fn invalid_sources_are_detected() {
        assert!(validate_source(&FeedSource::new("A", "https://a.example/feed")).is_ok());
        assert!(validate_source(&FeedSource::new("", "https://a.example/feed")).is_err());
        assert!(validate_source(&FeedSource::new("A", "ftp://a.example/feed")).is_err());
        assert!(validate_source(&FeedSource::new("A", "not a url")).is_err());
    }
}
