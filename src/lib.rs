// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod feed;
pub mod metrics;
pub mod progress;
pub mod render;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{
    Digest, DigestError, DigestFilter, DigestOutcome, NewsAggregator,
};
pub use crate::api::create_router;
pub use crate::feed::{Entry, FeedSource, SourceFailure};
pub use crate::progress::{NoopSink, ProgressSink, RecordingSink, TracingSink};
pub use crate::render::{render_digest, render_digest_with_window};

use std::sync::Arc;

use crate::config::DigestConfig;
use crate::feed::providers::HttpFeedProvider;

/// Build an aggregator over real HTTP for `cfg`.
pub fn http_aggregator(cfg: &DigestConfig) -> anyhow::Result<NewsAggregator> {
    let provider = HttpFeedProvider::new(cfg.fetch_timeout())?;
    Ok(NewsAggregator::new(Arc::new(provider))
        .with_fetch_timeout(cfg.fetch_timeout())
        .with_max_concurrency(cfg.max_concurrency))
}
