// src/feed/providers/http.rs
use async_trait::async_trait;
use std::time::Duration;

use crate::feed::types::{FeedProvider, FeedSource, FetchError};

pub const DEFAULT_USER_AGENT: &str =
    "tech-news-digest/0.1 (+github.com/lumlich/tech-news-digest)";

/// Plain HTTP(S) GET against each feed URL.
#[derive(Clone)]
pub struct HttpFeedProvider {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedProvider {
    /// `timeout` bounds the whole request; connecting gets at most half of it.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .connect_timeout(timeout / 2)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("building http client: {e}")))?;
        Ok(Self { client, timeout })
    }

    /// Reuse a prebuilt client; `timeout` is only used to label timeout failures.
    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl FeedProvider for HttpFeedProvider {
    async fn fetch(&self, source: &FeedSource) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(&source.url)
            .header(
                reqwest::header::ACCEPT,
                "application/rss+xml, application/atom+xml, application/xml;q=0.9, */*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| self.classify(e, source))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        resp.text().await.map_err(|e| self.classify(e, source))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

impl HttpFeedProvider {
    fn classify(&self, e: reqwest::Error, source: &FeedSource) -> FetchError {
        tracing::debug!(error = ?e, source = %source.name, "feed http error");
        if e.is_timeout() {
            return FetchError::Timeout(self.timeout);
        }
        // the source name already identifies the url
        FetchError::Network(e.without_url().to_string())
    }
}
