// src/feed/providers/fixture.rs
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::feed::types::{FeedProvider, FeedSource, FetchError};

enum Canned {
    Body(String),
    Status(u16),
    Network(String),
}

/// In-memory provider keyed by source name. Used by tests and offline demos.
#[derive(Default)]
pub struct FixtureProvider {
    feeds: HashMap<String, (Canned, Option<Duration>)>,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for the source named `name`.
    pub fn with_feed(mut self, name: &str, body: &str) -> Self {
        self.feeds
            .insert(name.to_string(), (Canned::Body(body.to_string()), None));
        self
    }

    /// Serve `body` only after sleeping for `delay`.
    pub fn with_slow_feed(mut self, name: &str, body: &str, delay: Duration) -> Self {
        self.feeds.insert(
            name.to_string(),
            (Canned::Body(body.to_string()), Some(delay)),
        );
        self
    }

    pub fn with_status(mut self, name: &str, status: u16) -> Self {
        self.feeds
            .insert(name.to_string(), (Canned::Status(status), None));
        self
    }

    pub fn with_network_error(mut self, name: &str, msg: &str) -> Self {
        self.feeds
            .insert(name.to_string(), (Canned::Network(msg.to_string()), None));
        self
    }
}

#[async_trait]
impl FeedProvider for FixtureProvider {
    async fn fetch(&self, source: &FeedSource) -> Result<String, FetchError> {
        let Some((canned, delay)) = self.feeds.get(&source.name) else {
            return Err(FetchError::Network(format!(
                "no fixture for {}",
                source.name
            )));
        };
        if let Some(d) = delay {
            tokio::time::sleep(*d).await;
        }
        match canned {
            Canned::Body(b) => Ok(b.clone()),
            Canned::Status(s) => Err(FetchError::Status(*s)),
            Canned::Network(m) => Err(FetchError::Network(m.clone())),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
