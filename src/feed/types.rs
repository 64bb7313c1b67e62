// src/feed/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A configured feed endpoint. Immutable during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedSource {
    pub name: String, // e.g., "Kubernetes", "Hacker News"
    pub url: String,
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One element of a parsed feed document, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// An item that survived parsing and carries everything a digest line needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub source: String,
}

/// Why a single source contributed nothing to the digest.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),
    #[error("http status {0}")]
    Status(u16),
    #[error("request failed: {0}")]
    Network(String),
    #[error("parse failed: {0}")]
    Parse(String),
    #[error("invalid source: {0}")]
    InvalidSource(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Timeout(_) => FailureKind::Timeout,
            FetchError::Status(_) => FailureKind::HttpStatus,
            FetchError::Network(_) => FailureKind::Network,
            FetchError::Parse(_) => FailureKind::Parse,
            FetchError::InvalidSource(_) => FailureKind::InvalidSource,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    HttpStatus,
    Network,
    Parse,
    InvalidSource,
}

/// Per-source failure record handed back next to the digest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFailure {
    pub source: String,
    pub kind: FailureKind,
    pub message: String,
}

impl SourceFailure {
    pub fn from_error(source: &str, err: &FetchError) -> Self {
        Self {
            source: source.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Retrieves the raw document of one feed.
#[async_trait::async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<String, FetchError>;
    fn name(&self) -> &'static str;
}
