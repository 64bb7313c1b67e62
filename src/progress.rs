//! # Progress
//! Host-agnostic progress signals for a digest run.
//!
//! A run moves `NotStarted -> InProgress -> Done | Failed`. Sinks only observe;
//! nothing here retries or changes the outcome.

use std::sync::Mutex;

use crate::aggregate::{DigestError, DigestOutcome};

/// Receives progress for one aggregation call.
pub trait ProgressSink: Send + Sync {
    fn on_start(&self);
    fn on_progress(&self, description: &str);
    fn on_done(&self, result: Result<&DigestOutcome, &DigestError>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    NotStarted,
    InProgress,
    Done,
    Failed,
}

/// Ignores every signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_start(&self) {}
    fn on_progress(&self, _description: &str) {}
    fn on_done(&self, _result: Result<&DigestOutcome, &DigestError>) {}
}

/// Mirrors progress into the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_start(&self) {
        tracing::info!(target: "digest", "Fetching RSS feeds...");
    }

    fn on_progress(&self, description: &str) {
        tracing::debug!(target: "digest", "{description}");
    }

    fn on_done(&self, result: Result<&DigestOutcome, &DigestError>) {
        match result {
            Ok(out) => tracing::info!(
                target: "digest",
                entries = out.digest.len(),
                failed = out.failures.len(),
                "News loaded."
            ),
            Err(e) => tracing::warn!(target: "digest", error = %e, "digest failed"),
        }
    }
}

/// A recorded signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Started,
    Progress(String),
    Done { entries: usize, failed: usize },
    Failed(String),
}

/// Keeps every signal in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("progress mutex poisoned").clone()
    }

    pub fn state(&self) -> ProgressState {
        let events = self.events.lock().expect("progress mutex poisoned");
        match events.last() {
            None => ProgressState::NotStarted,
            Some(ProgressEvent::Done { .. }) => ProgressState::Done,
            Some(ProgressEvent::Failed(_)) => ProgressState::Failed,
            Some(_) => ProgressState::InProgress,
        }
    }

    fn push(&self, ev: ProgressEvent) {
        self.events.lock().expect("progress mutex poisoned").push(ev);
    }
}

impl ProgressSink for RecordingSink {
    fn on_start(&self) {
        self.push(ProgressEvent::Started);
    }

    fn on_progress(&self, description: &str) {
        self.push(ProgressEvent::Progress(description.to_string()));
    }

    fn on_done(&self, result: Result<&DigestOutcome, &DigestError>) {
        self.push(match result {
            Ok(out) => ProgressEvent::Done {
                entries: out.digest.len(),
                failed: out.failures.len(),
            },
            Err(e) => ProgressEvent::Failed(e.to_string()),
        });
    }
}
