use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;

use crate::aggregate::{DigestOutcome, NewsAggregator};
use crate::config::{load_config_default, load_config_from, DigestConfig};
use crate::feed::{Entry, FeedProvider, SourceFailure};
use crate::progress::TracingSink;
use crate::render::render_digest_with_window;

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn FeedProvider>,
    config: Arc<RwLock<DigestConfig>>,
    config_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(provider: Arc<dyn FeedProvider>, config: DigestConfig) -> Self {
        Self {
            provider,
            config: Arc::new(RwLock::new(config)),
            config_path: None,
        }
    }

    /// Reload from this file instead of the default lookup.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn config_snapshot(&self) -> DigestConfig {
        self.config.read().expect("rwlock poisoned").clone()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/digest", get(digest_json))
        .route("/digest/markdown", get(digest_markdown))
        .route("/admin/reload-config", get(admin_reload_config))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct DigestResp {
    generated_at: DateTime<Utc>,
    window_hours: u32,
    entries: Vec<Entry>,
    failures: Vec<SourceFailure>,
    markdown: String,
}

struct DigestRun {
    cfg: DigestConfig,
    now: DateTime<Utc>,
    outcome: DigestOutcome,
}

async fn run_digest(state: &AppState) -> Result<DigestRun, (StatusCode, String)> {
    // Clone out of the lock; the guard must not live across the fetch.
    let cfg = state.config_snapshot();
    let aggregator = NewsAggregator::new(Arc::clone(&state.provider))
        .with_fetch_timeout(cfg.fetch_timeout())
        .with_max_concurrency(cfg.max_concurrency);

    let now = Utc::now();
    let outcome = aggregator
        .fetch_digest(&cfg.sources, &cfg.filter(), now, &TracingSink)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(DigestRun { cfg, now, outcome })
}

async fn digest_json(
    State(state): State<AppState>,
) -> Result<Json<DigestResp>, (StatusCode, String)> {
    let DigestRun { cfg, now, outcome } = run_digest(&state).await?;
    let markdown = render_digest_with_window(&outcome.digest, &outcome.failures, cfg.window_hours);
    Ok(Json(DigestResp {
        generated_at: now,
        window_hours: cfg.window_hours,
        entries: outcome.digest.into_entries(),
        failures: outcome.failures,
        markdown,
    }))
}

async fn digest_markdown(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let DigestRun { cfg, outcome, .. } = run_digest(&state).await?;
    let body = render_digest_with_window(&outcome.digest, &outcome.failures, cfg.window_hours);
    Ok(([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], body))
}

async fn admin_reload_config(State(state): State<AppState>) -> String {
    let fresh = match &state.config_path {
        Some(p) => load_config_from(p),
        None => load_config_default(),
    };
    let fresh = match fresh {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = ?e, "config reload failed");
            return format!("failed: {e:#}");
        }
    };
    match state.config.write() {
        Ok(mut w) => {
            tracing::info!(sources = fresh.sources.len(), "digest config reloaded");
            *w = fresh;
            "reloaded".to_string()
        }
        Err(_) => "failed: lock poisoned".to_string(),
    }
}
