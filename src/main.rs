//! Tech News Digest: binary entrypoint
//! Boots the Axum HTTP server serving the digest, wired to real HTTP feeds.

use std::path::PathBuf;
use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tech_news_digest::{
    api::{create_router, AppState},
    config::{load_config_default, ENV_CONFIG_PATH},
    feed::providers::HttpFeedProvider,
    metrics::Metrics,
    telemetry::init_tracing,
};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = load_config_default()?;
    if cfg.sources.is_empty() {
        tracing::warn!("no feed sources configured; /digest will report a configuration error");
    }
    tracing::info!(
        sources = cfg.sources.len(),
        keywords = cfg.keywords.len(),
        window_hours = cfg.window_hours,
        "digest config loaded"
    );

    let provider = HttpFeedProvider::new(cfg.fetch_timeout())
        .map_err(shuttle_runtime::CustomError::new)?;

    let mut state = AppState::new(Arc::new(provider), cfg.clone());
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        state = state.with_config_path(PathBuf::from(p));
    }

    let mut router = create_router(state);
    match Metrics::init(cfg.window_hours) {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(router.into())
}
