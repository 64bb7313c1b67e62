//! Fetch the configured feeds once and print the Markdown digest to stdout.

use anyhow::Context;
use chrono::Utc;
use tech_news_digest::{
    config::load_config_default, http_aggregator, render_digest_with_window,
    telemetry::init_tracing, TracingSink,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = load_config_default().context("loading digest config")?;
    let aggregator = http_aggregator(&cfg)?;

    let outcome = aggregator
        .fetch_digest(&cfg.sources, &cfg.filter(), Utc::now(), &TracingSink)
        .await?;

    println!(
        "{}",
        render_digest_with_window(&outcome.digest, &outcome.failures, cfg.window_hours)
    );
    Ok(())
}
