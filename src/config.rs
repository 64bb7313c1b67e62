// src/config.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::{
    clean_keywords, DigestFilter, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_CONCURRENCY,
    DEFAULT_WINDOW_HOURS,
};
use crate::feed::FeedSource;

pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_WINDOW_HOURS: &str = "DIGEST_WINDOW_HOURS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DIGEST_FETCH_TIMEOUT_SECS";

pub const DEFAULT_CONFIG_TOML: &str = "config/digest.toml";
pub const DEFAULT_CONFIG_JSON: &str = "config/digest.json";

fn default_window_hours() -> u32 {
    DEFAULT_WINDOW_HOURS
}
fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}
fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestConfig {
    #[serde(default)]
    pub sources: Vec<FeedSource>,
    /// Case-insensitive; empty accepts every title.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_window_hours")]
    pub window_hours: u32,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub per_source_limit: Option<usize>,
    #[serde(default)]
    pub max_items: Option<usize>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            keywords: Vec::new(),
            window_hours: default_window_hours(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            per_source_limit: None,
            max_items: None,
        }
    }
}

impl DigestConfig {
    pub fn filter(&self) -> DigestFilter {
        DigestFilter {
            keywords: self.keywords.clone(),
            window_hours: self.window_hours,
            per_source_limit: self.per_source_limit,
            max_items: self.max_items,
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    fn sanitize(mut self) -> Self {
        self.keywords = clean_keywords(&self.keywords);
        for s in &mut self.sources {
            s.name = s.name.trim().to_string();
            s.url = s.url.trim().to_string();
        }
        self
    }

    /// `DIGEST_WINDOW_HOURS` / `DIGEST_FETCH_TIMEOUT_SECS`; unparseable or zero values are ignored.
    fn apply_env_overrides(mut self) -> Self {
        if let Some(h) = parse_positive_env::<u32>(std::env::var(ENV_WINDOW_HOURS).ok()) {
            self.window_hours = h;
        }
        if let Some(t) = parse_positive_env::<u64>(std::env::var(ENV_FETCH_TIMEOUT_SECS).ok()) {
            self.fetch_timeout_secs = t;
        }
        self
    }
}

fn parse_positive_env<T>(raw: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.and_then(|s| s.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
}

/// Load config from an explicit path. Supports TOML or JSON formats.
pub fn load_config_from(path: &Path) -> Result<DigestConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading digest config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing digest config {}", path.display()))?;
    Ok(cfg.sanitize().apply_env_overrides())
}

/// Load config using env var + fallbacks:
/// 1) $DIGEST_CONFIG_PATH
/// 2) config/digest.toml
/// 3) config/digest.json
/// 4) built-in defaults (no sources)
pub fn load_config_default() -> Result<DigestConfig> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_config_from(&pb);
        } else {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from(DEFAULT_CONFIG_TOML);
    if toml_p.exists() {
        return load_config_from(&toml_p);
    }
    let json_p = PathBuf::from(DEFAULT_CONFIG_JSON);
    if json_p.exists() {
        return load_config_from(&json_p);
    }
    Ok(DigestConfig::default().apply_env_overrides())
}

fn parse_config(s: &str, hint_ext: &str) -> Result<DigestConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        // No usable extension: JSON first (cheap to rule out), then TOML.
        _ => match serde_json::from_str(s) {
            Ok(cfg) => Ok(cfg),
            Err(_) => toml::from_str(s)
                .map_err(|e| anyhow!("unsupported digest config format: {e}")),
        },
    }
}
