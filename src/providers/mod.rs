// src/providers/mod.rs
pub mod firecrawl;
pub mod llm;
pub mod openai;
pub mod perplexity;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::trends::ProvidersConfig;
use crate::trends::types::TrendProvider;

pub use firecrawl::FirecrawlProvider;
pub use openai::OpenAiProvider;
pub use perplexity::PerplexityProvider;

const USER_AGENT: &str = "trendscout/0.1";

/// Shared HTTP client settings for provider adapters.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(4))
        .timeout(timeout)
        .build()
        .context("building provider http client")
}

/// Decode HTML entities, strip tags, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build every enabled provider that has credentials, in a fixed order
/// (openai, perplexity, firecrawl). Misconfigured providers are skipped.
pub fn build_providers(cfg: &ProvidersConfig) -> Vec<Arc<dyn TrendProvider>> {
    let mut out: Vec<Arc<dyn TrendProvider>> = Vec::new();

    if cfg.openai.is_usable() {
        match OpenAiProvider::from_config(&cfg.openai) {
            Ok(p) => out.push(Arc::new(p)),
            Err(e) => warn!(provider = "openai", error = ?e, "provider not registered"),
        }
    } else {
        info!(provider = "openai", "provider disabled or missing api key");
    }

    if cfg.perplexity.is_usable() {
        match PerplexityProvider::from_config(&cfg.perplexity) {
            Ok(p) => out.push(Arc::new(p)),
            Err(e) => warn!(provider = "perplexity", error = ?e, "provider not registered"),
        }
    } else {
        info!(provider = "perplexity", "provider disabled or missing api key");
    }

    if cfg.firecrawl.is_usable() {
        match FirecrawlProvider::from_config(&cfg.firecrawl) {
            Ok(p) => out.push(Arc::new(p)),
            Err(e) => warn!(provider = "firecrawl", error = ?e, "provider not registered"),
        }
    } else {
        info!(provider = "firecrawl", "provider disabled or missing api key");
    }

    out
}
