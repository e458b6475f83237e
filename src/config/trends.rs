// src/config/trends.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::source_weights::SourceWeights;
use crate::trends::unify::DEFAULT_SIMILARITY_THRESHOLD;
use crate::trends::{DEFAULT_LIMIT, DEFAULT_PROVIDER_TIMEOUT};

pub const ENV_CONFIG_PATH: &str = "TRENDS_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/trends.toml";

pub const ENV_OPENAI_KEY: &str = "OPENAI_API_KEY";
pub const ENV_PERPLEXITY_KEY: &str = "PERPLEXITY_API_KEY";
pub const ENV_FIRECRAWL_KEY: &str = "FIRECRAWL_API_KEY";

/// Whole trends configuration (`config/trends.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendsConfig {
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub weights: SourceWeights,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    #[default]
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,
    #[serde(default)]
    pub matcher: MatcherKind,
    /// Only used by the fuzzy matcher.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}
fn default_provider_timeout_ms() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT.as_millis() as u64
}
fn default_similarity_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            provider_timeout_ms: default_provider_timeout_ms(),
            matcher: MatcherKind::default(),
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

impl DiscoveryConfig {
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: LlmProviderConfig,
    #[serde(default)]
    pub perplexity: LlmProviderConfig,
    #[serde(default)]
    pub firecrawl: SearchProviderConfig,
}

fn default_true() -> bool {
    true
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_max_trends() -> usize {
    5
}

/// Settings for an LLM-backed provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Literal key, or "ENV" to read the provider's environment variable.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_trends")]
    pub max_trends: usize,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: default_api_key(),
            base_url: None,
            model: None,
            max_trends: default_max_trends(),
            temperature: None,
        }
    }
}

impl LlmProviderConfig {
    pub fn is_usable(&self) -> bool {
        self.enabled && key_is_set(&self.api_key)
    }
}

fn default_search_limit() -> usize {
    5
}
fn default_base_score() -> f64 {
    90.0
}
fn default_score_step() -> f64 {
    5.0
}

/// Settings for the search/crawl provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Results requested per result type.
    #[serde(default = "default_search_limit")]
    pub limit: usize,
    #[serde(default = "default_base_score")]
    pub base_score: f64,
    #[serde(default = "default_score_step")]
    pub score_step: f64,
}

impl Default for SearchProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: default_api_key(),
            base_url: None,
            limit: default_search_limit(),
            base_score: default_base_score(),
            score_step: default_score_step(),
        }
    }
}

impl SearchProviderConfig {
    pub fn is_usable(&self) -> bool {
        self.enabled && key_is_set(&self.api_key)
    }
}

fn key_is_set(k: &str) -> bool {
    let k = k.trim();
    !k.is_empty() && !k.eq_ignore_ascii_case("env")
}

impl TrendsConfig {
    /// Parse TOML text and resolve it (env keys, sanitized numbers).
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: TrendsConfig = toml::from_str(s).context("parsing trends config toml")?;
        Ok(cfg.resolved())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading trends config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    /// Load using env var + fallbacks:
    /// 1) $TRENDS_CONFIG_PATH
    /// 2) config/trends.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default().resolved())
    }

    /// Resolve "ENV" api keys, merge `[weights]` over the built-in table, and
    /// clamp invalid values to defaults.
    pub fn resolved(mut self) -> Self {
        self.weights = self.weights.normalized().over_seed();

        let d = &mut self.discovery;
        if d.limit == 0 {
            d.limit = default_limit();
        }
        if d.provider_timeout_ms == 0 {
            d.provider_timeout_ms = default_provider_timeout_ms();
        }
        if !(d.similarity_threshold > 0.0 && d.similarity_threshold <= 1.0) {
            d.similarity_threshold = default_similarity_threshold();
        }

        let p = &mut self.providers;
        p.openai.api_key = resolve_key(&p.openai.api_key, ENV_OPENAI_KEY);
        p.perplexity.api_key = resolve_key(&p.perplexity.api_key, ENV_PERPLEXITY_KEY);
        p.firecrawl.api_key = resolve_key(&p.firecrawl.api_key, ENV_FIRECRAWL_KEY);

        self
    }
}

/// "ENV" → value of `var` (empty if unset); anything else is kept verbatim.
fn resolve_key(raw: &str, var: &str) -> String {
    if raw.trim().eq_ignore_ascii_case("env") {
        env::var(var).unwrap_or_default().trim().to_string()
    } else {
        raw.trim().to_string()
    }
}
