// src/bootstrap.rs
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::trends::{MatcherKind, TrendsConfig};
use crate::providers::build_providers;
use crate::trends::types::TrendContext;
use crate::trends::unify::{ExactTopicMatcher, FuzzyTopicMatcher, TopicMatcher};
use crate::trends::TrendAggregator;

/// Assemble an aggregator from configuration: registered providers, weights,
/// matcher, limit and timeout.
pub fn build_aggregator(cfg: &TrendsConfig) -> TrendAggregator {
    let matcher: Arc<dyn TopicMatcher> = match cfg.discovery.matcher {
        MatcherKind::Exact => Arc::new(ExactTopicMatcher),
        MatcherKind::Fuzzy => Arc::new(FuzzyTopicMatcher::new(cfg.discovery.similarity_threshold)),
    };

    TrendAggregator::builder()
        .providers(build_providers(&cfg.providers))
        .weights(cfg.weights.clone())
        .matcher(matcher)
        .limit(cfg.discovery.limit)
        .provider_timeout(cfg.discovery.provider_timeout())
        .build()
}

pub struct TrendsRuntime {
    pub cfg: TrendsConfig,
    pub aggregator: Arc<TrendAggregator>,
}

impl TrendsRuntime {
    pub fn from_config(cfg: TrendsConfig) -> Self {
        let aggregator = Arc::new(build_aggregator(&cfg));
        // Safe diagnostics: provider names only, never keys.
        info!(
            providers = ?aggregator.provider_names(),
            limit = aggregator.limit(),
            matcher = aggregator.matcher_name(),
            timeout_ms = aggregator.provider_timeout().as_millis() as u64,
            "trends runtime ready"
        );
        if aggregator.provider_names().is_empty() {
            warn!("no trend providers registered; discovery will return empty lists");
        }
        Self { cfg, aggregator }
    }

    pub fn from_default_location() -> anyhow::Result<Self> {
        Ok(Self::from_config(TrendsConfig::load_default()?))
    }

    /// One-off discovery with a sample context; logs the outcome, never fails.
    pub async fn quick_probe(&self) {
        let ctx = TrendContext::new("technology", "content creators", "US");
        let out = self.aggregator.discover_trends(&ctx).await;
        let topics: Vec<&str> = out.iter().map(|t| t.topic.as_str()).collect();
        info!(count = out.len(), ?topics, "trends quick_probe finished");
    }
}
