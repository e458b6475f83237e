// src/trends/aggregator.rs
//! Fan out to every provider, absorb failures, rank by weighted score,
//! dedup by topic identity, truncate.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;
use metrics::{counter, histogram};
use tracing::{debug, error, info, warn};

use crate::source_weights::SourceWeights;
use crate::trends::ensure_metrics_described;
use crate::trends::types::{Trend, TrendContext, TrendProvider};
use crate::trends::unify::{ExactTopicMatcher, TopicMatcher};

pub const DEFAULT_LIMIT: usize = 5;
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

pub struct TrendAggregator {
    providers: Vec<Arc<dyn TrendProvider>>,
    weights: SourceWeights,
    matcher: Arc<dyn TopicMatcher>,
    limit: usize,
    provider_timeout: Duration,
}

impl TrendAggregator {
    /// Aggregator with default weights, exact matching, limit 5 and an 8s timeout.
    pub fn new(providers: Vec<Arc<dyn TrendProvider>>) -> Self {
        Self::builder().providers(providers).build()
    }

    pub fn builder() -> TrendAggregatorBuilder {
        TrendAggregatorBuilder::default()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn weights(&self) -> &SourceWeights {
        &self.weights
    }

    pub fn matcher_name(&self) -> &'static str {
        self.matcher.name()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    /// Discover trends for `ctx`. Never fails: providers that error, panic or
    /// time out contribute nothing.
    pub async fn discover_trends(&self, ctx: &TrendContext) -> Vec<Trend> {
        ensure_metrics_described();

        let calls = self
            .providers
            .iter()
            .map(|p| fetch_or_empty(p.as_ref(), ctx, self.provider_timeout));

        // join_all keeps registration order regardless of completion order.
        let candidates: Vec<Trend> = join_all(calls).await.into_iter().flatten().collect();
        counter!("trends_candidates_total").increment(candidates.len() as u64);

        if candidates.is_empty() {
            info!(target: "trends", providers = self.providers.len(), "no trend candidates");
            return Vec::new();
        }

        let total = candidates.len();
        let out = rank_and_unify(candidates, &self.weights, self.matcher.as_ref(), self.limit);
        counter!("trends_returned_total").increment(out.len() as u64);

        info!(
            target: "trends",
            candidates = total,
            returned = out.len(),
            matcher = self.matcher.name(),
            "trend discovery finished"
        );
        out
    }
}

/// Run one provider and absorb every failure mode into an empty result.
/// Text of a panic payload: `panic!("...")` yields `&str` or `String`.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

pub async fn fetch_or_empty(
    provider: &dyn TrendProvider,
    ctx: &TrendContext,
    timeout: Duration,
) -> Vec<Trend> {
    let name = provider.name();
    let t0 = Instant::now();

    let call = AssertUnwindSafe(provider.fetch_trends(ctx)).catch_unwind();
    let out = match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Ok(trends))) => {
            debug!(target: "trends", provider = name, count = trends.len(), "provider ok");
            trends
        }
        Ok(Ok(Err(e))) => {
            warn!(target: "trends", provider = name, error = ?e, "provider error");
            counter!("trends_provider_errors_total", "provider" => name).increment(1);
            Vec::new()
        }
        Ok(Err(payload)) => {
            error!(
                target: "trends",
                provider = name,
                panic = panic_message(payload.as_ref()),
                "provider panicked"
            );
            counter!("trends_provider_errors_total", "provider" => name).increment(1);
            Vec::new()
        }
        Err(_) => {
            warn!(
                target: "trends",
                provider = name,
                timeout_ms = timeout.as_millis() as u64,
                "provider timed out"
            );
            counter!("trends_provider_timeouts_total", "provider" => name).increment(1);
            Vec::new()
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("trends_provider_fetch_ms", "provider" => name).record(ms);
    out
}

/// Raw score times the source weight; non-finite results rank as 0.
pub fn weighted_score(trend: &Trend, weights: &SourceWeights) -> f64 {
    let w = trend.score * weights.weight_for(&trend.source);
    if w.is_finite() {
        w
    } else {
        0.0
    }
}

/// Weight, sort (stable, descending), dedup and truncate.
///
/// Sorting happens before dedup so the surviving instance of a topic is the
/// best-scoring one. Equal weighted scores keep their input order.
pub fn rank_and_unify(
    candidates: Vec<Trend>,
    weights: &SourceWeights,
    matcher: &dyn TopicMatcher,
    limit: usize,
) -> Vec<Trend> {
    let mut ranked: Vec<(f64, Trend)> = candidates
        .into_iter()
        .map(|t| (weighted_score(&t, weights), t))
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut kept: Vec<Trend> = Vec::with_capacity(limit.min(ranked.len()));
    let mut dropped = 0u64;
    for (_, t) in ranked {
        if kept.len() >= limit {
            break;
        }
        if kept.iter().any(|k| matcher.is_duplicate(k, &t)) {
            dropped += 1;
            continue;
        }
        kept.push(t);
    }

    counter!("trends_dedup_total").increment(dropped);
    kept
}

#[derive(Default)]
pub struct TrendAggregatorBuilder {
    providers: Vec<Arc<dyn TrendProvider>>,
    weights: Option<SourceWeights>,
    matcher: Option<Arc<dyn TopicMatcher>>,
    limit: Option<usize>,
    provider_timeout: Option<Duration>,
}

impl TrendAggregatorBuilder {
    pub fn provider(mut self, p: Arc<dyn TrendProvider>) -> Self {
        self.providers.push(p);
        self
    }

    pub fn providers(mut self, ps: impl IntoIterator<Item = Arc<dyn TrendProvider>>) -> Self {
        self.providers.extend(ps);
        self
    }

    pub fn weights(mut self, w: SourceWeights) -> Self {
        self.weights = Some(w);
        self
    }

    pub fn matcher(mut self, m: Arc<dyn TopicMatcher>) -> Self {
        self.matcher = Some(m);
        self
    }

    /// Zero is bumped to 1.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n.max(1));
        self
    }

    pub fn provider_timeout(mut self, d: Duration) -> Self {
        self.provider_timeout = Some(d);
        self
    }

    pub fn build(self) -> TrendAggregator {
        TrendAggregator {
            providers: self.providers,
            weights: self.weights.unwrap_or_default(),
            matcher: self.matcher.unwrap_or_else(|| Arc::new(ExactTopicMatcher)),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT),
            provider_timeout: self.provider_timeout.unwrap_or(DEFAULT_PROVIDER_TIMEOUT),
        }
    }
}
