// src/trends/mod.rs
pub mod aggregator;
pub mod types;
pub mod unify;

pub use aggregator::{
    fetch_or_empty, rank_and_unify, weighted_score, TrendAggregator, TrendAggregatorBuilder,
    DEFAULT_LIMIT, DEFAULT_PROVIDER_TIMEOUT,
};
pub use types::{normalize_topic, Trend, TrendContext, TrendProvider};
pub use unify::{ExactTopicMatcher, FuzzyTopicMatcher, TopicMatcher};

use metrics::{describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "trends_candidates_total",
            "Raw trend candidates returned by providers."
        );
        describe_counter!(
            "trends_returned_total",
            "Trends returned after ranking, dedup and truncation."
        );
        describe_counter!(
            "trends_dedup_total",
            "Candidates dropped as duplicates of a better-ranked topic."
        );
        describe_counter!(
            "trends_provider_errors_total",
            "Provider fetch/parse errors (including panics)."
        );
        describe_counter!(
            "trends_provider_timeouts_total",
            "Provider calls abandoned after the per-provider timeout."
        );
        describe_histogram!(
            "trends_provider_fetch_ms",
            "Provider call duration in milliseconds."
        );
    });
}
