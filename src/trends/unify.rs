// src/trends/unify.rs
//! Topic identity used by the dedup step.
//!
//! `ExactTopicMatcher` is the default: two trends are the same topic when
//! their trimmed, case-folded topics are equal. `FuzzyTopicMatcher` also
//! collapses near-identical spellings ("AI regulations" vs "AI regulation")
//! using `strsim::normalized_levenshtein`. Embedding-distance matching can be
//! added as another implementation without touching the aggregator.

use crate::trends::types::{normalize_topic, Trend};
use strsim::normalized_levenshtein;

pub trait TopicMatcher: Send + Sync {
    fn is_duplicate(&self, a: &Trend, b: &Trend) -> bool;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExactTopicMatcher;

impl TopicMatcher for ExactTopicMatcher {
    fn is_duplicate(&self, a: &Trend, b: &Trend) -> bool {
        normalize_topic(&a.topic) == normalize_topic(&b.topic)
    }

    fn name(&self) -> &'static str {
        "exact"
    }
}

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.90;

#[derive(Debug, Clone, Copy)]
pub struct FuzzyTopicMatcher {
    threshold: f64,
}

impl FuzzyTopicMatcher {
    /// Out-of-range thresholds fall back to the default.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_SIMILARITY_THRESHOLD
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl Default for FuzzyTopicMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl TopicMatcher for FuzzyTopicMatcher {
    fn is_duplicate(&self, a: &Trend, b: &Trend) -> bool {
        let (na, nb) = (normalize_topic(&a.topic), normalize_topic(&b.topic));
        na == nb || normalized_levenshtein(&na, &nb) >= self.threshold
    }

    fn name(&self) -> &'static str {
        "fuzzy"
    }
}
