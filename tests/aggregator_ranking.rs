// tests/aggregator_ranking.rs
//
// Weighted ranking, dedup and truncation through the full fan-out path.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use trendscout::source_weights::SourceWeights;
use trendscout::trends::{
    rank_and_unify, FuzzyTopicMatcher, TopicMatcher, Trend, TrendAggregator, TrendContext,
    TrendProvider,
};

struct StaticProvider {
    name: &'static str,
    items: Vec<(&'static str, f64)>,
}

#[async_trait]
impl TrendProvider for StaticProvider {
    async fn fetch_trends(&self, _ctx: &TrendContext) -> Result<Vec<Trend>> {
        Ok(self
            .items
            .iter()
            .map(|(topic, score)| Trend::new(*topic, format!("via {}", self.name), *score, self.name))
            .collect())
    }
    fn name(&self) -> &'static str {
        self.name
    }
}

struct FailingProvider;

#[async_trait]
impl TrendProvider for FailingProvider {
    async fn fetch_trends(&self, _ctx: &TrendContext) -> Result<Vec<Trend>> {
        Err(anyhow!("upstream returned 503"))
    }
    fn name(&self) -> &'static str {
        "gamma"
    }
}

fn provider(name: &'static str, items: Vec<(&'static str, f64)>) -> Arc<dyn TrendProvider> {
    Arc::new(StaticProvider { name, items })
}

fn weights() -> SourceWeights {
    SourceWeights::from_pairs([("alpha", 1.2), ("beta", 1.1), ("gamma", 1.0)])
}

fn ctx() -> TrendContext {
    TrendContext::new("tech", "founders", "US")
}

#[tokio::test]
async fn weighted_duplicate_wins_and_failing_provider_is_silent() {
    let agg = TrendAggregator::builder()
        .provider(provider("alpha", vec![("AI Regulation", 70.0)]))
        .provider(provider("beta", vec![("ai regulation", 90.0), ("Remote Work", 60.0)]))
        .provider(Arc::new(FailingProvider))
        .weights(weights())
        .build();

    let out = agg.discover_trends(&ctx()).await;

    assert_eq!(out.len(), 2);
    assert_eq!(out[0].topic, "ai regulation");
    assert_eq!(out[0].source, "beta");
    assert_eq!(out[0].score, 90.0, "raw score is returned untouched");
    assert_eq!(out[1].topic, "Remote Work");
    assert_eq!(out[1].source, "beta");
}

#[tokio::test]
async fn equal_raw_scores_rank_by_source_weight() {
    // gamma registered first so registration order alone would put it ahead.
    let agg = TrendAggregator::builder()
        .provider(provider("gamma", vec![("Low weight", 50.0)]))
        .provider(provider("alpha", vec![("High weight", 50.0)]))
        .weights(weights())
        .build();

    let out = agg.discover_trends(&ctx()).await;
    let topics: Vec<_> = out.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(topics, ["High weight", "Low weight"]);
}

#[tokio::test]
async fn duplicate_topic_keeps_best_weighted_instance() {
    let agg = TrendAggregator::builder()
        .provider(provider("alpha", vec![("Future of AI", 50.0)])) // 60
        .provider(provider("beta", vec![("future of ai ", 80.0)])) // 88
        .weights(weights())
        .build();

    let out = agg.discover_trends(&ctx()).await;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].source, "beta");
    assert_eq!(out[0].topic, "future of ai ");
}

#[tokio::test]
async fn output_is_capped_at_five_by_default() {
    let agg = TrendAggregator::builder()
        .provider(provider(
            "alpha",
            vec![("a", 10.0), ("b", 20.0), ("c", 30.0), ("d", 40.0)],
        ))
        .provider(provider("beta", vec![("e", 50.0), ("f", 60.0), ("g", 70.0)]))
        .weights(weights())
        .build();

    let out = agg.discover_trends(&ctx()).await;
    assert_eq!(out.len(), 5);
    let topics: Vec<_> = out.iter().map(|t| t.topic.as_str()).collect();
    // g=77, f=66, e=55, d=48, c=36
    assert_eq!(topics, ["g", "f", "e", "d", "c"]);
}

#[tokio::test]
async fn limit_is_configurable() {
    let agg = TrendAggregator::builder()
        .provider(provider("alpha", vec![("a", 1.0), ("b", 2.0), ("c", 3.0)]))
        .limit(2)
        .build();
    assert_eq!(agg.discover_trends(&ctx()).await.len(), 2);
}

#[tokio::test]
async fn duplicates_do_not_count_against_the_limit() {
    let agg = TrendAggregator::builder()
        .provider(provider(
            "alpha",
            vec![("Same", 90.0), ("same", 80.0), (" SAME ", 70.0), ("Other", 10.0)],
        ))
        .limit(2)
        .build();

    let out = agg.discover_trends(&ctx()).await;
    let topics: Vec<_> = out.iter().map(|t| t.topic.as_str()).collect();
    assert_eq!(topics, ["Same", "Other"]);
}

#[tokio::test]
async fn all_empty_providers_yield_empty_list() {
    let agg = TrendAggregator::builder()
        .provider(provider("alpha", vec![]))
        .provider(provider("beta", vec![]))
        .build();
    assert!(agg.discover_trends(&ctx()).await.is_empty());

    let none = TrendAggregator::new(Vec::new());
    assert!(none.discover_trends(&ctx()).await.is_empty());
}

#[tokio::test]
async fn unknown_source_gets_baseline_weight() {
    let agg = TrendAggregator::builder()
        .provider(provider("mystery", vec![("Unweighted", 100.0)])) // 100
        .provider(provider("alpha", vec![("Weighted", 85.0)])) // 102
        .weights(weights())
        .build();

    let out = agg.discover_trends(&ctx()).await;
    assert_eq!(out[0].topic, "Weighted");
    assert_eq!(out[1].topic, "Unweighted");
}

#[tokio::test]
async fn source_containing_a_weighted_name_is_still_unknown() {
    let agg = TrendAggregator::builder()
        .provider(provider("reddit", vec![("A", 100.0)])) // 100
        .provider(provider("mail", vec![("B", 60.0)])) // 60, not 120
        .weights(SourceWeights::from_pairs([("ai", 2.0)]))
        .build();

    let out = agg.discover_trends(&ctx()).await;
    let got: Vec<_> = out.iter().map(|t| (t.topic.as_str(), t.source.as_str())).collect();
    assert_eq!(got, [("A", "reddit"), ("B", "mail")]);
}

#[tokio::test]
async fn fuzzy_matcher_collapses_near_spellings_to_best_weighted() {
    let agg = TrendAggregator::builder()
        .provider(provider("alpha", vec![("AI regulations", 70.0), ("Remote work", 50.0)])) // 84, 60
        .provider(provider("beta", vec![("AI Regulation", 90.0), ("Remote work.", 40.0)])) // 99, 44
        .provider(provider("gamma", vec![("Solar leasing", 55.0)])) // 55
        .weights(weights())
        .matcher(Arc::new(FuzzyTopicMatcher::default()))
        .build();

    let out = agg.discover_trends(&ctx()).await;
    let got: Vec<_> = out.iter().map(|t| (t.topic.as_str(), t.source.as_str())).collect();
    assert_eq!(
        got,
        [("AI Regulation", "beta"), ("Remote work", "alpha"), ("Solar leasing", "gamma")]
    );
    // Raw score is reported, not the weighted one.
    assert_eq!(out[0].score, 90.0);

    let m = FuzzyTopicMatcher::default();
    for (i, a) in out.iter().enumerate() {
        for b in &out[i + 1..] {
            assert!(!m.is_duplicate(a, b), "{} ~ {}", a.topic, b.topic);
        }
    }
}

#[test]
fn exact_matcher_keeps_near_spellings_apart() {
    let candidates = vec![
        Trend::new("AI regulations", "", 70.0, "alpha"),
        Trend::new("AI Regulation", "", 90.0, "beta"),
    ];
    let exact = rank_and_unify(
        candidates.clone(),
        &weights(),
        &trendscout::trends::ExactTopicMatcher,
        5,
    );
    assert_eq!(exact.len(), 2);

    let fuzzy = rank_and_unify(candidates, &weights(), &FuzzyTopicMatcher::new(0.9), 5);
    assert_eq!(fuzzy.len(), 1);
    assert_eq!(fuzzy[0].source, "beta");
}
