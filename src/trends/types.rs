// src/trends/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Targeting input for one discovery request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendContext {
    #[serde(default)]
    pub niche: String,
    #[serde(default)]
    pub audience: String,
    #[serde(default)]
    pub geo: String,
    /// Free-text override; providers search this instead of the niche.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl TrendContext {
    pub fn new(
        niche: impl Into<String>,
        audience: impl Into<String>,
        geo: impl Into<String>,
    ) -> Self {
        Self {
            niche: niche.into(),
            audience: audience.into(),
            geo: geo.into(),
            topic: None,
        }
    }

    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }

    /// The topic override, if it carries any text.
    pub fn topic(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_topic(&self) -> bool {
        self.topic().is_some()
    }

    /// Query for search-style providers: the topic when set, otherwise a
    /// niche-derived phrase. `None` when there is nothing to search for.
    pub fn search_query(&self) -> Option<String> {
        if let Some(t) = self.topic() {
            return Some(t.to_string());
        }
        let niche = self.niche.trim();
        if niche.is_empty() {
            return None;
        }
        let mut q = format!("{niche} trends");
        let audience = self.audience.trim();
        if !audience.is_empty() {
            q.push_str(&format!(" for {audience}"));
        }
        let geo = self.geo.trim();
        if !geo.is_empty() {
            q.push_str(&format!(" in {geo}"));
        }
        Some(q)
    }
}

/// A candidate (or final) trending topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trend {
    pub topic: String,
    pub description: String,
    /// Source-local relevance; scale differs between providers.
    pub score: f64,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Trend {
    pub fn new(
        topic: impl Into<String>,
        description: impl Into<String>,
        score: f64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            description: description.into(),
            score,
            source: source.into(),
            url: None,
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        };
        self
    }

    /// Unification key: trimmed, case-folded topic.
    pub fn normalized_topic(&self) -> String {
        normalize_topic(&self.topic)
    }
}

pub fn normalize_topic(s: &str) -> String {
    s.trim().to_lowercase()
}

/// One external trend-signal service.
#[async_trait::async_trait]
pub trait TrendProvider: Send + Sync {
    async fn fetch_trends(&self, ctx: &TrendContext) -> Result<Vec<Trend>>;
    fn name(&self) -> &'static str;
}
