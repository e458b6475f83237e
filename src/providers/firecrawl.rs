// src/providers/firecrawl.rs
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::trends::SearchProviderConfig;
use crate::providers::{clean_text, http_client};
use crate::trends::types::{Trend, TrendContext, TrendProvider};

pub const FIRECRAWL_BASE_URL: &str = "https://api.firecrawl.dev";

#[derive(Debug, Serialize)]
struct SearchReq<'a> {
    query: &'a str,
    limit: usize,
    sources: [&'a str; 2],
}

#[derive(Debug, Deserialize)]
struct SearchResp {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<SearchData>,
}

fn default_true() -> bool {
    true
}

/// v2 groups hits by result type; older deployments return a flat list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchData {
    Grouped {
        #[serde(default)]
        web: Vec<Hit>,
        #[serde(default)]
        news: Vec<Hit>,
    },
    Flat(Vec<Hit>),
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    description: Option<String>,
    snippet: Option<String>,
    url: Option<String>,
    date: Option<String>,
}

/// Web/news search; hits become trends scored by rank
/// (`base_score - rank * score_step`, floored at 0).
pub struct FirecrawlProvider {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    limit: usize,
    base_score: f64,
    score_step: f64,
}

impl FirecrawlProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(20))?,
            api_key: api_key.into(),
            base_url: FIRECRAWL_BASE_URL.to_string(),
            limit: 5,
            base_score: 90.0,
            score_step: 5.0,
        })
    }

    pub fn from_config(cfg: &SearchProviderConfig) -> Result<Self> {
        let mut p = Self::new(cfg.api_key.clone())?;
        if let Some(u) = cfg.base_url.as_deref() {
            p = p.with_base_url(u);
        }
        p.limit = cfg.limit.max(1);
        p.base_score = cfg.base_score;
        p.score_step = cfg.score_step.max(0.0);
        Ok(p)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn score_for_rank(&self, rank: usize) -> f64 {
        (self.base_score - rank as f64 * self.score_step).max(0.0)
    }
}

#[async_trait]
impl TrendProvider for FirecrawlProvider {
    async fn fetch_trends(&self, ctx: &TrendContext) -> Result<Vec<Trend>> {
        if self.api_key.trim().is_empty() {
            bail!("firecrawl api key not configured");
        }
        let Some(query) = ctx.search_query() else {
            bail!("firecrawl needs a topic or niche to search for");
        };

        let req = SearchReq {
            query: &query,
            limit: self.limit,
            sources: ["web", "news"],
        };
        let resp: SearchResp = self
            .http
            .post(format!("{}/v2/search", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("firecrawl search request")?
            .error_for_status()
            .context("firecrawl search non-2xx")?
            .json()
            .await
            .context("decoding firecrawl search response")?;

        if !resp.success {
            return Err(anyhow!(resp.error.unwrap_or_else(|| "unknown error".into())))
                .context("firecrawl search unsuccessful");
        }

        let hits: Vec<(&'static str, Hit)> = match resp.data {
            Some(SearchData::Grouped { web, news }) => web
                .into_iter()
                .map(|h| ("web", h))
                .chain(news.into_iter().map(|h| ("news", h)))
                .collect(),
            Some(SearchData::Flat(v)) => v.into_iter().map(|h| ("web", h)).collect(),
            None => Vec::new(),
        };

        let now = Utc::now();
        let mut out = Vec::with_capacity(hits.len());
        for (kind, hit) in hits {
            let topic = clean_text(hit.title.as_deref().unwrap_or_default());
            if topic.is_empty() {
                continue;
            }
            let description = clean_text(
                hit.description
                    .as_deref()
                    .or(hit.snippet.as_deref())
                    .unwrap_or_default(),
            );

            let rank = out.len();
            let mut meta = Map::new();
            meta.insert("kind".into(), Value::String(kind.into()));
            meta.insert("rank".into(), Value::from(rank as u64));
            meta.insert("query".into(), Value::String(query.clone()));
            if let Some(d) = hit.date {
                meta.insert("published".into(), Value::String(d));
            }

            out.push(
                Trend::new(topic, description, self.score_for_rank(rank), self.name())
                    .with_url(hit.url)
                    .with_timestamp(now)
                    .with_metadata(meta),
            );
        }

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "firecrawl"
    }
}
