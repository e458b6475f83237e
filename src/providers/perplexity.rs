// src/providers/perplexity.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};

use crate::config::trends::LlmProviderConfig;
use crate::providers::http_client;
use crate::providers::llm::{
    build_user_prompt, chat_completion, into_trends, parse_trend_payload, request_mode,
    ChatRequest, SYSTEM_PROMPT,
};
use crate::trends::types::{Trend, TrendContext, TrendProvider};

pub const PERPLEXITY_BASE_URL: &str = "https://api.perplexity.ai";
pub const PERPLEXITY_DEFAULT_MODEL: &str = "sonar";

/// Online-search LLM. Same JSON contract as the OpenAI provider, but the
/// model grounds its answer in live web results and returns citations.
pub struct PerplexityProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_trends: usize,
    temperature: f32,
}

impl PerplexityProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(30))?,
            api_key: api_key.into(),
            model: PERPLEXITY_DEFAULT_MODEL.to_string(),
            base_url: PERPLEXITY_BASE_URL.to_string(),
            max_trends: 5,
            temperature: 0.2,
        })
    }

    pub fn from_config(cfg: &LlmProviderConfig) -> Result<Self> {
        let mut p = Self::new(cfg.api_key.clone())?;
        if let Some(m) = cfg.model.as_deref().filter(|m| !m.trim().is_empty()) {
            p.model = m.trim().to_string();
        }
        if let Some(u) = cfg.base_url.as_deref() {
            p = p.with_base_url(u);
        }
        p.max_trends = cfg.max_trends.max(1);
        if let Some(t) = cfg.temperature {
            p.temperature = t;
        }
        Ok(p)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl TrendProvider for PerplexityProvider {
    async fn fetch_trends(&self, ctx: &TrendContext) -> Result<Vec<Trend>> {
        if self.api_key.trim().is_empty() {
            bail!("perplexity api key not configured");
        }

        let prompt = format!(
            "{} Only include topics with coverage from the last 7 days.",
            build_user_prompt(ctx, self.max_trends)
        );
        let req = ChatRequest::new(&self.model, SYSTEM_PROMPT, &prompt, self.temperature);

        let url = format!("{}/chat/completions", self.base_url);
        let resp = chat_completion(&self.http, &url, &self.api_key, &req).await?;
        let raw =
            parse_trend_payload(resp.first_content()?).context("parsing perplexity trends")?;

        let mut meta = Map::new();
        meta.insert("model".into(), Value::String(self.model.clone()));
        meta.insert("mode".into(), Value::String(request_mode(ctx).into()));
        if !resp.citations.is_empty() {
            meta.insert(
                "citations".into(),
                Value::Array(resp.citations.iter().cloned().map(Value::String).collect()),
            );
        }

        // Citations belong to the whole answer, not to a single trend, so
        // they stay in metadata and `url` is left unset.
        let mut out: Vec<Trend> = into_trends(raw, self.name(), Utc::now(), &meta);
        out.truncate(self.max_trends);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "perplexity"
    }
}
