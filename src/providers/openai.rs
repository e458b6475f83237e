// src/providers/openai.rs
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::config::trends::LlmProviderConfig;
use crate::providers::http_client;
use crate::providers::llm::{
    build_user_prompt, chat_completion, into_trends, parse_trend_payload, request_mode,
    ChatRequest, SYSTEM_PROMPT,
};
use crate::trends::types::{Trend, TrendContext, TrendProvider};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Asks an OpenAI chat model to enumerate trending topics as strict JSON.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_trends: usize,
    temperature: f32,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http: http_client(Duration::from_secs(30))?,
            api_key: api_key.into(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            max_trends: 5,
            temperature: 0.7,
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

    /// Point at another OpenAI-compatible endpoint (e.g. a test server).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TrendProvider for OpenAiProvider {
    async fn fetch_trends(&self, ctx: &TrendContext) -> Result<Vec<Trend>> {
        if self.api_key.trim().is_empty() {
            bail!("openai api key not configured");
        }

        let prompt = build_user_prompt(ctx, self.max_trends);
        let mut req = ChatRequest::new(&self.model, SYSTEM_PROMPT, &prompt, self.temperature);
        req.response_format = Some(json!({ "type": "json_object" }));

        let url = format!("{}/chat/completions", self.base_url);
        let resp = chat_completion(&self.http, &url, &self.api_key, &req).await?;
        let raw = parse_trend_payload(resp.first_content()?).context("parsing openai trends")?;

        let mut meta = Map::new();
        meta.insert("model".into(), Value::String(self.model.clone()));
        meta.insert("mode".into(), Value::String(request_mode(ctx).into()));

        let mut out = into_trends(raw, self.name(), Utc::now(), &meta);
        out.truncate(self.max_trends);
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
