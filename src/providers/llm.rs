//! Plumbing shared by the LLM-backed providers: prompts, the
//! OpenAI-compatible chat-completions wire types, and tolerant parsing of the
//! `{"trends":[...]}` JSON contract.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::trends::types::{Trend, TrendContext};

pub const SYSTEM_PROMPT: &str = "You are a social media trend analyst. \
Respond with strict JSON only, no prose and no markdown, of the shape \
{\"trends\":[{\"topic\":string,\"description\":string,\"score\":number}]}. \
`score` is your confidence that the topic is trending right now, from 0 to 100.";

/// User prompt: a topic deep-dive when the context carries one, otherwise
/// niche/audience/geo discovery.
pub fn build_user_prompt(ctx: &TrendContext, max_trends: usize) -> String {
    if let Some(topic) = ctx.topic() {
        return format!(
            "Find up to {max_trends} currently trending angles, stories or discussions about \"{topic}\". \
Give each a short topic title and a one-paragraph description of what is happening and why it is trending."
        );
    }

    let niche = non_empty_or(&ctx.niche, "general interest");
    let audience = non_empty_or(&ctx.audience, "a broad audience");
    let geo = non_empty_or(&ctx.geo, "worldwide");
    format!(
        "List up to {max_trends} topics trending right now in the {niche} niche for {audience} ({geo}). \
Give each a short topic title and a one-paragraph description of what is happening and why it is trending."
    )
}

/// "topic" or "niche", recorded in trend metadata.
pub fn request_mode(ctx: &TrendContext) -> &'static str {
    if ctx.has_topic() {
        "topic"
    } else {
        "niche"
    }
}

fn non_empty_or<'a>(s: &'a str, fallback: &'a str) -> &'a str {
    let t = s.trim();
    if t.is_empty() {
        fallback
    } else {
        t
    }
}

// ------------------------------------------------------------
// Chat-completions wire types (OpenAI and Perplexity share them)
// ------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, system: &'a str, user: &'a str, temperature: f32) -> Self {
        Self {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature,
            response_format: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Perplexity only.
    #[serde(default)]
    pub citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: String,
}

impl ChatResponse {
    pub fn first_content(&self) -> Result<&str> {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("empty completion"))
    }
}

/// POST a chat-completions request; non-2xx is an error.
pub async fn chat_completion(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    req: &ChatRequest<'_>,
) -> Result<ChatResponse> {
    http.post(url)
        .bearer_auth(api_key)
        .json(req)
        .send()
        .await
        .context("chat completion request")?
        .error_for_status()
        .context("chat completion non-2xx")?
        .json::<ChatResponse>()
        .await
        .context("decoding chat completion response")
}

// ------------------------------------------------------------
// Payload parsing
// ------------------------------------------------------------

/// One entry of the model's JSON output, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrend {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub score: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped { trends: Vec<RawTrend> },
    Bare(Vec<RawTrend>),
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    static RE_FENCE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re = RE_FENCE
        .get_or_init(|| regex::Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());
    match re.captures(raw).and_then(|c| c.get(1)) {
        Some(m) => m.as_str().trim(),
        None => raw.trim(),
    }
}

/// Parse model output into raw trends. Accepts the wrapped object or a bare
/// array, with or without code fences; as a last resort the outermost
/// `{...}` span is tried (models sometimes add a sentence around the JSON).
pub fn parse_trend_payload(raw: &str) -> Result<Vec<RawTrend>> {
    let body = strip_code_fences(raw);
    let first_err = match serde_json::from_str::<Payload>(body) {
        Ok(p) => return Ok(p.into_vec()),
        Err(e) => e,
    };

    if let (Some(start), Some(end)) = (body.find('{'), body.rfind('}')) {
        if start < end {
            if let Ok(p) = serde_json::from_str::<Payload>(&body[start..=end]) {
                return Ok(p.into_vec());
            }
        }
    }

    Err(first_err).context("model output is not the trends JSON contract")
}

impl Payload {
    fn into_vec(self) -> Vec<RawTrend> {
        match self {
            Payload::Wrapped { trends } => trends,
            Payload::Bare(v) => v,
        }
    }
}

/// Numbers pass through, numeric strings are parsed, anything else is 0.
fn score_of(v: &Value) -> f64 {
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().trim_end_matches('%').parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Validate raw entries and stamp them as `source`. Blank topics are dropped.
pub fn into_trends(
    raw: Vec<RawTrend>,
    source: &str,
    now: DateTime<Utc>,
    metadata: &Map<String, Value>,
) -> Vec<Trend> {
    raw.into_iter()
        .filter_map(|r| {
            let topic = r.topic.trim();
            if topic.is_empty() {
                return None;
            }
            Some(
                Trend::new(topic, r.description.trim(), score_of(&r.score), source)
                    .with_timestamp(now)
                    .with_metadata(metadata.clone()),
            )
        })
        .collect()
}
