//! # Source Weights
//!
//! Static multipliers applied to a provider's raw score before ranking
//! (e.g. `openai` counts 20% more than baseline).
//!
//! - Loads from the `[weights]` table of the trends config.
//! - Case-insensitive lookup with normalization of punctuation, dashes, etc.
//! - Aliases map alternative provider names to canonical ones.
//! - Fallback order: aliases → exact match → default.
//! - Unknown sources get `default_weight` (1.0 unless configured).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source-name → score multiplier table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWeights {
    /// Weight used when no match is found.
    #[serde(default = "default_default_weight")]
    pub default_weight: f64,
    /// Explicit weights for canonical source names.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Aliases mapping non-canonical names → canonical names.
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

fn default_default_weight() -> f64 {
    1.0
}

impl Default for SourceWeights {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl SourceWeights {
    /// Table with only the given weights, no aliases, default 1.0.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let weights = pairs
            .into_iter()
            .map(|(k, v)| (normalize(k.as_ref()), v))
            .collect();
        Self {
            default_weight: default_default_weight(),
            weights,
            aliases: HashMap::new(),
        }
    }

    /// Re-key weights and aliases through `normalize` so config authors can
    /// write `"OpenAI"` or `"open-ai"`.
    pub fn normalized(self) -> Self {
        Self {
            default_weight: self.default_weight,
            weights: self
                .weights
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
            aliases: self
                .aliases
                .into_iter()
                .map(|(k, v)| (normalize(&k), normalize(&v)))
                .collect(),
        }
    }

    /// Layer these entries over the built-in seed: listed weights and aliases
    /// win, unlisted providers keep their seeded weight. Call after
    /// `normalized`.
    pub fn over_seed(self) -> Self {
        let mut base = Self::default_seed();
        base.default_weight = self.default_weight;
        base.weights.extend(self.weights);
        base.aliases.extend(self.aliases);
        base
    }

    /// Get the multiplier for a given source name.
    ///
    /// Steps:
    /// 1. Alias lookup (normalized) → canonical → weight.
    /// 2. Exact weight match.
    /// 3. Default weight. Names are never matched by substring: a provider
    ///    called "notopenai" is unknown, not openai.
    pub fn weight_for(&self, source: &str) -> f64 {
        let s = normalize(source);

        if let Some(canon) = self.aliases.get(&s) {
            if let Some(&w) = self.weights.get(&normalize(canon)) {
                return sanitize(w);
            }
        }

        if let Some(&w) = self.weights.get(&s) {
            return sanitize(w);
        }

        sanitize(self.default_weight)
    }

    /// Built-in seed for the bundled providers.
    pub(crate) fn default_seed() -> Self {
        let mut weights = HashMap::new();
        let mut aliases = HashMap::new();

        for (k, v) in [("openai", 1.2), ("firecrawl", 1.1), ("perplexity", 1.0)] {
            weights.insert(k.to_string(), v);
        }

        for (a, c) in [
            ("open ai", "openai"),
            ("gpt", "openai"),
            ("chatgpt", "openai"),
            ("pplx", "perplexity"),
            ("sonar", "perplexity"),
            ("fire crawl", "firecrawl"),
        ] {
            aliases.insert(a.to_string(), c.to_string());
        }

        Self {
            default_weight: default_default_weight(),
            weights,
            aliases,
        }
    }
}

/// Lowercase, replace punctuation/dashes with spaces, collapse whitespace.
fn normalize(s: &str) -> String {
    let mut out = s.trim().to_lowercase();

    for ch in ['—', '–', '-', '_', '/', '\\'] {
        out = out.replace(ch, " ");
    }
    out = out.replace(['\n', '\r', '\t', '.', ',', '’', '\''], " ");

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Negative or non-finite weights collapse to 0.
fn sanitize(w: f64) -> f64 {
    if w.is_finite() && w > 0.0 {
        w
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SourceWeights {
        SourceWeights::default_seed()
    }

    #[test]
    fn exact_match() {
        assert!((cfg().weight_for("openai") - 1.2).abs() < 1e-9);
        assert!((cfg().weight_for("firecrawl") - 1.1).abs() < 1e-9);
    }

    #[test]
    fn alias_match() {
        assert!((cfg().weight_for("ChatGPT") - 1.2).abs() < 1e-9);
        assert!((cfg().weight_for("Fire-Crawl") - 1.1).abs() < 1e-9);
    }

    #[test]
    fn names_containing_a_key_are_unknown() {
        let c = cfg();
        assert_eq!(c.weight_for("notopenai"), 1.0);
        assert_eq!(c.weight_for("firecrawl-mirror"), 1.0);
        assert_eq!(c.weight_for("openai gpt-4o-mini"), 1.0);

        let short = SourceWeights::from_pairs([("ai", 2.0)]);
        assert_eq!(short.weight_for("mail"), 1.0);
        assert_eq!(short.weight_for("AI"), 2.0);
    }

    #[test]
    fn unknown_source_defaults_to_one() {
        assert!((cfg().weight_for("TotallyUnknown") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn case_insensitive_lookup() {
        let c = cfg();
        assert_eq!(c.weight_for("OPENAI"), c.weight_for("openai"));
        assert_eq!(c.weight_for("OpenAI"), c.weight_for("openai"));
    }

    #[test]
    fn config_keys_are_normalized() {
        let raw = r#"{ "weights": { "Open-AI": 1.5 }, "aliases": { "GPT4": "open ai" } }"#;
        let w = serde_json::from_str::<SourceWeights>(raw)
            .unwrap()
            .normalized();
        assert!((w.weight_for("open ai") - 1.5).abs() < 1e-9);
        assert!((w.weight_for("gpt4") - 1.5).abs() < 1e-9);
        assert!((w.default_weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_table_keeps_seeded_providers() {
        let w = SourceWeights::from_pairs([("OpenAI", 2.0)]).over_seed();
        assert_eq!(w.weight_for("openai"), 2.0);
        assert!((w.weight_for("firecrawl") - 1.1).abs() < 1e-9);
        assert!((w.weight_for("chatgpt") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn negative_weights_clamp_to_zero() {
        let w = SourceWeights::from_pairs([("bad", -2.0)]);
        assert_eq!(w.weight_for("bad"), 0.0);
    }
}
