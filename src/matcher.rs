// src/matcher.rs
//! Topic relevance matching: keyword expansion plus substring scoring.
//!
//! Deliberately cheap and explainable — no model inference, sub-millisecond
//! per item. Items are additionally recency-filtered and volume-capped
//! downstream, so the matcher only has to be a reasonable first gate.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXPANSIONS_PATH: &str = "config/topics.toml";
pub const ENV_EXPANSIONS_PATH: &str = "TOPIC_EXPANSIONS_PATH";

/// Result of matching a piece of text against a topic. Ephemeral, never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// 0.0 to 1.0, rounded to two decimals.
    pub score: f64,
}

impl MatchResult {
    const MISS: MatchResult = MatchResult {
        matched: false,
        score: 0.0,
    };
}

/// Lowercase and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
    RE_WS
        .replace_all(text.to_lowercase().trim(), " ")
        .into_owned()
}

/// Common synonyms / related terms for popular news topics.
fn builtin_expansions() -> HashMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 9] = [
        (
            "ai",
            &[
                "artificial intelligence",
                "machine learning",
                "deep learning",
                "chatgpt",
                "openai",
                "llm",
                "gpt",
            ],
        ),
        (
            "crypto",
            &[
                "cryptocurrency",
                "bitcoin",
                "ethereum",
                "blockchain",
                "web3",
                "defi",
                "nft",
            ],
        ),
        (
            "climate",
            &[
                "climate change",
                "global warming",
                "carbon emissions",
                "renewable energy",
                "greenhouse",
            ],
        ),
        (
            "tech",
            &[
                "technology",
                "silicon valley",
                "startup",
                "software",
                "hardware",
            ],
        ),
        (
            "finance",
            &[
                "financial",
                "stock market",
                "wall street",
                "economy",
                "economic",
                "banking",
                "federal reserve",
            ],
        ),
        (
            "politics",
            &[
                "political",
                "election",
                "congress",
                "senate",
                "parliament",
                "legislation",
            ],
        ),
        (
            "sports",
            &[
                "football",
                "basketball",
                "soccer",
                "tennis",
                "olympics",
                "nfl",
                "nba",
                "premier league",
            ],
        ),
        (
            "health",
            &[
                "healthcare",
                "medical",
                "vaccine",
                "pandemic",
                "mental health",
                "disease",
            ],
        ),
        (
            "space",
            &[
                "nasa",
                "spacex",
                "astronomy",
                "satellite",
                "mars",
                "rocket",
                "orbit",
            ],
        ),
    ];
    table
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ExpansionsFile {
    expansions: HashMap<String, Vec<String>>,
}

/// Immutable topic→synonym table plus the scoring rules built on it.
/// Loaded once at startup; no mutation afterwards, so it is freely shared.
#[derive(Debug)]
pub struct TopicMatcher {
    expansions: HashMap<String, Vec<String>>,
}

impl Default for TopicMatcher {
    fn default() -> Self {
        Self {
            expansions: builtin_expansions(),
        }
    }
}

impl TopicMatcher {
    /// Parse an expansion table from a TOML string:
    /// `[expansions]` with one `key = ["synonym", ...]` entry per topic.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let file: ExpansionsFile =
            toml::from_str(toml_str).context("parsing topic expansions toml")?;
        Ok(Self {
            expansions: file
                .expansions
                .into_iter()
                .map(|(k, v)| (normalize(&k), v.iter().map(|s| normalize(s)).collect()))
                .collect(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading topic expansions from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolution order:
    /// 1) $TOPIC_EXPANSIONS_PATH (must exist and parse)
    /// 2) config/topics.toml if present
    /// 3) built-in table
    pub fn from_env_or_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_EXPANSIONS_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_EXPANSIONS_PATH} points to non-existent path"));
            }
            return Self::from_file(&pb);
        }
        let default = PathBuf::from(DEFAULT_EXPANSIONS_PATH);
        if default.exists() {
            return Self::from_file(&default);
        }
        Ok(Self::default())
    }

    /// The normalized topic plus any expanded synonyms (and the table key,
    /// when the topic is itself a listed synonym). Deduplicated.
    fn topic_keywords(&self, topic: &str) -> Vec<String> {
        let normalized = normalize(topic);
        let mut keywords = vec![normalized.clone()];

        for (key, expansions) in &self.expansions {
            if *key == normalized || expansions.contains(&normalized) {
                keywords.extend(expansions.iter().cloned());
                if !keywords.contains(key) {
                    keywords.push(key.clone());
                }
                break;
            }
        }

        keywords.sort();
        keywords.dedup();
        keywords
    }

    /// Score `text` against `topic`.
    ///
    /// `matched` is true whenever at least one keyword appears as a substring
    /// of the normalized text, independent of the numeric score — a topic with
    /// many synonyms can match with a low score.
    pub fn match_topic(&self, text: &str, topic: &str) -> MatchResult {
        let normalized_text = normalize(text);
        if normalized_text.is_empty() {
            return MatchResult::MISS;
        }

        let keywords = self.topic_keywords(topic);
        let match_count = keywords
            .iter()
            .filter(|k| normalized_text.contains(k.as_str()))
            .count();
        if match_count == 0 {
            return MatchResult::MISS;
        }

        let denominator = (keywords.len() as f64 / 2.0).max(1.0);
        let mut score = (match_count as f64 / denominator).min(1.0);

        // Title-position heuristic: exact topic in the first 100 chars.
        let head: String = normalized_text.chars().take(100).collect();
        if head.contains(&normalize(topic)) {
            score = (score + 0.3).min(1.0);
        }

        MatchResult {
            matched: true,
            score: (score * 100.0).round() / 100.0,
        }
    }

    /// Keep items whose combined text matches `topic` with at least
    /// `min_score`; return them sorted by score descending. The sort is
    /// stable, so equal-score items keep their input order.
    pub fn filter_by_topic<T>(
        &self,
        items: Vec<T>,
        topic: &str,
        min_score: f64,
        text_of: impl Fn(&T) -> String,
    ) -> Vec<T> {
        let mut scored: Vec<(f64, T)> = items
            .into_iter()
            .filter_map(|item| {
                let result = self.match_topic(&text_of(&item), topic);
                (result.matched && result.score >= min_score).then_some((result.score, item))
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, item)| item).collect()
    }
}
