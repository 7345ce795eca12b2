// src/model.rs
//! Normalized content model shared by every source adapter.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where an item originated. Closed set; unknown tags are a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Feed,
    Social,
    Forum,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Feed, SourceKind::Social, SourceKind::Forum];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed => "feed",
            SourceKind::Social => "social",
            SourceKind::Forum => "forum",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "feed" => Ok(SourceKind::Feed),
            "social" => Ok(SourceKind::Social),
            "forum" => Ok(SourceKind::Forum),
            other => Err(anyhow::anyhow!(
                "unknown source '{other}' (valid: feed, social, forum)"
            )),
        }
    }
}

/// One unit of collected content, normalized across sources.
///
/// `published_at` is always timezone-aware; adapters substitute the collection
/// time when the origin provides none. `engagement` is a source-specific
/// popularity proxy (likes/upvotes for social/forum, scaled relevance score
/// for feeds) and is only meaningful for ordering within one source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedItem {
    pub title: String,
    pub content: String,
    pub url: Option<String>,
    pub source: SourceKind,
    /// Human-readable origin, e.g. a feed's title, "r/worldnews", "@handle".
    pub source_name: String,
    pub author: Option<String>,
    pub published_at: DateTime<Utc>,
    pub engagement: u64,
}

/// True when `published` falls inside the recency window of `max_age_days`.
pub fn within_age_limit(published: DateTime<Utc>, max_age_days: i64) -> bool {
    let cutoff = Utc::now() - Duration::days(max_age_days);
    published >= cutoff
}
