// src/sources/mod.rs
pub mod feeds;
pub mod forum;
pub mod social;

use crate::model::{FeedItem, SourceKind};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// Capability contract for one content source.
///
/// `search` handles its own protocol/site-specific failures: sub-steps
/// (a single feed URL, a single community) are caught and logged inside the
/// adapter, and an `Err` at this boundary is treated by the orchestrator as a
/// zero-item contribution, never as a request failure.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;
    async fn search(&self, topic: &str) -> Result<Vec<FeedItem>>;
}

/// Decode HTML entities, strip tags, collapse whitespace.
pub(crate) fn strip_html(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

    let decoded = html_escape::decode_html_entities(s).to_string();
    let no_tags = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(no_tags.trim(), " ").trim().to_string()
}

/// First `max` characters of `text`, with an ellipsis when truncated.
pub(crate) fn snippet(text: &str, max: usize) -> String {
    let head: String = text.chars().take(max).collect();
    if text.chars().count() > max {
        format!("{head}...")
    } else {
        head
    }
}
