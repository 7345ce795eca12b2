// src/sources/feeds.rs
//! Web feed adapter: fetches configured RSS feeds and keeps topic-relevant,
//! recent entries. Relevance comes from the matcher; engagement is the
//! matcher score scaled to an integer, so within this source "engagement"
//! means relevance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;
use tracing::warn;

use crate::config::Settings;
use crate::matcher::TopicMatcher;
use crate::model::{within_age_limit, FeedItem, SourceKind};
use crate::sources::{snippet, strip_html, SourceAdapter};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
/// Entries examined per feed before relevance filtering.
const ENTRIES_PER_FEED: usize = 50;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    author: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .and_then(|dt| DateTime::from_timestamp(dt.unix_timestamp(), 0))
}

pub struct FeedSource {
    client: reqwest::Client,
    feed_urls: Vec<String>,
    matcher: Arc<TopicMatcher>,
    max_items: usize,
    max_age_days: i64,
}

impl FeedSource {
    pub fn new(settings: &Settings, matcher: Arc<TopicMatcher>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("building feed http client")?;
        Ok(Self {
            client,
            feed_urls: settings.feed_urls.clone(),
            matcher,
            max_items: settings.max_items_per_source,
            max_age_days: settings.max_feed_age_days,
        })
    }

    /// Parse one feed document and keep entries relevant to `topic` within
    /// the recency window. Public so fixture tests can exercise the parser
    /// without a network.
    pub fn parse_feed(&self, xml: &str, feed_url: &str, topic: &str) -> Result<Vec<FeedItem>> {
        let t0 = std::time::Instant::now();
        let rss: Rss = from_str(xml).context("parsing rss xml")?;
        let feed_title = rss
            .channel
            .title
            .map(|t| strip_html(&t))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| feed_url.to_string());

        let mut out = Vec::new();
        for entry in rss.channel.items.into_iter().take(ENTRIES_PER_FEED) {
            let title = strip_html(entry.title.as_deref().unwrap_or_default());
            let summary = strip_html(entry.description.as_deref().unwrap_or_default());

            let combined = format!("{title} {summary}");
            let result = self.matcher.match_topic(&combined, topic);
            if !result.matched {
                continue;
            }

            // Missing dates fall back to collection time, an explicit
            // approximation rather than an error.
            let published = entry
                .pub_date
                .as_deref()
                .and_then(parse_rfc2822)
                .unwrap_or_else(Utc::now);
            if !within_age_limit(published, self.max_age_days) {
                continue;
            }

            let content = if summary.is_empty() {
                title.clone()
            } else {
                summary
            };
            if content.is_empty() {
                continue;
            }
            let title = if title.is_empty() {
                snippet(&content, 80)
            } else {
                title
            };

            out.push(FeedItem {
                title,
                content,
                url: entry.link,
                source: SourceKind::Feed,
                source_name: feed_title.clone(),
                author: entry.author,
                published_at: published,
                engagement: (result.score * 100.0).round() as u64,
            });
        }

        histogram!("collect_feed_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for FeedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Feed
    }

    async fn search(&self, topic: &str) -> Result<Vec<FeedItem>> {
        let mut items = Vec::new();

        for feed_url in &self.feed_urls {
            let body = match self.client.get(feed_url).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => resp.text().await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            // A failing URL is skipped; the remaining feeds still contribute.
            let body = match body {
                Ok(b) => b,
                Err(e) => {
                    warn!(feed_url, error = %e, "feed fetch failed");
                    counter!("collect_source_errors_total").increment(1);
                    continue;
                }
            };
            match self.parse_feed(&body, feed_url, topic) {
                Ok(mut v) => items.append(&mut v),
                Err(e) => {
                    warn!(feed_url, error = %e, "feed parse failed");
                    counter!("collect_source_errors_total").increment(1);
                }
            }
        }

        // Relevance-based engagement ordering, capped per topic.
        items.sort_by(|a, b| b.engagement.cmp(&a.engagement));
        items.truncate(self.max_items);
        Ok(items)
    }
}
