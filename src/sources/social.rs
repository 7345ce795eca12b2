// src/sources/social.rs
//! Social adapter: live search against x.com through the browser-rendering
//! service, extracting posts from the rendered search page.
//!
//! Renders share one underlying browser session, so concurrent topic
//! searches against the same adapter instance queue on a single permit
//! rather than interleaving.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Semaphore;
use tracing::warn;

use crate::browser::BrowserClient;
use crate::config::Settings;
use crate::model::{within_age_limit, FeedItem, SourceKind};
use crate::sources::{snippet, SourceAdapter};

/// Posts examined per rendered page before the age filter.
const POSTS_PER_PAGE: usize = 20;

static SEL_TWEET: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"article[data-testid="tweet"]"#).expect("tweet selector"));
static SEL_TEXT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[data-testid="tweetText"]"#).expect("text selector"));
static SEL_TIME: Lazy<Selector> = Lazy::new(|| Selector::parse("time").expect("time selector"));
static SEL_USER_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[role="link"]"#).expect("user link selector"));
static SEL_STATUS_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/status/"]"#).expect("status link selector"));
static SEL_COUNTERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["reply", "retweet", "like"]
        .iter()
        .map(|id| {
            Selector::parse(&format!(r#"[data-testid="{id}"]"#)).expect("counter selector")
        })
        .collect()
});

/// Session cookie material for authenticated searches: inline JSON array or
/// a path to a JSON file. Entries must be objects with `name` and `value`;
/// `sameSite` values the browser service rejects are dropped from the entry.
pub fn load_session_cookies(raw: &str) -> Result<Vec<serde_json::Value>> {
    let trimmed = raw.trim();
    let text = if trimmed.starts_with('[') {
        trimmed.to_string()
    } else {
        std::fs::read_to_string(trimmed)
            .with_context(|| format!("reading session cookies from {trimmed}"))?
    };
    let parsed: serde_json::Value =
        serde_json::from_str(&text).context("parsing session cookies")?;
    let entries = parsed
        .as_array()
        .context("session cookies must be a json array")?;

    let mut cookies = Vec::new();
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };
        if !obj.contains_key("name") || !obj.contains_key("value") {
            continue;
        }
        let mut cookie = obj.clone();
        let same_site_ok = cookie
            .get("sameSite")
            .map_or(true, |v| matches!(v.as_str(), Some("Strict" | "Lax" | "None")));
        if !same_site_ok {
            cookie.remove("sameSite");
        }
        cookies.push(serde_json::Value::Object(cookie));
    }
    Ok(cookies)
}

pub struct SocialSource {
    browser: BrowserClient,
    render_permit: Semaphore,
    max_items: usize,
    max_age_days: i64,
}

impl SocialSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let mut browser =
            BrowserClient::new(&settings.browser_url, settings.browser_token.as_deref())?;

        // Unusable session material degrades to unauthenticated searches.
        if let Some(raw) = settings.social_cookies.as_deref() {
            match load_session_cookies(raw) {
                Ok(cookies) if !cookies.is_empty() => {
                    browser = browser.with_cookies(cookies);
                }
                Ok(_) => warn!("social session material empty, searching unauthenticated"),
                Err(e) => {
                    warn!(error = %e, "social session material unusable, searching unauthenticated");
                }
            }
        }

        Ok(Self {
            browser,
            render_permit: Semaphore::new(1),
            max_items: settings.max_items_per_source,
            max_age_days: settings.max_feed_age_days,
        })
    }

    /// Extract posts from a rendered search page. Public for fixture tests.
    pub fn parse_search_page(&self, html: &str) -> Vec<FeedItem> {
        let doc = Html::parse_document(html);
        let mut items = Vec::new();

        for tweet in doc.select(&SEL_TWEET).take(POSTS_PER_PAGE) {
            let Some(item) = parse_post(&tweet) else {
                continue;
            };
            if within_age_limit(item.published_at, self.max_age_days) {
                items.push(item);
            }
        }

        items
    }
}

fn parse_post(tweet: &ElementRef<'_>) -> Option<FeedItem> {
    let text: String = tweet
        .select(&SEL_TEXT)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if text.is_empty() {
        return None;
    }

    let author = tweet
        .select(&SEL_USER_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.starts_with('/') && !href.starts_with("/search"))
        .map(|href| href.trim_matches('/').to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    // Missing or malformed timestamps fall back to collection time.
    let published_at = tweet
        .select(&SEL_TIME)
        .next()
        .and_then(|t| t.value().attr("datetime"))
        .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now);

    // Engagement approximated by summing the visible interaction counters.
    let mut engagement = 0u64;
    for selector in SEL_COUNTERS.iter() {
        if let Some(aria) = tweet
            .select(selector)
            .next()
            .and_then(|el| el.value().attr("aria-label"))
        {
            if let Some(first) = aria.split_whitespace().next() {
                if let Ok(n) = first.replace(',', "").parse::<u64>() {
                    engagement += n;
                }
            }
        }
    }

    let url = tweet
        .select(&SEL_STATUS_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("/status/"))
        .map(|href| {
            if href.starts_with('/') {
                format!("https://x.com{href}")
            } else {
                href.to_string()
            }
        });

    Some(FeedItem {
        title: format!("@{author}: {}", snippet(&text, 80)),
        content: text,
        url,
        source: SourceKind::Social,
        source_name: format!("@{author}"),
        author: Some(author),
        published_at,
        engagement,
    })
}

#[async_trait]
impl SourceAdapter for SocialSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    async fn search(&self, topic: &str) -> Result<Vec<FeedItem>> {
        let search_url = reqwest::Url::parse_with_params(
            "https://x.com/search",
            &[("q", topic), ("src", "typed_query"), ("f", "live")],
        )
        .context("building search url")?;

        let _permit = self
            .render_permit
            .acquire()
            .await
            .context("render permit closed")?;

        let html = match self.browser.content(search_url.as_str()).await {
            Ok(html) => html,
            Err(e) => {
                warn!(topic, error = %e, "social search render failed");
                metrics::counter!("collect_source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };

        // An empty page is a valid "nothing found" outcome, not an error.
        let mut items = self.parse_search_page(&html);
        items.truncate(self.max_items);
        Ok(items)
    }
}
