// src/sources/forum.rs
//! Forum adapter: searches a fixed set of default communities through the
//! forum's API. Relevance is delegated to the forum's own search ranking;
//! locally we only floor engagement and re-check recency (the API's time
//! filter is too coarse).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

use crate::config::Settings;
use crate::model::{within_age_limit, FeedItem, SourceKind};
use crate::sources::SourceAdapter;

const API_TIMEOUT: Duration = Duration::from_secs(15);
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const SEARCH_BASE: &str = "https://oauth.reddit.com";
/// Results requested per community, before local filtering.
const RESULTS_PER_COMMUNITY: usize = 10;
/// Posts below this score are noise.
const MIN_ENGAGEMENT: i64 = 10;

/// Default communities searched for every topic.
const DEFAULT_COMMUNITIES: [&str; 6] = [
    "worldnews",
    "news",
    "technology",
    "science",
    "business",
    "politics",
];

/// Map the recency window onto the API's coarse time filter.
fn time_filter(max_age_days: i64) -> &'static str {
    match max_age_days {
        d if d <= 1 => "day",
        d if d <= 7 => "week",
        d if d <= 30 => "month",
        d if d <= 365 => "year",
        _ => "all",
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: String,
    created_utc: f64,
    #[serde(default)]
    score: i64,
    author: Option<String>,
    #[serde(default)]
    is_self: bool,
    url: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

pub struct ForumSource {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    user_agent: String,
    communities: Vec<String>,
    max_items: usize,
    max_age_days: i64,
    token: Mutex<Option<CachedToken>>,
}

impl ForumSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .context("building forum http client")?;
        Ok(Self {
            client,
            client_id: settings.forum_client_id.clone(),
            client_secret: settings.forum_client_secret.clone(),
            user_agent: settings.forum_user_agent.clone(),
            communities: DEFAULT_COMMUNITIES.iter().map(|s| s.to_string()).collect(),
            max_items: settings.max_items_per_source,
            max_age_days: settings.max_feed_age_days,
            token: Mutex::new(None),
        })
    }

    fn has_credentials(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// App-only OAuth token, fetched lazily and reused until close to expiry.
    async fn access_token(&self) -> Result<String> {
        let mut slot = self.token.lock().await;
        if let Some(cached) = slot.as_ref() {
            if cached.expires_at > Instant::now() + Duration::from_secs(60) {
                return Ok(cached.value.clone());
            }
        }

        let resp = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("token request failed")?;
        if !resp.status().is_success() {
            return Err(anyhow!("token endpoint returned {}", resp.status()));
        }
        let token: TokenResponse = resp.json().await.context("parsing token response")?;

        let value = token.access_token.clone();
        *slot = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }

    async fn search_community(
        &self,
        token: &str,
        community: &str,
        topic: &str,
    ) -> Result<Vec<FeedItem>> {
        let url = format!("{SEARCH_BASE}/r/{community}/search");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header("User-Agent", &self.user_agent)
            .query(&[
                ("q", topic),
                ("restrict_sr", "1"),
                ("sort", "relevance"),
                ("t", time_filter(self.max_age_days)),
                ("limit", &RESULTS_PER_COMMUNITY.to_string()),
                ("raw_json", "1"),
            ])
            .send()
            .await
            .with_context(|| format!("searching r/{community}"))?
            .error_for_status()
            .with_context(|| format!("searching r/{community}"))?;

        let body = resp.text().await.context("reading search response")?;
        self.parse_listing(community, &body)
    }

    /// Convert one search listing into items. Public for fixture tests.
    pub fn parse_listing(&self, community: &str, body: &str) -> Result<Vec<FeedItem>> {
        let listing: Listing = serde_json::from_str(body).context("parsing search listing")?;
        let mut out = Vec::new();

        for child in listing.data.children {
            let post = child.data;
            if post.score < MIN_ENGAGEMENT {
                continue;
            }

            let published = DateTime::<Utc>::from_timestamp(post.created_utc as i64, 0)
                .unwrap_or_else(Utc::now);
            // The API's time filter is coarse; re-verify locally.
            if !within_age_limit(published, self.max_age_days) {
                continue;
            }

            let mut content = if post.selftext.is_empty() {
                post.title.clone()
            } else {
                post.selftext
            };
            // Link posts carry their target in the body.
            if !post.is_self {
                if let Some(link) = &post.url {
                    content = format!("{content}\n\nLink: {link}");
                }
            }

            out.push(FeedItem {
                title: post.title,
                content,
                url: Some(format!("https://reddit.com{}", post.permalink)),
                source: SourceKind::Forum,
                source_name: format!("r/{community}"),
                author: post.author,
                published_at: published,
                engagement: post.score.max(0) as u64,
            });
        }

        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for ForumSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Forum
    }

    async fn search(&self, topic: &str) -> Result<Vec<FeedItem>> {
        // Missing credentials soft-disable this source.
        if !self.has_credentials() {
            warn!("forum API credentials not configured, skipping");
            return Ok(Vec::new());
        }

        let token = match self.access_token().await {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "forum auth failed");
                counter!("collect_source_errors_total").increment(1);
                return Ok(Vec::new());
            }
        };

        let mut items = Vec::new();
        for community in &self.communities {
            match self.search_community(&token, community, topic).await {
                Ok(mut v) => items.append(&mut v),
                Err(e) => {
                    warn!(community, error = %e, "community search failed");
                    counter!("collect_source_errors_total").increment(1);
                }
            }
        }

        items.sort_by(|a, b| b.engagement.cmp(&a.engagement));
        items.truncate(self.max_items);
        Ok(items)
    }
}
