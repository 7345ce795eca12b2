//! Feed adapter parsing against an RSS fixture. Timestamp placeholders are
//! filled at runtime so the recency window behaves the same on any day.

use chrono::{Duration, Utc};
use news_radar::config::Settings;
use news_radar::matcher::TopicMatcher;
use news_radar::model::SourceKind;
use news_radar::sources::feeds::FeedSource;
use std::sync::Arc;

const FEED_XML: &str = include_str!("fixtures/feed_rss.xml");

fn test_settings() -> Settings {
    Settings {
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: String::new(),
        feed_urls: vec![],
        forum_client_id: String::new(),
        forum_client_secret: String::new(),
        forum_user_agent: "test".into(),
        browser_url: "http://localhost:3000".into(),
        browser_token: None,
        social_cookies: None,
        redis_url: "redis://localhost:6379".into(),
        max_items_per_source: 10,
        cache_ttl_secs: 300,
        max_feed_age_days: 3,
    }
}

fn fixture_xml() -> String {
    let recent = (Utc::now() - Duration::hours(2)).to_rfc2822();
    let stale = (Utc::now() - Duration::days(30)).to_rfc2822();
    FEED_XML
        .replace("{{RECENT}}", &recent)
        .replace("{{STALE}}", &stale)
}

fn feed_source() -> FeedSource {
    FeedSource::new(&test_settings(), Arc::new(TopicMatcher::default())).expect("feed source")
}

#[test]
fn keeps_relevant_recent_entries_only() {
    let source = feed_source();
    let items = source
        .parse_feed(&fixture_xml(), "https://news.example/rss", "ai")
        .expect("parse ok");

    let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
    assert!(titles
        .iter()
        .any(|t| t.contains("Artificial intelligence breakthrough")));
    // Irrelevant entry dropped.
    assert!(!titles.iter().any(|t| t.contains("bake sale")));
    // Relevant but outside the recency window.
    assert!(!titles.iter().any(|t| t.contains("OpenAI announces")));
}

#[test]
fn normalizes_fields_and_scales_engagement() {
    let source = feed_source();
    let items = source
        .parse_feed(&fixture_xml(), "https://news.example/rss", "ai")
        .expect("parse ok");

    for item in &items {
        assert_eq!(item.source, SourceKind::Feed);
        assert_eq!(item.source_name, "Example World News");
        assert!(!item.title.is_empty());
        assert!(!item.content.is_empty());
        // Engagement is the matcher score scaled to 0..=100.
        assert!(item.engagement <= 100);
        assert!(item.engagement > 0);
    }

    let breakthrough = items
        .iter()
        .find(|i| i.title.contains("breakthrough"))
        .expect("breakthrough item present");
    // HTML markup stripped from the summary.
    assert_eq!(
        breakthrough.content,
        "Researchers unveil a new machine learning model."
    );
    assert_eq!(
        breakthrough.url.as_deref(),
        Some("https://news.example/ai-breakthrough")
    );
}

#[test]
fn synthesizes_title_when_feed_omits_one() {
    let source = feed_source();
    let items = source
        .parse_feed(&fixture_xml(), "https://news.example/rss", "ai")
        .expect("parse ok");

    let untitled = items
        .iter()
        .find(|i| i.url.as_deref() == Some("https://news.example/untitled"))
        .expect("untitled entry kept");
    assert!(untitled.title.starts_with("Enterprises report"));
}

#[test]
fn bad_xml_is_an_error() {
    let source = feed_source();
    assert!(source
        .parse_feed("this is not xml at all", "https://news.example/rss", "ai")
        .is_err());
}

#[test]
fn unmatched_topic_yields_empty() {
    let source = feed_source();
    let items = source
        .parse_feed(&fixture_xml(), "https://news.example/rss", "volcanoes")
        .expect("parse ok");
    assert!(items.is_empty());
}
