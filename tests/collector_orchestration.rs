//! Orchestrator properties: per-topic completeness, failure isolation, and
//! the global recency ordering.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use news_radar::collector::Collector;
use news_radar::model::{FeedItem, SourceKind};
use news_radar::sources::SourceAdapter;
use std::sync::Arc;

fn item(source: SourceKind, title: &str, published_at: DateTime<Utc>) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        content: format!("{title} content"),
        url: None,
        source,
        source_name: format!("{source} origin"),
        author: None,
        published_at,
        engagement: 1,
    }
}

struct StubSource {
    kind: SourceKind,
    items: Vec<FeedItem>,
    fail: bool,
}

impl StubSource {
    fn ok(kind: SourceKind, items: Vec<FeedItem>) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            kind,
            items,
            fail: false,
        })
    }

    fn failing(kind: SourceKind) -> Arc<dyn SourceAdapter> {
        Arc::new(Self {
            kind,
            items: Vec::new(),
            fail: true,
        })
    }
}

#[async_trait]
impl SourceAdapter for StubSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn search(&self, _topic: &str) -> Result<Vec<FeedItem>> {
        if self.fail {
            anyhow::bail!("upstream unavailable");
        }
        Ok(self.items.clone())
    }
}

struct PanickingSource;

#[async_trait]
impl SourceAdapter for PanickingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Social
    }

    async fn search(&self, _topic: &str) -> Result<Vec<FeedItem>> {
        panic!("adapter bug");
    }
}

fn topics(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn every_topic_gets_an_entry_even_when_all_sources_fail() {
    let collector = Collector::new(vec![
        StubSource::failing(SourceKind::Feed),
        StubSource::failing(SourceKind::Forum),
    ]);
    let out = collector
        .collect(
            &topics(&["ai", "crypto"]),
            &[SourceKind::Feed, SourceKind::Forum],
        )
        .await
        .expect("collect succeeds despite source failures");

    assert_eq!(out.len(), 2);
    assert_eq!(out["ai"], Vec::new());
    assert_eq!(out["crypto"], Vec::new());
}

#[tokio::test]
async fn merged_items_are_sorted_by_recency_descending() {
    let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
    let feed_items = vec![
        item(SourceKind::Feed, "feed old", base - Duration::hours(5)),
        item(SourceKind::Feed, "feed new", base),
    ];
    let forum_items = vec![item(
        SourceKind::Forum,
        "forum mid",
        base - Duration::hours(2),
    )];

    let collector = Collector::new(vec![
        StubSource::ok(SourceKind::Feed, feed_items),
        StubSource::ok(SourceKind::Forum, forum_items),
    ]);
    let out = collector
        .collect(&topics(&["ai"]), &[SourceKind::Feed, SourceKind::Forum])
        .await
        .unwrap();

    let items = &out["ai"];
    assert_eq!(items.len(), 3);
    for pair in items.windows(2) {
        assert!(pair[0].published_at >= pair[1].published_at);
    }
    assert_eq!(items[0].title, "feed new");
    assert_eq!(items[1].title, "forum mid");
    assert_eq!(items[2].title, "feed old");
}

#[tokio::test]
async fn one_failing_source_does_not_lose_the_others() {
    let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
    let collector = Collector::new(vec![
        StubSource::failing(SourceKind::Feed),
        StubSource::ok(
            SourceKind::Social,
            vec![item(SourceKind::Social, "post", base)],
        ),
        StubSource::ok(
            SourceKind::Forum,
            vec![item(SourceKind::Forum, "thread", base - Duration::hours(1))],
        ),
    ]);
    let out = collector
        .collect(
            &topics(&["ai"]),
            &[SourceKind::Feed, SourceKind::Social, SourceKind::Forum],
        )
        .await
        .unwrap();

    let titles: Vec<&str> = out["ai"].iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["post", "thread"]);
}

#[tokio::test]
async fn panicking_adapter_is_isolated() {
    let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
    let collector = Collector::new(vec![
        Arc::new(PanickingSource),
        StubSource::ok(SourceKind::Feed, vec![item(SourceKind::Feed, "ok", base)]),
    ]);
    let out = collector
        .collect(&topics(&["ai"]), &[SourceKind::Feed, SourceKind::Social])
        .await
        .unwrap();

    assert_eq!(out["ai"].len(), 1);
    assert_eq!(out["ai"][0].title, "ok");
}

#[tokio::test]
async fn no_enabled_sources_is_a_configuration_error() {
    let collector = Collector::new(vec![StubSource::ok(SourceKind::Feed, Vec::new())]);
    // Enabled set does not intersect registered adapters.
    let res = collector
        .collect(&topics(&["ai"]), &[SourceKind::Social])
        .await;
    assert!(res.is_err());

    let res = collector.collect(&topics(&["ai"]), &[]).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn duplicate_topics_collapse_into_one_entry() {
    let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
    let collector = Collector::new(vec![StubSource::ok(
        SourceKind::Feed,
        vec![item(SourceKind::Feed, "only", base)],
    )]);
    let out = collector
        .collect(&topics(&["ai", "ai"]), &[SourceKind::Feed])
        .await
        .unwrap();

    assert_eq!(out.len(), 1);
    assert_eq!(out["ai"].len(), 1);
}
