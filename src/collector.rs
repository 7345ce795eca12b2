// src/collector.rs
//! Collection orchestrator: concurrent fan-out to every enabled source for
//! every topic, with per-task failure isolation.

use anyhow::{bail, Result};
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::warn;

use crate::model::{FeedItem, SourceKind};
use crate::sources::SourceAdapter;

pub struct Collector {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl Collector {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Collect items for every topic from every enabled source.
    ///
    /// The result always has exactly one entry per requested topic; a topic
    /// for which every source failed maps to an empty list. The only error
    /// case is a configuration one: no enabled source matches a registered
    /// adapter. Individual task failures are logged and contribute nothing.
    pub async fn collect(
        &self,
        topics: &[String],
        enabled_sources: &[SourceKind],
    ) -> Result<HashMap<String, Vec<FeedItem>>> {
        let active: Vec<Arc<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|a| enabled_sources.contains(&a.kind()))
            .cloned()
            .collect();
        if active.is_empty() {
            bail!("no sources enabled for collection");
        }

        // Topics are deduplicated here so duplicate inputs cannot double-fill
        // one result bucket.
        let mut topics_dedup: Vec<String> = Vec::new();
        for t in topics {
            if !topics_dedup.contains(t) {
                topics_dedup.push(t.clone());
            }
        }

        let mut results: HashMap<String, Vec<FeedItem>> = topics_dedup
            .iter()
            .map(|t| (t.clone(), Vec::new()))
            .collect();

        // One task per (topic, source); all are awaited regardless of
        // individual outcomes. No shared mutable state inside the tasks —
        // each returns its own list and the merge happens after the barrier.
        let mut tasks = JoinSet::new();
        for topic in &topics_dedup {
            for adapter in &active {
                let adapter = adapter.clone();
                let topic = topic.clone();
                tasks.spawn(async move {
                    let kind = adapter.kind();
                    let outcome = adapter.search(&topic).await;
                    (topic, kind, outcome)
                });
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((topic, _kind, Ok(mut items))) => {
                    counter!("collect_items_total").increment(items.len() as u64);
                    if let Some(bucket) = results.get_mut(&topic) {
                        bucket.append(&mut items);
                    }
                }
                Ok((topic, kind, Err(e))) => {
                    warn!(topic, source = %kind, error = %e, "source fetch failed");
                    counter!("collect_source_errors_total").increment(1);
                }
                Err(e) => {
                    warn!(error = %e, "collection task aborted");
                    counter!("collect_source_errors_total").increment(1);
                }
            }
        }

        // Single global ordering rule: most recent first. Adapter-internal
        // engagement orderings only decided what made the cut.
        for items in results.values_mut() {
            items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        }

        Ok(results)
    }
}
