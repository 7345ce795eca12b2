// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register the series names so they
    /// show up on /metrics before the first increment.
    pub fn init(cache_ttl_secs: u64) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!("collect_requests_total", "Collection requests received.");
        describe_counter!("collect_cache_hits_total", "Requests served from cache.");
        describe_counter!("collect_cache_misses_total", "Requests that ran collection.");
        describe_counter!(
            "collect_source_errors_total",
            "Per-source fetch/parse/auth failures (non-fatal)."
        );
        describe_counter!("collect_items_total", "Items contributed by adapters.");
        describe_histogram!("collect_feed_parse_ms", "Feed parse time in milliseconds.");

        gauge!("collect_cache_ttl_secs").set(cache_ttl_secs as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
